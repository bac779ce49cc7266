//! Command implementations.
//!
//! Each command writes its human-readable output to `out` and returns
//! `anyhow::Result`, leaving process exit codes to `main`.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod refresh;

use cart_core::{CartStore, Currency, KeyValueStore};
use std::io::Write;

/// Print every line and the total
pub(crate) fn write_cart<S: KeyValueStore>(
    out: &mut impl Write,
    cart: &CartStore<S>,
) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    let currency = Currency::COP;
    for line in cart.lines() {
        let variant = line
            .variant_id
            .map(|id| format!(" (variant {id})"))
            .unwrap_or_default();
        writeln!(
            out,
            "{:>4} x {}{} [#{}]  {}  = {}",
            line.quantity,
            line.name,
            variant,
            line.product_id,
            currency.format_amount(line.unit_price),
            currency.format_amount(line.subtotal()),
        )?;
    }
    writeln!(
        out,
        "Total ({} items): {}",
        cart.item_count(),
        currency.format_amount(cart.total())
    )
}
