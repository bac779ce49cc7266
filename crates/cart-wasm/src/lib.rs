//! # cart-wasm
//!
//! Browser bindings for lucy-cart.
//!
//! This crate provides:
//! - `WasmCart`, the cart persisted in `localStorage`
//! - `WasmCheckout`, which signs a session, opens the Wompi widget and
//!   places the order through `fetch` once the payment is approved
//! - display and signature helpers
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCart, WasmCheckout, format_cop } from 'lucy-cart-wasm';
//!
//! await init();
//!
//! const cart = new WasmCart();
//! cart.add({ id: 7, name: 'Pijama Luna', sale_price: 30000, variants: [] });
//! console.log('Total:', format_cop(cart.total()));
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build crates/cart-wasm --target web
//! ```

pub mod backend;
pub mod cart;
pub mod checkout;
pub mod storage;
pub mod widget;

pub use backend::FetchBackend;
pub use cart::WasmCart;
pub use checkout::WasmCheckout;
pub use storage::LocalStorage;
pub use widget::{ensure_widget_script, BrowserWidget, JsDelay};

use cart_core::{CheckoutError, Currency};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

/// Errors cross into JavaScript as `Error`s carrying the shopper-facing message
pub(crate) fn to_js_error(err: CheckoutError) -> JsValue {
    web_sys::console::error_1(&JsValue::from_str(&err.to_string()));
    js_sys::Error::new(&err.user_message()).into()
}

/// Format pesos the way the storefront does (`$ 50.000,00`)
#[wasm_bindgen]
pub fn format_cop(amount: f64) -> String {
    match Decimal::try_from(amount) {
        Ok(amount) => Currency::COP.format_amount(amount),
        Err(_) => String::new(),
    }
}

/// Integrity signature for `reference`, amount in cents and COP.
///
/// Throws for amounts the session builder would refuse: non-finite, fractional
/// or not positive.
#[wasm_bindgen]
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: f64,
    integrity_secret: &str,
) -> Result<String, JsValue> {
    let amount = minor_units(amount_in_cents).map_err(to_js_error)?;
    Ok(cart_core::integrity_signature(
        reference,
        amount,
        Currency::COP,
        integrity_secret,
    ))
}

fn minor_units(amount_in_cents: f64) -> Result<i64, CheckoutError> {
    let amount = Decimal::try_from(amount_in_cents)
        .ok()
        .filter(|a| a.fract().is_zero() && a.is_sign_positive() && !a.is_zero())
        .and_then(|a| a.to_i64());
    amount.ok_or_else(|| {
        CheckoutError::InvalidAmount {
            message: format!("{} is not a positive whole number of cents", amount_in_cents),
        }
    })
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cop() {
        assert_eq!(format_cop(50000.0), "$ 50.000,00");
        assert_eq!(format_cop(1234.5), "$ 1.234,50");
        assert_eq!(format_cop(f64::NAN), "");
    }

    #[test]
    fn test_minor_units_matches_core_signature() {
        let amount = minor_units(2490000.0).unwrap();
        assert_eq!(amount, 2_490_000);
        assert_eq!(
            cart_core::integrity_signature("ref-1", amount, Currency::COP, "test_integrity_abc").len(),
            64
        );
    }

    #[test]
    fn test_minor_units_rejects_unpayable_amounts() {
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -100.0, 10.5, 1e30] {
            assert!(
                matches!(minor_units(amount), Err(CheckoutError::InvalidAmount { .. })),
                "{amount} accepted"
            );
        }
    }
}
