//! Re-price the cart from the live catalog.

use super::write_cart;
use crate::state::AppState;
use cart_core::CheckoutError;
use std::future::Future;
use std::io::Write;

/// Refresh prices; Ctrl-C abandons the refresh without touching the cart
pub async fn run(state: &AppState, out: &mut impl Write) -> anyhow::Result<()> {
    run_until(state, out, async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await
}

pub async fn run_until(
    state: &AppState,
    out: &mut impl Write,
    cancel: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let mut cart = state.open_cart()?;
    if cart.is_empty() {
        writeln!(out, "Cart is empty")?;
        return Ok(());
    }

    match state.catalog.refresh_prices_until(&mut cart, cancel).await {
        Ok(changed) => {
            writeln!(out, "{} line(s) repriced", changed)?;
            write_cart(out, &cart)?;
            Ok(())
        }
        Err(CheckoutError::Cancelled) => {
            writeln!(out, "Refresh cancelled; cart unchanged")?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
