//! Checkout commands.
//!
//! # Usage
//!
//! ```bash
//! # Signed widget input and Web Checkout URL for the current cart
//! lucy-cart session
//!
//! # Pay through Wompi Web Checkout and create the order
//! lucy-cart checkout
//! ```
//!
//! # Environment Variables
//!
//! - `WOMPI_PUBLIC_KEY`, `WOMPI_INTEGRITY_SECRET` - required
//! - `WOMPI_REDIRECT_URL` - where Wompi sends the shopper after paying

use crate::state::AppState;
use async_trait::async_trait;
use cart_core::{CheckoutError, CheckoutResult};
use cart_wompi::{CheckoutPresenter, WompiConfig};
use reqwest::Url;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prints the checkout URL and reads the transaction id from stdin.
///
/// Accepts either the bare id or the whole redirect URL (`...?id=<tx>`).
/// An empty line means the shopper gave up.
pub struct StdinPresenter;

#[async_trait]
impl CheckoutPresenter for StdinPresenter {
    async fn present(&self, checkout_url: &str, reference: &str) -> CheckoutResult<String> {
        println!("Open this link to pay (reference {reference}):\n\n  {checkout_url}\n");
        println!("Paste the transaction id or the redirect URL when done (empty to cancel):");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| CheckoutError::Internal(format!("cannot read stdin: {}", e)))?;

        Ok(transaction_id_from_input(&line))
    }
}

fn transaction_id_from_input(input: &str) -> String {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, id)| id.into_owned())
            .unwrap_or_default(),
        Err(_) => input.to_string(),
    }
}

/// Print the signed widget input and the equivalent Web Checkout URL
pub fn session(state: &AppState, wompi: WompiConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let cart = state.open_cart()?;
    let flow = state.checkout_flow(wompi, StdinPresenter)?;

    let (session, request) = flow.prepare(&cart)?;
    tracing::debug!(reference = %session.reference, "Prepared checkout session");

    writeln!(out, "{}", serde_json::to_string_pretty(&request)?)?;
    writeln!(out, "{}", flow.bridge().widget().checkout_url(&request)?)?;
    Ok(())
}

/// Pay for the cart and submit the order
pub async fn pay<P: CheckoutPresenter>(
    state: &AppState,
    wompi: WompiConfig,
    presenter: P,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut cart = state.open_cart()?;
    let bearer = state.bearer_token(cart.storage());
    if bearer.is_none() {
        tracing::warn!("No bearer token; the order API may reject the order");
    }

    let flow = state.checkout_flow(wompi, presenter)?;
    match flow.checkout(&mut cart, bearer.as_deref()).await {
        Ok(notice) => {
            writeln!(out, "{}", notice.message())?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "{}", e.user_message())?;
            Err(e.into())
        }
    }
}
