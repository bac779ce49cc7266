//! Bearer token kept next to the cart.
//!
//! `STOREFRONT_TOKEN` (or `token` in the config file) takes precedence.

use crate::state::AppState;
use cart_core::{KeyValueStore, TOKEN_KEY};
use std::io::Write;

pub fn login(state: &AppState, token: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }

    let mut cart = state.open_cart()?;
    cart.storage_mut().set(TOKEN_KEY, token)?;
    writeln!(out, "Token saved")?;
    Ok(())
}

pub fn logout(state: &AppState, out: &mut impl Write) -> anyhow::Result<()> {
    let mut cart = state.open_cart()?;
    cart.storage_mut().remove(TOKEN_KEY)?;
    writeln!(out, "Token removed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::state_at;

    #[test]
    fn test_login_then_logout() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path(), "http://127.0.0.1:9");

        login(&state, " jwt-abc ", &mut Vec::new()).unwrap();
        let cart = state.open_cart().unwrap();
        assert_eq!(state.bearer_token(cart.storage()).as_deref(), Some("jwt-abc"));

        logout(&state, &mut Vec::new()).unwrap();
        let cart = state.open_cart().unwrap();
        assert_eq!(state.bearer_token(cart.storage()), None);
        assert!(login(&state, "  ", &mut Vec::new()).is_err());
    }
}
