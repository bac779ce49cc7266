//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! lucy-cart cart show
//! lucy-cart cart add 7 --variant 3
//! lucy-cart cart set-qty 7 --variant 3 2
//! lucy-cart cart remove 7
//! lucy-cart cart clear
//! ```

use super::write_cart;
use crate::state::AppState;
use anyhow::{bail, Context};
use cart_core::{ProductId, VariantId};
use std::io::Write;

pub fn show(state: &AppState, out: &mut impl Write) -> anyhow::Result<()> {
    let cart = state.open_cart()?;
    write_cart(out, &cart)?;
    Ok(())
}

/// Add one unit at the catalog's current price
pub async fn add(
    state: &AppState,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let product = state
        .catalog
        .product(product_id)
        .await
        .context("Failed to load the catalog")?;

    let Some(product) = product else {
        bail!("Product {} is not in the active catalog", product_id);
    };

    match variant_id {
        Some(id) if product.variant(id).is_none() => {
            bail!("{} has no variant {}", product.name, id);
        }
        None if product.has_variants() => {
            let sizes: Vec<String> = product
                .variants
                .iter()
                .map(|v| format!("{} ({})", v.id, v.label))
                .collect();
            bail!(
                "{} comes in sizes; choose a size with --variant: {}",
                product.name,
                sizes.join(", ")
            );
        }
        _ => {}
    }
    if !product.can_add(variant_id) {
        bail!("{} is out of stock", product.name);
    }

    let mut cart = state.open_cart()?;
    cart.add(&product, variant_id);
    tracing::info!(product_id, ?variant_id, "Added to cart");

    writeln!(out, "Added {}", product.name)?;
    write_cart(out, &cart)?;
    Ok(())
}

/// Remove a product, or just one of its variants
pub fn remove(
    state: &AppState,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut cart = state.open_cart()?;
    let removed = match variant_id {
        Some(id) => usize::from(cart.remove_variant(product_id, Some(id))),
        None => cart.remove(product_id),
    };

    if removed == 0 {
        writeln!(out, "Product {} is not in the cart", product_id)?;
    }
    write_cart(out, &cart)?;
    Ok(())
}

/// Set a quantity; zero or less removes the line(s)
pub fn set_quantity(
    state: &AppState,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    quantity: i64,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut cart = state.open_cart()?;
    match variant_id {
        Some(id) => cart.set_variant_quantity(product_id, Some(id), quantity),
        None => cart.set_quantity(product_id, quantity),
    }
    write_cart(out, &cart)?;
    Ok(())
}

pub fn clear(state: &AppState, out: &mut impl Write) -> anyhow::Result<()> {
    let mut cart = state.open_cart()?;
    cart.clear();
    writeln!(out, "Cart cleared")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ACTIVE_PRODUCTS_PATH;
    use crate::commands::tests::{output, pajama, state_at};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn catalog_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACTIVE_PRODUCTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 7,
                "nombre": "Pijama Luna",
                "precioVenta": 30000,
                "variante": [
                    {"talla": {"id": 3, "nombre": "M"}, "precioVenta": 25000, "stockActual": 4},
                    {"talla": {"id": 4, "nombre": "L"}, "precioVenta": 27000, "stockActual": 0}
                ]
            }])))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_add_persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let server = catalog_server().await;
        let state = state_at(dir.path(), &server.uri());

        add(&state, 7, Some(3), &mut Vec::new()).await.unwrap();
        add(&state, 7, Some(3), &mut Vec::new()).await.unwrap();

        let cart = state.open_cart().unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), dec!(50000));
    }

    #[tokio::test]
    async fn test_add_rejects_out_of_stock_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let server = catalog_server().await;
        let state = state_at(dir.path(), &server.uri());

        let err = add(&state, 7, Some(4), &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("out of stock"));
        assert!(add(&state, 7, Some(99), &mut Vec::new()).await.is_err());
        assert!(add(&state, 8, None, &mut Vec::new()).await.is_err());
        assert!(state.open_cart().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_sized_product_requires_variant() {
        let dir = tempfile::tempdir().unwrap();
        let server = catalog_server().await;
        let state = state_at(dir.path(), &server.uri());

        let err = add(&state, 7, None, &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("choose a size"));
        assert!(err.to_string().contains("3 (M)"));
        assert!(state.open_cart().unwrap().is_empty());
    }

    #[test]
    fn test_remove_variant_keeps_other_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path(), "http://127.0.0.1:9");
        let mut cart = state.open_cart().unwrap();
        let mut product = pajama();
        product.variants[1].stock = 3;
        cart.add(&product, Some(3));
        cart.add(&product, Some(4));

        remove(&state, 7, Some(4), &mut Vec::new()).unwrap();
        assert_eq!(state.open_cart().unwrap().lines().len(), 1);

        let mut out = Vec::new();
        remove(&state, 7, None, &mut out).unwrap();
        assert!(state.open_cart().unwrap().is_empty());
        assert!(output(out).contains("Cart is empty"));
    }

    #[test]
    fn test_set_quantity_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path(), "http://127.0.0.1:9");
        state.open_cart().unwrap().add(&pajama(), Some(3));

        set_quantity(&state, 7, Some(3), 5, &mut Vec::new()).unwrap();
        assert_eq!(state.open_cart().unwrap().item_count(), 5);

        set_quantity(&state, 7, None, 0, &mut Vec::new()).unwrap();
        assert!(state.open_cart().unwrap().is_empty());

        state.open_cart().unwrap().add(&pajama(), None);
        clear(&state, &mut Vec::new()).unwrap();
        assert!(state.open_cart().unwrap().is_empty());
    }
}
