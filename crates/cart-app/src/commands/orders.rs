//! Order history for a customer.

use crate::state::AppState;
use anyhow::Context;
use std::io::Write;

pub async fn list(state: &AppState, customer_id: i64, out: &mut impl Write) -> anyhow::Result<()> {
    let cart = state.open_cart()?;
    let bearer = state.bearer_token(cart.storage());

    let orders = state
        .backend
        .orders_for_customer(customer_id, bearer.as_deref())
        .await
        .with_context(|| format!("Failed to load orders for customer {}", customer_id))?;

    if orders.is_empty() {
        writeln!(out, "No orders yet")?;
        return Ok(());
    }

    for order in &orders {
        let delivered = order
            .delivered_at
            .as_deref()
            .map(|d| format!(", delivered {d}"))
            .unwrap_or_default();
        writeln!(
            out,
            "Order #{} [{}] placed {}{}",
            order.id, order.status, order.created_at, delivered
        )?;
        for item in &order.items {
            let name = item
                .product
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("(unknown product)");
            match item.variant_id {
                Some(variant) => writeln!(out, "  {} x {} (variant {})", item.quantity, name, variant)?,
                None => writeln!(out, "  {} x {}", item.quantity, name)?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{output, state_at};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_uses_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pedidos/cliente/12"))
            .and(header("authorization", "Bearer stored-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 3,
                "estado": "PENDIENTE",
                "fechaCreacion": "2024-05-02T09:30:00",
                "items": [{"producto": {"id": 7, "nombre": "Pijama Luna"}, "tallaId": 3, "cantidad": 1}]
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path(), &server.uri());
        crate::commands::auth::login(&state, "stored-jwt", &mut Vec::new()).unwrap();

        let mut out = Vec::new();
        list(&state, 12, &mut out).await.unwrap();
        let text = output(out);

        assert!(text.contains("Order #3 [PENDIENTE] placed 2024-05-02T09:30:00"));
        assert!(text.contains("1 x Pijama Luna (variant 3)"));
    }

    #[tokio::test]
    async fn test_list_reports_backend_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pedidos/cliente/12"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path(), &server.uri());
        assert!(list(&state, 12, &mut Vec::new()).await.is_err());
    }
}
