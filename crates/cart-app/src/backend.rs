//! # Storefront Backend
//!
//! HTTP adapter for the storefront's order endpoints.

use async_trait::async_trait;
use cart_core::{
    backend_message, CheckoutError, CheckoutResult, OrderBackend, OrderReceipt,
    OrderSubmissionPayload, ProductId, VariantId,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

pub use cart_core::CHECKOUT_PATH;

/// Storefront order API client
#[derive(Debug, Clone)]
pub struct HttpOrderBackend {
    client: Client,
    base_url: String,
}

impl HttpOrderBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Orders placed by a customer, newest first as the backend returns them
    #[instrument(skip(self, bearer_token))]
    pub async fn orders_for_customer(
        &self,
        customer_id: i64,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<Vec<CustomerOrder>> {
        let url = format!("{}/api/pedidos/cliente/{}", self.base_url, customer_id);

        let mut request = self.client.get(&url);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Order history request failed: status={}, body={}", status, body);
            return Err(CheckoutError::Provider {
                provider: "storefront".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let orders: Vec<CustomerOrder> = response.json().await.map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse customer orders: {}", e))
        })?;
        debug!("Fetched {} orders for customer {}", orders.len(), customer_id);
        Ok(orders)
    }
}

#[async_trait(?Send)]
impl OrderBackend for HttpOrderBackend {
    #[instrument(skip_all, fields(reference = %payload.transaction.reference, items = payload.items.len()))]
    async fn create_order(
        &self,
        payload: &OrderSubmissionPayload,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<OrderReceipt> {
        let url = format!("{}{}", self.base_url, CHECKOUT_PATH);

        let mut request = self.client.post(&url).json(payload);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(CheckoutError::OrderSubmissionFailure {
                status: Some(status.as_u16()),
                message: backend_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }

        info!(status = status.as_u16(), "Order accepted by backend");
        Ok(OrderReceipt {
            status: status.as_u16(),
            body: serde_json::from_str(&body).ok(),
        })
    }
}

// =============================================================================
// Order history types
// =============================================================================

/// A customer order (the backend's `Pedido`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrder {
    pub id: i64,
    #[serde(rename = "estado", default)]
    pub status: String,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: String,
    #[serde(rename = "fechaEntrega", default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub items: Vec<CustomerOrderItem>,
}

/// One line of a customer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrderItem {
    #[serde(rename = "producto", default, skip_serializing_if = "Option::is_none")]
    pub product: Option<OrderedProduct>,
    #[serde(rename = "tallaId", default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    #[serde(rename = "cantidad", default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub id: ProductId,
    #[serde(rename = "nombre", default)]
    pub name: String,
}
