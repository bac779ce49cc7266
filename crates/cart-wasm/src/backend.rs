//! The storefront order endpoint over `fetch`.

use crate::storage::js_message;
use async_trait::async_trait;
use cart_core::{
    backend_message, CheckoutError, CheckoutResult, OrderBackend, OrderReceipt,
    OrderSubmissionPayload, CHECKOUT_PATH,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, Response};

/// Order API reached from the page
#[derive(Debug, Clone)]
pub struct FetchBackend {
    base_url: String,
}

impl FetchBackend {
    /// `base_url` is the storefront API origin; empty means same origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn order_url(&self) -> String {
        format!("{}{}", self.base_url, CHECKOUT_PATH)
    }
}

#[async_trait(?Send)]
impl OrderBackend for FetchBackend {
    async fn create_order(
        &self,
        payload: &OrderSubmissionPayload,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<OrderReceipt> {
        let body = serde_json::to_string(payload)?;

        let headers = Headers::new().map_err(network_error)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(network_error)?;
        if let Some(token) = bearer_token {
            headers
                .set("Authorization", &format!("Bearer {}", token))
                .map_err(network_error)?;
        }

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let window =
            web_sys::window().ok_or_else(|| CheckoutError::Network("no window".to_string()))?;
        let response = JsFuture::from(window.fetch_with_str_and_init(&self.order_url(), &init))
            .await
            .map_err(network_error)?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| CheckoutError::Network("fetch did not return a Response".to_string()))?;

        let text = JsFuture::from(response.text().map_err(network_error)?)
            .await
            .map_err(network_error)?
            .as_string()
            .unwrap_or_default();

        receipt_from(response.status(), &response.status_text(), &text)
    }
}

/// 2xx is an acknowledged order; anything else keeps the cart
fn receipt_from(status: u16, status_text: &str, body: &str) -> CheckoutResult<OrderReceipt> {
    if !(200..300).contains(&status) {
        let reason = if status_text.is_empty() { "error" } else { status_text };
        return Err(CheckoutError::OrderSubmissionFailure {
            status: Some(status),
            message: backend_message(body).unwrap_or_else(|| reason.to_string()),
        });
    }
    Ok(OrderReceipt {
        status,
        body: serde_json::from_str(body).ok(),
    })
}

fn network_error(err: JsValue) -> CheckoutError {
    CheckoutError::Network(js_message(&err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_url() {
        assert_eq!(
            FetchBackend::new("https://api.lucy.co/").order_url(),
            "https://api.lucy.co/api/facturas/checkout"
        );
        assert_eq!(FetchBackend::new("").order_url(), "/api/facturas/checkout");
    }

    #[test]
    fn test_receipt_from_status() {
        let receipt = receipt_from(201, "Created", r#"{"id": 42}"#).unwrap();
        assert_eq!(receipt.status, 201);
        assert_eq!(receipt.body.unwrap()["id"], 42);

        match receipt_from(500, "Internal Server Error", r#"{"error": "Stock insuficiente"}"#) {
            Err(CheckoutError::OrderSubmissionFailure { status, message }) => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "Stock insuficiente");
            }
            other => panic!("unexpected: {other:?}"),
        }

        match receipt_from(502, "Bad Gateway", "") {
            Err(CheckoutError::OrderSubmissionFailure { message, .. }) => {
                assert_eq!(message, "Bad Gateway")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
