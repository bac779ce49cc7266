//! # Order Submission
//!
//! Turns a payment outcome into a durable order. This is the only place the
//! cart is cleared after a paid transaction, and only once the backend has
//! acknowledged the order.
//!
//! ```text
//! Approved ──► POST order ──┬── 2xx ──► clear cart ──► OrderPlaced
//!                           └── fail ─► keep cart ──► OrderSubmissionFailure
//! Declined ──────────────────────────► keep cart ──► Declined
//! other ─────────────────────────────► keep cart ──► StatusNotice
//! ```

use crate::cart::{CartLine, CartStore};
use crate::error::{CheckoutError, CheckoutResult};
use crate::product::{ProductId, VariantId};
use crate::storage::KeyValueStore;
use crate::transaction::{PaymentOutcome, Transaction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Variant id sent for lines without one
pub const DEFAULT_VARIANT_ID: VariantId = 1;

/// Order-creation path, relative to the backend base URL
pub const CHECKOUT_PATH: &str = "/api/facturas/checkout";

/// One order item, in the backend's field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "productoId")]
    pub product_id: ProductId,
    #[serde(rename = "tallaId")]
    pub variant_id: VariantId,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

impl OrderItem {
    fn from_line(line: &CartLine, default_variant: VariantId) -> Self {
        Self {
            product_id: line.product_id,
            variant_id: line.variant_id.unwrap_or(default_variant),
            quantity: line.quantity,
        }
    }
}

/// Body of the order-creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmissionPayload {
    pub transaction: Transaction,
    pub items: Vec<OrderItem>,
}

impl OrderSubmissionPayload {
    /// One item per cart line at the time of submission
    pub fn from_cart<S: KeyValueStore>(
        cart: &CartStore<S>,
        transaction: &Transaction,
        default_variant: VariantId,
    ) -> Self {
        Self {
            transaction: transaction.clone(),
            items: cart
                .lines()
                .iter()
                .map(|line| OrderItem::from_line(line, default_variant))
                .collect(),
        }
    }
}

/// Backend acknowledgement of a created order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

/// Order-creation endpoint.
///
/// `reqwest` in `cart-app`, `fetch` in `cart-wasm`. Not `Send`, like
/// [`crate::PaymentWidget`].
#[async_trait(?Send)]
pub trait OrderBackend {
    /// Create the order. `Ok` only for an acknowledged (2xx) creation.
    async fn create_order(
        &self,
        payload: &OrderSubmissionPayload,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<OrderReceipt>;
}

#[async_trait(?Send)]
impl<B: OrderBackend + ?Sized> OrderBackend for std::sync::Arc<B> {
    async fn create_order(
        &self,
        payload: &OrderSubmissionPayload,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<OrderReceipt> {
        (**self).create_order(payload, bearer_token).await
    }
}

/// What the shopper is told after the widget closes
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutNotice {
    /// Order created and cart cleared
    OrderPlaced {
        transaction_id: String,
        receipt: OrderReceipt,
    },
    /// Payment declined; cart kept
    Declined { transaction_id: String },
    /// Any other status; cart kept
    StatusNotice {
        status: String,
        transaction_id: String,
    },
}

impl CheckoutNotice {
    pub fn message(&self) -> String {
        match self {
            CheckoutNotice::OrderPlaced { transaction_id, .. } => {
                format!("Payment approved. Your order was created (transaction {transaction_id}).")
            }
            CheckoutNotice::Declined { transaction_id } => {
                format!("Payment declined (transaction {transaction_id}). Your cart was kept.")
            }
            CheckoutNotice::StatusNotice {
                status,
                transaction_id,
            } => format!("Payment status {status} (transaction {transaction_id})."),
        }
    }

    pub fn is_order_placed(&self) -> bool {
        matches!(self, CheckoutNotice::OrderPlaced { .. })
    }
}

/// Runs the order state machine against an [`OrderBackend`]
#[derive(Debug, Clone)]
pub struct OrderSubmitter<B> {
    backend: B,
    default_variant: VariantId,
}

impl<B: OrderBackend> OrderSubmitter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            default_variant: DEFAULT_VARIANT_ID,
        }
    }

    /// Builder: variant id for lines without one
    pub fn with_default_variant(mut self, variant_id: VariantId) -> Self {
        self.default_variant = variant_id;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Act on a payment outcome.
    ///
    /// The cart is cleared only when the backend acknowledges the order.
    #[instrument(skip_all, fields(outcome = outcome.kind(), transaction_id = %outcome.transaction().id))]
    pub async fn handle<S: KeyValueStore>(
        &self,
        cart: &mut CartStore<S>,
        outcome: PaymentOutcome,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<CheckoutNotice> {
        let transaction = match outcome {
            PaymentOutcome::Approved(tx) => tx,
            PaymentOutcome::Declined(tx) => {
                info!("Payment declined, cart kept");
                return Ok(CheckoutNotice::Declined {
                    transaction_id: tx.id,
                });
            }
            PaymentOutcome::Other(tx) => {
                info!(status = %tx.status, "Payment ended without approval, cart kept");
                return Ok(CheckoutNotice::StatusNotice {
                    status: tx.status,
                    transaction_id: tx.id,
                });
            }
        };

        if cart.is_empty() {
            error!(
                reference = %transaction.reference,
                amount_in_cents = transaction.amount_in_cents,
                "Approved payment but the cart is empty; needs manual reconciliation"
            );
            return Err(CheckoutError::OrderSubmissionFailure {
                status: None,
                message: format!("no items to submit for transaction {}", transaction.id),
            });
        }

        let payload = OrderSubmissionPayload::from_cart(cart, &transaction, self.default_variant);

        match self.backend.create_order(&payload, bearer_token).await {
            Ok(receipt) => {
                cart.clear();
                info!(status = receipt.status, items = payload.items.len(), "Order created, cart cleared");
                Ok(CheckoutNotice::OrderPlaced {
                    transaction_id: transaction.id,
                    receipt,
                })
            }
            Err(e) => {
                error!(
                    reference = %transaction.reference,
                    amount_in_cents = transaction.amount_in_cents,
                    error = %e,
                    "Paid order was not created; cart kept for manual reconciliation"
                );
                Err(into_submission_failure(e))
            }
        }
    }
}

/// `{"error": ".."}`, `{"message": ".."}` or `{"mensaje": ".."}`, else the raw body
pub fn backend_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message", "mensaje"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
        });
    Some(message.unwrap_or_else(|| body.to_string()))
}

fn into_submission_failure(err: CheckoutError) -> CheckoutError {
    match err {
        CheckoutError::OrderSubmissionFailure { .. } => err,
        other => CheckoutError::OrderSubmissionFailure {
            status: None,
            message: other.to_string(),
        },
    }
}
