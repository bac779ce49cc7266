//! # Wompi Web Checkout
//!
//! A [`PaymentWidget`] for clients that cannot host the JavaScript widget.
//! The shopper pays on Wompi's hosted Web Checkout page; afterwards the
//! transaction is looked up through the public transactions API until it
//! leaves `PENDING`.

use crate::config::{WompiConfig, PROVIDER_NAME};
use async_trait::async_trait;
use cart_core::{
    poll_until, CheckoutError, CheckoutResult, PaymentWidget, PollConfig, TokioDelay,
    Transaction, WidgetRequest,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Shows the Web Checkout URL to the shopper.
///
/// Resolves with the Wompi transaction id once the shopper is back, or an
/// empty string if they gave up.
#[async_trait]
pub trait CheckoutPresenter: Send + Sync {
    async fn present(&self, checkout_url: &str, reference: &str) -> CheckoutResult<String>;
}

/// Redirect-based Wompi checkout
pub struct WompiWebCheckout<P> {
    config: WompiConfig,
    client: Client,
    presenter: P,
    lookup_poll: PollConfig,
}

impl<P: CheckoutPresenter> WompiWebCheckout<P> {
    /// Create a web checkout with a 30 s HTTP timeout
    pub fn new(config: WompiConfig, presenter: P) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(config, presenter, client))
    }

    /// Create with a preconfigured HTTP client
    pub fn with_client(config: WompiConfig, presenter: P, client: Client) -> Self {
        Self {
            config,
            client,
            presenter,
            lookup_poll: PollConfig::from_millis(2_000, 120_000),
        }
    }

    /// Builder: how long to wait for a pending transaction to settle
    pub fn with_lookup_poll(mut self, poll: PollConfig) -> Self {
        self.lookup_poll = poll;
        self
    }

    pub fn config(&self) -> &WompiConfig {
        &self.config
    }

    /// Web Checkout URL carrying the signed widget input
    pub fn checkout_url(&self, request: &WidgetRequest) -> CheckoutResult<String> {
        let mut params = vec![
            ("public-key", request.public_key.clone()),
            ("currency", request.currency.as_str().to_string()),
            ("amount-in-cents", request.amount_in_cents.to_string()),
            ("reference", request.reference.clone()),
            ("signature:integrity", request.signature.integrity.clone()),
        ];
        if let Some(ref redirect) = request.redirect_url {
            params.push(("redirect-url", redirect.clone()));
        }

        Url::parse_with_params(&self.config.checkout_url, &params)
            .map(String::from)
            .map_err(|e| CheckoutError::Configuration(format!("invalid checkout URL: {}", e)))
    }

    /// Fetch a transaction by id
    #[instrument(skip(self))]
    pub async fn fetch_transaction(&self, transaction_id: &str) -> CheckoutResult<Transaction> {
        let url = format!(
            "{}/v1/transactions/{}",
            self.config.api_base_url, transaction_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.public_key)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Wompi API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<WompiErrorResponse>(&body) {
                return Err(CheckoutError::Provider {
                    provider: PROVIDER_NAME.to_string(),
                    message: error_response.error.describe(),
                });
            }

            return Err(CheckoutError::Provider {
                provider: PROVIDER_NAME.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let envelope: WompiEnvelope = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Wompi transaction: {}", e))
        })?;

        debug!(
            "Fetched Wompi transaction: id={}, status={}",
            envelope.data.id, envelope.data.status
        );
        Ok(envelope.data.into())
    }

    /// Poll until the transaction is no longer pending.
    ///
    /// When the bound runs out the last (pending) state is returned.
    async fn await_settled(&self, transaction_id: &str) -> CheckoutResult<Transaction> {
        let this = self;
        let settled = poll_until(&self.lookup_poll, &TokioDelay, move || async move {
            match this.fetch_transaction(transaction_id).await {
                Ok(tx) => Ok(tx.status().is_final().then_some(tx)),
                Err(CheckoutError::Network(e)) => {
                    warn!("Transaction lookup failed, retrying: {}", e);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await?;

        match settled {
            Some(tx) => Ok(tx),
            None => {
                warn!(transaction_id, "Transaction still pending after the lookup bound");
                self.fetch_transaction(transaction_id).await
            }
        }
    }
}

#[async_trait(?Send)]
impl<P: CheckoutPresenter> PaymentWidget for WompiWebCheckout<P> {
    // Hosted page; nothing to load locally
    fn ensure_loaded(&self) -> CheckoutResult<()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn open(&self, request: &WidgetRequest) -> CheckoutResult<Transaction> {
        let url = self.checkout_url(request)?;
        info!(reference = %request.reference, "Presenting Wompi Web Checkout");

        let transaction_id = self.presenter.present(&url, &request.reference).await?;
        let transaction_id = transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(CheckoutError::Cancelled);
        }

        self.await_settled(transaction_id).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

// =============================================================================
// Wompi API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WompiEnvelope {
    data: WompiTransaction,
}

#[derive(Debug, Deserialize)]
struct WompiTransaction {
    id: String,
    status: String,
    amount_in_cents: i64,
    reference: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payment_method_type: Option<String>,
    #[serde(default)]
    finalized_at: Option<DateTime<Utc>>,
}

impl From<WompiTransaction> for Transaction {
    fn from(tx: WompiTransaction) -> Self {
        Transaction {
            id: tx.id,
            status: tx.status,
            amount_in_cents: tx.amount_in_cents,
            reference: tx.reference,
            currency: tx.currency,
            payment_method_type: tx.payment_method_type,
            finalized_at: tx.finalized_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WompiErrorResponse {
    error: WompiError,
}

#[derive(Debug, Deserialize)]
struct WompiError {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    reason: Option<serde_json::Value>,
}

impl WompiError {
    fn describe(&self) -> String {
        match &self.reason {
            Some(serde_json::Value::String(reason)) => format!("{}: {}", self.kind, reason),
            Some(other) => format!("{}: {}", self.kind, other),
            None => self.kind.clone(),
        }
    }
}
