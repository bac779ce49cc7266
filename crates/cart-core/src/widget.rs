//! # Payment Widget Bridge
//!
//! Port for the hosted payment widget and the bridge that drives it:
//!
//! ```text
//! ensure_loaded() ──► poll is_ready() ──► open(request) ──► PaymentOutcome
//!   (idempotent)      (bounded, see        (one result       Approved |
//!                      PollConfig)          per attempt)      Declined | Other
//! ```
//!
//! The widget's callback is modelled as the return value of `open`, so the
//! order flow receives an explicit outcome instead of registering a closure.

use crate::error::{CheckoutError, CheckoutResult};
use crate::poll::{poll_until, Delay, PollConfig};
use crate::product::Currency;
use crate::session::CheckoutSession;
use crate::transaction::{PaymentOutcome, Transaction};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Integrity block of the widget input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetSignature {
    pub integrity: String,
}

/// Input handed to the hosted widget constructor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRequest {
    pub currency: Currency,
    pub amount_in_cents: i64,
    pub reference: String,
    pub public_key: String,
    pub signature: WidgetSignature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl WidgetRequest {
    pub fn from_session(
        session: &CheckoutSession,
        public_key: impl Into<String>,
        redirect_url: Option<&str>,
    ) -> Self {
        Self {
            currency: session.currency,
            amount_in_cents: session.amount_minor_units,
            reference: session.reference.clone(),
            public_key: public_key.into(),
            signature: WidgetSignature {
                integrity: session.integrity_signature.clone(),
            },
            redirect_url: redirect_url.map(str::to_string),
        }
    }
}

/// A hosted payment UI.
///
/// Implementations live where the UI lives: the browser widget in
/// `cart-wasm`, the redirect-based Web Checkout in `cart-wompi`. Not `Send`,
/// since browser handles are bound to the UI thread.
#[async_trait(?Send)]
pub trait PaymentWidget {
    /// Make sure the widget code is (being) loaded. Must be idempotent.
    fn ensure_loaded(&self) -> CheckoutResult<()>;

    /// Whether the widget can be opened right now
    fn is_ready(&self) -> bool;

    /// Open the widget and resolve once the shopper completes or abandons payment.
    ///
    /// Failures while opening are reported as `WidgetOpenFailure`.
    async fn open(&self, request: &WidgetRequest) -> CheckoutResult<Transaction>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Drives a [`PaymentWidget`] through load, readiness and open
#[derive(Debug, Clone)]
pub struct WidgetBridge<W, D> {
    widget: W,
    delay: D,
    poll: PollConfig,
}

impl<W: PaymentWidget, D: Delay> WidgetBridge<W, D> {
    pub fn new(widget: W, delay: D, poll: PollConfig) -> Self {
        Self {
            widget,
            delay,
            poll,
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Open the widget for `request` and classify the resulting transaction.
    ///
    /// Never touches the cart. Errors:
    /// - `WidgetOpenFailure` when loading or opening fails
    /// - `WidgetUnavailable` when the widget is not ready within the poll bound
    /// - `Provider` when the transaction belongs to another reference
    pub async fn open(&self, request: &WidgetRequest) -> CheckoutResult<PaymentOutcome> {
        let provider = self.widget.provider_name();

        self.widget.ensure_loaded().map_err(as_open_failure)?;

        let widget = &self.widget;
        let ready = poll_until(&self.poll, &self.delay, || async move {
            Ok(widget.is_ready().then_some(()))
        })
        .await?;

        if ready.is_none() {
            let waited_ms = u64::try_from(self.poll.timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(provider, waited_ms, "Payment widget never became ready");
            return Err(CheckoutError::WidgetUnavailable { waited_ms });
        }

        debug!(provider, reference = %request.reference, "Opening payment widget");
        let transaction = self.widget.open(request).await.map_err(as_open_failure)?;

        if transaction.reference != request.reference {
            warn!(
                provider,
                expected = %request.reference,
                received = %transaction.reference,
                "Widget returned a transaction for another reference"
            );
            return Err(CheckoutError::Provider {
                provider: provider.to_string(),
                message: format!(
                    "transaction {} does not belong to reference {}",
                    transaction.id, request.reference
                ),
            });
        }

        let outcome = PaymentOutcome::from(transaction);
        info!(
            provider,
            transaction_id = %outcome.transaction().id,
            status = %outcome.transaction().status,
            "Payment widget closed"
        );
        Ok(outcome)
    }
}

#[cfg(feature = "tokio")]
impl<W: PaymentWidget> WidgetBridge<W, crate::poll::TokioDelay> {
    /// Bridge that sleeps on the Tokio timer
    pub fn with_tokio(widget: W, poll: PollConfig) -> Self {
        Self::new(widget, crate::poll::TokioDelay, poll)
    }
}

// Typed transport/provider errors pass through; anything else is an open failure.
fn as_open_failure(err: CheckoutError) -> CheckoutError {
    match err {
        CheckoutError::WidgetOpenFailure(_)
        | CheckoutError::Network(_)
        | CheckoutError::Provider { .. }
        | CheckoutError::Cancelled => err,
        other => CheckoutError::WidgetOpenFailure(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::{CheckoutSessionBuilder, FixedReference};
    use rust_decimal_macros::dec;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    /// Widget that becomes ready after a number of checks and returns a canned result
    pub(crate) struct ScriptedWidget {
        ready_after: u32,
        pub(crate) checks: Cell<u32>,
        pub(crate) loads: Cell<u32>,
        pub(crate) opened: Cell<u32>,
        result: RefCell<Option<CheckoutResult<Transaction>>>,
    }

    impl ScriptedWidget {
        pub(crate) fn new(ready_after: u32, result: CheckoutResult<Transaction>) -> Self {
            Self {
                ready_after,
                checks: Cell::new(0),
                loads: Cell::new(0),
                opened: Cell::new(0),
                result: RefCell::new(Some(result)),
            }
        }

        pub(crate) fn approving(reference: &str) -> Self {
            Self::new(0, Ok(transaction("tx-1", "APPROVED", reference)))
        }
    }

    #[async_trait(?Send)]
    impl PaymentWidget for ScriptedWidget {
        fn ensure_loaded(&self) -> CheckoutResult<()> {
            self.loads.set(self.loads.get() + 1);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.checks.get() > self.ready_after
        }

        async fn open(&self, _request: &WidgetRequest) -> CheckoutResult<Transaction> {
            self.opened.set(self.opened.get() + 1);
            self.result
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(CheckoutError::Internal("opened twice".into())))
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    pub(crate) fn transaction(id: &str, status: &str, reference: &str) -> Transaction {
        Transaction {
            id: id.into(),
            status: status.into(),
            amount_in_cents: 5_000_000,
            reference: reference.into(),
            currency: Some("COP".into()),
            payment_method_type: Some("CARD".into()),
            finalized_at: None,
        }
    }

    fn request() -> WidgetRequest {
        let session = CheckoutSessionBuilder::new(Currency::COP, "test_integrity_secret")
            .with_reference_generator(FixedReference("ref-123".into()))
            .build(dec!(50000))
            .unwrap();
        WidgetRequest::from_session(&session, "pub_test_abc", Some("https://lucy.co/cliente/pago"))
    }

    #[test]
    fn test_request_serializes_as_widget_input() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["currency"], "COP");
        assert_eq!(value["amountInCents"], 5_000_000);
        assert_eq!(value["reference"], "ref-123");
        assert_eq!(value["publicKey"], "pub_test_abc");
        assert_eq!(value["signature"]["integrity"].as_str().unwrap().len(), 64);
        assert_eq!(value["redirectUrl"], "https://lucy.co/cliente/pago");
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_script_then_opens() {
        let bridge = WidgetBridge::with_tokio(
            ScriptedWidget::new(3, Ok(transaction("tx-1", "APPROVED", "ref-123"))),
            PollConfig::from_millis(100, 10_000),
        );
        let started = tokio::time::Instant::now();

        let outcome = bridge.open(&request()).await.unwrap();

        assert_eq!(outcome.kind(), "approved");
        assert_eq!(bridge.widget().checks.get(), 4);
        assert_eq!(bridge.widget().loads.get(), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_widget_is_bounded() {
        let bridge = WidgetBridge::with_tokio(
            ScriptedWidget::new(u32::MAX, Ok(transaction("tx-1", "APPROVED", "ref-123"))),
            PollConfig::from_millis(100, 1_000),
        );

        let err = bridge.open(&request()).await.unwrap_err();

        assert!(matches!(err, CheckoutError::WidgetUnavailable { waited_ms: 1_000 }));
        assert_eq!(bridge.widget().checks.get(), 11);
        assert_eq!(bridge.widget().opened.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_errors_become_open_failure() {
        let bridge = WidgetBridge::with_tokio(
            ScriptedWidget::new(0, Err(CheckoutError::Internal("widget threw".into()))),
            PollConfig::default(),
        );

        let err = bridge.open(&request()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::WidgetOpenFailure(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_reference_is_rejected() {
        let bridge = WidgetBridge::with_tokio(
            ScriptedWidget::new(0, Ok(transaction("tx-9", "APPROVED", "someone-else"))),
            PollConfig::default(),
        );

        let err = bridge.open(&request()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Provider { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_is_an_outcome_not_an_error() {
        let bridge = WidgetBridge::with_tokio(
            ScriptedWidget::new(0, Ok(transaction("tx-2", "DECLINED", "ref-123"))),
            PollConfig::default(),
        );

        let outcome = bridge.open(&request()).await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Declined(_)));
    }
}
