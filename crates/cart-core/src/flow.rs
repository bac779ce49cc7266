//! # Checkout Flow
//!
//! One checkout attempt end to end: sign a session for the cart total, open
//! the widget, then hand the outcome to the order submitter.

use crate::cart::CartStore;
use crate::error::CheckoutResult;
use crate::order::{CheckoutNotice, OrderBackend, OrderSubmitter};
use crate::poll::Delay;
use crate::session::{CheckoutSession, CheckoutSessionBuilder};
use crate::storage::KeyValueStore;
use crate::widget::{PaymentWidget, WidgetBridge, WidgetRequest};
use tracing::{info, warn};

/// Composes session builder, widget bridge and order submitter
pub struct CheckoutFlow<W, D, B> {
    sessions: CheckoutSessionBuilder,
    bridge: WidgetBridge<W, D>,
    submitter: OrderSubmitter<B>,
    public_key: String,
    redirect_url: Option<String>,
}

impl<W, D, B> CheckoutFlow<W, D, B>
where
    W: PaymentWidget,
    D: Delay,
    B: OrderBackend,
{
    pub fn new(
        sessions: CheckoutSessionBuilder,
        bridge: WidgetBridge<W, D>,
        submitter: OrderSubmitter<B>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            bridge,
            submitter,
            public_key: public_key.into(),
            redirect_url: None,
        }
    }

    /// Builder: where the hosted checkout sends the shopper afterwards
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn bridge(&self) -> &WidgetBridge<W, D> {
        &self.bridge
    }

    pub fn submitter(&self) -> &OrderSubmitter<B> {
        &self.submitter
    }

    /// Signed widget input for the cart's current total, without opening anything
    pub fn prepare<S: KeyValueStore>(
        &self,
        cart: &CartStore<S>,
    ) -> CheckoutResult<(CheckoutSession, WidgetRequest)> {
        let session = self.sessions.build_for_cart(cart)?;
        let request =
            WidgetRequest::from_session(&session, &self.public_key, self.redirect_url.as_deref());
        Ok((session, request))
    }

    /// Run one checkout attempt against `cart`.
    ///
    /// Invalid amounts fail before the widget is touched; widget failures
    /// leave the cart as it was.
    pub async fn checkout<S: KeyValueStore>(
        &self,
        cart: &mut CartStore<S>,
        bearer_token: Option<&str>,
    ) -> CheckoutResult<CheckoutNotice> {
        let (session, request) = self.prepare(cart)?;
        info!(
            reference = %session.reference,
            amount = session.amount_minor_units,
            currency = %session.currency,
            "Starting checkout"
        );

        let outcome = self.bridge.open(&request).await?;

        let paid = outcome.transaction().amount_in_cents;
        if paid != session.amount_minor_units {
            warn!(
                reference = %session.reference,
                expected = session.amount_minor_units,
                paid,
                "Transaction amount differs from the session amount"
            );
        }

        self.submitter.handle(cart, outcome, bearer_token).await
    }
}
