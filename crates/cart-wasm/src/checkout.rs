//! Paying for the cart from JavaScript.
//!
//! ```javascript
//! const checkout = new WasmCheckout(publicKey, integritySecret, redirectUrl, apiBaseUrl);
//! try {
//!   const notice = await checkout.pay(cart);
//!   showToast(notice.message);
//! } catch (e) {
//!   showError(e.message);
//! }
//! ```
//!
//! `pay` signs the session, opens the widget and, for an approved payment,
//! posts the order. The cart is cleared only once the backend accepts it.

use crate::backend::FetchBackend;
use crate::cart::{to_js_value, WasmCart};
use crate::to_js_error;
use crate::widget::{BrowserWidget, JsDelay};
use cart_core::{
    stored_token, CartStore, CheckoutFlow, CheckoutNotice, CheckoutResult, Delay, KeyValueStore,
    OrderBackend, OrderSubmitter, PaymentWidget, PollConfig, VariantId, WidgetBridge,
    DEFAULT_VARIANT_ID,
};
use cart_wompi::WompiConfig;
use js_sys::Promise;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

type BrowserFlow = CheckoutFlow<BrowserWidget, JsDelay, FetchBackend>;

/// What `pay()` resolves with
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoticeResult<'a> {
    kind: &'static str,
    transaction_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'a serde_json::Value>,
    message: String,
}

impl<'a> From<&'a CheckoutNotice> for NoticeResult<'a> {
    fn from(notice: &'a CheckoutNotice) -> Self {
        let message = notice.message();
        match notice {
            CheckoutNotice::OrderPlaced {
                transaction_id,
                receipt,
            } => Self {
                kind: "orderPlaced",
                transaction_id,
                status: None,
                order: receipt.body.as_ref(),
                message,
            },
            CheckoutNotice::Declined { transaction_id } => Self {
                kind: "declined",
                transaction_id,
                status: None,
                order: None,
                message,
            },
            CheckoutNotice::StatusNotice {
                status,
                transaction_id,
            } => Self {
                kind: "status",
                transaction_id,
                status: Some(status),
                order: None,
                message,
            },
        }
    }
}

/// Signs sessions, drives the browser widget and places the order
#[wasm_bindgen]
pub struct WasmCheckout {
    config: WompiConfig,
    backend: FetchBackend,
    poll: PollConfig,
    default_variant: VariantId,
    flow: Rc<BrowserFlow>,
}

#[wasm_bindgen]
impl WasmCheckout {
    /// `api_base_url` is the storefront API origin; omitted means same origin
    #[wasm_bindgen(constructor)]
    pub fn new(
        public_key: String,
        integrity_secret: String,
        redirect_url: Option<String>,
        api_base_url: Option<String>,
    ) -> Result<WasmCheckout, JsValue> {
        let config = WompiConfig::new(public_key, integrity_secret);
        config.validate().map_err(to_js_error)?;
        let config = match redirect_url.filter(|u| !u.is_empty()) {
            Some(url) => config.with_redirect_url(url),
            None => config,
        };
        let backend = FetchBackend::new(api_base_url.unwrap_or_default());
        let poll = PollConfig::default();
        let flow = Rc::new(browser_flow(&config, &backend, poll, DEFAULT_VARIANT_ID));

        Ok(Self {
            config,
            backend,
            poll,
            default_variant: DEFAULT_VARIANT_ID,
            flow,
        })
    }

    /// Change the widget readiness poll (defaults to every 100 ms for 10 s)
    #[wasm_bindgen(js_name = setPoll)]
    pub fn set_poll(&mut self, interval_ms: u32, timeout_ms: u32) {
        self.poll = PollConfig::from_millis(u64::from(interval_ms), u64::from(timeout_ms));
        self.rebuild();
    }

    /// Size id sent for cart lines without one
    #[wasm_bindgen(js_name = setDefaultVariant)]
    pub fn set_default_variant(&mut self, variant_id: i32) {
        self.default_variant = VariantId::from(variant_id);
        self.rebuild();
    }

    /// Start loading the widget script ahead of checkout
    pub fn preload(&self) -> Result<(), JsValue> {
        crate::widget::ensure_widget_script().map_err(to_js_error)
    }

    /// Signed widget input for the cart's current total
    pub fn session(&self, cart: &WasmCart) -> Result<JsValue, JsValue> {
        let (_, request) = self.flow.prepare(&*cart.store()).map_err(to_js_error)?;
        to_js_value(&request)
    }

    /// Pay for the cart and place the order.
    ///
    /// Resolves with `{kind: "orderPlaced" | "declined" | "status", transactionId,
    /// status?, order?, message}`. Rejects when the total is not payable, the
    /// widget cannot be opened, or an approved payment could not be turned into
    /// an order (the cart is then kept). Without `bearer_token` the token saved
    /// in `localStorage` is used.
    pub fn pay(&self, cart: &WasmCart, bearer_token: Option<String>) -> Promise {
        let flow = Rc::clone(&self.flow);
        let cart = cart.shared();
        let bearer_token = bearer_token
            .filter(|t| !t.is_empty())
            .or_else(|| stored_token(cart.borrow().storage()));

        future_to_promise(async move {
            let notice = checkout_shared(&flow, &cart, bearer_token.as_deref())
                .await
                .map_err(to_js_error)?;
            to_js_value(&NoticeResult::from(&notice))
        })
    }
}

impl WasmCheckout {
    fn rebuild(&mut self) {
        self.flow = Rc::new(browser_flow(
            &self.config,
            &self.backend,
            self.poll,
            self.default_variant,
        ));
    }
}

fn browser_flow(
    config: &WompiConfig,
    backend: &FetchBackend,
    poll: PollConfig,
    default_variant: VariantId,
) -> BrowserFlow {
    let flow = CheckoutFlow::new(
        config.session_builder(),
        WidgetBridge::new(BrowserWidget, JsDelay, poll),
        OrderSubmitter::new(backend.clone()).with_default_variant(default_variant),
        config.public_key.clone(),
    );
    match config.redirect_url.clone() {
        Some(url) => flow.with_redirect_url(url),
        None => flow,
    }
}

/// Run a checkout against a cart that JavaScript may read meanwhile.
///
/// The attempt works on a copy so no borrow is held across the widget and the
/// order request. The copy replaces the shared cart only when the order was
/// placed.
async fn checkout_shared<W, D, B, S>(
    flow: &CheckoutFlow<W, D, B>,
    cart: &RefCell<CartStore<S>>,
    bearer_token: Option<&str>,
) -> CheckoutResult<CheckoutNotice>
where
    W: PaymentWidget,
    D: Delay,
    B: OrderBackend,
    S: KeyValueStore + Clone,
{
    let mut working = cart.borrow().clone();
    let notice = flow.checkout(&mut working, bearer_token).await?;
    if notice.is_order_placed() {
        *cart.borrow_mut() = working;
    }
    Ok(notice)
}
