//! # Browser Widget
//!
//! The Wompi JavaScript widget behind the [`PaymentWidget`] port. The widget
//! script is injected once per page; `WidgetCheckout` appears on `window`
//! when it has finished loading.

use crate::storage::js_message;
use async_trait::async_trait;
use cart_core::{CheckoutError, CheckoutResult, Delay, PaymentWidget, Transaction, WidgetRequest};
use cart_wompi::{parse_widget_result, PROVIDER_NAME, WIDGET_GLOBAL, WIDGET_SCRIPT_ID, WIDGET_SCRIPT_URL};
use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// `setTimeout` as a [`Delay`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsDelay;

#[async_trait(?Send)]
impl Delay for JsDelay {
    async fn delay(&self, duration: Duration) {
        let millis = timeout_millis(duration);
        let mut executor = move |resolve: Function, _reject: Function| {
            let Some(window) = web_sys::window() else {
                let _ = resolve.call0(&JsValue::NULL);
                return;
            };
            let on_timeout = resolve.clone();
            let callback = Closure::once_into_js(move || {
                let _ = on_timeout.call0(&JsValue::NULL);
            });
            let scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                millis,
            );
            settle_unscheduled(scheduled, &resolve);
        };
        let _ = JsFuture::from(Promise::new(&mut executor)).await;
    }
}

/// An unscheduled timer would never settle the promise, so resolve now
fn settle_unscheduled(scheduled: Result<i32, JsValue>, resolve: &Function) {
    if scheduled.is_err() {
        let _ = resolve.call0(&JsValue::NULL);
    }
}

fn timeout_millis(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

/// The hosted Wompi widget on the current page
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserWidget;

#[async_trait(?Send)]
impl PaymentWidget for BrowserWidget {
    fn ensure_loaded(&self) -> CheckoutResult<()> {
        ensure_widget_script()
    }

    fn is_ready(&self) -> bool {
        widget_constructor().is_some()
    }

    async fn open(&self, request: &WidgetRequest) -> CheckoutResult<Transaction> {
        let constructor = widget_constructor().ok_or_else(|| {
            CheckoutError::WidgetOpenFailure(format!("{} is not defined", WIDGET_GLOBAL))
        })?;

        let config = request
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| CheckoutError::Serialization(e.to_string()))?;

        let checkout = Reflect::construct(&constructor, &Array::of1(&config))
            .map_err(|e| CheckoutError::WidgetOpenFailure(js_message(&e)))?;
        let open: Function = Reflect::get(&checkout, &JsValue::from_str("open"))
            .ok()
            .and_then(|f| f.dyn_into().ok())
            .ok_or_else(|| CheckoutError::WidgetOpenFailure("widget has no open()".to_string()))?;

        // open(callback) reports the result once, when the shopper closes the widget
        let mut executor = move |resolve: Function, reject: Function| {
            let callback = Closure::once_into_js(move |result: JsValue| {
                let _ = resolve.call1(&JsValue::NULL, &result);
            });
            if let Err(e) = open.call1(&checkout, &callback) {
                let _ = reject.call1(&JsValue::NULL, &e);
            }
        };
        let result = JsFuture::from(Promise::new(&mut executor))
            .await
            .map_err(|e| CheckoutError::WidgetOpenFailure(js_message(&e)))?;

        let value: serde_json::Value = serde_wasm_bindgen::from_value(result)
            .map_err(|e| CheckoutError::Serialization(e.to_string()))?;
        parse_widget_result(value)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn widget_constructor() -> Option<Function> {
    let window = web_sys::window()?;
    Reflect::get(&window, &JsValue::from_str(WIDGET_GLOBAL))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// Inject the widget `<script>` unless a previous call already did
pub fn ensure_widget_script() -> CheckoutResult<()> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| CheckoutError::WidgetOpenFailure("no document".to_string()))?;

    if document.get_element_by_id(WIDGET_SCRIPT_ID).is_some() {
        return Ok(());
    }

    let script: web_sys::HtmlScriptElement = document
        .create_element("script")
        .map_err(|e| CheckoutError::WidgetOpenFailure(js_message(&e)))?
        .dyn_into()
        .map_err(|_| CheckoutError::WidgetOpenFailure("script element expected".to_string()))?;
    script.set_id(WIDGET_SCRIPT_ID);
    script.set_src(WIDGET_SCRIPT_URL);
    script.set_async(true);

    let parent = document
        .head()
        .ok_or_else(|| CheckoutError::WidgetOpenFailure("document has no <head>".to_string()))?;
    parent
        .append_child(&script)
        .map_err(|e| CheckoutError::WidgetOpenFailure(js_message(&e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_millis_saturates() {
        assert_eq!(timeout_millis(Duration::from_millis(100)), 100);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX / 2)), i32::MAX);
    }
}
