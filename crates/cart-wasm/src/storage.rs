//! `window.localStorage` as a [`KeyValueStore`].

use cart_core::{CheckoutError, CheckoutResult, KeyValueStore};
use wasm_bindgen::JsValue;

/// Browser `localStorage`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// The current window's `localStorage`.
    ///
    /// Fails when there is no window or storage is disabled (private mode, sandboxed frames).
    pub fn open() -> CheckoutResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| CheckoutError::Storage("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(storage_error)?
            .ok_or_else(|| CheckoutError::Storage("localStorage is unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> CheckoutResult<Option<String>> {
        self.storage.get_item(key).map_err(storage_error)
    }

    fn set(&mut self, key: &str, value: &str) -> CheckoutResult<()> {
        // Throws QuotaExceededError when full
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> CheckoutResult<()> {
        self.storage.remove_item(key).map_err(storage_error)
    }
}

pub(crate) fn storage_error(err: JsValue) -> CheckoutError {
    CheckoutError::Storage(js_message(&err))
}

/// Best-effort text of a thrown JS value
pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}
