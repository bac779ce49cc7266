//! # Application State
//!
//! Everything a command needs: configuration, the storefront clients and
//! the persisted cart.

use crate::backend::HttpOrderBackend;
use crate::catalog::CatalogClient;
use crate::config::AppConfig;
use cart_core::{
    stored_token, CartStore, CheckoutFlow, FileStorage, KeyValueStore, OrderSubmitter,
    TokioDelay, WidgetBridge,
};
use cart_wompi::{CheckoutPresenter, WompiConfig, WompiWebCheckout};
use std::sync::Arc;

/// Checkout flow as wired by the command-line client
pub type WebCheckoutFlow<P> =
    CheckoutFlow<WompiWebCheckout<P>, TokioDelay, Arc<HttpOrderBackend>>;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Order API client
    pub backend: Arc<HttpOrderBackend>,
    /// Catalog client
    pub catalog: CatalogClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let backend = HttpOrderBackend::new(&config.backend_url, config.http_timeout())
            .map_err(|e| anyhow::anyhow!("Failed to initialize order client: {}", e))?;
        let catalog = CatalogClient::new(&config.backend_url, config.http_timeout())
            .map_err(|e| anyhow::anyhow!("Failed to initialize catalog client: {}", e))?;

        Ok(Self {
            config,
            backend: Arc::new(backend),
            catalog,
        })
    }

    /// The cart persisted under the configured storage directory
    pub fn open_cart(&self) -> anyhow::Result<CartStore<FileStorage>> {
        let storage = FileStorage::open(&self.config.storage_dir).map_err(|e| {
            anyhow::anyhow!("Cannot open cart storage: {}", e)
        })?;
        Ok(CartStore::open(storage))
    }

    /// Configured token, else the one saved next to the cart
    pub fn bearer_token(&self, storage: &impl KeyValueStore) -> Option<String> {
        if let Some(ref token) = self.config.token {
            return Some(token.clone());
        }
        stored_token(storage)
    }

    /// Checkout flow paying through Wompi Web Checkout
    pub fn checkout_flow<P: CheckoutPresenter>(
        &self,
        wompi: WompiConfig,
        presenter: P,
    ) -> anyhow::Result<WebCheckoutFlow<P>> {
        let sessions = wompi.session_builder();
        let public_key = wompi.public_key.clone();
        let redirect_url = wompi.redirect_url.clone();

        let widget = WompiWebCheckout::new(wompi, presenter)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Wompi: {}", e))?;
        let bridge = WidgetBridge::with_tokio(widget, self.config.widget_poll());
        let submitter = OrderSubmitter::new(Arc::clone(&self.backend))
            .with_default_variant(self.config.default_variant_id);

        let flow = CheckoutFlow::new(sessions, bridge, submitter, public_key);
        Ok(match redirect_url {
            Some(url) => flow.with_redirect_url(url),
            None => flow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{MemoryStorage, TOKEN_KEY};

    fn state(token: Option<&str>) -> AppState {
        let config = AppConfig {
            token: token.map(str::to_string),
            ..AppConfig::default()
        };
        AppState::new(config).unwrap()
    }

    #[test]
    fn test_configured_token_wins() {
        let storage = MemoryStorage::new().with_entry(TOKEN_KEY, "stored");
        assert_eq!(state(Some("configured")).bearer_token(&storage).as_deref(), Some("configured"));
    }

    #[test]
    fn test_stored_token_is_unquoted() {
        let storage = MemoryStorage::new().with_entry(TOKEN_KEY, "\"jwt-abc\"\n");
        assert_eq!(state(None).bearer_token(&storage).as_deref(), Some("jwt-abc"));
        assert_eq!(state(None).bearer_token(&MemoryStorage::new()), None);
    }

    #[test]
    fn test_cart_lives_in_storage_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage_dir: dir.path().join("cart"),
            ..AppConfig::default()
        };
        let cart = AppState::new(config).unwrap().open_cart().unwrap();
        assert!(cart.is_empty());
        assert!(dir.path().join("cart").is_dir());
    }
}
