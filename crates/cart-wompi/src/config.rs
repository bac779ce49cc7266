//! # Wompi Configuration
//!
//! Keys and endpoints for the Wompi integration.
//! Secrets are loaded from environment variables only.

use cart_core::{
    CheckoutError, CheckoutResult, CheckoutSession, CheckoutSessionBuilder, Currency,
    WidgetRequest,
};
use std::env;

/// Name used in logs and provider errors
pub const PROVIDER_NAME: &str = "wompi";

/// Hosted widget script
pub const WIDGET_SCRIPT_URL: &str = "https://checkout.wompi.co/widget.js";

/// `id` of the injected `<script>` tag, used to inject it only once
pub const WIDGET_SCRIPT_ID: &str = "wompi-widget-script";

/// Global constructor the widget script defines
pub const WIDGET_GLOBAL: &str = "WidgetCheckout";

const SANDBOX_API_URL: &str = "https://sandbox.wompi.co";
const PRODUCTION_API_URL: &str = "https://production.wompi.co";
const WEB_CHECKOUT_URL: &str = "https://checkout.wompi.co/p/";

/// Wompi configuration
#[derive(Clone)]
pub struct WompiConfig {
    /// Public key (pub_test_... or pub_prod_...)
    pub public_key: String,

    /// Integrity secret (test_integrity_... or prod_integrity_...)
    pub integrity_secret: String,

    /// Where Wompi sends the shopper after paying
    pub redirect_url: Option<String>,

    /// Transactions API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Web Checkout page
    pub checkout_url: String,
}

impl std::fmt::Debug for WompiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WompiConfig")
            .field("public_key", &self.public_key)
            .field("integrity_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl WompiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `WOMPI_PUBLIC_KEY`
    /// - `WOMPI_INTEGRITY_SECRET`
    ///
    /// Optional:
    /// - `WOMPI_REDIRECT_URL`
    /// - `WOMPI_API_BASE_URL`
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> CheckoutResult<Self> {
        let public_key = lookup("WOMPI_PUBLIC_KEY").ok_or_else(|| {
            CheckoutError::Configuration("WOMPI_PUBLIC_KEY not set".to_string())
        })?;

        let integrity_secret = lookup("WOMPI_INTEGRITY_SECRET").ok_or_else(|| {
            CheckoutError::Configuration("WOMPI_INTEGRITY_SECRET not set".to_string())
        })?;

        let mut config = Self::new(public_key, integrity_secret);
        config.validate()?;

        if let Some(url) = lookup("WOMPI_REDIRECT_URL").filter(|u| !u.is_empty()) {
            config = config.with_redirect_url(url);
        }
        if let Some(url) = lookup("WOMPI_API_BASE_URL").filter(|u| !u.is_empty()) {
            config = config.with_api_base_url(url);
        }

        tracing::debug!(
            test_mode = config.is_test_mode(),
            api = %config.api_base_url,
            "Loaded Wompi configuration"
        );
        Ok(config)
    }

    /// Create config with explicit values (for testing). Not validated.
    pub fn new(public_key: impl Into<String>, integrity_secret: impl Into<String>) -> Self {
        let public_key = public_key.into();
        let api_base_url = if public_key.starts_with("pub_prod_") {
            PRODUCTION_API_URL
        } else {
            SANDBOX_API_URL
        };

        Self {
            public_key,
            integrity_secret: integrity_secret.into(),
            redirect_url: None,
            api_base_url: api_base_url.to_string(),
            checkout_url: WEB_CHECKOUT_URL.to_string(),
        }
    }

    /// Check key formats and that both keys belong to the same environment
    pub fn validate(&self) -> CheckoutResult<()> {
        if !self.public_key.starts_with("pub_test_") && !self.public_key.starts_with("pub_prod_") {
            return Err(CheckoutError::Configuration(
                "WOMPI_PUBLIC_KEY must start with pub_test_ or pub_prod_".to_string(),
            ));
        }

        let secret_is_test = self.integrity_secret.starts_with("test_integrity_");
        if !secret_is_test && !self.integrity_secret.starts_with("prod_integrity_") {
            return Err(CheckoutError::Configuration(
                "WOMPI_INTEGRITY_SECRET must start with test_integrity_ or prod_integrity_"
                    .to_string(),
            ));
        }

        if secret_is_test != self.is_test_mode() {
            return Err(CheckoutError::Configuration(
                "WOMPI_PUBLIC_KEY and WOMPI_INTEGRITY_SECRET belong to different environments"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Check if using sandbox keys
    pub fn is_test_mode(&self) -> bool {
        self.public_key.starts_with("pub_test_")
    }

    /// Wompi only settles in Colombian pesos
    pub fn currency(&self) -> Currency {
        Currency::COP
    }

    /// Session builder signing with this integrity secret
    pub fn session_builder(&self) -> CheckoutSessionBuilder {
        CheckoutSessionBuilder::new(self.currency(), self.integrity_secret.clone())
    }

    /// Widget input for a signed session
    pub fn widget_request(&self, session: &CheckoutSession) -> WidgetRequest {
        WidgetRequest::from_session(session, &self.public_key, self.redirect_url.as_deref())
    }

    pub fn widget_script_url(&self) -> &'static str {
        WIDGET_SCRIPT_URL
    }

    /// Builder: set redirect URL
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::FixedReference;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_validation() {
        let config = WompiConfig::new("pub_test_abc123", "test_integrity_xyz");
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());
        assert_eq!(config.api_base_url, SANDBOX_API_URL);

        let config = WompiConfig::new("pub_prod_abc123", "prod_integrity_xyz");
        assert!(config.validate().is_ok());
        assert!(!config.is_test_mode());
        assert_eq!(config.api_base_url, PRODUCTION_API_URL);

        assert!(WompiConfig::new("pk_test_abc", "test_integrity_xyz").validate().is_err());
        assert!(WompiConfig::new("pub_test_abc", "whsec_xyz").validate().is_err());
    }

    #[test]
    fn test_mixed_environments_rejected() {
        let err = WompiConfig::new("pub_prod_abc", "test_integrity_xyz")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("different environments"));
    }

    #[test]
    fn test_from_vars() {
        let config = WompiConfig::from_vars(vars(&[
            ("WOMPI_PUBLIC_KEY", "pub_test_abc"),
            ("WOMPI_INTEGRITY_SECRET", "test_integrity_xyz"),
            ("WOMPI_REDIRECT_URL", "https://lucy.co/cliente/pago"),
            ("WOMPI_API_BASE_URL", "http://127.0.0.1:9999/"),
        ]))
        .unwrap();

        assert_eq!(config.redirect_url.as_deref(), Some("https://lucy.co/cliente/pago"));
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_from_vars_missing_key() {
        let result = WompiConfig::from_vars(vars(&[("WOMPI_PUBLIC_KEY", "pub_test_abc")]));
        assert!(matches!(result, Err(CheckoutError::Configuration(_))));
    }

    #[test]
    fn test_widget_request_from_session() {
        let config = WompiConfig::new("pub_test_abc", "test_integrity_xyz")
            .with_redirect_url("https://lucy.co/cliente/pago");
        let session = config
            .session_builder()
            .with_reference_generator(FixedReference("ref-1".into()))
            .build(Currency::COP.from_minor_units(2_490_000))
            .unwrap();

        let request = config.widget_request(&session);
        assert_eq!(request.public_key, "pub_test_abc");
        assert_eq!(request.amount_in_cents, 2_490_000);
        assert_eq!(
            request.signature.integrity,
            cart_core::integrity_signature("ref-1", 2_490_000, Currency::COP, "test_integrity_xyz")
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = WompiConfig::new("pub_test_abc", "test_integrity_xyz");
        assert!(!format!("{:?}", config).contains("test_integrity_xyz"));
    }
}
