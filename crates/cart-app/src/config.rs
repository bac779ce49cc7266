//! # Application Configuration
//!
//! Settings for the command-line client. Values come from an optional TOML
//! file, then environment variables (after loading `.env`), then defaults.

use cart_core::{CheckoutError, CheckoutResult, PollConfig, VariantId, DEFAULT_VARIANT_ID};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "lucy-cart.toml";

/// Application configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Storefront backend base URL, without trailing slash
    pub backend_url: String,

    /// Bearer token for order creation (overrides the stored one)
    pub token: Option<String>,

    /// Directory holding the persisted cart
    pub storage_dir: PathBuf,

    /// Widget readiness poll interval
    pub widget_poll_interval_ms: u64,

    /// Widget readiness poll bound
    pub widget_poll_timeout_ms: u64,

    /// `tallaId` sent for cart lines without a variant
    pub default_variant_id: VariantId,

    /// Per-request HTTP timeout
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend_url", &self.backend_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("storage_dir", &self.storage_dir)
            .field("widget_poll_interval_ms", &self.widget_poll_interval_ms)
            .field("widget_poll_timeout_ms", &self.widget_poll_timeout_ms)
            .field("default_variant_id", &self.default_variant_id)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            backend_url: "http://localhost:8080".to_string(),
            token: None,
            storage_dir: PathBuf::from(".lucy-cart"),
            widget_poll_interval_ms: duration_ms(poll.interval),
            widget_poll_timeout_ms: duration_ms(poll.timeout),
            default_variant_id: DEFAULT_VARIANT_ID,
            http_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load from `path` (or `lucy-cart.toml` if present), then the environment.
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> CheckoutResult<Self> {
        dotenvy::dotenv().ok();

        let base = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        base.with_env(|key| env::var(key).ok())
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> CheckoutResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckoutError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            CheckoutError::Configuration(msg) => {
                CheckoutError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> CheckoutResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CheckoutError::Configuration(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Apply environment overrides.
    ///
    /// Recognised variables: `STOREFRONT_BACKEND_URL`, `STOREFRONT_TOKEN`,
    /// `CART_STORAGE_DIR`, `WIDGET_POLL_INTERVAL_MS`, `WIDGET_POLL_TIMEOUT_MS`,
    /// `CHECKOUT_DEFAULT_VARIANT_ID`, `HTTP_TIMEOUT_SECS`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> CheckoutResult<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("STOREFRONT_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(token) = lookup("STOREFRONT_TOKEN") {
            self.token = Some(token);
        }
        if let Some(dir) = lookup("CART_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup("WIDGET_POLL_INTERVAL_MS") {
            self.widget_poll_interval_ms = parse_var("WIDGET_POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(ms) = lookup("WIDGET_POLL_TIMEOUT_MS") {
            self.widget_poll_timeout_ms = parse_var("WIDGET_POLL_TIMEOUT_MS", &ms)?;
        }
        if let Some(id) = lookup("CHECKOUT_DEFAULT_VARIANT_ID") {
            self.default_variant_id = parse_var("CHECKOUT_DEFAULT_VARIANT_ID", &id)?;
        }
        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_var("HTTP_TIMEOUT_SECS", &secs)?;
        }

        Ok(self.normalized())
    }

    /// Widget readiness poll
    pub fn widget_poll(&self) -> PollConfig {
        PollConfig::from_millis(self.widget_poll_interval_ms, self.widget_poll_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    fn normalized(mut self) -> Self {
        self.backend_url = self.backend_url.trim().trim_end_matches('/').to_string();
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> CheckoutResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CheckoutError::Configuration(format!("{} is invalid ({}): {}", name, value, e)))
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.widget_poll(), PollConfig::from_millis(100, 10_000));
        assert_eq!(config.default_variant_id, 1);
    }

    #[test]
    fn test_toml_then_env() {
        let config = AppConfig::from_toml(
            r#"
            backend_url = "https://api.lucy.co/"
            storage_dir = "/var/lib/lucy-cart"
            widget_poll_timeout_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "https://api.lucy.co");
        assert_eq!(config.widget_poll_timeout_ms, 5000);
        assert_eq!(config.widget_poll_interval_ms, 100);

        let config = config
            .with_env(vars(&[
                ("STOREFRONT_BACKEND_URL", "http://127.0.0.1:8080///"),
                ("STOREFRONT_TOKEN", "jwt-token"),
                ("CHECKOUT_DEFAULT_VARIANT_ID", "11"),
                ("HTTP_TIMEOUT_SECS", ""),
            ]))
            .unwrap();
        assert_eq!(config.backend_url, "http://127.0.0.1:8080");
        assert_eq!(config.token.as_deref(), Some("jwt-token"));
        assert_eq!(config.default_variant_id, 11);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/lucy-cart"));
    }

    #[test]
    fn test_invalid_numbers_are_configuration_errors() {
        let result = AppConfig::default().with_env(vars(&[("WIDGET_POLL_INTERVAL_MS", "fast")]));
        assert!(matches!(result, Err(CheckoutError::Configuration(_))));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::from_file(&dir.path().join("missing.toml")).is_err());

        let path = dir.path().join("lucy-cart.toml");
        std::fs::write(&path, "backend_url = \"http://shop.test\"\n").unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap().backend_url, "http://shop.test");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = AppConfig {
            token: Some("jwt-secret".into()),
            ..AppConfig::default()
        };
        assert!(!format!("{:?}", config).contains("jwt-secret"));
    }
}
