//! # cart-wompi
//!
//! Wompi (Colombia, COP) as the hosted payment provider for lucy-cart.
//!
//! This crate provides:
//!
//! 1. **WompiConfig** - keys loaded from the environment
//!    - Public key and integrity secret, validated by prefix
//!    - Session builder and widget input for a checkout session
//!
//! 2. **parse_widget_result** - the widget callback object as a `Transaction`
//!
//! 3. **WompiWebCheckout** - a `PaymentWidget` for clients without a browser
//!    (`web-checkout` feature, on by default)
//!    - Builds the Web Checkout redirect URL
//!    - Polls the transactions API until the payment settles
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_wompi::{WompiConfig, WompiWebCheckout};
//!
//! let config = WompiConfig::from_env()?;
//! let sessions = config.session_builder();
//! let widget = WompiWebCheckout::new(config, presenter)?;
//! ```

#[cfg(feature = "web-checkout")]
pub mod checkout;
pub mod config;
pub mod result;

// Re-exports
#[cfg(feature = "web-checkout")]
pub use checkout::{CheckoutPresenter, WompiWebCheckout};
pub use config::{
    WompiConfig, PROVIDER_NAME, WIDGET_GLOBAL, WIDGET_SCRIPT_ID, WIDGET_SCRIPT_URL,
};
pub use result::parse_widget_result;
