//! # cart-app
//!
//! Storefront adapters and the `lucy-cart` command-line client.
//!
//! - `HttpOrderBackend` - the order API behind [`cart_core::OrderBackend`]
//! - `CatalogClient` - active products and price refreshes
//! - `AppConfig` / `AppState` - configuration and wiring
//! - `commands` - one module per command family

pub mod backend;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod state;

pub use backend::{CustomerOrder, CustomerOrderItem, HttpOrderBackend, OrderedProduct};
pub use catalog::CatalogClient;
pub use config::AppConfig;
pub use state::{AppState, WebCheckoutFlow};
