//! # cart-core
//!
//! Cart and checkout core for the lucy-cart storefront client.
//!
//! This crate provides:
//! - `CartStore` over a `KeyValueStore` port, persisted after every mutation
//! - `PriceUpdate` reconciliation of catalog prices into the cart
//! - `CheckoutSessionBuilder` for signed, amount-bound payment sessions
//! - `PaymentWidget` port and the bounded-poll `WidgetBridge`
//! - `OrderSubmitter`, the payment-outcome state machine
//! - `CheckoutFlow`, which composes the three checkout steps
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartStore, CheckoutFlow, FileStorage, Product};
//!
//! let mut cart = CartStore::open(FileStorage::open("~/.lucy-cart")?);
//! cart.add(&product, Some(variant_id));
//!
//! // Sign, open the widget, submit the order
//! let notice = flow.checkout(&mut cart, bearer.as_deref()).await?;
//! println!("{}", notice.message());
//! ```

pub mod cart;
pub mod error;
pub mod flow;
pub mod order;
pub mod poll;
pub mod product;
pub mod reconcile;
pub mod session;
pub mod storage;
pub mod transaction;
pub mod widget;

// Re-exports for convenience
pub use cart::{CartLine, CartSnapshot, CartStore};
pub use error::{CheckoutError, CheckoutResult};
pub use flow::CheckoutFlow;
pub use order::{
    backend_message, CheckoutNotice, OrderBackend, OrderItem, OrderReceipt,
    OrderSubmissionPayload, OrderSubmitter, CHECKOUT_PATH, DEFAULT_VARIANT_ID,
};
pub use poll::{poll_until, Delay, PollConfig};
#[cfg(feature = "tokio")]
pub use poll::TokioDelay;
pub use product::{Currency, Product, ProductId, Variant, VariantId};
pub use reconcile::PriceUpdate;
pub use session::{
    integrity_signature, CheckoutSession, CheckoutSessionBuilder, FixedReference,
    RandomReference, ReferenceGenerator,
};
pub use storage::{
    stored_token, FileStorage, KeyValueStore, MemoryStorage, CART_KEY, TOKEN_KEY,
};
pub use transaction::{PaymentOutcome, Transaction, TransactionStatus};
pub use widget::{PaymentWidget, WidgetBridge, WidgetRequest, WidgetSignature};
