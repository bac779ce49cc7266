//! # Checkout Error Types
//!
//! Typed error handling for the cart and checkout flow.
//! All fallible operations return `Result<T, CheckoutError>`.

use thiserror::Error;

/// Core error type for cart and checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Checkout attempted with a non-positive or unrepresentable amount
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// The hosted widget raised an error while opening
    #[error("Could not open payment widget: {0}")]
    WidgetOpenFailure(String),

    /// The widget script never became ready within the poll bound
    #[error("Payment widget unavailable after {waited_ms} ms")]
    WidgetUnavailable { waited_ms: u64 },

    /// Backend rejected or never acknowledged the order after payment
    #[error("Order submission failed{}: {message}", http_suffix(.status))]
    OrderSubmissionFailure {
        status: Option<u16>,
        message: String,
    },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: String, message: String },

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Local key-value storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Shorthand for an invalid amount
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        CheckoutError::InvalidAmount {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Network(_)
                | CheckoutError::Provider { .. }
                | CheckoutError::OrderSubmissionFailure { .. }
                | CheckoutError::WidgetUnavailable { .. }
        )
    }

    /// Message suitable for showing to the shopper
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::InvalidAmount { .. } => {
                "The order total must be greater than zero before paying.".to_string()
            }
            CheckoutError::WidgetOpenFailure(_) => {
                "Could not open the payment widget. Your cart was not changed.".to_string()
            }
            CheckoutError::WidgetUnavailable { .. } => {
                "The payment service did not load. Please try again in a moment.".to_string()
            }
            CheckoutError::OrderSubmissionFailure { .. } => {
                "Your payment went through but we could not register the order. \
                 Your cart was kept; please contact support or retry."
                    .to_string()
            }
            CheckoutError::Network(_) | CheckoutError::Provider { .. } => {
                "We could not reach the store right now. Please try again.".to_string()
            }
            CheckoutError::Cancelled => "The operation was cancelled.".to_string(),
            CheckoutError::Configuration(_)
            | CheckoutError::Storage(_)
            | CheckoutError::Serialization(_)
            | CheckoutError::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
