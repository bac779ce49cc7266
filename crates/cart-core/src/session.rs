//! # Checkout Sessions
//!
//! A checkout session is the signed, amount-bound request handed to the
//! hosted payment widget. It is built fresh for every attempt and never
//! persisted.
//!
//! ```text
//! total (decimal) ──► amount in minor units ──► reference ──► SHA-256 integrity
//!                     (rejected if ≤ 0)          (random)      signature (hex)
//! ```

use crate::cart::CartStore;
use crate::error::{CheckoutError, CheckoutResult};
use crate::product::Currency;
use crate::storage::KeyValueStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Produces the per-attempt payment reference
pub trait ReferenceGenerator: Send + Sync {
    fn next_reference(&self) -> String;
}

/// Two independent random v4 UUIDs, concatenated without hyphens
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReference;

impl ReferenceGenerator for RandomReference {
    fn next_reference(&self) -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }
}

/// Always returns the same reference (for tests and replays)
#[derive(Debug, Clone)]
pub struct FixedReference(pub String);

impl ReferenceGenerator for FixedReference {
    fn next_reference(&self) -> String {
        self.0.clone()
    }
}

/// Hex-encoded SHA-256 of `reference + amount + currency + secret`, no delimiters
pub fn integrity_signature(
    reference: &str,
    amount_minor_units: i64,
    currency: Currency,
    integrity_secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_minor_units.to_string().as_bytes());
    hasher.update(currency.as_str().as_bytes());
    hasher.update(integrity_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// A signed payment request for one checkout attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    /// Unique per attempt
    pub reference: String,

    /// `round(total × 100)`, always positive
    pub amount_minor_units: i64,

    pub currency: Currency,

    /// See [`integrity_signature`]
    pub integrity_signature: String,

    pub created_at: DateTime<Utc>,
}

/// Builds [`CheckoutSession`]s from cart totals
#[derive(Clone)]
pub struct CheckoutSessionBuilder {
    currency: Currency,
    integrity_secret: String,
    references: Arc<dyn ReferenceGenerator>,
}

impl std::fmt::Debug for CheckoutSessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSessionBuilder")
            .field("currency", &self.currency)
            .field("integrity_secret", &"<redacted>")
            .finish()
    }
}

impl CheckoutSessionBuilder {
    /// Create a builder using random references
    pub fn new(currency: Currency, integrity_secret: impl Into<String>) -> Self {
        Self {
            currency,
            integrity_secret: integrity_secret.into(),
            references: Arc::new(RandomReference),
        }
    }

    /// Builder: use a custom reference generator
    pub fn with_reference_generator(mut self, generator: impl ReferenceGenerator + 'static) -> Self {
        self.references = Arc::new(generator);
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Build a session for `total` (in major currency units).
    ///
    /// Fails with `InvalidAmount` unless the amount in minor units is a positive integer.
    pub fn build(&self, total: Decimal) -> CheckoutResult<CheckoutSession> {
        let amount_minor_units = self.currency.to_minor_units(total).ok_or_else(|| {
            CheckoutError::invalid_amount(format!("{} {} is out of range", total, self.currency))
        })?;

        if amount_minor_units <= 0 {
            return Err(CheckoutError::invalid_amount(format!(
                "{} {} is {} in minor units",
                total, self.currency, amount_minor_units
            )));
        }

        let reference = self.references.next_reference();
        let integrity_signature = integrity_signature(
            &reference,
            amount_minor_units,
            self.currency,
            &self.integrity_secret,
        );

        Ok(CheckoutSession {
            reference,
            amount_minor_units,
            currency: self.currency,
            integrity_signature,
            created_at: Utc::now(),
        })
    }

    /// Build a session for the cart's current total
    pub fn build_for_cart<S: KeyValueStore>(&self, cart: &CartStore<S>) -> CheckoutResult<CheckoutSession> {
        if cart.is_empty() {
            return Err(CheckoutError::invalid_amount("cart is empty"));
        }
        self.build(cart.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Product, Variant};
    use crate::storage::MemoryStorage;
    use rust_decimal_macros::dec;

    fn builder() -> CheckoutSessionBuilder {
        CheckoutSessionBuilder::new(Currency::COP, "test_integrity_secret")
            .with_reference_generator(FixedReference("ref-123".into()))
    }

    #[test]
    fn test_scenario_amount_and_signature() {
        let mut cart = CartStore::open(MemoryStorage::new());
        let product = Product::new(7, "Pijama Luna", dec!(30000))
            .with_variant(Variant::new(3, "M", dec!(25000), 5));
        cart.add(&product, Some(3));
        cart.add(&product, Some(3));

        let session = builder().build_for_cart(&cart).unwrap();
        assert_eq!(session.amount_minor_units, 5_000_000);
        assert_eq!(session.currency, Currency::COP);
        assert_eq!(session.integrity_signature.len(), 64);
        assert!(session
            .integrity_signature
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let again = builder().build(dec!(50000)).unwrap();
        assert_eq!(again.integrity_signature, session.integrity_signature);
    }

    #[test]
    fn test_signature_is_plain_concatenation() {
        let expected = hex::encode(Sha256::digest(b"ref-1235000000COPtest_integrity_secret"));
        assert_eq!(
            integrity_signature("ref-123", 5_000_000, Currency::COP, "test_integrity_secret"),
            expected
        );
    }

    #[test]
    fn test_signature_known_vector() {
        // Provider documentation example
        assert_eq!(
            integrity_signature(
                "sk8-438k4-xmxm392-sn2m",
                2_490_000,
                Currency::COP,
                "prod_integrity_Z5mMke9x0k8gpErbDqwrJXMqsI6SFli6"
            ),
            "37c8407747e595535433ef8f6a811d853cd943046624a0ec04662b17bbf33bf5"
        );
    }

    #[test]
    fn test_amount_guard() {
        let b = builder();
        assert!(matches!(b.build(dec!(0)), Err(CheckoutError::InvalidAmount { .. })));
        assert!(matches!(b.build(dec!(-10)), Err(CheckoutError::InvalidAmount { .. })));
        assert!(matches!(b.build(dec!(0.004)), Err(CheckoutError::InvalidAmount { .. })));
        assert!(b.build(dec!(0.005)).is_ok());

        let empty = CartStore::open(MemoryStorage::new());
        assert!(matches!(
            b.build_for_cart(&empty),
            Err(CheckoutError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_random_references_are_unique() {
        let generator = RandomReference;
        let a = generator.next_reference();
        let b = generator.next_reference();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", builder());
        assert!(!rendered.contains("test_integrity_secret"));
    }
}
