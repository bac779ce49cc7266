//! # Payment Transactions
//!
//! The result the hosted widget reports once the shopper finishes (or abandons)
//! payment, and the discriminated outcome the order flow acts on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction status as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Approved,
    Declined,
    Voided,
    Error,
    Pending,
    /// Anything the provider adds later
    Other(String),
}

impl TransactionStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => TransactionStatus::Approved,
            "DECLINED" => TransactionStatus::Declined,
            "VOIDED" => TransactionStatus::Voided,
            "ERROR" => TransactionStatus::Error,
            "PENDING" => TransactionStatus::Pending,
            _ => TransactionStatus::Other(status.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Declined => "DECLINED",
            TransactionStatus::Voided => "VOIDED",
            TransactionStatus::Error => "ERROR",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Other(s) => s,
        }
    }

    /// Whether the provider will not change this status any more
    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment transaction (the widget callback's `transaction` object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Provider's transaction id
    pub id: String,

    /// Raw status string (see [`TransactionStatus`])
    pub status: String,

    #[serde(default)]
    pub amount_in_cents: i64,

    /// Our checkout reference, echoed back
    #[serde(default)]
    pub reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::parse(&self.status)
    }
}

/// What the order flow does next depends only on this
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Approved(Transaction),
    Declined(Transaction),
    /// Voided, error, pending or unknown
    Other(Transaction),
}

impl PaymentOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            PaymentOutcome::Approved(tx) | PaymentOutcome::Declined(tx) | PaymentOutcome::Other(tx) => tx,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PaymentOutcome::Approved(_) => "approved",
            PaymentOutcome::Declined(_) => "declined",
            PaymentOutcome::Other(_) => "other",
        }
    }
}

impl From<Transaction> for PaymentOutcome {
    fn from(tx: Transaction) -> Self {
        match tx.status() {
            TransactionStatus::Approved => PaymentOutcome::Approved(tx),
            TransactionStatus::Declined => PaymentOutcome::Declined(tx),
            _ => PaymentOutcome::Other(tx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_widget_transaction() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "id": "1234-1610641025-49201",
                "status": "APPROVED",
                "amountInCents": 5000000,
                "reference": "ref-123",
                "currency": "COP",
                "paymentMethodType": "CARD",
                "finalizedAt": "2024-06-01T15:04:05.000Z",
                "redirectUrl": "https://lucy.co/cliente/pago"
            }"#,
        )
        .unwrap();

        assert_eq!(tx.status(), TransactionStatus::Approved);
        assert_eq!(tx.amount_in_cents, 5_000_000);
        assert_eq!(tx.payment_method_type.as_deref(), Some("CARD"));
        assert!(tx.finalized_at.is_some());
    }

    #[test]
    fn test_outcome_from_status() {
        let tx = |status: &str| Transaction {
            id: "tx".into(),
            status: status.into(),
            amount_in_cents: 100,
            reference: "r".into(),
            currency: None,
            payment_method_type: None,
            finalized_at: None,
        };

        assert_eq!(PaymentOutcome::from(tx("APPROVED")).kind(), "approved");
        assert_eq!(PaymentOutcome::from(tx("declined")).kind(), "declined");
        assert_eq!(PaymentOutcome::from(tx("VOIDED")).kind(), "other");
        assert_eq!(PaymentOutcome::from(tx("SOMETHING_NEW")).kind(), "other");
    }

    #[test]
    fn test_status_finality() {
        assert!(!TransactionStatus::parse("PENDING").is_final());
        assert!(TransactionStatus::parse("ERROR").is_final());
        assert_eq!(TransactionStatus::parse("weird").as_str(), "weird");
    }
}
