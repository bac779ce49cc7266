//! # Widget Results
//!
//! The widget calls back with `{ transaction: { ... } }`. Some integrations
//! forward the bare transaction instead; both are accepted.

use crate::config::PROVIDER_NAME;
use cart_core::{CheckoutError, CheckoutResult, Transaction};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WidgetResult {
    Wrapped { transaction: Transaction },
    Bare(Transaction),
}

/// Parse the widget callback payload into a [`Transaction`]
pub fn parse_widget_result(value: serde_json::Value) -> CheckoutResult<Transaction> {
    let transaction = match serde_json::from_value::<WidgetResult>(value) {
        Ok(WidgetResult::Wrapped { transaction }) | Ok(WidgetResult::Bare(transaction)) => transaction,
        Err(e) => {
            return Err(CheckoutError::Provider {
                provider: PROVIDER_NAME.to_string(),
                message: format!("unrecognised widget result: {}", e),
            })
        }
    };

    if transaction.id.is_empty() {
        return Err(CheckoutError::Provider {
            provider: PROVIDER_NAME.to_string(),
            message: "widget result has no transaction id".to_string(),
        });
    }

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::TransactionStatus;
    use serde_json::json;

    #[test]
    fn test_wrapped_result() {
        let tx = parse_widget_result(json!({
            "transaction": {
                "id": "01-1531231271-19365",
                "status": "APPROVED",
                "amountInCents": 2490000,
                "reference": "ref-1",
                "paymentMethodType": "NEQUI",
                "redirectUrl": null
            }
        }))
        .unwrap();

        assert_eq!(tx.id, "01-1531231271-19365");
        assert_eq!(tx.status(), TransactionStatus::Approved);
        assert_eq!(tx.payment_method_type.as_deref(), Some("NEQUI"));
    }

    #[test]
    fn test_bare_result() {
        let tx = parse_widget_result(json!({
            "id": "tx-2",
            "status": "DECLINED",
            "amountInCents": 100,
            "reference": "ref-2"
        }))
        .unwrap();
        assert_eq!(tx.status(), TransactionStatus::Declined);
    }

    #[test]
    fn test_garbage_is_a_provider_error() {
        assert!(matches!(
            parse_widget_result(json!({"ok": true})),
            Err(CheckoutError::Provider { .. })
        ));
        assert!(parse_widget_result(json!({"id": "", "status": "APPROVED"})).is_err());
    }
}
