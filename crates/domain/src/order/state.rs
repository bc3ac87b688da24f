//! Order status lifecycle.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order.
///
/// State transitions:
/// ```text
/// Processing ──┬──► Completed ──► Cancelled
///              ├──► ErrorItemsFailed ──► Cancelled
///              └──► Cancelled
/// Completed ──► ErrorItemsFailed
/// ```
///
/// Online checkouts start in `Processing`, POS sales in `Completed`. The
/// coordinator only ever moves an order into `ErrorItemsFailed`; the other
/// transitions belong to back-office tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid online, awaiting fulfillment.
    Processing,

    /// Fulfilled, or settled at a terminal.
    Completed,

    /// The order row exists but its line items could not be written.
    ErrorItemsFailed,

    /// Cancelled by staff (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can be flagged for failed line items.
    pub fn can_mark_items_failed(&self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Completed)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Returns the status as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::ErrorItemsFailed => "error_items_failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "error_items_failed" => Ok(OrderStatus::ErrorItemsFailed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::UnknownVariant {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_mark_items_failed() {
        assert!(OrderStatus::Processing.can_mark_items_failed());
        assert!(OrderStatus::Completed.can_mark_items_failed());
        assert!(!OrderStatus::ErrorItemsFailed.can_mark_items_failed());
        assert!(!OrderStatus::Cancelled.can_mark_items_failed());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::ErrorItemsFailed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_string_forms_agree() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::ErrorItemsFailed,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_unknown_status() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownVariant {
                kind: "order status",
                value: "shipped".to_string(),
            }
        );
    }
}
