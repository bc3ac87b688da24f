//! Audit records of downstream notification attempts.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Downstream system notified after a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTarget {
    /// Marketing contact list sync; only for buyers who opted in.
    Marketing,
    /// Accounting export of the sale.
    Accounting,
    /// Shipping label trigger.
    Shipping,
}

impl SyncTarget {
    pub const ALL: [SyncTarget; 3] = [
        SyncTarget::Marketing,
        SyncTarget::Accounting,
        SyncTarget::Shipping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTarget::Marketing => "marketing",
            SyncTarget::Accounting => "accounting",
            SyncTarget::Shipping => "shipping",
        }
    }
}

impl std::fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncTarget {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marketing" => Ok(SyncTarget::Marketing),
            "accounting" => Ok(SyncTarget::Accounting),
            "shipping" => Ok(SyncTarget::Shipping),
            other => Err(DomainError::UnknownVariant {
                kind: "sync target",
                value: other.to_string(),
            }),
        }
    }
}

/// Result of a single notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Triggered,
    FailedTrigger,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Triggered => "triggered",
            SyncStatus::FailedTrigger => "failed_trigger",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "triggered" => Ok(SyncStatus::Triggered),
            "failed_trigger" => Ok(SyncStatus::FailedTrigger),
            other => Err(DomainError::UnknownVariant {
                kind: "sync status",
                value: other.to_string(),
            }),
        }
    }
}

/// One append-only audit row per notification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: Uuid,
    pub target: SyncTarget,
    pub order_id: OrderId,
    pub status: SyncStatus,
    /// The payload that was sent, as sent.
    pub payload: serde_json::Value,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    /// Records a successful attempt.
    pub fn triggered(target: SyncTarget, order_id: OrderId, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            order_id,
            status: SyncStatus::Triggered,
            payload,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Records a failed attempt with the collaborator's error.
    pub fn failed(
        target: SyncTarget,
        order_id: OrderId,
        payload: serde_json::Value,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            order_id,
            status: SyncStatus::FailedTrigger,
            payload,
            error: Some(error.into()),
            created_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == SyncStatus::FailedTrigger
    }
}
