use chrono::{DateTime, Utc};
use common::AccountId;
use domain::{OrderChannel, OrderStatus};
use serde::{Deserialize, Serialize};

/// Builder for order listing queries used by reporting surfaces.
///
/// Results are returned newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// Filter by owning account.
    pub account_id: Option<AccountId>,

    /// Filter by sales channel.
    pub channel: Option<OrderChannel>,

    /// Filter to orders created at or after this timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter to orders created at or before this timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one account's orders.
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by account.
    pub fn account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Filters by channel.
    pub fn channel(mut self, channel: OrderChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Filters to orders created at or after this timestamp.
    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    /// Filters to orders created at or before this timestamp.
    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    /// Limits the number of orders returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many orders before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}
