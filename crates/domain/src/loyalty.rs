//! Loyalty tiers, accounts and tier resolution.

use chrono::{DateTime, Utc};
use common::AccountId;
use serde::{Deserialize, Serialize};

/// A reward bracket keyed by a minimum point threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTier {
    pub name: String,
    pub min_points: i64,
    pub discount_percent: u8,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl LoyaltyTier {
    pub fn new(name: impl Into<String>, min_points: i64, discount_percent: u8) -> Self {
        Self {
            name: name.into(),
            min_points,
            discount_percent,
            benefits: Vec::new(),
        }
    }

    pub fn with_benefits(mut self, benefits: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.benefits = benefits.into_iter().map(Into::into).collect();
        self
    }
}

/// Points balance and tier of a customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub account_id: AccountId,
    pub points: i64,
    /// Name of the current tier; `None` when no tier threshold is met.
    pub tier: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Result of one accrual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualOutcome {
    pub account: LoyaltyAccount,
    pub points_added: i64,
    pub previous_tier: Option<String>,
}

impl AccrualOutcome {
    /// Returns true if the accrual moved the account into a different tier.
    pub fn promoted(&self) -> bool {
        self.account.tier.is_some() && self.account.tier != self.previous_tier
    }
}

/// Picks the tier with the highest threshold not above `points`.
///
/// Tiers sharing a threshold are resolved to the lexicographically smallest
/// name, matching the `ORDER BY min_points DESC, name ASC` used in storage.
pub fn resolve_tier(tiers: &[LoyaltyTier], points: i64) -> Option<&LoyaltyTier> {
    tiers
        .iter()
        .filter(|tier| tier.min_points <= points)
        .max_by(|a, b| {
            a.min_points
                .cmp(&b.min_points)
                .then_with(|| b.name.cmp(&a.name))
        })
}
