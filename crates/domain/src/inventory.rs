//! Inventory records and the result of a conditional decrement.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// Available stock for one product. `available` never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub available: i64,
}

/// Outcome of decrementing stock only when enough is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecrementOutcome {
    /// Stock was reduced; `remaining` is the new available quantity.
    Applied { remaining: i64 },

    /// Stock was left untouched because only `available` units exist.
    /// An unknown product reports zero.
    Insufficient { available: i64 },
}

impl DecrementOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DecrementOutcome::Applied { .. })
    }
}
