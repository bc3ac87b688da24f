//! Fulfillment error types.

use std::time::Duration;

use common::OrderId;
use domain::ValidationError;
use storage::StorageError;
use thiserror::Error;

/// Errors surfaced to the caller of a checkout or POS sale.
///
/// Only validation and the order/item writes can fail a sale. Stock
/// shortfalls, loyalty failures and sync failures are recorded and the
/// sale still succeeds.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request was rejected before anything was written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The order or its items could not be written.
    ///
    /// `order_id` is set when the order row exists; it is then left in
    /// `error_items_failed` for manual follow-up.
    #[error("Persistence failed: {source}")]
    Persistence {
        order_id: Option<OrderId>,
        #[source]
        source: StorageError,
    },
}

impl CheckoutError {
    /// Returns the id of the partially written order, if one exists.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            CheckoutError::Validation(_) => None,
            CheckoutError::Persistence { order_id, .. } => *order_id,
        }
    }
}

/// Errors raised by downstream integration collaborators.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The collaborator refused or could not be reached.
    #[error("Integration unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered with a non-success status.
    #[error("Integration rejected the request: status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The attempt did not finish in time.
    #[error("Integration timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for integration results.
pub type Result<T> = std::result::Result<T, IntegrationError>;
