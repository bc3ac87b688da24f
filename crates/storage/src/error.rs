use common::{OrderId, ProductId};
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when reading or writing storefront records.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this id was already written.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// Stock levels must not be negative.
    #[error("Invalid stock level for {product_id}: {available}")]
    NegativeStock {
        product_id: ProductId,
        available: i64,
    },

    /// A stock level or line quantity does not fit its column.
    #[error("Quantity out of range for {product_id}")]
    QuantityOutOfRange { product_id: ProductId },

    /// The backing store could not complete the write.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a domain value.
    #[error("Corrupt row: {0}")]
    Decode(#[from] DomainError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
