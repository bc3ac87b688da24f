//! Domain error types.

use common::{Money, ProductId};
use thiserror::Error;

/// A checkout or POS request that cannot be committed as submitted.
///
/// Validation runs before any write, so returning one of these guarantees
/// nothing was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Customer name is blank.
    #[error("Customer name is required")]
    MissingCustomerName,

    /// Customer email is blank.
    #[error("Customer email is required")]
    MissingCustomerEmail,

    /// Customer email is not an address.
    #[error("Malformed email address: {0}")]
    MalformedEmail(String),

    /// A required address field is blank.
    #[error("{address} address is incomplete: missing {field}")]
    IncompleteAddress {
        address: &'static str,
        field: &'static str,
    },

    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line has a zero quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A cart line quantity exceeds what an order item can record.
    #[error("Quantity for {product_id} is too large: {quantity} (at most {max})")]
    QuantityTooLarge {
        product_id: ProductId,
        quantity: u32,
        max: u32,
    },

    /// A cart line has a negative unit price.
    #[error("Invalid unit price for {product_id}: {price}")]
    NegativePrice { product_id: ProductId, price: Money },

    /// A totals component is negative.
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    /// An amount is too large to compute.
    #[error("{field} is out of range")]
    AmountOverflow { field: &'static str },

    /// The stated subtotal does not match the cart lines.
    #[error("Subtotal mismatch: lines sum to {expected}, request states {actual}")]
    SubtotalMismatch { expected: Money, actual: Money },

    /// The stated total does not match subtotal + tax + shipping - discount.
    #[error("Total mismatch: expected {expected}, request states {actual}")]
    TotalMismatch { expected: Money, actual: Money },

    /// Payment confirmation carries no transaction id.
    #[error("Payment transaction id is required")]
    MissingTransactionId,

    /// Cash tendered at the terminal does not cover the total.
    #[error("Amount received {received} does not cover total {total}")]
    InsufficientTender { total: Money, received: Money },
}

/// Errors raised when decoding stored domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A stored enum column holds a value this build does not know.
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
