//! Domain layer for the storefront order fulfillment system.
//!
//! This crate holds the data model shared by the online checkout and the
//! point-of-sale flow:
//! - Checkout and POS request types with their validation rules
//! - Order and order item records with the order status lifecycle
//! - Inventory, loyalty tier and sync-log records
//! - Cart arithmetic for pricing a set of lines

pub mod cart;
pub mod checkout;
pub mod error;
pub mod inventory;
pub mod loyalty;
pub mod order;
pub mod sync;

pub use cart::Cart;
pub use checkout::{
    Address, CartLine, CheckoutRequest, CustomerContact, OrderTotals, PaymentConfirmation,
    MAX_LINE_QUANTITY, PosPaymentMethod, PosSaleRequest, change_due,
};
pub use error::{DomainError, ValidationError};
pub use inventory::{DecrementOutcome, InventoryRecord};
pub use loyalty::{AccrualOutcome, LoyaltyAccount, LoyaltyTier, resolve_tier};
pub use order::{Order, OrderChannel, OrderItem, OrderStatus, PaymentStatus};
pub use sync::{SyncLogEntry, SyncStatus, SyncTarget};

pub use common::{AccountId, Money, OrderId, ProductId};
