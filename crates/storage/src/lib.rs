//! Storage layer for orders, inventory, loyalty accounts and the sync log.
//!
//! Every store implements the four traits in [`store`]. The two atomic
//! primitives the coordinator relies on live here rather than in callers:
//! - [`InventoryStore::decrement_if_available`] never lets stock go negative
//! - [`LoyaltyStore::accrue_points`] increments and resolves the tier in one step

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StorageError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::OrderQuery;
pub use store::{InventoryStore, LoyaltyStore, OrderStore, StorefrontStore, SyncLogStore};
