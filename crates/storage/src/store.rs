use async_trait::async_trait;
use common::{AccountId, OrderId, ProductId};
use domain::{
    AccrualOutcome, DecrementOutcome, InventoryRecord, LoyaltyAccount, LoyaltyTier, Order,
    OrderItem, OrderStatus, SyncLogEntry,
};

use crate::{OrderQuery, Result};

/// Persistence for orders and their line items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order row.
    ///
    /// Fails with `DuplicateOrder` if the id is already taken.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Inserts line items. Either all rows are written or none are.
    async fn insert_order_items(&self, items: &[OrderItem]) -> Result<()>;

    /// Overwrites an order's status, optionally replacing its notes.
    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<()>;

    /// Loads an order. Returns None if it does not exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads an order's items in insertion order.
    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Lists orders matching a query, newest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>>;
}

/// Per-product available stock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Decrements stock by `quantity` only if at least that much is available.
    ///
    /// Implementations must perform the check and the write as one atomic
    /// operation so concurrent callers can never oversell.
    async fn decrement_if_available(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<DecrementOutcome>;

    /// Reads the stock record for a product.
    async fn get_stock(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>>;

    /// Sets the available quantity for a product, creating the record if needed.
    async fn set_stock(&self, product_id: &ProductId, available: i64) -> Result<()>;

    /// Adds `quantity` to a product's stock, creating the record if needed,
    /// and returns the new level.
    ///
    /// Atomic with respect to `decrement_if_available`: a concurrent
    /// decrement is never overwritten.
    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<i64>;
}

/// Loyalty tiers and account balances.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// Lists tiers ordered by threshold, then name.
    async fn list_tiers(&self) -> Result<Vec<LoyaltyTier>>;

    /// Inserts or replaces a tier by name.
    async fn upsert_tier(&self, tier: &LoyaltyTier) -> Result<()>;

    /// Reads an account's balance. Returns None if it has never accrued.
    async fn get_account(&self, account_id: AccountId) -> Result<Option<LoyaltyAccount>>;

    /// Adds points to an account and resolves its tier against the new total.
    ///
    /// Creates the account when absent. The increment and tier resolution
    /// happen atomically, so concurrent accruals for one account never lose
    /// an update.
    async fn accrue_points(&self, account_id: AccountId, points: i64) -> Result<AccrualOutcome>;
}

/// Append-only audit trail of downstream sync attempts.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// Appends an entry. Entries are never updated or deleted.
    async fn append_sync_entry(&self, entry: &SyncLogEntry) -> Result<()>;

    /// Lists an order's entries, oldest first.
    async fn sync_entries_for_order(&self, order_id: OrderId) -> Result<Vec<SyncLogEntry>>;

    /// Lists the most recent failed entries, newest first.
    async fn failed_sync_entries(&self, limit: usize) -> Result<Vec<SyncLogEntry>>;
}

/// Everything the fulfillment coordinator needs from storage.
pub trait StorefrontStore: OrderStore + InventoryStore + LoyaltyStore + SyncLogStore {}

impl<T: OrderStore + InventoryStore + LoyaltyStore + SyncLogStore + ?Sized> StorefrontStore for T {}
