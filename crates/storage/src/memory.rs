use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{AccountId, OrderId, ProductId};
use domain::{
    AccrualOutcome, DecrementOutcome, InventoryRecord, LoyaltyAccount, LoyaltyTier, Order,
    OrderItem, OrderStatus, SyncLogEntry, resolve_tier,
};
use tokio::sync::RwLock;

use crate::{
    OrderQuery, Result, StorageError,
    store::{InventoryStore, LoyaltyStore, OrderStore, SyncLogStore},
};

#[derive(Debug, Default)]
struct FailureSwitches {
    insert_order: bool,
    insert_items: bool,
    append_sync: bool,
}

#[derive(Debug, Default)]
struct InMemoryState {
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    stock: HashMap<ProductId, i64>,
    tiers: Vec<LoyaltyTier>,
    accounts: HashMap<AccountId, LoyaltyAccount>,
    sync_log: Vec<SyncLogEntry>,
    fail: FailureSwitches,
}

/// In-memory store implementation for tests and local runs.
///
/// Holds every table behind one lock, so each trait method is atomic with
/// respect to the others, the same guarantee the PostgreSQL store gives
/// for its conditional statements.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `insert_order` calls fail.
    pub async fn set_fail_on_insert_order(&self, fail: bool) {
        self.state.write().await.fail.insert_order = fail;
    }

    /// Makes subsequent `insert_order_items` calls fail.
    pub async fn set_fail_on_insert_items(&self, fail: bool) {
        self.state.write().await.fail.insert_items = fail;
    }

    /// Makes subsequent `append_sync_entry` calls fail.
    pub async fn set_fail_on_append_sync(&self, fail: bool) {
        self.state.write().await.fail.append_sync = fail;
    }

    /// Returns the number of order rows.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of order item rows.
    pub async fn order_item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    /// Returns the number of sync log rows.
    pub async fn sync_entry_count(&self) -> usize {
        self.state.read().await.sync_log.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.insert_order {
            return Err(StorageError::Unavailable("order insert rejected".to_string()));
        }
        if state.orders.iter().any(|o| o.id == order.id) {
            return Err(StorageError::DuplicateOrder(order.id));
        }
        state.orders.push(order.clone());
        Ok(())
    }

    async fn insert_order_items(&self, items: &[OrderItem]) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.insert_items {
            return Err(StorageError::Unavailable(
                "order item insert rejected".to_string(),
            ));
        }
        // Check every reference before writing anything
        for item in items {
            if !state.orders.iter().any(|o| o.id == item.order_id) {
                return Err(StorageError::OrderNotFound(item.order_id));
            }
        }
        state.items.extend(items.iter().cloned());
        Ok(())
    }

    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StorageError::OrderNotFound(order_id))?;
        order.status = status;
        if notes.is_some() {
            order.notes = notes;
        }
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| {
                if let Some(status) = query.status
                    && o.status != status
                {
                    return false;
                }
                if let Some(account_id) = query.account_id
                    && o.account_id != Some(account_id)
                {
                    return false;
                }
                if let Some(channel) = query.channel
                    && o.channel != channel
                {
                    return false;
                }
                if let Some(from) = query.from_timestamp
                    && o.created_at < from
                {
                    return false;
                }
                if let Some(to) = query.to_timestamp
                    && o.created_at > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        // Newest first; the stable sort keeps later inserts ahead on ties
        orders.reverse();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn decrement_if_available(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<DecrementOutcome> {
        let mut state = self.state.write().await;
        let wanted = i64::from(quantity);
        match state.stock.get_mut(product_id) {
            Some(available) if *available >= wanted => {
                *available -= wanted;
                Ok(DecrementOutcome::Applied {
                    remaining: *available,
                })
            }
            Some(available) => Ok(DecrementOutcome::Insufficient {
                available: *available,
            }),
            None => Ok(DecrementOutcome::Insufficient { available: 0 }),
        }
    }

    async fn get_stock(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .stock
            .get(product_id)
            .map(|available| InventoryRecord {
                product_id: product_id.clone(),
                available: *available,
            }))
    }

    async fn set_stock(&self, product_id: &ProductId, available: i64) -> Result<()> {
        if available < 0 {
            return Err(StorageError::NegativeStock {
                product_id: product_id.clone(),
                available,
            });
        }
        let mut state = self.state.write().await;
        state.stock.insert(product_id.clone(), available);
        Ok(())
    }

    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<i64> {
        let mut state = self.state.write().await;
        let available = state.stock.entry(product_id.clone()).or_insert(0);
        *available = available.checked_add(i64::from(quantity)).ok_or_else(|| {
            StorageError::QuantityOutOfRange {
                product_id: product_id.clone(),
            }
        })?;
        Ok(*available)
    }
}

#[async_trait]
impl LoyaltyStore for InMemoryStore {
    async fn list_tiers(&self) -> Result<Vec<LoyaltyTier>> {
        let state = self.state.read().await;
        let mut tiers = state.tiers.clone();
        tiers.sort_by(|a, b| a.min_points.cmp(&b.min_points).then(a.name.cmp(&b.name)));
        Ok(tiers)
    }

    async fn upsert_tier(&self, tier: &LoyaltyTier) -> Result<()> {
        let mut state = self.state.write().await;
        match state.tiers.iter_mut().find(|t| t.name == tier.name) {
            Some(existing) => *existing = tier.clone(),
            None => state.tiers.push(tier.clone()),
        }
        Ok(())
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<LoyaltyAccount>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&account_id).cloned())
    }

    async fn accrue_points(&self, account_id: AccountId, points: i64) -> Result<AccrualOutcome> {
        let mut state = self.state.write().await;
        let (current, previous_tier) = match state.accounts.get(&account_id) {
            Some(account) => (account.points, account.tier.clone()),
            None => (0, None),
        };
        let total = current + points;
        let tier = resolve_tier(&state.tiers, total).map(|t| t.name.clone());

        let account = LoyaltyAccount {
            account_id,
            points: total,
            tier,
            updated_at: Utc::now(),
        };
        state.accounts.insert(account_id, account.clone());

        Ok(AccrualOutcome {
            account,
            points_added: points,
            previous_tier,
        })
    }
}

#[async_trait]
impl SyncLogStore for InMemoryStore {
    async fn append_sync_entry(&self, entry: &SyncLogEntry) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.append_sync {
            return Err(StorageError::Unavailable(
                "sync log append rejected".to_string(),
            ));
        }
        state.sync_log.push(entry.clone());
        Ok(())
    }

    async fn sync_entries_for_order(&self, order_id: OrderId) -> Result<Vec<SyncLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .sync_log
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn failed_sync_entries(&self, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .sync_log
            .iter()
            .rev()
            .filter(|e| e.is_failure())
            .take(limit)
            .cloned()
            .collect())
    }
}
