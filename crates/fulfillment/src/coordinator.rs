//! Order fulfillment coordinator: commits a paid sale and fans out its side effects.

use std::sync::Arc;

use domain::{CartLine, CheckoutRequest, Order, OrderItem, OrderStatus, PosSaleRequest};
use storage::StorefrontStore;

use crate::dispatch::{IntegrationSyncDispatcher, SyncMode};
use crate::error::CheckoutError;
use crate::inventory::InventoryLedger;
use crate::loyalty::LoyaltyAccrualEngine;
use crate::order_fulfillment;
use crate::services::IntegrationClient;

/// Commits completed purchases from the online checkout and the POS terminal.
///
/// Only the order and item writes can fail a sale. Once the order row
/// exists nothing is rolled back: stock shortfalls, loyalty failures and
/// sync failures are logged and the sale stands.
pub struct OrderFulfillmentCoordinator<S, M, A, Sh> {
    store: S,
    inventory: InventoryLedger<S>,
    loyalty: LoyaltyAccrualEngine<S>,
    dispatcher: Arc<IntegrationSyncDispatcher<S, M, A, Sh>>,
    sync_mode: SyncMode,
}

impl<S, M, A, Sh> OrderFulfillmentCoordinator<S, M, A, Sh>
where
    S: StorefrontStore + Clone + 'static,
    M: IntegrationClient + 'static,
    A: IntegrationClient + 'static,
    Sh: IntegrationClient + 'static,
{
    /// Creates a new coordinator over a store and a sync dispatcher.
    pub fn new(store: S, dispatcher: IntegrationSyncDispatcher<S, M, A, Sh>) -> Self {
        Self {
            inventory: InventoryLedger::new(store.clone()),
            loyalty: LoyaltyAccrualEngine::new(store.clone()),
            store,
            dispatcher: Arc::new(dispatcher),
            sync_mode: SyncMode::default(),
        }
    }

    /// Sets whether syncs run before or after the call returns.
    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn inventory(&self) -> &InventoryLedger<S> {
        &self.inventory
    }

    pub fn loyalty(&self) -> &LoyaltyAccrualEngine<S> {
        &self.loyalty
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// The dispatcher that pushes committed orders to the sync targets.
    pub fn dispatcher(&self) -> &IntegrationSyncDispatcher<S, M, A, Sh> {
        &self.dispatcher
    }

    /// Commits an online checkout whose payment has already been captured.
    ///
    /// The order is created in `processing`. Nothing is written if the
    /// request fails validation.
    #[tracing::instrument(skip(self, request), fields(channel = "online"))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Order, CheckoutError> {
        tracing::debug!(step = order_fulfillment::STEP_VALIDATE, "checkout step started");
        if let Err(e) = request.validate() {
            metrics::counter!("checkouts_total", "channel" => "online", "outcome" => "rejected")
                .increment(1);
            tracing::info!(error = %e, "checkout rejected");
            return Err(e.into());
        }

        let order = Order::online(&request);
        self.commit(order, &request.items).await
    }

    /// Commits a sale settled at a staffed terminal.
    ///
    /// The order is created `completed`, addressed to the store, with a
    /// locally generated transaction id.
    #[tracing::instrument(skip(self, request), fields(channel = "pos"))]
    pub async fn pos_sale(&self, request: PosSaleRequest) -> Result<Order, CheckoutError> {
        tracing::debug!(step = order_fulfillment::STEP_VALIDATE, "checkout step started");
        if let Err(e) = request.validate() {
            metrics::counter!("checkouts_total", "channel" => "pos", "outcome" => "rejected")
                .increment(1);
            tracing::info!(error = %e, "pos sale rejected");
            return Err(e.into());
        }

        let order = Order::point_of_sale(&request);
        self.commit(order, &request.items).await
    }

    async fn commit(&self, order: Order, lines: &[CartLine]) -> Result<Order, CheckoutError> {
        let start = std::time::Instant::now();
        let channel = order.channel.as_str();
        let order_id = order.id;

        // 1. Order row
        tracing::info!(
            step = order_fulfillment::STEP_INSERT_ORDER,
            %order_id,
            "checkout step started"
        );
        if let Err(e) = self.store.insert_order(&order).await {
            metrics::counter!("checkouts_total", "channel" => channel, "outcome" => "failed")
                .increment(1);
            tracing::error!(%order_id, error = %e, "failed to persist order");
            return Err(CheckoutError::Persistence {
                order_id: None,
                source: e,
            });
        }

        // 2. Items, all or none
        tracing::info!(
            step = order_fulfillment::STEP_INSERT_ITEMS,
            %order_id,
            lines = lines.len(),
            "checkout step started"
        );
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem::from_line(order_id, line))
            .collect();
        if let Err(e) = self.store.insert_order_items(&items).await {
            let note = format!("{}: {e}", order_fulfillment::ITEMS_FAILED_NOTE);
            if let Err(mark_err) = self
                .store
                .set_order_status(order_id, OrderStatus::ErrorItemsFailed, Some(note))
                .await
            {
                tracing::error!(%order_id, error = %mark_err, "failed to flag order with failed items");
            }
            metrics::counter!("checkouts_total", "channel" => channel, "outcome" => "failed")
                .increment(1);
            tracing::error!(%order_id, error = %e, "failed to persist order items");
            return Err(CheckoutError::Persistence {
                order_id: Some(order_id),
                source: e,
            });
        }

        // 3. Stock, best-effort
        tracing::info!(
            step = order_fulfillment::STEP_SETTLE_INVENTORY,
            %order_id,
            "checkout step started"
        );
        let warnings = self.inventory.settle(&items).await;
        if !warnings.is_empty() {
            tracing::warn!(%order_id, count = warnings.len(), "order committed with stock warnings");
        }

        // 4. Loyalty, attributable buyers only
        if let Some(account_id) = order.account_id {
            tracing::info!(
                step = order_fulfillment::STEP_ACCRUE_LOYALTY,
                %order_id,
                "checkout step started"
            );
            let points = LoyaltyAccrualEngine::<S>::points_for_total(order.totals.total);
            if let Err(e) = self.loyalty.accrue(account_id, points).await {
                tracing::warn!(%order_id, %account_id, points, error = %e, "loyalty accrual failed");
            }
        }

        // 5. Downstream syncs
        tracing::info!(
            step = order_fulfillment::STEP_DISPATCH_SYNCS,
            %order_id,
            mode = ?self.sync_mode,
            "checkout step started"
        );
        match self.sync_mode {
            SyncMode::Inline => {
                self.dispatcher.dispatch(&order, &items).await;
            }
            SyncMode::Detached => {
                let dispatcher = Arc::clone(&self.dispatcher);
                let order = order.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(&order, &items).await;
                });
            }
        }

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds", "channel" => channel).record(duration);
        metrics::counter!("checkouts_total", "channel" => channel, "outcome" => "committed")
            .increment(1);
        tracing::info!(%order_id, total = %order.totals.total, duration, "order committed");

        Ok(order)
    }
}
