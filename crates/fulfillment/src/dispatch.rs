//! Integration sync dispatcher: one logged attempt per downstream target.

use std::time::Duration;

use domain::{Order, OrderItem, SyncLogEntry, SyncTarget};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use storage::SyncLogStore;

use crate::error::IntegrationError;
use crate::services::IntegrationClient;

/// Default bound on a single sync attempt.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether syncs delay the checkout response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Dispatch before the checkout call returns.
    #[default]
    Inline,

    /// Dispatch on a spawned task; the checkout call returns immediately.
    Detached,
}

impl std::str::FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(SyncMode::Inline),
            "detached" => Ok(SyncMode::Detached),
            other => Err(format!("unknown sync mode: {other}")),
        }
    }
}

/// Notifies marketing, accounting and shipping about a committed order.
///
/// Each target gets exactly one attempt, bounded by a timeout, and exactly
/// one [`SyncLogEntry`] recording the outcome. Attempts run concurrently and
/// never affect each other or the sale.
pub struct IntegrationSyncDispatcher<S, M, A, Sh> {
    store: S,
    marketing: M,
    accounting: A,
    shipping: Sh,
    timeout: Duration,
}

impl<S, M, A, Sh> IntegrationSyncDispatcher<S, M, A, Sh>
where
    S: SyncLogStore,
    M: IntegrationClient,
    A: IntegrationClient,
    Sh: IntegrationClient,
{
    pub fn new(store: S, marketing: M, accounting: A, shipping: Sh) -> Self {
        Self {
            store,
            marketing,
            accounting,
            shipping,
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }

    /// Sets the bound on each attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn marketing(&self) -> &M {
        &self.marketing
    }

    pub fn accounting(&self) -> &A {
        &self.accounting
    }

    pub fn shipping(&self) -> &Sh {
        &self.shipping
    }

    /// Targets an order is synced to. Marketing requires opt-in.
    pub fn targets_for(order: &Order) -> Vec<SyncTarget> {
        SyncTarget::ALL
            .into_iter()
            .filter(|target| *target != SyncTarget::Marketing || order.marketing_opt_in)
            .collect()
    }

    /// Runs every applicable sync for an order and returns the log entries written.
    #[tracing::instrument(skip(self, order, items), fields(order_id = %order.id))]
    pub async fn dispatch(&self, order: &Order, items: &[OrderItem]) -> Vec<SyncLogEntry> {
        let attempts = Self::targets_for(order).into_iter().map(|target| {
            let payload = build_payload(target, order, items);
            self.attempt(target, order, payload)
        });

        join_all(attempts).await
    }

    async fn attempt(&self, target: SyncTarget, order: &Order, payload: Value) -> SyncLogEntry {
        let result =
            match tokio::time::timeout(self.timeout, self.client(target).trigger(order.id, &payload))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(IntegrationError::Timeout(self.timeout)),
            };

        let entry = match result {
            Ok(()) => {
                tracing::info!(%target, "sync triggered");
                SyncLogEntry::triggered(target, order.id, payload)
            }
            Err(e) => {
                tracing::warn!(%target, error = %e, "sync failed");
                SyncLogEntry::failed(target, order.id, payload, e.to_string())
            }
        };

        metrics::counter!(
            "sync_attempts_total",
            "target" => target.as_str(),
            "status" => entry.status.as_str()
        )
        .increment(1);

        if let Err(e) = self.store.append_sync_entry(&entry).await {
            tracing::error!(%target, error = %e, "failed to record sync log entry");
        }

        entry
    }

    fn client(&self, target: SyncTarget) -> &dyn IntegrationClient {
        match target {
            SyncTarget::Marketing => &self.marketing,
            SyncTarget::Accounting => &self.accounting,
            SyncTarget::Shipping => &self.shipping,
        }
    }
}

/// Builds the payload snapshot sent to, and logged for, a target.
pub fn build_payload(target: SyncTarget, order: &Order, items: &[OrderItem]) -> Value {
    match target {
        SyncTarget::Marketing => marketing_payload(order),
        SyncTarget::Accounting => accounting_payload(order, items),
        SyncTarget::Shipping => shipping_payload(order, items),
    }
}

fn marketing_payload(order: &Order) -> Value {
    json!({
        "order_id": order.id,
        "account_id": order.account_id,
        "name": order.customer.name,
        "email": order.customer.email,
        "phone": order.customer.phone,
        "channel": order.channel.as_str(),
    })
}

fn accounting_payload(order: &Order, items: &[OrderItem]) -> Value {
    json!({
        "order_id": order.id,
        "transaction_id": order.transaction_id,
        "payment_method": order.payment_method,
        "payment_status": order.payment_status.as_str(),
        "subtotal": order.totals.subtotal,
        "tax": order.totals.tax,
        "shipping": order.totals.shipping,
        "discount": order.totals.discount,
        "total": order.totals.total,
        "created_at": order.created_at,
        "items": items
            .iter()
            .map(|item| json!({
                "product_id": item.product_id,
                "name": item.product_name,
                "quantity": item.quantity,
                "unit_price": item.unit_price,
                "subtotal": item.subtotal,
            }))
            .collect::<Vec<_>>(),
    })
}

fn shipping_payload(order: &Order, items: &[OrderItem]) -> Value {
    json!({
        "order_id": order.id,
        "name": order.customer.name,
        "email": order.customer.email,
        "phone": order.customer.phone,
        "address": order.shipping_address,
        "items": items
            .iter()
            .map(|item| json!({
                "product_id": item.product_id,
                "name": item.product_name,
                "quantity": item.quantity,
            }))
            .collect::<Vec<_>>(),
    })
}
