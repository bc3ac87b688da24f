//! Inventory ledger: best-effort stock settlement for committed orders.

use common::ProductId;
use domain::{DecrementOutcome, OrderItem};
use serde::Serialize;
use storage::InventoryStore;

/// A line whose stock could not be decremented.
///
/// Warnings never fail a sale; the order already exists and is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockWarning {
    /// Fewer units were available than the line requested. Stock was left untouched.
    Shortfall {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    /// The store could not be reached.
    Failed {
        product_id: ProductId,
        requested: u32,
        error: String,
    },
}

impl StockWarning {
    pub fn product_id(&self) -> &ProductId {
        match self {
            StockWarning::Shortfall { product_id, .. } | StockWarning::Failed { product_id, .. } => {
                product_id
            }
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            StockWarning::Shortfall { .. } => "insufficient",
            StockWarning::Failed { .. } => "error",
        }
    }
}

/// Per-product available stock.
#[derive(Debug, Clone)]
pub struct InventoryLedger<S> {
    store: S,
}

impl<S: InventoryStore> InventoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Decrements stock only if enough is available; never goes negative.
    pub async fn decrement_if_available(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> storage::Result<DecrementOutcome> {
        self.store.decrement_if_available(product_id, quantity).await
    }

    /// Returns the available quantity, zero for unknown products.
    pub async fn stock(&self, product_id: &ProductId) -> storage::Result<i64> {
        Ok(self
            .store
            .get_stock(product_id)
            .await?
            .map_or(0, |record| record.available))
    }

    /// Adds units to a product's stock and returns the new quantity.
    ///
    /// Safe to run alongside checkouts: the increment is applied by the
    /// store in one step.
    #[tracing::instrument(skip(self))]
    pub async fn restock(&self, product_id: &ProductId, quantity: u32) -> storage::Result<i64> {
        let available = self.store.increment_stock(product_id, quantity).await?;
        tracing::info!(%product_id, quantity, available, "stock replenished");
        Ok(available)
    }

    /// Decrements stock for every item of a committed order.
    ///
    /// Each line is attempted independently. Shortfalls and store errors are
    /// logged and returned as warnings; they never abort the sale.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn settle(&self, items: &[OrderItem]) -> Vec<StockWarning> {
        let mut warnings = Vec::new();

        for item in items {
            let warning = match self
                .store
                .decrement_if_available(&item.product_id, item.quantity)
                .await
            {
                Ok(DecrementOutcome::Applied { remaining }) => {
                    tracing::debug!(product_id = %item.product_id, remaining, "stock decremented");
                    continue;
                }
                Ok(DecrementOutcome::Insufficient { available }) => StockWarning::Shortfall {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available,
                },
                Err(e) => StockWarning::Failed {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    error: e.to_string(),
                },
            };

            metrics::counter!("stock_warnings_total", "reason" => warning.reason()).increment(1);
            tracing::warn!(
                order_id = %item.order_id,
                product_id = %item.product_id,
                requested = item.quantity,
                ?warning,
                "stock warning"
            );
            warnings.push(warning);
        }

        warnings
    }
}
