use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, Money, OrderId, ProductId};
use domain::{
    AccrualOutcome, CustomerContact, DecrementOutcome, InventoryRecord, LoyaltyAccount,
    LoyaltyTier, Order, OrderItem, OrderStatus, OrderTotals, SyncLogEntry, SyncStatus,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderQuery, Result, StorageError,
    store::{InventoryStore, LoyaltyStore, OrderStore, SyncLogStore},
};

const ORDER_COLUMNS: &str = "id, account_id, channel, customer_name, customer_email, \
    customer_phone, shipping_address, billing_address, subtotal_cents, tax_cents, \
    shipping_cents, discount_cents, total_cents, status, payment_method, payment_status, \
    transaction_id, marketing_opt_in, notes, created_at";

/// Tier for a point total: highest threshold reached, ties broken by name.
const RESOLVE_TIER_FOR_POINTS: &str =
    "SELECT name FROM loyalty_tiers WHERE min_points <= $2 ORDER BY min_points DESC, name ASC LIMIT 1";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            account_id: row
                .try_get::<Option<Uuid>, _>("account_id")?
                .map(AccountId::from_uuid),
            channel: row.try_get::<String, _>("channel")?.parse()?,
            customer: CustomerContact {
                name: row.try_get("customer_name")?,
                email: row.try_get("customer_email")?,
                phone: row.try_get("customer_phone")?,
            },
            shipping_address: serde_json::from_value(row.try_get("shipping_address")?)?,
            billing_address: serde_json::from_value(row.try_get("billing_address")?)?,
            totals: OrderTotals {
                subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
                tax: Money::from_cents(row.try_get("tax_cents")?),
                shipping: Money::from_cents(row.try_get("shipping_cents")?),
                discount: Money::from_cents(row.try_get("discount_cents")?),
                total: Money::from_cents(row.try_get("total_cents")?),
            },
            status: row.try_get::<String, _>("status")?.parse()?,
            payment_method: row.try_get("payment_method")?,
            payment_status: row.try_get::<String, _>("payment_status")?.parse()?,
            transaction_id: row.try_get("transaction_id")?,
            marketing_opt_in: row.try_get("marketing_opt_in")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity: row.try_get::<i32, _>("quantity")?.max(0) as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            product_name: row.try_get("product_name")?,
            product_image: row.try_get("product_image")?,
        })
    }

    fn row_to_tier(row: PgRow) -> Result<LoyaltyTier> {
        let benefits: serde_json::Value = row.try_get("benefits")?;
        Ok(LoyaltyTier {
            name: row.try_get("name")?,
            min_points: row.try_get("min_points")?,
            discount_percent: row.try_get::<i16, _>("discount_percent")?.clamp(0, 100) as u8,
            benefits: serde_json::from_value(benefits)?,
        })
    }

    fn row_to_account(row: &PgRow) -> Result<LoyaltyAccount> {
        Ok(LoyaltyAccount {
            account_id: AccountId::from_uuid(row.try_get::<Uuid, _>("account_id")?),
            points: row.try_get("points")?,
            tier: row.try_get("tier_name")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_sync_entry(row: PgRow) -> Result<SyncLogEntry> {
        Ok(SyncLogEntry {
            id: row.try_get("id")?,
            target: row.try_get::<String, _>("target")?.parse()?,
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            status: row.try_get::<String, _>("status")?.parse()?,
            payload: row.try_get("payload")?,
            error: row.try_get("error")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, account_id, channel, customer_name, customer_email, customer_phone,
                shipping_address, billing_address, subtotal_cents, tax_cents, shipping_cents,
                discount_cents, total_cents, status, payment_method, payment_status,
                transaction_id, marketing_opt_in, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.account_id.map(|id| id.as_uuid()))
        .bind(order.channel.as_str())
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.phone)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(serde_json::to_value(&order.billing_address)?)
        .bind(order.totals.subtotal.cents())
        .bind(order.totals.tax.cents())
        .bind(order.totals.shipping.cents())
        .bind(order.totals.discount.cents())
        .bind(order.totals.total.cents())
        .bind(order.status.as_str())
        .bind(&order.payment_method)
        .bind(order.payment_status.as_str())
        .bind(&order.transaction_id)
        .bind(order.marketing_opt_in)
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StorageError::DuplicateOrder(order.id);
            }
            StorageError::Database(e)
        })?;

        Ok(())
    }

    async fn insert_order_items(&self, items: &[OrderItem]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, product_id, quantity, unit_price_cents, subtotal_cents,
                    product_name, product_image
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_str())
            .bind(i32::try_from(item.quantity).map_err(|_| {
                StorageError::QuantityOutOfRange {
                    product_id: item.product_id.clone(),
                }
            })?)
            .bind(item.unit_price.cents())
            .bind(item.subtotal.cents())
            .bind(&item.product_name)
            .bind(&item.product_image)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return StorageError::OrderNotFound(item.order_id);
                }
                StorageError::Database(e)
            })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE orders SET status = $2, notes = COALESCE($3, notes) WHERE id = $1")
                .bind(order_id.as_uuid())
                .bind(status.as_str())
                .bind(notes)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::OrderNotFound(order_id));
        }
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents, subtotal_cents,
                   product_name, product_image
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.account_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND account_id = ${param_count}"));
        }
        if query.channel.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND channel = ${param_count}"));
        }
        if query.from_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.to_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(account_id) = query.account_id {
            sqlx_query = sqlx_query.bind(account_id.as_uuid());
        }
        if let Some(channel) = query.channel {
            sqlx_query = sqlx_query.bind(channel.as_str());
        }
        if let Some(from_ts) = query.from_timestamp {
            sqlx_query = sqlx_query.bind(from_ts);
        }
        if let Some(to_ts) = query.to_timestamp {
            sqlx_query = sqlx_query.bind(to_ts);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn decrement_if_available(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<DecrementOutcome> {
        let wanted = i64::from(quantity);

        // Check and write in one statement; the row lock serializes racers
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory
            SET available = available - $2, updated_at = NOW()
            WHERE product_id = $1 AND available >= $2
            RETURNING available
            "#,
        )
        .bind(product_id.as_str())
        .bind(wanted)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(DecrementOutcome::Applied { remaining });
        }

        let available: Option<i64> =
            sqlx::query_scalar("SELECT available FROM inventory WHERE product_id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(DecrementOutcome::Insufficient {
            available: available.unwrap_or(0),
        })
    }

    async fn get_stock(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>> {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT available FROM inventory WHERE product_id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(available.map(|available| InventoryRecord {
            product_id: product_id.clone(),
            available,
        }))
    }

    async fn set_stock(&self, product_id: &ProductId, available: i64) -> Result<()> {
        if available < 0 {
            return Err(StorageError::NegativeStock {
                product_id: product_id.clone(),
                available,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, available, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (product_id) DO UPDATE SET
                available = EXCLUDED.available,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product_id.as_str())
        .bind(available)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_stock(&self, product_id: &ProductId, quantity: u32) -> Result<i64> {
        // Adds to the locked row's current value, never to a value read earlier
        let available: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO inventory (product_id, available, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (product_id) DO UPDATE SET
                available = inventory.available + EXCLUDED.available,
                updated_at = EXCLUDED.updated_at
            RETURNING available
            "#,
        )
        .bind(product_id.as_str())
        .bind(i64::from(quantity))
        .fetch_one(&self.pool)
        .await?;

        Ok(available)
    }
}

#[async_trait]
impl LoyaltyStore for PostgresStore {
    async fn list_tiers(&self) -> Result<Vec<LoyaltyTier>> {
        let rows = sqlx::query(
            r#"
            SELECT name, min_points, discount_percent, benefits
            FROM loyalty_tiers
            ORDER BY min_points ASC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_tier).collect()
    }

    async fn upsert_tier(&self, tier: &LoyaltyTier) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_tiers (name, min_points, discount_percent, benefits)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET
                min_points = EXCLUDED.min_points,
                discount_percent = EXCLUDED.discount_percent,
                benefits = EXCLUDED.benefits
            "#,
        )
        .bind(&tier.name)
        .bind(tier.min_points)
        .bind(i16::from(tier.discount_percent))
        .bind(serde_json::to_value(&tier.benefits)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<LoyaltyAccount>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, points, tier_name, updated_at
            FROM loyalty_accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    async fn accrue_points(&self, account_id: AccountId, points: i64) -> Result<AccrualOutcome> {
        // The upsert takes the row lock, adds the points and resolves the
        // tier against the post-increment total in a single statement.
        // The previous tier is resolved from the locked row's points minus
        // this accrual. `xmax = 0` marks a fresh insert, which has none.
        let sql = format!(
            r#"
            WITH upserted AS (
                INSERT INTO loyalty_accounts (account_id, points, tier_name, updated_at)
                VALUES ($1, $2, ({RESOLVE_TIER_FOR_POINTS}), NOW())
                ON CONFLICT (account_id) DO UPDATE SET
                    points = loyalty_accounts.points + EXCLUDED.points,
                    tier_name = (
                        SELECT name FROM loyalty_tiers
                        WHERE min_points <= loyalty_accounts.points + EXCLUDED.points
                        ORDER BY min_points DESC, name ASC
                        LIMIT 1
                    ),
                    updated_at = NOW()
                RETURNING account_id, points, tier_name, updated_at, (xmax = 0) AS inserted
            )
            SELECT upserted.account_id, upserted.points, upserted.tier_name, upserted.updated_at,
                   CASE WHEN upserted.inserted THEN NULL ELSE (
                       SELECT name FROM loyalty_tiers
                       WHERE min_points <= upserted.points - $2
                       ORDER BY min_points DESC, name ASC
                       LIMIT 1
                   ) END AS previous_tier
            FROM upserted
            "#
        );

        let row = sqlx::query(&sql)
            .bind(account_id.as_uuid())
            .bind(points)
            .fetch_one(&self.pool)
            .await?;

        Ok(AccrualOutcome {
            account: Self::row_to_account(&row)?,
            points_added: points,
            previous_tier: row.try_get("previous_tier")?,
        })
    }
}

#[async_trait]
impl SyncLogStore for PostgresStore {
    async fn append_sync_entry(&self, entry: &SyncLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_log (id, target, order_id, status, payload, error, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.target.as_str())
        .bind(entry.order_id.as_uuid())
        .bind(entry.status.as_str())
        .bind(&entry.payload)
        .bind(&entry.error)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sync_entries_for_order(&self, order_id: OrderId) -> Result<Vec<SyncLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, target, order_id, status, payload, error, created_at
            FROM sync_log
            WHERE order_id = $1
            ORDER BY created_at ASC, target ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_sync_entry).collect()
    }

    async fn failed_sync_entries(&self, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, target, order_id, status, payload, error, created_at
            FROM sync_log
            WHERE status = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(SyncStatus::FailedTrigger.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_sync_entry).collect()
    }
}
