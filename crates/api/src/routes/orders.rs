//! Shared state and order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderId;
use domain::{Order, OrderItem, SyncLogEntry};
use fulfillment::OrderFulfillmentCoordinator;
use serde::Serialize;
use storage::{OrderQuery, StorefrontStore};

use crate::error::ApiError;
use crate::integrations::Endpoint;

/// Page size applied when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// The coordinator as wired by this server.
pub type Coordinator<S> = OrderFulfillmentCoordinator<S, Endpoint, Endpoint, Endpoint>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: StorefrontStore> {
    pub coordinator: Coordinator<S>,
    pub store: S,
    pub pos_tax_rate_bps: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// -- Handlers --

/// GET /orders: list orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let query = match query.limit {
        Some(_) => query,
        None => query.limit(DEFAULT_PAGE_SIZE),
    };
    Ok(Json(state.store.query_orders(query).await?))
}

/// GET /orders/{id}: load an order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    let items = state.store.get_order_items(order_id).await?;

    Ok(Json(OrderDetailResponse { order, items }))
}

/// GET /orders/{id}/sync-log: list an order's downstream sync attempts.
#[tracing::instrument(skip(state))]
pub async fn sync_log<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SyncLogEntry>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    if state.store.get_order(order_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Order {id} not found")));
    }

    Ok(Json(state.store.sync_entries_for_order(order_id).await?))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(OrderId::from(uuid))
}
