//! Inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::InventoryRecord;
use serde::Deserialize;
use storage::StorefrontStore;

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

/// GET /inventory/{product_id}: read a product's available stock.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
) -> Result<Json<InventoryRecord>, ApiError> {
    state
        .store
        .get_stock(&ProductId::new(product_id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No stock record for {product_id}")))
}

/// POST /inventory/{product_id}/restock: add units to a product's stock.
#[tracing::instrument(skip(state, req))]
pub async fn restock<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<String>,
    Json(req): Json<RestockRequest>,
) -> Result<Json<InventoryRecord>, ApiError> {
    if req.quantity == 0 {
        return Err(ApiError::BadRequest(
            "Restock quantity must be greater than 0".to_string(),
        ));
    }

    let product_id = ProductId::new(product_id);
    let available = state
        .coordinator
        .inventory()
        .restock(&product_id, req.quantity)
        .await?;

    Ok(Json(InventoryRecord {
        product_id,
        available,
    }))
}
