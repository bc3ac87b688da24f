//! Loyalty read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::AccountId;
use domain::{LoyaltyAccount, LoyaltyTier};
use storage::StorefrontStore;

use super::orders::AppState;
use crate::error::ApiError;

/// GET /loyalty/tiers: list the tier ladder by threshold.
#[tracing::instrument(skip(state))]
pub async fn tiers<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<LoyaltyTier>>, ApiError> {
    Ok(Json(state.coordinator.loyalty().tiers().await?))
}

/// GET /loyalty/{account_id}: read an account's balance and tier.
#[tracing::instrument(skip(state))]
pub async fn account<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(account_id): Path<String>,
) -> Result<Json<LoyaltyAccount>, ApiError> {
    let uuid = uuid::Uuid::parse_str(&account_id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;

    state
        .coordinator
        .loyalty()
        .account(AccountId::from(uuid))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Loyalty account {account_id} not found")))
}
