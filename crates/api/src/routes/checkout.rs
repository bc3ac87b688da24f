//! Online checkout and POS sale endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{AccountId, Money};
use domain::{
    Cart, CartLine, CheckoutRequest, CustomerContact, Order, PosPaymentMethod, PosSaleRequest,
};
use fulfillment::CheckoutError;
use serde::{Deserialize, Serialize};
use storage::StorefrontStore;

use super::orders::AppState;
use crate::error::ApiError;

// -- Request types --

/// A terminal sale as rung up by staff. Totals are priced server-side.
#[derive(Deserialize)]
pub struct PosSaleBody {
    #[serde(default)]
    pub account_id: Option<AccountId>,
    pub customer: CustomerContact,
    pub items: Vec<CartLine>,
    pub payment_method: PosPaymentMethod,
    #[serde(default)]
    pub amount_received: Option<Money>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub marketing_opt_in: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct PosSaleResponse {
    pub order: Order,
    pub change_due: Option<Money>,
}

// -- Handlers --

/// POST /checkout: commit a paid online checkout.
#[tracing::instrument(skip(state, request))]
pub async fn checkout<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.coordinator.checkout(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /pos/sales: price and commit a terminal sale.
#[tracing::instrument(skip(state, body))]
pub async fn pos_sale<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<PosSaleBody>,
) -> Result<(StatusCode, Json<PosSaleResponse>), ApiError> {
    let cart = Cart::from_lines(body.items).map_err(CheckoutError::from)?;
    let totals = cart
        .totals(
            state.pos_tax_rate_bps,
            Money::zero(),
            body.discount.unwrap_or_else(Money::zero),
        )
        .map_err(CheckoutError::from)?;
    let request = PosSaleRequest {
        account_id: body.account_id,
        customer: body.customer,
        items: cart.into_lines(),
        totals,
        payment_method: body.payment_method,
        amount_received: body.amount_received,
        marketing_opt_in: body.marketing_opt_in,
    };
    let change_due = request.change_due();

    let order = state.coordinator.pos_sale(request).await?;
    Ok((StatusCode::CREATED, Json(PosSaleResponse { order, change_due })))
}
