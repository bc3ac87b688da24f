//! HTTP API server with observability for storefront order fulfillment.
//!
//! Exposes the checkout and POS commit operations plus read endpoints for
//! orders, sync logs, loyalty and inventory, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod integrations;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::LoyaltyTier;
use fulfillment::{IntegrationSyncDispatcher, OrderFulfillmentCoordinator};
use metrics_exporter_prometheus::PrometheusHandle;
use storage::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use integrations::Endpoint;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/checkout", post(routes::checkout::checkout::<S>))
        .route("/pos/sales", post(routes::checkout::pos_sale::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/sync-log", get(routes::orders::sync_log::<S>))
        .route("/loyalty/tiers", get(routes::loyalty::tiers::<S>))
        .route("/loyalty/{account_id}", get(routes::loyalty::account::<S>))
        .route("/inventory/{product_id}", get(routes::inventory::get::<S>))
        .route(
            "/inventory/{product_id}/restock",
            post(routes::inventory::restock::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state: coordinator, sync endpoints and pricing settings.
pub fn create_default_state<S: StorefrontStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let http = reqwest::Client::new();
    let marketing = Endpoint::from_url(config.marketing_webhook_url.as_deref(), &http);
    let accounting = Endpoint::from_url(config.accounting_webhook_url.as_deref(), &http);
    let shipping = Endpoint::from_url(config.shipping_webhook_url.as_deref(), &http);

    let dispatcher = IntegrationSyncDispatcher::new(store.clone(), marketing, accounting, shipping)
        .with_timeout(config.sync_timeout);
    let coordinator = OrderFulfillmentCoordinator::new(store.clone(), dispatcher)
        .with_sync_mode(config.sync_mode);

    Arc::new(AppState {
        coordinator,
        store,
        pos_tax_rate_bps: config.pos_tax_rate_bps,
    })
}

/// The tier ladder installed on a store that has none.
pub fn default_tiers() -> Vec<LoyaltyTier> {
    vec![
        LoyaltyTier::new("Bronze", 0, 0).with_benefits(["Member pricing"]),
        LoyaltyTier::new("Silver", 100, 5).with_benefits(["Member pricing", "Free shipping"]),
        LoyaltyTier::new("Gold", 500, 10).with_benefits([
            "Member pricing",
            "Free shipping",
            "Early access",
        ]),
    ]
}

/// Installs [`default_tiers`] when the store has no tiers yet.
pub async fn seed_default_tiers<S: StorefrontStore>(store: &S) -> storage::Result<()> {
    if !store.list_tiers().await?.is_empty() {
        return Ok(());
    }
    for tier in default_tiers() {
        store.upsert_tier(&tier).await?;
    }
    tracing::info!("seeded default loyalty tiers");
    Ok(())
}
