//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Registers descriptions for the counters and histograms the fulfillment
/// pipeline records, so they render with help text before first use.
pub fn describe() {
    metrics::describe_counter!("checkouts_total", "Checkout attempts by channel and outcome");
    metrics::describe_histogram!(
        "checkout_duration_seconds",
        metrics::Unit::Seconds,
        "Time to commit an order, syncs included when inline"
    );
    metrics::describe_counter!("stock_warnings_total", "Order lines whose stock could not be decremented");
    metrics::describe_counter!("sync_attempts_total", "Downstream sync attempts by target and status");
    metrics::describe_counter!("loyalty_accruals_total", "Loyalty point accruals applied");
    metrics::describe_counter!("loyalty_promotions_total", "Accruals that moved an account to a new tier");
}

/// GET /metrics: returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
}
