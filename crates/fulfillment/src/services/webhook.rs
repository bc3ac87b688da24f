//! HTTP webhook integration client.

use async_trait::async_trait;
use common::OrderId;

use super::integration::IntegrationClient;
use crate::error::{IntegrationError, Result};

/// Header carrying the order id on every webhook call.
pub const ORDER_ID_HEADER: &str = "x-order-id";

/// Posts the sync payload as JSON to a fixed URL.
///
/// Any 2xx response counts as delivered. The dispatcher bounds each call
/// with its own timeout, so the client carries none.
#[derive(Debug, Clone)]
pub struct WebhookIntegration {
    http: reqwest::Client,
    url: String,
}

impl WebhookIntegration {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Shares a connection pool with other webhook clients.
    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl IntegrationClient for WebhookIntegration {
    async fn trigger(&self, order_id: OrderId, payload: &serde_json::Value) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .header(ORDER_ID_HEADER, order_id.to_string())
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    fn client(url: String) -> WebhookIntegration {
        // Loopback calls must not go through an ambient HTTP proxy
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        WebhookIntegration::with_client(http, url)
    }

    #[tokio::test]
    async fn test_posts_payload_with_order_header() {
        let received: Arc<Mutex<Vec<(String, serde_json::Value)>>> = Arc::default();
        let sink = received.clone();
        let router = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    let order = headers
                        .get(ORDER_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    sink.lock().unwrap().push((order, body));
                    StatusCode::ACCEPTED
                }
            }),
        );
        let client = client(serve(router).await);

        let order_id = OrderId::new();
        let payload = serde_json::json!({ "total": 1999 });
        client.trigger(order_id, &payload).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, order_id.to_string());
        assert_eq!(received[0].1, payload);
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let router = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let client = client(serve(router).await);

        let err = client
            .trigger(OrderId::new(), &serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            IntegrationError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(format!("http://{addr}/hook"));
        let err = client
            .trigger(OrderId::new(), &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, IntegrationError::Http(_)));
    }
}
