//! Runtime selection of downstream integration clients.

use async_trait::async_trait;
use common::OrderId;
use fulfillment::{InMemoryIntegration, IntegrationClient, WebhookIntegration};

/// A sync target's client, chosen from configuration at startup.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// No URL configured: payloads are recorded in memory.
    Recording(InMemoryIntegration),
    /// Payloads are POSTed to a webhook.
    Webhook(WebhookIntegration),
}

impl Endpoint {
    /// Builds a webhook client for `url`, or a recording client when absent.
    pub fn from_url(url: Option<&str>, http: &reqwest::Client) -> Self {
        match url {
            Some(url) => Endpoint::Webhook(WebhookIntegration::with_client(http.clone(), url)),
            None => Endpoint::Recording(InMemoryIntegration::new()),
        }
    }

    /// Returns the recording client, if this endpoint is one.
    pub fn as_recording(&self) -> Option<&InMemoryIntegration> {
        match self {
            Endpoint::Recording(client) => Some(client),
            Endpoint::Webhook(_) => None,
        }
    }
}

#[async_trait]
impl IntegrationClient for Endpoint {
    async fn trigger(
        &self,
        order_id: OrderId,
        payload: &serde_json::Value,
    ) -> fulfillment::error::Result<()> {
        match self {
            Endpoint::Recording(client) => client.trigger(order_id, payload).await,
            Endpoint::Webhook(client) => client.trigger(order_id, payload).await,
        }
    }
}
