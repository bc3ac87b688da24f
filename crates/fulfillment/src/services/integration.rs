//! Integration client trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;

use crate::error::{IntegrationError, Result};

/// A downstream system notified once per committed order.
///
/// One implementation serves each target (marketing, accounting, shipping).
/// The dispatcher makes exactly one call per order and target; clients must
/// not retry on their own.
#[async_trait]
pub trait IntegrationClient: Send + Sync {
    /// Delivers the payload for an order.
    async fn trigger(&self, order_id: OrderId, payload: &serde_json::Value) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryIntegrationState {
    delivered: Vec<(OrderId, serde_json::Value)>,
    calls: usize,
    fail_on_trigger: bool,
    delay: Option<Duration>,
}

/// Recording integration client for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIntegration {
    state: Arc<RwLock<InMemoryIntegrationState>>,
}

impl InMemoryIntegration {
    /// Creates a new recording client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the client to refuse subsequent calls.
    pub fn set_fail_on_trigger(&self, fail: bool) {
        self.write().fail_on_trigger = fail;
    }

    /// Delays every call, to exercise dispatch timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.write().delay = delay;
    }

    /// Returns the number of calls received, failed ones included.
    pub fn call_count(&self) -> usize {
        self.read().calls
    }

    /// Returns the payloads delivered successfully, oldest first.
    pub fn delivered(&self) -> Vec<(OrderId, serde_json::Value)> {
        self.read().delivered.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryIntegrationState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryIntegrationState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IntegrationClient for InMemoryIntegration {
    async fn trigger(&self, order_id: OrderId, payload: &serde_json::Value) -> Result<()> {
        let delay = {
            let mut state = self.write();
            state.calls += 1;
            if state.fail_on_trigger {
                return Err(IntegrationError::Unavailable(
                    "Collaborator refused the request".to_string(),
                ));
            }
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.write().delivered.push((order_id, payload.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_deliveries() {
        let client = InMemoryIntegration::new();
        let order_id = OrderId::new();
        let payload = serde_json::json!({ "order_id": order_id });

        client.trigger(order_id, &payload).await.unwrap();

        assert_eq!(client.call_count(), 1);
        assert_eq!(client.delivered(), vec![(order_id, payload)]);
    }

    #[tokio::test]
    async fn test_fail_on_trigger() {
        let client = InMemoryIntegration::new();
        client.set_fail_on_trigger(true);

        let result = client
            .trigger(OrderId::new(), &serde_json::Value::Null)
            .await;

        assert!(matches!(result, Err(IntegrationError::Unavailable(_))));
        assert_eq!(client.call_count(), 1);
        assert!(client.delivered().is_empty());
    }
}
