//! Downstream integration collaborators.

pub mod integration;
pub mod webhook;

pub use integration::{InMemoryIntegration, IntegrationClient};
pub use webhook::{ORDER_ID_HEADER, WebhookIntegration};
