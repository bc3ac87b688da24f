//! Order fulfillment for the storefront and the POS terminal.
//!
//! [`OrderFulfillmentCoordinator`] commits a paid sale in a fixed sequence:
//! 1. Validate the request (nothing is written on failure)
//! 2. Insert the order row
//! 3. Insert every order item, all or none
//! 4. Decrement stock per item through the [`InventoryLedger`]
//! 5. Accrue loyalty points through the [`LoyaltyAccrualEngine`]
//! 6. Notify marketing, accounting and shipping through the [`IntegrationSyncDispatcher`]
//!
//! Steps 4 to 6 are best-effort: their failures are logged and recorded but
//! never undo the sale.

pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod loyalty;
pub mod order_fulfillment;
pub mod services;

pub use coordinator::OrderFulfillmentCoordinator;
pub use dispatch::{DEFAULT_SYNC_TIMEOUT, IntegrationSyncDispatcher, SyncMode, build_payload};
pub use error::{CheckoutError, IntegrationError};
pub use inventory::{InventoryLedger, StockWarning};
pub use loyalty::LoyaltyAccrualEngine;
pub use services::{InMemoryIntegration, IntegrationClient, WebhookIntegration};
