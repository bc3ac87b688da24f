//! HTTP route handlers.

pub mod checkout;
pub mod health;
pub mod inventory;
pub mod loyalty;
pub mod metrics;
pub mod orders;
