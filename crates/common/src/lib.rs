//! Shared identifier and money types used across the storefront crates.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{AccountId, OrderId, ProductId};
