//! Value objects for the order domain.

use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::checkout::CartLine;
use crate::error::DomainError;

/// Where a sale was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    Online,
    Pos,
}

impl OrderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderChannel::Online => "online",
            OrderChannel::Pos => "pos",
        }
    }
}

impl std::str::FromStr for OrderChannel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(OrderChannel::Online),
            "pos" => Ok(OrderChannel::Pos),
            other => Err(DomainError::UnknownVariant {
                kind: "order channel",
                value: other.to_string(),
            }),
        }
    }
}

/// Settlement status of an order's payment.
///
/// The coordinator only records `Paid`: funds are captured before it runs.
/// Refunds are recorded by back-office tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::UnknownVariant {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

/// A purchased line, frozen at the moment of sale.
///
/// Name and image are copied from the cart snapshot so later catalog edits
/// or deletions do not change what the order shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    pub product_name: String,
    pub product_image: Option<String>,
}

impl OrderItem {
    /// Builds the item row for a cart line.
    pub fn from_line(order_id: OrderId, line: &CartLine) -> Self {
        Self {
            order_id,
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal(),
            product_name: line.name.clone(),
            product_image: line.image.clone(),
        }
    }
}
