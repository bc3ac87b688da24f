//! The order record written by the fulfillment coordinator.

use chrono::{DateTime, Utc};
use common::{AccountId, Money, OrderId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderChannel, OrderItem, OrderStatus, PaymentStatus};
use crate::checkout::{Address, CheckoutRequest, CustomerContact, OrderTotals, PosSaleRequest};

/// Durable record of a completed or attempted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: Option<AccountId>,
    pub channel: OrderChannel,
    pub customer: CustomerContact,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub marketing_opt_in: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds the order row for a validated online checkout.
    pub fn online(request: &CheckoutRequest) -> Self {
        Self {
            id: OrderId::new(),
            account_id: request.account_id,
            channel: OrderChannel::Online,
            customer: request.customer.clone(),
            shipping_address: request.shipping_address.clone(),
            billing_address: request.billing_or_shipping().clone(),
            totals: request.totals,
            status: OrderStatus::Processing,
            payment_method: request.payment.provider.clone(),
            payment_status: PaymentStatus::Paid,
            transaction_id: request.payment.transaction_id.clone(),
            marketing_opt_in: request.marketing_opt_in,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Builds the order row for a validated terminal sale.
    ///
    /// The terminal settles payment itself, so the transaction id is minted
    /// locally.
    pub fn point_of_sale(request: &PosSaleRequest) -> Self {
        Self {
            id: OrderId::new(),
            account_id: request.account_id,
            channel: OrderChannel::Pos,
            customer: request.customer.clone(),
            shipping_address: Address::in_store(),
            billing_address: Address::in_store(),
            totals: request.totals,
            status: OrderStatus::Completed,
            payment_method: request.payment_method.as_str().to_string(),
            payment_status: PaymentStatus::Paid,
            transaction_id: format!("POS-{}", Uuid::new_v4()),
            marketing_opt_in: request.marketing_opt_in,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the stated total equals the item subtotals plus
    /// tax and shipping, minus discount.
    pub fn totals_match(&self, items: &[OrderItem]) -> bool {
        let items_subtotal: Money = items.iter().map(|i| i.subtotal).sum();
        self.totals.total
            == items_subtotal + self.totals.tax + self.totals.shipping - self.totals.discount
    }
}
