//! Checkout and point-of-sale request types.
//!
//! Both request types carry a cart snapshot captured at add-to-cart time
//! together with the totals the buyer agreed to. The coordinator trusts the
//! snapshot and only checks it for internal consistency.

use common::{AccountId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Marker stored in every address field of an in-store sale.
pub const IN_STORE: &str = "in-store";

/// A postal address snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Returns the fixed address recorded for point-of-sale orders.
    pub fn in_store() -> Self {
        Self {
            line1: IN_STORE.to_string(),
            line2: None,
            city: IN_STORE.to_string(),
            state: String::new(),
            postal_code: IN_STORE.to_string(),
            country: IN_STORE.to_string(),
        }
    }

    /// Returns true if this is the in-store marker address.
    pub fn is_in_store(&self) -> bool {
        self.line1 == IN_STORE
    }

    /// Returns the first required field that is blank, if any.
    ///
    /// `line2` and `state` are optional.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    fn validate(&self, address: &'static str) -> Result<(), ValidationError> {
        match self.missing_field() {
            Some(field) => Err(ValidationError::IncompleteAddress { address, field }),
            None => Ok(()),
        }
    }
}

/// Buyer contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerContact {
    /// Creates a contact without a phone number.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
        }
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingCustomerName);
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingCustomerEmail);
        }
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            return Err(ValidationError::MalformedEmail(email.to_string()));
        }
        Ok(())
    }
}

/// One cart line as captured from the catalog when it was added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartLine {
    /// Creates a cart line without an image.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
            name: name.into(),
            image: None,
        }
    }

    /// Sets the image snapshot.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Returns unit price times quantity.
    ///
    /// Only call on validated lines; see [`CartLine::checked_subtotal`].
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Returns unit price times quantity, or `AmountOverflow`.
    pub fn checked_subtotal(&self) -> Result<Money, ValidationError> {
        self.unit_price
            .checked_multiply(self.quantity)
            .ok_or(ValidationError::AmountOverflow {
                field: "line subtotal",
            })
    }
}

/// Largest quantity a single cart line may carry.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Sums line subtotals, failing instead of overflowing.
pub(crate) fn lines_subtotal(lines: &[CartLine]) -> Result<Money, ValidationError> {
    let mut subtotal = Money::zero();
    for line in lines {
        subtotal = subtotal
            .checked_add(line.checked_subtotal()?)
            .ok_or(ValidationError::AmountOverflow { field: "subtotal" })?;
    }
    Ok(subtotal)
}

fn validate_lines(lines: &[CartLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    for line in lines {
        if line.quantity == 0 {
            return Err(ValidationError::InvalidQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            });
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::QuantityTooLarge {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                max: MAX_LINE_QUANTITY,
            });
        }
        if line.unit_price.is_negative() {
            return Err(ValidationError::NegativePrice {
                product_id: line.product_id.clone(),
                price: line.unit_price,
            });
        }
        line.checked_subtotal()?;
    }
    Ok(())
}

/// Money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Computes consistent totals for a set of lines.
    pub fn compute(lines: &[CartLine], tax: Money, shipping: Money, discount: Money) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::subtotal).sum();
        Self {
            subtotal,
            tax,
            shipping,
            discount,
            total: subtotal + tax + shipping - discount,
        }
    }

    /// Returns subtotal + tax + shipping - discount, or `AmountOverflow`.
    pub fn expected_total(&self) -> Result<Money, ValidationError> {
        self.subtotal
            .checked_add(self.tax)
            .and_then(|m| m.checked_add(self.shipping))
            .and_then(|m| m.checked_sub(self.discount))
            .ok_or(ValidationError::AmountOverflow { field: "total" })
    }

    /// Checks that the totals agree with the lines they claim to price.
    pub fn check(&self, lines: &[CartLine]) -> Result<(), ValidationError> {
        for (field, amount) in [
            ("subtotal", self.subtotal),
            ("tax", self.tax),
            ("shipping", self.shipping),
            ("discount", self.discount),
            ("total", self.total),
        ] {
            if amount.is_negative() {
                return Err(ValidationError::NegativeAmount { field });
            }
        }

        let lines_subtotal = lines_subtotal(lines)?;
        if lines_subtotal != self.subtotal {
            return Err(ValidationError::SubtotalMismatch {
                expected: lines_subtotal,
                actual: self.subtotal,
            });
        }

        let expected = self.expected_total()?;
        if expected != self.total {
            return Err(ValidationError::TotalMismatch {
                expected,
                actual: self.total,
            });
        }
        Ok(())
    }
}

/// Proof of payment handed back by the payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub provider: String,
    pub transaction_id: String,
}

impl PaymentConfirmation {
    pub fn new(provider: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            transaction_id: transaction_id.into(),
        }
    }
}

/// A finalized, payment-confirmed online checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Set when the buyer is signed in.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    pub customer: CustomerContact,
    pub shipping_address: Address,
    /// `None` means billing is the same as shipping.
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub items: Vec<CartLine>,
    pub totals: OrderTotals,
    #[serde(default)]
    pub marketing_opt_in: bool,
    pub payment: PaymentConfirmation,
}

impl CheckoutRequest {
    /// Checks every field required to commit the checkout.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.customer.validate()?;
        self.shipping_address.validate("shipping")?;
        if let Some(billing) = &self.billing_address
            && billing != &self.shipping_address
        {
            billing.validate("billing")?;
        }
        validate_lines(&self.items)?;
        self.totals.check(&self.items)?;
        if self.payment.transaction_id.trim().is_empty() {
            return Err(ValidationError::MissingTransactionId);
        }
        Ok(())
    }

    /// Returns the billing address, falling back to shipping.
    pub fn billing_or_shipping(&self) -> &Address {
        self.billing_address
            .as_ref()
            .unwrap_or(&self.shipping_address)
    }
}

/// How a point-of-sale sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosPaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PosPaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosPaymentMethod::Cash => "cash",
            PosPaymentMethod::Card => "card",
            PosPaymentMethod::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for PosPaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sale rung up at a staffed terminal, already settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosSaleRequest {
    #[serde(default)]
    pub account_id: Option<AccountId>,
    pub customer: CustomerContact,
    pub items: Vec<CartLine>,
    pub totals: OrderTotals,
    pub payment_method: PosPaymentMethod,
    /// Cash handed over by the customer, when known.
    #[serde(default)]
    pub amount_received: Option<Money>,
    #[serde(default)]
    pub marketing_opt_in: bool,
}

impl PosSaleRequest {
    /// Checks every field required to commit the sale.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.customer.validate()?;
        validate_lines(&self.items)?;
        self.totals.check(&self.items)?;
        if self.payment_method == PosPaymentMethod::Cash
            && let Some(received) = self.amount_received
            && received < self.totals.total
        {
            return Err(ValidationError::InsufficientTender {
                total: self.totals.total,
                received,
            });
        }
        Ok(())
    }

    /// Change owed for a cash sale with a recorded amount received.
    pub fn change_due(&self) -> Option<Money> {
        match (self.payment_method, self.amount_received) {
            (PosPaymentMethod::Cash, Some(received)) => Some(change_due(received, self.totals.total)),
            _ => None,
        }
    }
}

/// Returns `amount_received - total`; negative when the tender is short.
pub fn change_due(amount_received: Money, total: Money) -> Money {
    amount_received - total
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn address() -> Address {
        Address {
            line1: "12 Market St".to_string(),
            line2: None,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    fn lines() -> Vec<CartLine> {
        vec![
            CartLine::new("SKU-001", "Widget", 2, Money::from_cents(1000)),
            CartLine::new("SKU-002", "Gadget", 1, Money::from_cents(2500)),
        ]
    }

    fn request() -> CheckoutRequest {
        let items = lines();
        let totals = OrderTotals::compute(
            &items,
            Money::from_cents(360),
            Money::from_cents(500),
            Money::from_cents(200),
        );
        CheckoutRequest {
            account_id: None,
            customer: CustomerContact::new("Ada Lovelace", "ada@example.com"),
            shipping_address: address(),
            billing_address: None,
            items,
            totals,
            marketing_opt_in: false,
            payment: PaymentConfirmation::new("paypal", "TX-1"),
        }
    }

    fn pos_request(method: PosPaymentMethod, received: Option<Money>) -> PosSaleRequest {
        let items = lines();
        let totals = OrderTotals::compute(&items, Money::zero(), Money::zero(), Money::zero());
        PosSaleRequest {
            account_id: None,
            customer: CustomerContact::new("Walk In", "walkin@example.com"),
            items,
            totals,
            payment_method: method,
            amount_received: received,
            marketing_opt_in: false,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert_eq!(request().validate(), Ok(()));
    }

    #[test]
    fn test_missing_name_and_email() {
        let mut req = request();
        req.customer.name = "  ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::MissingCustomerName));

        let mut req = request();
        req.customer.email = String::new();
        assert_eq!(req.validate(), Err(ValidationError::MissingCustomerEmail));
    }

    #[test]
    fn test_malformed_email() {
        for bad in ["ada", "@example.com", "ada@", "ada@@example.com", "a da@example.com"] {
            let mut req = request();
            req.customer.email = bad.to_string();
            assert!(
                matches!(req.validate(), Err(ValidationError::MalformedEmail(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_shipping_city() {
        let mut req = request();
        req.shipping_address.city = String::new();
        assert_eq!(
            req.validate(),
            Err(ValidationError::IncompleteAddress {
                address: "shipping",
                field: "city",
            })
        );
    }

    #[test]
    fn test_billing_checked_only_when_different() {
        let mut req = request();
        req.billing_address = Some(address());
        assert_eq!(req.validate(), Ok(()));

        let mut billing = address();
        billing.postal_code = " ".to_string();
        req.billing_address = Some(billing);
        assert_eq!(
            req.validate(),
            Err(ValidationError::IncompleteAddress {
                address: "billing",
                field: "postal_code",
            })
        );
    }

    #[test]
    fn test_state_and_line2_are_optional() {
        let mut req = request();
        req.shipping_address.state = String::new();
        req.shipping_address.line2 = None;
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_empty_cart() {
        let mut req = request();
        req.items.clear();
        req.totals = OrderTotals::compute(&[], Money::zero(), Money::zero(), Money::zero());
        assert_eq!(req.validate(), Err(ValidationError::EmptyCart));
    }

    #[test]
    fn test_zero_quantity_line() {
        let mut req = request();
        req.items[0].quantity = 0;
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_totals_mismatch() {
        let mut req = request();
        req.totals.subtotal = Money::from_cents(1);
        assert!(matches!(
            req.validate(),
            Err(ValidationError::SubtotalMismatch { .. })
        ));

        let mut req = request();
        req.totals.total = req.totals.total + Money::from_cents(1);
        assert!(matches!(
            req.validate(),
            Err(ValidationError::TotalMismatch { .. })
        ));

        let mut req = request();
        req.totals.discount = Money::from_cents(-5);
        assert_eq!(
            req.validate(),
            Err(ValidationError::NegativeAmount { field: "discount" })
        );
    }

    #[test]
    fn test_missing_transaction_id() {
        let mut req = request();
        req.payment.transaction_id = String::new();
        assert_eq!(req.validate(), Err(ValidationError::MissingTransactionId));
    }

    #[test]
    fn test_billing_falls_back_to_shipping() {
        let req = request();
        assert_eq!(req.billing_or_shipping(), &req.shipping_address);
    }

    #[test]
    fn test_in_store_address() {
        let addr = Address::in_store();
        assert!(addr.is_in_store());
        assert_eq!(addr.missing_field(), None);
        assert!(!address().is_in_store());
    }

    #[test]
    fn test_pos_phone_optional() {
        let req = pos_request(PosPaymentMethod::Card, None);
        assert!(req.customer.phone.is_none());
        assert_eq!(req.validate(), Ok(()));
    }

    #[test]
    fn test_pos_cash_short_tender_rejected() {
        let req = pos_request(PosPaymentMethod::Cash, Some(Money::from_cents(100)));
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InsufficientTender { .. })
        ));
    }

    #[test]
    fn test_pos_change_due() {
        let req = pos_request(PosPaymentMethod::Cash, Some(Money::from_cents(5000)));
        assert_eq!(req.validate(), Ok(()));
        assert_eq!(req.change_due(), Some(Money::from_cents(500)));

        let card = pos_request(PosPaymentMethod::Card, Some(Money::from_cents(5000)));
        assert_eq!(card.change_due(), None);
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PosPaymentMethod::Transfer).unwrap();
        assert_eq!(json, "\"transfer\"");
    }

    #[test]
    fn test_line_subtotal_overflow_is_rejected() {
        let mut req = request();
        req.items = vec![CartLine::new("SKU-BIG", "Bulk", 3, Money::from_cents(i64::MAX / 2))];

        assert_eq!(
            req.validate(),
            Err(ValidationError::AmountOverflow {
                field: "line subtotal"
            })
        );
    }

    #[test]
    fn test_subtotal_overflow_across_lines_is_rejected() {
        let mut req = request();
        req.items = vec![
            CartLine::new("SKU-A", "Bulk", 1, Money::from_cents(i64::MAX)),
            CartLine::new("SKU-B", "Bulk", 1, Money::from_cents(1)),
        ];

        assert_eq!(
            req.validate(),
            Err(ValidationError::AmountOverflow { field: "subtotal" })
        );
    }

    #[test]
    fn test_stated_total_overflow_is_rejected() {
        let mut req = request();
        req.totals.tax = Money::from_cents(i64::MAX);
        req.totals.total = Money::from_cents(i64::MAX);

        assert_eq!(
            req.validate(),
            Err(ValidationError::AmountOverflow { field: "total" })
        );
    }

    #[test]
    fn test_quantity_above_item_limit_is_rejected() {
        let mut req = request();
        req.items[0].quantity = MAX_LINE_QUANTITY + 1;

        assert!(matches!(
            req.validate(),
            Err(ValidationError::QuantityTooLarge { quantity, max, .. })
                if quantity == MAX_LINE_QUANTITY + 1 && max == MAX_LINE_QUANTITY
        ));
    }

    proptest! {
        #[test]
        fn validation_never_panics_on_extreme_lines(
            quantity in any::<u32>(),
            price in any::<i64>(),
            total in any::<i64>(),
        ) {
            let mut req = request();
            req.items = vec![CartLine::new("SKU-X", "Item", quantity, Money::from_cents(price))];
            req.totals.subtotal = Money::from_cents(total);
            req.totals.total = Money::from_cents(total);
            let _ = req.validate();
        }
    }

    proptest! {
        #[test]
        fn computed_totals_always_check(
            quantities in proptest::collection::vec(1u32..20, 1..8),
            price in 0i64..100_000,
            tax in 0i64..10_000,
            shipping in 0i64..5_000,
            discount in 0i64..1_000,
        ) {
            let items: Vec<CartLine> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| CartLine::new(format!("SKU-{i}"), "Item", *q, Money::from_cents(price + i as i64)))
                .collect();
            let totals = OrderTotals::compute(
                &items,
                Money::from_cents(tax),
                Money::from_cents(shipping),
                Money::from_cents(discount),
            );
            prop_assume!(!totals.total.is_negative());
            prop_assert_eq!(totals.check(&items), Ok(()));
            let line_sum: Money = items.iter().map(CartLine::subtotal).sum();
            prop_assert_eq!(totals.total, line_sum + totals.tax + totals.shipping - totals.discount);
        }
    }
}
