//! Cart arithmetic.

use common::{Money, ProductId};

use crate::checkout::{CartLine, OrderTotals, lines_subtotal};
use crate::error::ValidationError;

/// An ordered set of cart lines, one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart, merging lines that name the same product.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, ValidationError> {
        let mut cart = Self::new();
        for line in lines {
            cart.add(line)?;
        }
        Ok(cart)
    }

    /// Adds a line. Adding a product already in the cart increases its
    /// quantity and keeps the first price/name snapshot.
    ///
    /// Fails without changing the cart if the merged quantity overflows.
    pub fn add(&mut self, line: CartLine) -> Result<(), ValidationError> {
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or(
                    ValidationError::AmountOverflow {
                        field: "line quantity",
                    },
                )?;
            }
            None => self.lines.push(line),
        }
        Ok(())
    }

    /// Removes a product. Returns the removed line, if it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|line| &line.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Result<Money, ValidationError> {
        lines_subtotal(&self.lines)
    }

    /// Prices the cart with a tax rate in basis points applied to the
    /// subtotal after discount.
    pub fn totals(
        &self,
        tax_rate_bps: u32,
        shipping: Money,
        discount: Money,
    ) -> Result<OrderTotals, ValidationError> {
        let subtotal = self.subtotal()?;
        let taxable = subtotal
            .checked_sub(discount)
            .ok_or(ValidationError::AmountOverflow { field: "discount" })?;
        let tax = if taxable.is_negative() {
            Money::zero()
        } else {
            taxable.apply_basis_points(tax_rate_bps)
        };
        let mut totals = OrderTotals {
            subtotal,
            tax,
            shipping,
            discount,
            total: Money::zero(),
        };
        totals.total = totals.expected_total()?;
        Ok(totals)
    }
}
