//! # Cart
//!
//! Shopping carts and their derived views.
//!
//! A customer has at most one cart that is not `Closed`. Carts do not
//! reserve stock; availability is checked when lines change and again at
//! checkout.

use crate::money::Money;
use crate::types::{CartId, CustomerKey, ProductId, Timestamp, VariantId, VendorId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// No lines.
    Empty,
    /// Has at least one line.
    Open,
    /// Checked out; immutable.
    Closed,
}

impl CartStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// A line in a cart. One line per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub customer: CustomerKey,
    pub lines: Vec<CartLine>,
    pub status: CartStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    pub(crate) fn new(id: CartId, customer: CustomerKey, now: Timestamp) -> Self {
        Self {
            id,
            customer,
            lines: Vec::new(),
            status: CartStatus::Empty,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == CartStatus::Closed
    }

    /// Quantity of `variant` currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, variant: VariantId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.variant_id == variant)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Total number of items across lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Set a line's quantity; zero removes it. Keeps status in sync with lines.
    pub(crate) fn set_line(&mut self, variant: VariantId, quantity: u32, now: Timestamp) {
        if quantity == 0 {
            self.lines.retain(|l| l.variant_id != variant);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant) {
            line.quantity = quantity;
        } else {
            self.lines.push(CartLine {
                variant_id: variant,
                quantity,
            });
        }
        self.refresh_status();
        self.updated_at = now;
    }

    pub(crate) fn clear(&mut self, now: Timestamp) {
        self.lines.clear();
        self.refresh_status();
        self.updated_at = now;
    }

    pub(crate) fn close(&mut self, now: Timestamp) {
        self.status = CartStatus::Closed;
        self.updated_at = now;
    }

    fn refresh_status(&mut self) {
        self.status = if self.lines.is_empty() {
            CartStatus::Empty
        } else {
            CartStatus::Open
        };
    }
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineView {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    /// Stock now; may be lower than `quantity` if it sold out meanwhile.
    pub available: u32,
}

/// Lines of one vendor within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorGroup {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub lines: Vec<CartLineView>,
    pub subtotal: Money,
}

/// Priced cart, grouped by vendor in ascending vendor id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: CartId,
    pub customer: CustomerKey,
    pub status: CartStatus,
    pub groups: Vec<VendorGroup>,
    pub item_count: u64,
    pub subtotal: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(CartId(1), CustomerKey::new("c").unwrap(), 10)
    }

    #[test]
    fn new_cart_is_empty() {
        let c = cart();
        assert_eq!(c.status, CartStatus::Empty);
        assert_eq!(c.item_count(), 0);
    }

    #[test]
    fn set_line_adds_updates_and_removes() {
        let mut c = cart();
        c.set_line(VariantId(5), 2, 11);
        assert_eq!(c.status, CartStatus::Open);
        assert_eq!(c.quantity_of(VariantId(5)), 2);

        c.set_line(VariantId(5), 4, 12);
        assert_eq!(c.lines.len(), 1);
        assert_eq!(c.item_count(), 4);

        c.set_line(VariantId(5), 0, 13);
        assert_eq!(c.status, CartStatus::Empty);
        assert_eq!(c.updated_at, 13);
    }

    #[test]
    fn clear_empties_cart() {
        let mut c = cart();
        c.set_line(VariantId(1), 1, 11);
        c.set_line(VariantId(2), 1, 11);
        c.clear(12);
        assert!(c.lines.is_empty());
        assert_eq!(c.status, CartStatus::Empty);
    }
}
