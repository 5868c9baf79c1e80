//! Cart operations.

use super::{Shop, bump};
use crate::cart::{Cart, CartLineView, CartView, VendorGroup};
use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::{MAX_CART_LINES, MAX_LINE_QUANTITY};
use crate::types::{CartId, CustomerKey, Timestamp, VariantId, VendorId};
use std::collections::BTreeMap;

impl Shop {
    /// The customer's open cart, created empty if they have none.
    pub fn cart_for(&mut self, customer: &CustomerKey, now: Timestamp) -> Result<CartId, ShopError> {
        if let Some(id) = self.open_carts.get(customer) {
            return Ok(*id);
        }
        let id = CartId(bump(&mut self.counters.cart)?);
        self.carts.insert(id, Cart::new(id, customer.clone(), now));
        self.open_carts.insert(customer.clone(), id);
        Ok(id)
    }

    /// Add `quantity` of a variant, merging with an existing line.
    pub fn add_to_cart(
        &mut self,
        customer: &CustomerKey,
        variant: VariantId,
        quantity: u32,
        now: Timestamp,
    ) -> Result<CartId, ShopError> {
        if quantity == 0 {
            return Err(ShopError::validation("quantity", "must be at least 1"));
        }
        let current = self
            .open_cart_of(customer)
            .map(|c| c.quantity_of(variant))
            .unwrap_or(0);
        let wanted = current.checked_add(quantity).ok_or(ShopError::Overflow)?;
        self.set_cart_quantity(customer, variant, wanted, now)
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn update_cart_line(
        &mut self,
        customer: &CustomerKey,
        variant: VariantId,
        quantity: u32,
        now: Timestamp,
    ) -> Result<CartId, ShopError> {
        if quantity == 0 {
            return self.remove_from_cart(customer, variant, now);
        }
        if self
            .open_cart_of(customer)
            .is_none_or(|c| c.quantity_of(variant) == 0)
        {
            return Err(ShopError::not_found("cart line", variant));
        }
        self.set_cart_quantity(customer, variant, quantity, now)
    }

    /// Remove a variant's line from the cart.
    pub fn remove_from_cart(
        &mut self,
        customer: &CustomerKey,
        variant: VariantId,
        now: Timestamp,
    ) -> Result<CartId, ShopError> {
        let id = *self
            .open_carts
            .get(customer)
            .ok_or_else(|| ShopError::not_found("cart for customer", customer))?;
        let cart = self
            .carts
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found("cart", id))?;
        if cart.quantity_of(variant) == 0 {
            return Err(ShopError::not_found("cart line", variant));
        }
        cart.set_line(variant, 0, now);
        Ok(id)
    }

    /// Remove every line. A customer without a cart gets an empty one.
    pub fn clear_cart(&mut self, customer: &CustomerKey, now: Timestamp) -> Result<CartId, ShopError> {
        let id = self.cart_for(customer, now)?;
        if let Some(cart) = self.carts.get_mut(&id) {
            cart.clear(now);
        }
        Ok(id)
    }

    fn set_cart_quantity(
        &mut self,
        customer: &CustomerKey,
        variant: VariantId,
        quantity: u32,
        now: Timestamp,
    ) -> Result<CartId, ShopError> {
        if quantity > MAX_LINE_QUANTITY {
            return Err(ShopError::validation(
                "quantity",
                format!("at most {MAX_LINE_QUANTITY} per line"),
            ));
        }
        let stock = self.sellable(variant)?.0.stock;
        if quantity > stock {
            return Err(ShopError::InsufficientStock {
                variant: variant.0,
                requested: quantity,
                available: stock,
            });
        }
        if let Some(cart) = self.open_cart_of(customer) {
            if cart.quantity_of(variant) == 0 && cart.lines.len() >= MAX_CART_LINES {
                return Err(ShopError::validation(
                    "cart",
                    format!("at most {MAX_CART_LINES} different items"),
                ));
            }
        }

        let id = self.cart_for(customer, now)?;
        let cart = self
            .carts
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found("cart", id))?;
        if cart.is_closed() {
            return Err(ShopError::CartClosed(id.0));
        }
        cart.set_line(variant, quantity, now);
        Ok(id)
    }

    /// Priced view of the customer's open cart, grouped by vendor.
    pub fn cart_view(&mut self, customer: &CustomerKey, now: Timestamp) -> Result<CartView, ShopError> {
        let id = self.cart_for(customer, now)?;
        self.price_cart(id)
    }

    /// Price any cart (including closed ones) against the current catalog.
    pub fn price_cart(&self, id: CartId) -> Result<CartView, ShopError> {
        let cart = self.cart(id)?;
        let mut groups: BTreeMap<VendorId, VendorGroup> = BTreeMap::new();

        for line in &cart.lines {
            let variant = self.variant(line.variant_id)?;
            let product = self.product(variant.product_id)?;
            let vendor = self.vendor(product.vendor_id)?;
            let unit_price = variant.effective_price(product);
            let line_total = unit_price.checked_mul(u64::from(line.quantity))?;

            let group = groups.entry(vendor.id).or_insert_with(|| VendorGroup {
                vendor_id: vendor.id,
                vendor_name: vendor.name.clone(),
                lines: Vec::new(),
                subtotal: Money::ZERO,
            });
            group.subtotal = group.subtotal.checked_add(line_total)?;
            group.lines.push(CartLineView {
                variant_id: variant.id,
                product_id: product.id,
                product_name: product.name.clone(),
                sku: variant.sku.clone(),
                quantity: line.quantity,
                unit_price,
                line_total,
                available: variant.stock,
            });
        }

        let groups: Vec<VendorGroup> = groups.into_values().collect();
        let subtotal = Money::sum(groups.iter().map(|g| g.subtotal))?;
        Ok(CartView {
            cart_id: cart.id,
            customer: cart.customer.clone(),
            status: cart.status,
            groups,
            item_count: cart.item_count(),
            subtotal,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::cart::CartStatus;
    use crate::catalog::{ProductInput, VariantInput};
    use crate::error::ShopError;
    use crate::money::Money;
    use crate::primitives::{MAX_CART_LINES, MAX_LINE_QUANTITY};
    use crate::shop::test_support::*;
    use crate::types::{CustomerKey, VariantId};
    use crate::vendor::VendorInput;
    use proptest::prelude::*;

    fn ana() -> CustomerKey {
        CustomerKey::new("ana").unwrap()
    }

    #[test]
    fn cart_for_is_idempotent() {
        let mut fx = fixture().unwrap();
        let a = fx.shop.cart_for(&ana(), NOW).unwrap();
        let b = fx.shop.cart_for(&ana(), NOW + 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(fx.shop.cart(a).unwrap().status, CartStatus::Empty);
    }

    #[test]
    fn adding_merges_lines() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 2, NOW).unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 3, NOW).unwrap();
        let cart = fx.shop.open_cart_of(&ana()).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.quantity_of(fx.variant), 5);
        assert_eq!(cart.status, CartStatus::Open);
    }

    #[test]
    fn add_checks_stock_and_limits() {
        let mut fx = fixture().unwrap();
        assert!(matches!(
            fx.shop.add_to_cart(&ana(), fx.variant, 11, NOW),
            Err(ShopError::InsufficientStock {
                requested: 11,
                available: 10,
                ..
            })
        ));
        assert!(fx.shop.add_to_cart(&ana(), fx.variant, 0, NOW).is_err());

        fx.shop.set_stock(fx.variant, 500).unwrap();
        assert!(matches!(
            fx.shop.add_to_cart(&ana(), fx.variant, MAX_LINE_QUANTITY + 1, NOW),
            Err(ShopError::Validation { .. })
        ));
        assert!(matches!(
            fx.shop.add_to_cart(&ana(), VariantId(99), 1, NOW),
            Err(ShopError::NotFound { .. })
        ));
    }

    #[test]
    fn cart_line_count_is_capped() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        let mut extra = Vec::new();
        for n in 0..MAX_CART_LINES {
            let sku = format!("TEE-{n}");
            let id = fx
                .shop
                .add_variant(
                    fx.product,
                    &VariantInput {
                        sku,
                        stock: 1,
                        ..VariantInput::default()
                    },
                )
                .unwrap();
            extra.push(id);
        }
        let (fill, overflow) = extra.split_at(MAX_CART_LINES - 1);
        for &variant in fill {
            fx.shop.add_to_cart(&ana(), variant, 1, NOW).unwrap();
        }
        assert_eq!(fx.shop.open_cart_of(&ana()).unwrap().lines.len(), MAX_CART_LINES);

        let before = fx.shop.clone();
        assert!(matches!(
            fx.shop.add_to_cart(&ana(), overflow[0], 1, NOW),
            Err(ShopError::Validation { field: "cart", .. })
        ));
        assert_eq!(fx.shop, before);

        // Existing lines can still grow.
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        assert_eq!(fx.shop.open_cart_of(&ana()).unwrap().quantity_of(fx.variant), 2);
    }

    #[test]
    fn inactive_items_cannot_be_added() {
        let mut fx = fixture().unwrap();
        fx.shop.set_product_active(fx.product, false).unwrap();
        assert!(matches!(
            fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW),
            Err(ShopError::Unavailable { kind: "product", .. })
        ));
        fx.shop.set_product_active(fx.product, true).unwrap();
        fx.shop.set_vendor_active(fx.vendor, false).unwrap();
        assert!(matches!(
            fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW),
            Err(ShopError::Unavailable { kind: "vendor", .. })
        ));
    }

    #[test]
    fn update_and_remove_lines() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 2, NOW).unwrap();
        fx.shop.update_cart_line(&ana(), fx.variant, 7, NOW).unwrap();
        assert_eq!(fx.shop.open_cart_of(&ana()).unwrap().quantity_of(fx.variant), 7);

        fx.shop.update_cart_line(&ana(), fx.variant, 0, NOW).unwrap();
        let cart = fx.shop.open_cart_of(&ana()).unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.status, CartStatus::Empty);

        assert!(matches!(
            fx.shop.remove_from_cart(&ana(), fx.variant, NOW),
            Err(ShopError::NotFound { .. })
        ));
        assert!(fx.shop.update_cart_line(&ana(), fx.variant, 1, NOW).is_err());
    }

    #[test]
    fn view_groups_lines_by_vendor() {
        let mut fx = fixture().unwrap();
        let other = fx
            .shop
            .create_vendor(
                &VendorInput {
                    name: "Beta".into(),
                    email: "beta@example.com".into(),
                },
                NOW,
            )
            .unwrap();
        let product = fx
            .shop
            .create_product(
                &ProductInput {
                    vendor_id: other,
                    subcategory_id: fx.subcategory,
                    name: "Cap".into(),
                    description: String::new(),
                    base_price: Money::from_cents(999),
                },
                NOW,
            )
            .unwrap();
        let cap = fx
            .shop
            .add_variant(
                product,
                &VariantInput {
                    sku: "CAP".into(),
                    stock: 3,
                    ..VariantInput::default()
                },
            )
            .unwrap();

        fx.shop.add_to_cart(&ana(), cap, 2, NOW).unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();

        let view = fx.shop.cart_view(&ana(), NOW).unwrap();
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].vendor_id, fx.vendor);
        assert_eq!(view.groups[0].subtotal, Money::from_cents(2000));
        assert_eq!(view.groups[1].subtotal, Money::from_cents(1998));
        assert_eq!(view.subtotal, Money::from_cents(3998));
        assert_eq!(view.item_count, 3);
    }

    proptest! {
        #[test]
        fn line_quantity_never_exceeds_stock(ops in proptest::collection::vec((0u32..15, any::<bool>()), 1..30)) {
            let mut fx = fixture().unwrap();
            let customer = ana();
            for (qty, add) in ops {
                let _ = if add {
                    fx.shop.add_to_cart(&customer, fx.variant, qty, NOW)
                } else {
                    fx.shop.update_cart_line(&customer, fx.variant, qty, NOW)
                };
                let cart = fx.shop.open_cart_of(&customer);
                let in_cart = cart.map(|c| c.quantity_of(fx.variant)).unwrap_or(0);
                prop_assert!(in_cart <= 10);
                if let Some(cart) = cart {
                    prop_assert_eq!(cart.lines.is_empty(), cart.status == CartStatus::Empty);
                }
            }
        }
    }
}
