//! Checkout, sale transitions and order queries.
//!
//! Checkout is all-or-nothing: every line, vendor, tariff and bank account
//! is validated and every amount computed before the first mutation.

use super::{Shop, bump};
use crate::cart::CartStatus;
use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::clean_text;
use crate::sale::{
    Order, OrderView, PaymentInstructions, Sale, SaleAction, SaleLine, SaleStatus,
    ShippingAddress, next_status,
};
use crate::types::{CustomerKey, OrderId, SaleId, Timestamp, VariantId, VendorId};
use crate::vendor::select_tariff;
use std::collections::BTreeMap;

/// A vendor's share of a cart, priced and ready to become a sale.
struct PlannedSale {
    vendor_id: VendorId,
    lines: Vec<SaleLine>,
    subtotal: Money,
    shipping: Money,
    total: Money,
}

impl Shop {
    /// Turn the customer's open cart into an order with one sale per vendor.
    pub fn checkout(
        &mut self,
        customer: &CustomerKey,
        address: &ShippingAddress,
        now: Timestamp,
    ) -> Result<OrderId, ShopError> {
        let address = address.normalized()?;
        let cart = self.open_cart_of(customer).ok_or(ShopError::EmptyCart)?;
        if cart.status != CartStatus::Open || cart.lines.is_empty() {
            return Err(ShopError::EmptyCart);
        }
        let cart_id = cart.id;

        // Validate and price every line, grouped by vendor.
        let mut by_vendor: BTreeMap<VendorId, Vec<SaleLine>> = BTreeMap::new();
        for line in &cart.lines {
            let (variant, product, vendor) = self.sellable(line.variant_id)?;
            if line.quantity > variant.stock {
                return Err(ShopError::InsufficientStock {
                    variant: variant.id.0,
                    requested: line.quantity,
                    available: variant.stock,
                });
            }
            let unit_price = variant.effective_price(product);
            by_vendor.entry(vendor.id).or_default().push(SaleLine {
                variant_id: variant.id,
                product_id: product.id,
                product_name: product.name.clone(),
                sku: variant.sku.clone(),
                quantity: line.quantity,
                unit_price,
                line_total: unit_price.checked_mul(u64::from(line.quantity))?,
            });
        }

        let mut plans = Vec::with_capacity(by_vendor.len());
        for (vendor_id, lines) in by_vendor {
            if self.primary_account_of(vendor_id).is_none() {
                return Err(ShopError::NoBankAccount(vendor_id.0));
            }
            let subtotal = Money::sum(lines.iter().map(|l| l.line_total))?;
            let items: u64 = lines.iter().map(|l| u64::from(l.quantity)).sum();
            let tariff = select_tariff(self.tariffs_of(vendor_id), &address.region).ok_or_else(
                || ShopError::NoShippingTariff {
                    vendor: vendor_id.0,
                    region: address.region.clone(),
                },
            )?;
            let shipping = tariff.cost(items, subtotal)?;
            plans.push(PlannedSale {
                vendor_id,
                lines,
                subtotal,
                shipping,
                total: subtotal.checked_add(shipping)?,
            });
        }
        let order_total = Money::sum(plans.iter().map(|p| p.total))?;

        // Everything checked: commit.
        let order_id = OrderId(bump(&mut self.counters.order)?);
        let mut sale_ids = Vec::with_capacity(plans.len());
        for plan in plans {
            for line in &plan.lines {
                if let Some(variant) = self.variants.get_mut(&line.variant_id) {
                    variant.stock -= line.quantity;
                }
            }
            let sale_id = SaleId(bump(&mut self.counters.sale)?);
            self.sales.insert(
                sale_id,
                Sale {
                    id: sale_id,
                    order_id,
                    vendor_id: plan.vendor_id,
                    customer: customer.clone(),
                    lines: plan.lines,
                    subtotal: plan.subtotal,
                    shipping: plan.shipping,
                    total: plan.total,
                    status: SaleStatus::Pending,
                    payment_reference: None,
                    tracking_code: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            sale_ids.push(sale_id);
        }
        self.orders.insert(
            order_id,
            Order {
                id: order_id,
                customer: customer.clone(),
                address,
                sale_ids,
                total: order_total,
                created_at: now,
            },
        );
        if let Some(cart) = self.carts.get_mut(&cart_id) {
            cart.close(now);
        }
        self.open_carts.remove(customer);

        Ok(order_id)
    }

    /// Apply a status change to a sale. Cancelling returns its stock.
    pub fn transition_sale(
        &mut self,
        id: SaleId,
        action: &SaleAction,
        now: Timestamp,
    ) -> Result<SaleStatus, ShopError> {
        let sale = self.sale(id)?;
        let next = next_status(sale.status, action)?;

        let reference = match action {
            SaleAction::Pay { reference } => Some(clean_text("reference", reference, 120)?),
            _ => None,
        };
        let tracking = match action {
            SaleAction::Ship { tracking_code } => {
                Some(clean_text("tracking_code", tracking_code, 120)?)
            }
            _ => None,
        };
        let restock: Vec<(VariantId, u32)> = if next == SaleStatus::Cancelled {
            sale.lines.iter().map(|l| (l.variant_id, l.quantity)).collect()
        } else {
            Vec::new()
        };
        for (variant, quantity) in &restock {
            let stock = self.variant(*variant).map(|v| v.stock).unwrap_or(0);
            stock.checked_add(*quantity).ok_or(ShopError::Overflow)?;
        }

        for (variant, quantity) in restock {
            // A variant deleted since the sale has nowhere to return stock to.
            if let Some(v) = self.variants.get_mut(&variant) {
                v.stock += quantity;
            }
        }
        let sale = self
            .sales
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found("sale", id))?;
        sale.status = next;
        sale.updated_at = now;
        if reference.is_some() {
            sale.payment_reference = reference;
        }
        if tracking.is_some() {
            sale.tracking_code = tracking;
        }
        Ok(next)
    }

    /// Bank-transfer instructions for paying a sale.
    pub fn payment_instructions(&self, id: SaleId) -> Result<PaymentInstructions, ShopError> {
        let sale = self.sale(id)?;
        let vendor = self.vendor(sale.vendor_id)?;
        let account = self
            .primary_account_of(vendor.id)
            .ok_or(ShopError::NoBankAccount(vendor.id.0))?;
        let amount_due = if sale.status == SaleStatus::Pending {
            sale.total
        } else {
            Money::ZERO
        };
        Ok(PaymentInstructions {
            sale_id: sale.id,
            vendor_name: vendor.name.clone(),
            bank_name: account.bank_name.clone(),
            holder_name: account.holder_name.clone(),
            masked_account: account.masked_number(),
            amount_due,
            status: sale.status,
        })
    }

    /// Order with its sales.
    pub fn order_view(&self, id: OrderId) -> Result<OrderView, ShopError> {
        let order = self.order(id)?;
        let sales = order
            .sale_ids
            .iter()
            .map(|sid| self.sale(*sid).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OrderView {
            order: order.clone(),
            sales,
        })
    }

    /// A customer's orders, newest first.
    pub fn orders_for(&self, customer: &CustomerKey) -> Result<Vec<OrderView>, ShopError> {
        self.orders
            .values()
            .rev()
            .filter(|o| &o.customer == customer)
            .map(|o| self.order_view(o.id))
            .collect()
    }

    /// A vendor's sales, optionally filtered by status, in id order.
    pub fn sales_for_vendor(
        &self,
        vendor: VendorId,
        status: Option<SaleStatus>,
    ) -> Result<Vec<&Sale>, ShopError> {
        self.vendor(vendor)?;
        Ok(self
            .sales
            .values()
            .filter(|s| s.vendor_id == vendor && status.is_none_or(|st| s.status == st))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use crate::cart::CartStatus;
    use crate::catalog::{ProductInput, VariantInput};
    use crate::error::ShopError;
    use crate::money::Money;
    use crate::sale::{SaleAction, SaleStatus, ShippingAddress};
    use crate::shop::test_support::*;
    use crate::types::{CustomerKey, SaleId};
    use crate::vendor::{TariffInput, VendorInput};

    fn ana() -> CustomerKey {
        CustomerKey::new("ana").unwrap()
    }

    pub(crate) fn address(region: &str) -> ShippingAddress {
        ShippingAddress {
            recipient: "Ana".into(),
            line1: "Calle Mayor 1".into(),
            city: "Madrid".into(),
            region: region.into(),
            postal_code: "28013".into(),
        }
    }

    #[test]
    fn checkout_creates_order_and_decrements_stock() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 3, NOW).unwrap();

        let order_id = fx.shop.checkout(&ana(), &address("Madrid"), NOW + 5).unwrap();
        let view = fx.shop.order_view(order_id).unwrap();

        assert_eq!(view.sales.len(), 1);
        let sale = &view.sales[0];
        assert_eq!(sale.subtotal, Money::from_cents(6000));
        // fallback tariff: 5.00 + 3 x 1.00
        assert_eq!(sale.shipping, Money::from_cents(800));
        assert_eq!(sale.total, Money::from_cents(6800));
        assert_eq!(view.order.total, Money::from_cents(6800));
        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(fx.shop.variant(fx.variant).unwrap().stock, 7);

        assert!(fx.shop.open_cart_of(&ana()).is_none());
        let closed = fx.shop.carts.values().next().unwrap();
        assert_eq!(closed.status, CartStatus::Closed);
    }

    #[test]
    fn checkout_splits_sales_per_vendor() {
        let mut fx = fixture().unwrap();
        let beta = fx
            .shop
            .create_vendor(
                &VendorInput {
                    name: "Beta".into(),
                    email: "beta@example.com".into(),
                },
                NOW,
            )
            .unwrap();
        fx.shop
            .add_bank_account(
                beta,
                &crate::vendor::BankAccountInput {
                    bank_name: "Banco Dos".into(),
                    holder_name: "Beta SA".into(),
                    account_number: "DE89370400440532013000".into(),
                },
            )
            .unwrap();
        fx.shop
            .set_shipping_tariff(
                beta,
                &TariffInput {
                    region: "MADRID".into(),
                    base_cost: Money::from_cents(300),
                    per_item_cost: Money::ZERO,
                    free_over: Some(Money::from_cents(1000)),
                },
            )
            .unwrap();
        let product = fx
            .shop
            .create_product(
                &ProductInput {
                    vendor_id: beta,
                    subcategory_id: fx.subcategory,
                    name: "Cap".into(),
                    description: String::new(),
                    base_price: Money::from_cents(600),
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
                    stock: 5,
                    ..VariantInput::default()
                },
            )
            .unwrap();

        fx.shop.add_to_cart(&ana(), cap, 2, NOW).unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        let order_id = fx.shop.checkout(&ana(), &address("madrid"), NOW).unwrap();
        let view = fx.shop.order_view(order_id).unwrap();

        assert_eq!(view.sales.len(), 2);
        assert_eq!(view.sales[0].vendor_id, fx.vendor);
        assert_eq!(view.sales[1].vendor_id, beta);
        // Beta: subtotal 12.00 is over the free-shipping threshold
        assert_eq!(view.sales[1].shipping, Money::ZERO);
        assert_eq!(view.order.total, Money::from_cents(2600 + 1200));
    }

    #[test]
    fn checkout_refuses_items_deactivated_after_adding() {
        type Toggle = fn(&mut Fixture, bool);
        let toggles: [(&str, Toggle); 3] = [
            ("variant", |fx, on| fx.shop.set_variant_active(fx.variant, on).unwrap()),
            ("product", |fx, on| fx.shop.set_product_active(fx.product, on).unwrap()),
            ("vendor", |fx, on| fx.shop.set_vendor_active(fx.vendor, on).unwrap()),
        ];
        for (expected, toggle) in toggles {
            let mut fx = fixture().unwrap();
            fx.shop.add_to_cart(&ana(), fx.variant, 2, NOW).unwrap();
            toggle(&mut fx, false);
            let before = fx.shop.clone();

            let result = fx.shop.checkout(&ana(), &address("madrid"), NOW);
            assert!(
                matches!(result, Err(ShopError::Unavailable { kind, .. }) if kind == expected),
                "{expected}: {result:?}"
            );
            assert_eq!(fx.shop, before, "{expected}: shop changed");
            assert_eq!(fx.shop.variant(fx.variant).unwrap().stock, 10);

            toggle(&mut fx, true);
            assert!(fx.shop.checkout(&ana(), &address("madrid"), NOW).is_ok());
        }
    }

    #[test]
    fn checkout_is_all_or_nothing() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 4, NOW).unwrap();
        // stock drops below the cart quantity after the line was added
        fx.shop.set_stock(fx.variant, 2).unwrap();
        let before = fx.shop.clone();

        let result = fx.shop.checkout(&ana(), &address("Madrid"), NOW);
        assert!(matches!(result, Err(ShopError::InsufficientStock { .. })));
        assert_eq!(fx.shop, before);
    }

    #[test]
    fn checkout_requires_tariff_and_bank_account() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();

        let tariff = fx.shop.tariffs_of(fx.vendor).next().unwrap().id;
        fx.shop.remove_tariff(tariff).unwrap();
        assert!(matches!(
            fx.shop.checkout(&ana(), &address("Madrid"), NOW),
            Err(ShopError::NoShippingTariff { .. })
        ));

        fx.shop
            .set_shipping_tariff(
                fx.vendor,
                &TariffInput {
                    region: "*".into(),
                    base_cost: Money::ZERO,
                    per_item_cost: Money::ZERO,
                    free_over: None,
                },
            )
            .unwrap();
        let account = fx.shop.primary_account_of(fx.vendor).unwrap().id;
        fx.shop.remove_bank_account(account).unwrap();
        assert!(matches!(
            fx.shop.checkout(&ana(), &address("Madrid"), NOW),
            Err(ShopError::NoBankAccount(_))
        ));
    }

    #[test]
    fn empty_cart_cannot_check_out() {
        let mut fx = fixture().unwrap();
        assert_eq!(
            fx.shop.checkout(&ana(), &address("Madrid"), NOW),
            Err(ShopError::EmptyCart)
        );
        fx.shop.cart_for(&ana(), NOW).unwrap();
        assert_eq!(
            fx.shop.checkout(&ana(), &address("Madrid"), NOW),
            Err(ShopError::EmptyCart)
        );
    }

    #[test]
    fn sale_snapshot_survives_catalog_changes() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        let order = fx.shop.checkout(&ana(), &address("Madrid"), NOW).unwrap();
        let update = crate::catalog::ProductUpdate {
            name: Some("Renamed".into()),
            base_price: Some(Money::from_cents(9999)),
            ..Default::default()
        };
        fx.shop.update_product(fx.product, &update).unwrap();

        let sale = &fx.shop.order_view(order).unwrap().sales[0];
        assert_eq!(sale.lines[0].product_name, "Tee");
        assert_eq!(sale.lines[0].unit_price, Money::from_cents(2000));
    }

    #[test]
    fn lifecycle_records_reference_and_tracking() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        fx.shop.checkout(&ana(), &address("Madrid"), NOW).unwrap();
        let sale = SaleId(1);

        let pay = SaleAction::Pay {
            reference: " TRX-42 ".into(),
        };
        fx.shop.transition_sale(sale, &pay, NOW + 1).unwrap();
        let ship = SaleAction::Ship {
            tracking_code: "TRK-9".into(),
        };
        fx.shop.transition_sale(sale, &ship, NOW + 2).unwrap();
        fx.shop
            .transition_sale(sale, &SaleAction::Deliver, NOW + 3)
            .unwrap();

        let s = fx.shop.sale(sale).unwrap();
        assert_eq!(s.status, SaleStatus::Delivered);
        assert_eq!(s.payment_reference.as_deref(), Some("TRX-42"));
        assert_eq!(s.tracking_code.as_deref(), Some("TRK-9"));
        assert_eq!(s.updated_at, NOW + 3);
    }

    #[test]
    fn blank_payment_reference_is_rejected() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        fx.shop.checkout(&ana(), &address("Madrid"), NOW).unwrap();
        let pay = SaleAction::Pay {
            reference: "  ".into(),
        };
        assert!(fx.shop.transition_sale(SaleId(1), &pay, NOW).is_err());
        assert_eq!(fx.shop.sale(SaleId(1)).unwrap().status, SaleStatus::Pending);
    }

    #[test]
    fn cancel_restocks() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 4, NOW).unwrap();
        fx.shop.checkout(&ana(), &address("Madrid"), NOW).unwrap();
        assert_eq!(fx.shop.variant(fx.variant).unwrap().stock, 6);

        fx.shop
            .transition_sale(SaleId(1), &SaleAction::Cancel, NOW)
            .unwrap();
        assert_eq!(fx.shop.variant(fx.variant).unwrap().stock, 10);
        assert!(matches!(
            fx.shop.transition_sale(SaleId(1), &SaleAction::Cancel, NOW),
            Err(ShopError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn payment_instructions_mask_account() {
        let mut fx = fixture().unwrap();
        fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
        fx.shop.checkout(&ana(), &address("Madrid"), NOW).unwrap();

        let info = fx.shop.payment_instructions(SaleId(1)).unwrap();
        assert_eq!(info.masked_account, "****1332");
        assert_eq!(info.amount_due, Money::from_cents(2600));
        assert_eq!(info.vendor_name, "Acme");
    }

    #[test]
    fn orders_listed_newest_first() {
        let mut fx = fixture().unwrap();
        for _ in 0..2 {
            fx.shop.add_to_cart(&ana(), fx.variant, 1, NOW).unwrap();
            fx.shop.checkout(&ana(), &address("Madrid"), NOW).unwrap();
        }
        let orders = fx.shop.orders_for(&ana()).unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].order.id > orders[1].order.id);

        let pending = fx
            .shop
            .sales_for_vendor(fx.vendor, Some(SaleStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 2);
    }
}
