//! # Shop Engine
//!
//! The deterministic in-memory storefront state.
//!
//! All collections are `BTreeMap`s keyed by id, so every listing and every
//! snapshot comes out in the same order. Operations validate first and
//! mutate last: a call that returns `Err` leaves the shop untouched.
//!
//! The operations are spread over submodules by area:
//! - `vendors`: vendors, bank accounts, shipping tariffs
//! - `catalog`: categories, subcategories, products, variants, listings
//! - `carts`: cart lines and priced views
//! - `checkout`: checkout, sale transitions, order queries

mod carts;
mod catalog;
mod checkout;
mod vendors;

use crate::cart::{Cart, CartStatus};
use crate::catalog::{Category, Product, Subcategory, Variant};
use crate::error::ShopError;
use crate::sale::{Order, Sale};
use crate::types::{
    BankAccountId, CartId, CategoryId, CustomerKey, OrderId, ProductId, SaleId, SubcategoryId,
    TariffId, VariantId, VendorId,
};
use crate::vendor::{BankAccount, ShippingTariff, Vendor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ID COUNTERS
// =============================================================================

/// Last allocated id per entity kind. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub vendor: u64,
    pub bank_account: u64,
    pub tariff: u64,
    pub category: u64,
    pub subcategory: u64,
    pub product: u64,
    pub variant: u64,
    pub cart: u64,
    pub order: u64,
    pub sale: u64,
}

fn bump(counter: &mut u64) -> Result<u64, ShopError> {
    *counter = counter.checked_add(1).ok_or(ShopError::Overflow)?;
    Ok(*counter)
}

// =============================================================================
// SHOP
// =============================================================================

/// The whole storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shop {
    vendors: BTreeMap<VendorId, Vendor>,
    bank_accounts: BTreeMap<BankAccountId, BankAccount>,
    tariffs: BTreeMap<TariffId, ShippingTariff>,
    categories: BTreeMap<CategoryId, Category>,
    subcategories: BTreeMap<SubcategoryId, Subcategory>,
    products: BTreeMap<ProductId, Product>,
    variants: BTreeMap<VariantId, Variant>,
    carts: BTreeMap<CartId, Cart>,
    orders: BTreeMap<OrderId, Order>,
    sales: BTreeMap<SaleId, Sale>,

    /// Derived: customer -> their cart that is not closed.
    open_carts: BTreeMap<CustomerKey, CartId>,

    counters: IdCounters,
}

/// Entity counts, for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopStats {
    pub vendors: usize,
    pub categories: usize,
    pub subcategories: usize,
    pub products: usize,
    pub variants: usize,
    pub open_carts: usize,
    pub orders: usize,
    pub sales: usize,
}

impl Shop {
    /// Create an empty shop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing has ever been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
            && self.categories.is_empty()
            && self.products.is_empty()
            && self.carts.is_empty()
            && self.orders.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> ShopStats {
        ShopStats {
            vendors: self.vendors.len(),
            categories: self.categories.len(),
            subcategories: self.subcategories.len(),
            products: self.products.len(),
            variants: self.variants.len(),
            open_carts: self.open_carts.len(),
            orders: self.orders.len(),
            sales: self.sales.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn vendor(&self, id: VendorId) -> Result<&Vendor, ShopError> {
        self.vendors
            .get(&id)
            .ok_or_else(|| ShopError::not_found("vendor", id))
    }

    pub fn vendors(&self) -> impl Iterator<Item = &Vendor> {
        self.vendors.values()
    }

    pub fn category(&self, id: CategoryId) -> Result<&Category, ShopError> {
        self.categories
            .get(&id)
            .ok_or_else(|| ShopError::not_found("category", id))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn subcategory(&self, id: SubcategoryId) -> Result<&Subcategory, ShopError> {
        self.subcategories
            .get(&id)
            .ok_or_else(|| ShopError::not_found("subcategory", id))
    }

    /// Subcategories of a category, in id order.
    pub fn subcategories_of(&self, category: CategoryId) -> impl Iterator<Item = &Subcategory> {
        self.subcategories
            .values()
            .filter(move |s| s.category_id == category)
    }

    pub fn product(&self, id: ProductId) -> Result<&Product, ShopError> {
        self.products
            .get(&id)
            .ok_or_else(|| ShopError::not_found("product", id))
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn variant(&self, id: VariantId) -> Result<&Variant, ShopError> {
        self.variants
            .get(&id)
            .ok_or_else(|| ShopError::not_found("variant", id))
    }

    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.values()
    }

    /// Variants of a product, in id order.
    pub fn variants_of(&self, product: ProductId) -> impl Iterator<Item = &Variant> {
        self.variants
            .values()
            .filter(move |v| v.product_id == product)
    }

    pub fn cart(&self, id: CartId) -> Result<&Cart, ShopError> {
        self.carts
            .get(&id)
            .ok_or_else(|| ShopError::not_found("cart", id))
    }

    /// The customer's cart that is not closed, if any.
    #[must_use]
    pub fn open_cart_of(&self, customer: &CustomerKey) -> Option<&Cart> {
        self.open_carts
            .get(customer)
            .and_then(|id| self.carts.get(id))
    }

    pub fn order(&self, id: OrderId) -> Result<&Order, ShopError> {
        self.orders
            .get(&id)
            .ok_or_else(|| ShopError::not_found("order", id))
    }

    pub fn sale(&self, id: SaleId) -> Result<&Sale, ShopError> {
        self.sales
            .get(&id)
            .ok_or_else(|| ShopError::not_found("sale", id))
    }

    pub fn sales(&self) -> impl Iterator<Item = &Sale> {
        self.sales.values()
    }

    #[must_use]
    pub fn counters(&self) -> IdCounters {
        self.counters
    }

    // -------------------------------------------------------------------------
    // Internal lookups
    // -------------------------------------------------------------------------

    fn vendor_mut(&mut self, id: VendorId) -> Result<&mut Vendor, ShopError> {
        self.vendors
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found("vendor", id))
    }

    fn product_mut(&mut self, id: ProductId) -> Result<&mut Product, ShopError> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found("product", id))
    }

    fn variant_mut(&mut self, id: VariantId) -> Result<&mut Variant, ShopError> {
        self.variants
            .get_mut(&id)
            .ok_or_else(|| ShopError::not_found("variant", id))
    }

    /// Resolve a variant to its product and vendor, requiring all three active.
    fn sellable(&self, id: VariantId) -> Result<(&Variant, &Product, &Vendor), ShopError> {
        let variant = self.variant(id)?;
        let product = self.product(variant.product_id)?;
        let vendor = self.vendor(product.vendor_id)?;
        if !variant.active {
            return Err(ShopError::Unavailable {
                kind: "variant",
                id: id.0,
            });
        }
        if !product.active {
            return Err(ShopError::Unavailable {
                kind: "product",
                id: product.id.0,
            });
        }
        if !vendor.active {
            return Err(ShopError::Unavailable {
                kind: "vendor",
                id: vendor.id.0,
            });
        }
        Ok((variant, product, vendor))
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Serializable representation of the shop for persistence and export.
///
/// Derived indexes are not stored; they are rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub vendors: Vec<Vendor>,
    pub bank_accounts: Vec<BankAccount>,
    pub tariffs: Vec<ShippingTariff>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub products: Vec<Product>,
    pub variants: Vec<Variant>,
    pub carts: Vec<Cart>,
    pub orders: Vec<Order>,
    pub sales: Vec<Sale>,
    pub counters: IdCounters,
}

impl From<&Shop> for ShopSnapshot {
    fn from(shop: &Shop) -> Self {
        Self {
            vendors: shop.vendors.values().cloned().collect(),
            bank_accounts: shop.bank_accounts.values().cloned().collect(),
            tariffs: shop.tariffs.values().cloned().collect(),
            categories: shop.categories.values().cloned().collect(),
            subcategories: shop.subcategories.values().cloned().collect(),
            products: shop.products.values().cloned().collect(),
            variants: shop.variants.values().cloned().collect(),
            carts: shop.carts.values().cloned().collect(),
            orders: shop.orders.values().cloned().collect(),
            sales: shop.sales.values().cloned().collect(),
            counters: shop.counters,
        }
    }
}

impl TryFrom<ShopSnapshot> for Shop {
    type Error = ShopError;

    /// Rebuild a shop, checking referential integrity and id counters.
    fn try_from(snap: ShopSnapshot) -> Result<Self, Self::Error> {
        let mut shop = Shop {
            counters: snap.counters,
            ..Shop::default()
        };

        for v in snap.vendors {
            shop.vendors.insert(v.id, v);
        }
        for a in snap.bank_accounts {
            shop.check_ref(shop.vendors.contains_key(&a.vendor_id), "bank account", a.id.0)?;
            shop.bank_accounts.insert(a.id, a);
        }
        for vendor in shop.vendors.keys() {
            let mut accounts = shop.bank_accounts_of(*vendor).peekable();
            if accounts.peek().is_none() {
                continue;
            }
            let primaries = accounts.filter(|a| a.primary).count();
            if primaries != 1 {
                return Err(ShopError::Format(format!(
                    "vendor {vendor} has {primaries} primary bank accounts"
                )));
            }
        }
        for t in snap.tariffs {
            shop.check_ref(shop.vendors.contains_key(&t.vendor_id), "tariff", t.id.0)?;
            shop.tariffs.insert(t.id, t);
        }
        for c in snap.categories {
            shop.categories.insert(c.id, c);
        }
        for s in snap.subcategories {
            shop.check_ref(shop.categories.contains_key(&s.category_id), "subcategory", s.id.0)?;
            shop.subcategories.insert(s.id, s);
        }
        for p in snap.products {
            let ok = shop.vendors.contains_key(&p.vendor_id)
                && shop.subcategories.contains_key(&p.subcategory_id);
            shop.check_ref(ok, "product", p.id.0)?;
            shop.products.insert(p.id, p);
        }
        for v in snap.variants {
            shop.check_ref(shop.products.contains_key(&v.product_id), "variant", v.id.0)?;
            shop.variants.insert(v.id, v);
        }
        for c in snap.carts {
            let ok = c
                .lines
                .iter()
                .all(|l| shop.variants.contains_key(&l.variant_id));
            shop.check_ref(ok, "cart", c.id.0)?;
            if c.status != CartStatus::Closed
                && shop.open_carts.insert(c.customer.clone(), c.id).is_some()
            {
                return Err(ShopError::Format(format!(
                    "customer {} has more than one open cart",
                    c.customer
                )));
            }
            shop.carts.insert(c.id, c);
        }
        for o in snap.orders {
            shop.orders.insert(o.id, o);
        }
        for s in snap.sales {
            let ok = shop.orders.contains_key(&s.order_id) && shop.vendors.contains_key(&s.vendor_id);
            shop.check_ref(ok, "sale", s.id.0)?;
            shop.sales.insert(s.id, s);
        }
        for o in shop.orders.values() {
            let ok = o.sale_ids.iter().all(|id| {
                shop.sales
                    .get(id)
                    .is_some_and(|s| s.order_id == o.id)
            });
            shop.check_ref(ok, "order", o.id.0)?;
        }

        shop.check_counters()?;
        Ok(shop)
    }
}

impl Shop {
    fn check_ref(&self, ok: bool, kind: &str, id: u64) -> Result<(), ShopError> {
        if ok {
            Ok(())
        } else {
            Err(ShopError::Format(format!(
                "{kind} {id} references a missing record"
            )))
        }
    }

    fn check_counters(&self) -> Result<(), ShopError> {
        fn max_key<K: Copy + Into<u64>, V>(map: &BTreeMap<K, V>) -> u64 {
            map.keys().next_back().map(|k| (*k).into()).unwrap_or(0)
        }
        let c = &self.counters;
        let pairs = [
            ("vendor", c.vendor, max_key(&self.vendors)),
            ("bank_account", c.bank_account, max_key(&self.bank_accounts)),
            ("tariff", c.tariff, max_key(&self.tariffs)),
            ("category", c.category, max_key(&self.categories)),
            ("subcategory", c.subcategory, max_key(&self.subcategories)),
            ("product", c.product, max_key(&self.products)),
            ("variant", c.variant, max_key(&self.variants)),
            ("cart", c.cart, max_key(&self.carts)),
            ("order", c.order, max_key(&self.orders)),
            ("sale", c.sale, max_key(&self.sales)),
        ];
        for (kind, counter, max) in pairs {
            if counter < max {
                return Err(ShopError::Format(format!(
                    "{kind} counter {counter} is behind stored id {max}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the shop tests.

    use super::*;
    use crate::catalog::{ProductInput, VariantInput};
    use crate::money::Money;
    use crate::vendor::{BankAccountInput, TariffInput, VendorInput};

    pub const NOW: u64 = 1_700_000_000;

    pub struct Fixture {
        pub shop: Shop,
        pub vendor: VendorId,
        pub subcategory: SubcategoryId,
        pub product: ProductId,
        pub variant: VariantId,
    }

    /// One vendor with a bank account and a fallback tariff, one product with
    /// one variant priced 20.00 and stock 10.
    pub fn fixture() -> Result<Fixture, ShopError> {
        let mut shop = Shop::new();
        let vendor = shop.create_vendor(
            &VendorInput {
                name: "Acme".into(),
                email: "acme@example.com".into(),
            },
            NOW,
        )?;
        shop.add_bank_account(
            vendor,
            &BankAccountInput {
                bank_name: "Banco Uno".into(),
                holder_name: "Acme SL".into(),
                account_number: "ES9121000418450200051332".into(),
            },
        )?;
        shop.set_shipping_tariff(
            vendor,
            &TariffInput {
                region: "*".into(),
                base_cost: Money::from_cents(500),
                per_item_cost: Money::from_cents(100),
                free_over: None,
            },
        )?;
        let category = shop.create_category("Clothing", "")?;
        let subcategory = shop.create_subcategory(category, "Shirts")?;
        let product = shop.create_product(
            &ProductInput {
                vendor_id: vendor,
                subcategory_id: subcategory,
                name: "Tee".into(),
                description: "Cotton tee".into(),
                base_price: Money::from_cents(2000),
            },
            NOW,
        )?;
        let variant = shop.add_variant(
            product,
            &VariantInput {
                sku: "TEE-M".into(),
                stock: 10,
                ..VariantInput::default()
            },
        )?;
        Ok(Fixture {
            shop,
            vendor,
            subcategory,
            product,
            variant,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn new_shop_is_empty() {
        let shop = Shop::new();
        assert!(shop.is_empty());
        assert_eq!(shop.stats(), ShopStats::default());
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let fx = fixture().unwrap();
        assert_eq!(fx.vendor, VendorId(1));
        assert_eq!(fx.product, ProductId(1));
        assert_eq!(fx.shop.counters().variant, 1);
    }

    #[test]
    fn snapshot_roundtrip_preserves_state() {
        let mut fx = fixture().unwrap();
        let customer = CustomerKey::new("ana").unwrap();
        fx.shop.add_to_cart(&customer, fx.variant, 2, NOW).unwrap();

        let snapshot = ShopSnapshot::from(&fx.shop);
        let restored = Shop::try_from(snapshot).unwrap();

        assert_eq!(restored, fx.shop);
        assert!(restored.open_cart_of(&customer).is_some());
    }

    #[test]
    fn snapshot_with_dangling_reference_is_rejected() {
        let fx = fixture().unwrap();
        let mut snapshot = ShopSnapshot::from(&fx.shop);
        snapshot.vendors.clear();
        assert!(matches!(Shop::try_from(snapshot), Err(ShopError::Format(_))));
    }

    #[test]
    fn snapshot_with_unknown_cart_variant_is_rejected() {
        let mut fx = fixture().unwrap();
        let customer = CustomerKey::new("ana").unwrap();
        fx.shop.add_to_cart(&customer, fx.variant, 1, NOW).unwrap();

        let mut snapshot = ShopSnapshot::from(&fx.shop);
        snapshot.carts[0].lines[0].variant_id = VariantId(999);
        assert!(matches!(Shop::try_from(snapshot), Err(ShopError::Format(_))));
    }

    #[test]
    fn snapshot_with_broken_order_sales_is_rejected() {
        let mut fx = fixture().unwrap();
        let customer = CustomerKey::new("ana").unwrap();
        let address = super::checkout::tests::address("madrid");
        for _ in 0..2 {
            fx.shop.add_to_cart(&customer, fx.variant, 1, NOW).unwrap();
            fx.shop.checkout(&customer, &address, NOW).unwrap();
        }
        let snapshot = ShopSnapshot::from(&fx.shop);
        assert!(Shop::try_from(snapshot.clone()).is_ok());

        let mut missing = snapshot.clone();
        missing.orders[0].sale_ids.push(SaleId(42));
        assert!(matches!(Shop::try_from(missing), Err(ShopError::Format(_))));

        // Sale 2 exists but belongs to order 2.
        let mut foreign = snapshot;
        foreign.orders[0].sale_ids = vec![SaleId(2)];
        assert!(matches!(Shop::try_from(foreign), Err(ShopError::Format(_))));
    }

    #[test]
    fn snapshot_needs_exactly_one_primary_account() {
        let mut fx = fixture().unwrap();
        fx.shop
            .add_bank_account(
                fx.vendor,
                &crate::vendor::BankAccountInput {
                    bank_name: "Banco Dos".into(),
                    holder_name: "Acme SL".into(),
                    account_number: "DE89370400440532013000".into(),
                },
            )
            .unwrap();
        let snapshot = ShopSnapshot::from(&fx.shop);

        let mut none = snapshot.clone();
        for a in &mut none.bank_accounts {
            a.primary = false;
        }
        assert!(matches!(Shop::try_from(none), Err(ShopError::Format(_))));

        let mut both = snapshot;
        for a in &mut both.bank_accounts {
            a.primary = true;
        }
        assert!(matches!(Shop::try_from(both), Err(ShopError::Format(_))));
    }

    #[test]
    fn snapshot_with_stale_counter_is_rejected() {
        let fx = fixture().unwrap();
        let mut snapshot = ShopSnapshot::from(&fx.shop);
        snapshot.counters.product = 0;
        assert!(matches!(Shop::try_from(snapshot), Err(ShopError::Format(_))));
    }
}
