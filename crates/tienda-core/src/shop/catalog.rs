//! Category, product and variant operations, plus catalog listings.

use super::{Shop, bump};
use crate::catalog::{
    CatalogFilter, Category, ListingEntry, Product, ProductDetail, ProductInput, ProductUpdate,
    Subcategory, Variant, VariantInput, VariantUpdate, VariantView, normalize_attributes,
    normalize_sku,
};
use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::{clean_description, clean_name, fold};
use crate::types::{CategoryId, ProductId, SubcategoryId, Timestamp, VariantId, VendorId};

impl Shop {
    // =========================================================================
    // CATEGORIES
    // =========================================================================

    pub fn create_category(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<CategoryId, ShopError> {
        let name = clean_name("name", name)?;
        let description = clean_description(description)?;
        self.ensure_category_name_free(&name, None)?;

        let id = CategoryId(bump(&mut self.counters.category)?);
        self.categories.insert(
            id,
            Category {
                id,
                name,
                description,
            },
        );
        Ok(id)
    }

    pub fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<(), ShopError> {
        self.category(id)?;
        let name = clean_name("name", name)?;
        self.ensure_category_name_free(&name, Some(id))?;
        if let Some(category) = self.categories.get_mut(&id) {
            category.name = name;
        }
        Ok(())
    }

    /// Delete a category. Refused while it still has subcategories.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<(), ShopError> {
        self.category(id)?;
        if self.subcategories_of(id).next().is_some() {
            return Err(ShopError::conflict(format!(
                "category {id} still has subcategories"
            )));
        }
        self.categories.remove(&id);
        Ok(())
    }

    fn ensure_category_name_free(
        &self,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<(), ShopError> {
        let key = fold(name);
        if self
            .categories
            .values()
            .any(|c| Some(c.id) != except && fold(&c.name) == key)
        {
            return Err(ShopError::conflict(format!(
                "category '{name}' already exists"
            )));
        }
        Ok(())
    }

    pub fn create_subcategory(
        &mut self,
        category: CategoryId,
        name: &str,
    ) -> Result<SubcategoryId, ShopError> {
        self.category(category)?;
        let name = clean_name("name", name)?;
        let key = fold(&name);
        if self.subcategories_of(category).any(|s| fold(&s.name) == key) {
            return Err(ShopError::conflict(format!(
                "subcategory '{name}' already exists in category {category}"
            )));
        }

        let id = SubcategoryId(bump(&mut self.counters.subcategory)?);
        self.subcategories.insert(
            id,
            Subcategory {
                id,
                category_id: category,
                name,
            },
        );
        Ok(id)
    }

    /// Delete a subcategory. Refused while products reference it.
    pub fn delete_subcategory(&mut self, id: SubcategoryId) -> Result<(), ShopError> {
        self.subcategory(id)?;
        if self.products.values().any(|p| p.subcategory_id == id) {
            return Err(ShopError::conflict(format!(
                "subcategory {id} still has products"
            )));
        }
        self.subcategories.remove(&id);
        Ok(())
    }

    // =========================================================================
    // PRODUCTS
    // =========================================================================

    pub fn create_product(
        &mut self,
        input: &ProductInput,
        now: Timestamp,
    ) -> Result<ProductId, ShopError> {
        self.vendor(input.vendor_id)?;
        self.subcategory(input.subcategory_id)?;
        let name = clean_name("name", &input.name)?;
        let description = clean_description(&input.description)?;
        check_price("base_price", input.base_price)?;
        self.ensure_product_name_free(input.vendor_id, &name, None)?;

        let id = ProductId(bump(&mut self.counters.product)?);
        self.products.insert(
            id,
            Product {
                id,
                vendor_id: input.vendor_id,
                subcategory_id: input.subcategory_id,
                name,
                description,
                base_price: input.base_price,
                active: true,
                created_at: now,
            },
        );
        Ok(id)
    }

    pub fn update_product(&mut self, id: ProductId, update: &ProductUpdate) -> Result<(), ShopError> {
        let current = self.product(id)?;
        let vendor = current.vendor_id;

        let name = match &update.name {
            Some(raw) => {
                let name = clean_name("name", raw)?;
                self.ensure_product_name_free(vendor, &name, Some(id))?;
                Some(name)
            }
            None => None,
        };
        let description = update
            .description
            .as_deref()
            .map(clean_description)
            .transpose()?;
        if let Some(price) = update.base_price {
            check_price("base_price", price)?;
        }
        if let Some(sub) = update.subcategory_id {
            self.subcategory(sub)?;
        }

        let product = self.product_mut(id)?;
        if let Some(name) = name {
            product.name = name;
        }
        if let Some(description) = description {
            product.description = description;
        }
        if let Some(price) = update.base_price {
            product.base_price = price;
        }
        if let Some(sub) = update.subcategory_id {
            product.subcategory_id = sub;
        }
        Ok(())
    }

    /// Show or hide a product. Hidden products cannot be added to carts.
    pub fn set_product_active(&mut self, id: ProductId, active: bool) -> Result<(), ShopError> {
        self.product_mut(id)?.active = active;
        Ok(())
    }

    fn ensure_product_name_free(
        &self,
        vendor: VendorId,
        name: &str,
        except: Option<ProductId>,
    ) -> Result<(), ShopError> {
        let key = fold(name);
        if self
            .products
            .values()
            .any(|p| p.vendor_id == vendor && Some(p.id) != except && fold(&p.name) == key)
        {
            return Err(ShopError::conflict(format!(
                "vendor {vendor} already sells a product named '{name}'"
            )));
        }
        Ok(())
    }

    // =========================================================================
    // VARIANTS
    // =========================================================================

    pub fn add_variant(
        &mut self,
        product: ProductId,
        input: &VariantInput,
    ) -> Result<VariantId, ShopError> {
        self.product(product)?;
        let sku = normalize_sku(&input.sku)?;
        let attributes = normalize_attributes(&input.attributes)?;
        if let Some(price) = input.price {
            check_price("price", price)?;
        }
        self.ensure_sku_free(&sku, None)?;

        let id = VariantId(bump(&mut self.counters.variant)?);
        self.variants.insert(
            id,
            Variant {
                id,
                product_id: product,
                sku,
                attributes,
                price: input.price,
                stock: input.stock,
                active: true,
            },
        );
        Ok(id)
    }

    pub fn update_variant(&mut self, id: VariantId, update: &VariantUpdate) -> Result<(), ShopError> {
        self.variant(id)?;
        let sku = match &update.sku {
            Some(raw) => {
                let sku = normalize_sku(raw)?;
                self.ensure_sku_free(&sku, Some(id))?;
                Some(sku)
            }
            None => None,
        };
        let attributes = update
            .attributes
            .as_ref()
            .map(normalize_attributes)
            .transpose()?;
        if let Some(price) = update.price {
            if update.clear_price {
                return Err(ShopError::validation(
                    "price",
                    "cannot set and clear the price in one update",
                ));
            }
            check_price("price", price)?;
        }

        let variant = self.variant_mut(id)?;
        if let Some(sku) = sku {
            variant.sku = sku;
        }
        if let Some(attributes) = attributes {
            variant.attributes = attributes;
        }
        if update.clear_price {
            variant.price = None;
        }
        if let Some(price) = update.price {
            variant.price = Some(price);
        }
        Ok(())
    }

    pub fn set_variant_active(&mut self, id: VariantId, active: bool) -> Result<(), ShopError> {
        self.variant_mut(id)?.active = active;
        Ok(())
    }

    /// Add (or with a negative delta, remove) stock. Returns the new level.
    pub fn restock(&mut self, id: VariantId, delta: i64) -> Result<u32, ShopError> {
        let variant = self.variant_mut(id)?;
        let next = i64::from(variant.stock)
            .checked_add(delta)
            .ok_or(ShopError::Overflow)?;
        if next < 0 {
            return Err(ShopError::validation(
                "delta",
                format!("would leave stock at {next}"),
            ));
        }
        variant.stock = u32::try_from(next).map_err(|_| ShopError::Overflow)?;
        Ok(variant.stock)
    }

    pub fn set_stock(&mut self, id: VariantId, stock: u32) -> Result<(), ShopError> {
        self.variant_mut(id)?.stock = stock;
        Ok(())
    }

    /// Delete a variant that was never sold and is in no open cart.
    pub fn delete_variant(&mut self, id: VariantId) -> Result<(), ShopError> {
        self.variant(id)?;
        let in_cart = self
            .carts
            .values()
            .any(|c| !c.is_closed() && c.quantity_of(id) > 0);
        let sold = self
            .sales
            .values()
            .any(|s| s.lines.iter().any(|l| l.variant_id == id));
        if in_cart || sold {
            return Err(ShopError::conflict(format!(
                "variant {id} is referenced by carts or sales; deactivate it instead"
            )));
        }
        self.variants.remove(&id);
        Ok(())
    }

    fn ensure_sku_free(&self, sku: &str, except: Option<VariantId>) -> Result<(), ShopError> {
        if self
            .variants
            .values()
            .any(|v| Some(v.id) != except && v.sku == sku)
        {
            return Err(ShopError::conflict(format!("sku '{sku}' already exists")));
        }
        Ok(())
    }

    /// Find a variant by SKU (case-insensitive).
    #[must_use]
    pub fn variant_by_sku(&self, sku: &str) -> Option<&Variant> {
        let sku = sku.trim().to_ascii_uppercase();
        self.variants.values().find(|v| v.sku == sku)
    }

    // =========================================================================
    // LISTINGS
    // =========================================================================

    /// Products matching `filter`, in product id order.
    pub fn catalog_listing(&self, filter: &CatalogFilter) -> Vec<ListingEntry> {
        let text = filter
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        self.products
            .values()
            .filter_map(|product| {
                let vendor = self.vendors.get(&product.vendor_id)?;
                let sub = self.subcategories.get(&product.subcategory_id)?;

                if !filter.include_inactive && !(product.active && vendor.active) {
                    return None;
                }
                if filter.vendor.is_some_and(|v| v != product.vendor_id)
                    || filter.subcategory.is_some_and(|s| s != product.subcategory_id)
                    || filter.category.is_some_and(|c| c != sub.category_id)
                {
                    return None;
                }
                if let Some(text) = &text {
                    let hit = product.name.to_lowercase().contains(text)
                        || product.description.to_lowercase().contains(text);
                    if !hit {
                        return None;
                    }
                }

                let live: Vec<&Variant> = self
                    .variants_of(product.id)
                    .filter(|v| v.active)
                    .collect();
                let stock: u64 = live.iter().map(|v| u64::from(v.stock)).sum();
                if filter.only_available && stock == 0 {
                    return None;
                }
                let from_price = live
                    .iter()
                    .map(|v| v.effective_price(product))
                    .min()
                    .unwrap_or(product.base_price);

                Some(ListingEntry {
                    product_id: product.id,
                    name: product.name.clone(),
                    vendor_id: vendor.id,
                    vendor_name: vendor.name.clone(),
                    subcategory_id: sub.id,
                    from_price,
                    stock,
                    active: product.active && vendor.active,
                })
            })
            .collect()
    }

    /// Product with vendor name, category path and all variants.
    pub fn product_detail(&self, id: ProductId) -> Result<ProductDetail, ShopError> {
        let product = self.product(id)?;
        let vendor = self.vendor(product.vendor_id)?;
        let subcategory = self.subcategory(product.subcategory_id)?;
        let category = self.category(subcategory.category_id)?;
        let variants = self
            .variants_of(id)
            .map(|v| VariantView {
                variant: v.clone(),
                price: v.effective_price(product),
            })
            .collect();

        Ok(ProductDetail {
            product: product.clone(),
            vendor_name: vendor.name.clone(),
            category: category.clone(),
            subcategory: subcategory.clone(),
            variants,
        })
    }

    /// Whether a product is visible in the public catalog.
    #[must_use]
    pub fn is_listed(&self, product: &Product) -> bool {
        product.active
            && self
                .vendors
                .get(&product.vendor_id)
                .is_some_and(|v| v.active)
    }
}

fn check_price(field: &'static str, price: Money) -> Result<(), ShopError> {
    if price.is_zero() {
        return Err(ShopError::validation(field, "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::catalog::{CatalogFilter, ProductInput, ProductUpdate, VariantInput, VariantUpdate};
    use crate::error::ShopError;
    use crate::money::Money;
    use crate::shop::test_support::*;
    use crate::types::CustomerKey;
    use std::collections::BTreeMap;

    #[test]
    fn category_and_subcategory_names_are_unique() {
        let mut fx = fixture().unwrap();
        assert!(fx.shop.create_category("clothing", "").is_err());
        let category = fx.shop.subcategory(fx.subcategory).unwrap().category_id;
        assert!(fx.shop.create_subcategory(category, "SHIRTS").is_err());

        let other = fx.shop.create_category("Shoes", "").unwrap();
        assert!(fx.shop.create_subcategory(other, "Shirts").is_ok());
    }

    #[test]
    fn delete_guards_follow_references() {
        let mut fx = fixture().unwrap();
        let category = fx.shop.subcategory(fx.subcategory).unwrap().category_id;
        assert!(matches!(
            fx.shop.delete_category(category),
            Err(ShopError::Conflict(_))
        ));
        assert!(matches!(
            fx.shop.delete_subcategory(fx.subcategory),
            Err(ShopError::Conflict(_))
        ));

        let empty = fx.shop.create_subcategory(category, "Empty").unwrap();
        fx.shop.delete_subcategory(empty).unwrap();
        assert!(fx.shop.subcategory(empty).is_err());
    }

    #[test]
    fn product_requires_positive_price_and_unique_name() {
        let mut fx = fixture().unwrap();
        let mut input = ProductInput {
            vendor_id: fx.vendor,
            subcategory_id: fx.subcategory,
            name: "Hoodie".into(),
            description: String::new(),
            base_price: Money::ZERO,
        };
        assert!(fx.shop.create_product(&input, NOW).is_err());

        input.base_price = Money::from_cents(100);
        input.name = "TEE".into();
        assert!(matches!(
            fx.shop.create_product(&input, NOW),
            Err(ShopError::Conflict(_))
        ));
    }

    #[test]
    fn update_product_applies_only_given_fields() {
        let mut fx = fixture().unwrap();
        let update = ProductUpdate {
            base_price: Some(Money::from_cents(2500)),
            ..ProductUpdate::default()
        };
        fx.shop.update_product(fx.product, &update).unwrap();
        let p = fx.shop.product(fx.product).unwrap();
        assert_eq!(p.base_price, Money::from_cents(2500));
        assert_eq!(p.name, "Tee");
    }

    #[test]
    fn sku_is_globally_unique() {
        let mut fx = fixture().unwrap();
        let dup = VariantInput {
            sku: "tee-m".into(),
            ..VariantInput::default()
        };
        assert!(matches!(
            fx.shop.add_variant(fx.product, &dup),
            Err(ShopError::Conflict(_))
        ));
        assert!(fx.shop.variant_by_sku("tee-m").is_some());
    }

    #[test]
    fn update_variant_price_override_and_clear() {
        let mut fx = fixture().unwrap();
        let set = VariantUpdate {
            price: Some(Money::from_cents(1800)),
            ..VariantUpdate::default()
        };
        fx.shop.update_variant(fx.variant, &set).unwrap();
        let detail = fx.shop.product_detail(fx.product).unwrap();
        assert_eq!(detail.variants[0].price, Money::from_cents(1800));

        let clear = VariantUpdate {
            clear_price: true,
            ..VariantUpdate::default()
        };
        fx.shop.update_variant(fx.variant, &clear).unwrap();
        assert_eq!(fx.shop.variant(fx.variant).unwrap().price, None);
    }

    #[test]
    fn update_variant_rejects_set_and_clear_together() {
        let mut fx = fixture().unwrap();
        let both = VariantUpdate {
            sku: Some("TEE-NEW".into()),
            price: Some(Money::from_cents(1800)),
            clear_price: true,
            ..VariantUpdate::default()
        };
        let before = fx.shop.clone();
        assert!(matches!(
            fx.shop.update_variant(fx.variant, &both),
            Err(ShopError::Validation { field: "price", .. })
        ));
        assert_eq!(fx.shop, before);
    }

    #[test]
    fn restock_never_goes_negative() {
        let mut fx = fixture().unwrap();
        assert_eq!(fx.shop.restock(fx.variant, 5).unwrap(), 15);
        assert_eq!(fx.shop.restock(fx.variant, -15).unwrap(), 0);
        assert!(fx.shop.restock(fx.variant, -1).is_err());
        assert_eq!(fx.shop.variant(fx.variant).unwrap().stock, 0);
    }

    #[test]
    fn delete_variant_refused_while_in_open_cart() {
        let mut fx = fixture().unwrap();
        let customer = CustomerKey::new("ana").unwrap();
        fx.shop.add_to_cart(&customer, fx.variant, 1, NOW).unwrap();
        assert!(matches!(
            fx.shop.delete_variant(fx.variant),
            Err(ShopError::Conflict(_))
        ));
        fx.shop.clear_cart(&customer, NOW).unwrap();
        fx.shop.delete_variant(fx.variant).unwrap();
    }

    #[test]
    fn listing_filters_and_hides_inactive() {
        let mut fx = fixture().unwrap();
        let mut attributes = BTreeMap::new();
        attributes.insert("size".into(), "L".into());
        fx.shop
            .add_variant(
                fx.product,
                &VariantInput {
                    sku: "TEE-L".into(),
                    attributes,
                    price: Some(Money::from_cents(1500)),
                    stock: 0,
                },
            )
            .unwrap();

        let all = fx.shop.catalog_listing(&CatalogFilter::default());
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].from_price, Money::from_cents(1500));
        assert_eq!(all[0].stock, 10);

        let search = CatalogFilter {
            text: Some("COTTON".into()),
            ..CatalogFilter::default()
        };
        assert_eq!(fx.shop.catalog_listing(&search).len(), 1);

        let miss = CatalogFilter {
            text: Some("wool".into()),
            ..CatalogFilter::default()
        };
        assert!(fx.shop.catalog_listing(&miss).is_empty());

        fx.shop.set_vendor_active(fx.vendor, false).unwrap();
        assert!(fx.shop.catalog_listing(&CatalogFilter::default()).is_empty());
        let admin = CatalogFilter {
            include_inactive: true,
            ..CatalogFilter::default()
        };
        assert_eq!(fx.shop.catalog_listing(&admin).len(), 1);
    }

    #[test]
    fn only_available_skips_sold_out_products() {
        let mut fx = fixture().unwrap();
        fx.shop.set_stock(fx.variant, 0).unwrap();
        let filter = CatalogFilter {
            only_available: true,
            ..CatalogFilter::default()
        };
        assert!(fx.shop.catalog_listing(&filter).is_empty());
    }

    #[test]
    fn product_detail_resolves_category_path() {
        let fx = fixture().unwrap();
        let detail = fx.shop.product_detail(fx.product).unwrap();
        assert_eq!(detail.vendor_name, "Acme");
        assert_eq!(detail.category.name, "Clothing");
        assert_eq!(detail.subcategory.name, "Shirts");
        assert_eq!(detail.variants.len(), 1);
        assert_eq!(detail.variants[0].price, Money::from_cents(2000));
    }
}
