//! # Catalog
//!
//! Categories, subcategories, products and their purchasable variants.
//!
//! A product belongs to one vendor and one subcategory. What a customer
//! actually buys is a variant (a size/colour combination with its own SKU
//! and stock). A variant without its own price sells at the product's
//! base price.

use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::MAX_SKU_LEN;
use crate::types::{CategoryId, ProductId, SubcategoryId, Timestamp, VariantId, VendorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// Second-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
}

/// A product listed by a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub subcategory_id: SubcategoryId,
    pub name: String,
    pub description: String,
    /// Price of variants that do not override it. Always > 0.
    pub base_price: Money,
    pub active: bool,
    pub created_at: Timestamp,
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub vendor_id: VendorId,
    pub subcategory_id: SubcategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Money,
}

/// Partial product update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Money>,
    pub subcategory_id: Option<SubcategoryId>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    /// Globally unique, uppercase.
    pub sku: String,
    /// Free-form attributes such as `size` or `color`.
    pub attributes: BTreeMap<String, String>,
    /// Overrides the product's base price when set.
    pub price: Option<Money>,
    pub stock: u32,
    pub active: bool,
}

impl Variant {
    /// Price this variant sells at.
    #[must_use]
    pub fn effective_price(&self, product: &Product) -> Money {
        self.price.unwrap_or(product.base_price)
    }
}

/// Input for creating a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantInput {
    pub sku: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: u32,
}

/// Partial variant update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantUpdate {
    pub sku: Option<String>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub price: Option<Money>,
    /// Drop the price override so the variant sells at the base price.
    #[serde(default)]
    pub clear_price: bool,
}

/// Normalise a SKU: trimmed, uppercase, `[A-Z0-9-_]`, 1..=64 chars.
pub(crate) fn normalize_sku(raw: &str) -> Result<String, ShopError> {
    let sku = raw.trim().to_ascii_uppercase();
    if sku.is_empty() || sku.len() > MAX_SKU_LEN {
        return Err(ShopError::validation(
            "sku",
            format!("must be 1-{MAX_SKU_LEN} characters"),
        ));
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ShopError::validation(
            "sku",
            "only letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(sku)
}

/// Validate variant attributes: non-empty keys and values, lowercase keys.
pub(crate) fn normalize_attributes(
    raw: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ShopError> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();
        if key.is_empty() || value.is_empty() {
            return Err(ShopError::validation(
                "attributes",
                "keys and values must not be empty",
            ));
        }
        if out.insert(key.clone(), value).is_some() {
            return Err(ShopError::validation(
                "attributes",
                format!("duplicate attribute '{key}'"),
            ));
        }
    }
    Ok(out)
}

/// Filter for catalog listings. Empty filter lists everything visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub category: Option<CategoryId>,
    pub subcategory: Option<SubcategoryId>,
    pub vendor: Option<VendorId>,
    /// Case-insensitive substring over name and description.
    pub text: Option<String>,
    /// Only products with an active variant in stock.
    #[serde(default)]
    pub only_available: bool,
    /// Include inactive products and vendors (admin listings).
    #[serde(default)]
    pub include_inactive: bool,
}

/// One row of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub product_id: ProductId,
    pub name: String,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub subcategory_id: SubcategoryId,
    /// Lowest effective price among active variants, or the base price.
    pub from_price: Money,
    /// Total stock across active variants.
    pub stock: u64,
    pub active: bool,
}

/// Full product view with category path and variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub vendor_name: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub variants: Vec<VariantView>,
}

/// Variant with its resolved price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantView {
    pub variant: Variant,
    pub price: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sku_normalisation() {
        assert_eq!(normalize_sku(" tee-red_m ").unwrap(), "TEE-RED_M");
        assert!(normalize_sku("").is_err());
        assert!(normalize_sku("has space").is_err());
        assert!(normalize_sku(&"A".repeat(65)).is_err());
    }

    #[test]
    fn attributes_are_lowercased_and_checked() {
        let mut raw = BTreeMap::new();
        raw.insert(" Size ".to_string(), " M ".to_string());
        let out = normalize_attributes(&raw).unwrap();
        assert_eq!(out.get("size").map(String::as_str), Some("M"));

        let mut dup = BTreeMap::new();
        dup.insert("Color".to_string(), "red".to_string());
        dup.insert("color".to_string(), "blue".to_string());
        assert!(normalize_attributes(&dup).is_err());
    }

    #[test]
    fn effective_price_falls_back_to_base() {
        let product = Product {
            id: ProductId(1),
            vendor_id: VendorId(1),
            subcategory_id: SubcategoryId(1),
            name: "Tee".into(),
            description: String::new(),
            base_price: Money::from_cents(1500),
            active: true,
            created_at: 0,
        };
        let mut variant = Variant {
            id: VariantId(1),
            product_id: ProductId(1),
            sku: "TEE".into(),
            attributes: BTreeMap::new(),
            price: None,
            stock: 1,
            active: true,
        };
        assert_eq!(variant.effective_price(&product), Money::from_cents(1500));
        variant.price = Some(Money::from_cents(1800));
        assert_eq!(variant.effective_price(&product), Money::from_cents(1800));
    }
}
