//! # Demo Seeder
//!
//! Populates an empty shop with two vendors and a small catalog, enough to
//! browse, fill a cart and check out against every code path.

use crate::catalog::{ProductInput, VariantInput};
use crate::error::ShopError;
use crate::money::Money;
use crate::shop::{Shop, ShopStats};
use crate::types::{ProductId, SubcategoryId, Timestamp, VendorId};
use crate::vendor::{BankAccountInput, TariffInput, VendorInput};
use std::collections::BTreeMap;

struct DemoVendor {
    name: &'static str,
    email: &'static str,
    bank: &'static str,
    account: &'static str,
    /// (region, base, per item, free over)
    tariffs: &'static [(&'static str, u64, u64, Option<u64>)],
}

const VENDORS: [DemoVendor; 2] = [
    DemoVendor {
        name: "Textiles del Sur",
        email: "ventas@textilesdelsur.example",
        bank: "Banco Uno",
        account: "ES9121000418450200051332",
        tariffs: &[("*", 600, 100, Some(6000)), ("MADRID", 350, 50, Some(4000))],
    },
    DemoVendor {
        name: "Casa Verde",
        email: "hola@casaverde.example",
        bank: "Banco Dos",
        account: "ES7921000813610123456789",
        tariffs: &[("*", 450, 0, None)],
    },
];

/// (category, subcategories)
const CATEGORIES: [(&str, &[&str]); 2] = [
    ("Ropa", &["Camisetas", "Sudaderas"]),
    ("Hogar", &["Cocina", "Plantas"]),
];

/// (vendor index, subcategory name, product name, base cents, variants)
type DemoProduct = (
    usize,
    &'static str,
    &'static str,
    u64,
    &'static [(&'static str, &'static str, Option<u64>, u32)],
);

/// Variants are (sku, size/kind attribute, price override, stock).
const PRODUCTS: [DemoProduct; 5] = [
    (
        0,
        "Camisetas",
        "Camiseta basica",
        1500,
        &[("CAM-BAS-S", "s", None, 20), ("CAM-BAS-M", "m", None, 25), ("CAM-BAS-XL", "xl", Some(1700), 3)],
    ),
    (
        0,
        "Sudaderas",
        "Sudadera con capucha",
        3900,
        &[("SUD-CAP-M", "m", None, 8), ("SUD-CAP-L", "l", None, 0)],
    ),
    (1, "Cocina", "Tabla de olivo", 2450, &[("TAB-OLI", "unica", None, 12)]),
    (1, "Plantas", "Maceta de barro", 890, &[("MAC-BAR-P", "p", None, 40), ("MAC-BAR-G", "g", Some(1290), 2)]),
    (1, "Plantas", "Regadera", 1290, &[("REG-1L", "unica", None, 15)]),
];

/// Fill an empty shop with demo data.
///
/// The seed is built on a scratch copy and swapped in only when complete.
pub fn seed_demo(shop: &mut Shop, now: Timestamp) -> Result<ShopStats, ShopError> {
    if !shop.is_empty() {
        return Err(ShopError::conflict("shop already has data; refusing to seed"));
    }
    let mut scratch = Shop::new();

    let mut vendor_ids: Vec<VendorId> = Vec::with_capacity(VENDORS.len());
    for demo in &VENDORS {
        let id = scratch.create_vendor(
            &VendorInput {
                name: demo.name.into(),
                email: demo.email.into(),
            },
            now,
        )?;
        scratch.add_bank_account(
            id,
            &BankAccountInput {
                bank_name: demo.bank.into(),
                holder_name: demo.name.into(),
                account_number: demo.account.into(),
            },
        )?;
        for &(region, base, per_item, free_over) in demo.tariffs {
            scratch.set_shipping_tariff(
                id,
                &TariffInput {
                    region: region.into(),
                    base_cost: Money::from_cents(base),
                    per_item_cost: Money::from_cents(per_item),
                    free_over: free_over.map(Money::from_cents),
                },
            )?;
        }
        vendor_ids.push(id);
    }

    let mut subcategories: BTreeMap<&str, SubcategoryId> = BTreeMap::new();
    for (category, subs) in CATEGORIES {
        let category_id = scratch.create_category(category, "")?;
        for &sub in subs {
            subcategories.insert(sub, scratch.create_subcategory(category_id, sub)?);
        }
    }

    for (vendor_index, sub, name, base, variants) in PRODUCTS {
        let vendor_id = vendor_ids
            .get(vendor_index)
            .copied()
            .ok_or_else(|| ShopError::not_found("vendor", vendor_index))?;
        let subcategory_id = *subcategories
            .get(sub)
            .ok_or_else(|| ShopError::not_found("subcategory", sub))?;
        let product: ProductId = scratch.create_product(
            &ProductInput {
                vendor_id,
                subcategory_id,
                name: name.into(),
                description: String::new(),
                base_price: Money::from_cents(base),
            },
            now,
        )?;
        for &(sku, size, price, stock) in variants {
            scratch.add_variant(
                product,
                &VariantInput {
                    sku: sku.into(),
                    attributes: BTreeMap::from([("size".to_string(), size.to_string())]),
                    price: price.map(Money::from_cents),
                    stock,
                },
            )?;
        }
    }

    *shop = scratch;
    Ok(shop.stats())
}
