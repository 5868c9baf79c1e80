//! # Reports
//!
//! Read-only aggregates over sales and stock.
//!
//! Cancelled sales never count towards revenue, quantities or rankings.
//! Time ranges are half-open `[from, to)` over a sale's `created_at`.

use crate::error::ShopError;
use crate::money::Money;
use crate::sale::{Sale, SaleStatus};
use crate::shop::Shop;
use crate::types::{ProductId, SECONDS_PER_DAY, Timestamp, VariantId, VendorId, day_of};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// REPORT TYPES
// =============================================================================

/// Sales totals of one vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub sales: u64,
    pub items: u64,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Sales totals over a time range, per vendor and overall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub from: Timestamp,
    pub to: Timestamp,
    pub vendors: Vec<VendorSummary>,
    pub sales: u64,
    pub items: u64,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

/// A product's position in the best-seller ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRanking {
    pub product_id: ProductId,
    pub product_name: String,
    pub vendor_id: VendorId,
    pub quantity: u64,
    pub revenue: Money,
}

/// An active variant running out of stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub stock: u32,
}

/// Revenue of one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
    /// Days since the Unix epoch.
    pub day: u64,
    /// Timestamp of the day's first second.
    pub day_start: Timestamp,
    pub sales: u64,
    pub total: Money,
}

/// Number of sales in a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: SaleStatus,
    pub count: u64,
}

fn check_range(from: Timestamp, to: Timestamp) -> Result<(), ShopError> {
    if from > to {
        return Err(ShopError::validation("range", "from must not be after to"));
    }
    Ok(())
}

// =============================================================================
// REPORTS
// =============================================================================

impl Shop {
    fn revenue_sales(&self) -> impl Iterator<Item = &Sale> {
        self.sales().filter(|s| s.status.counts_as_revenue())
    }

    /// Per-vendor and overall totals of sales created in `[from, to)`.
    pub fn sales_summary(&self, from: Timestamp, to: Timestamp) -> Result<SalesSummary, ShopError> {
        check_range(from, to)?;
        let mut vendors: BTreeMap<VendorId, VendorSummary> = BTreeMap::new();

        for sale in self
            .revenue_sales()
            .filter(|s| s.created_at >= from && s.created_at < to)
        {
            let entry = vendors.entry(sale.vendor_id).or_insert_with(|| VendorSummary {
                vendor_id: sale.vendor_id,
                vendor_name: self
                    .vendor(sale.vendor_id)
                    .map(|v| v.name.clone())
                    .unwrap_or_default(),
                ..VendorSummary::default()
            });
            entry.sales += 1;
            entry.items += sale.item_count();
            entry.subtotal = entry.subtotal.checked_add(sale.subtotal)?;
            entry.shipping = entry.shipping.checked_add(sale.shipping)?;
            entry.total = entry.total.checked_add(sale.total)?;
        }

        let vendors: Vec<VendorSummary> = vendors.into_values().collect();
        Ok(SalesSummary {
            from,
            to,
            sales: vendors.iter().map(|v| v.sales).sum(),
            items: vendors.iter().map(|v| v.items).sum(),
            subtotal: Money::sum(vendors.iter().map(|v| v.subtotal))?,
            shipping: Money::sum(vendors.iter().map(|v| v.shipping))?,
            total: Money::sum(vendors.iter().map(|v| v.total))?,
            vendors,
        })
    }

    /// Best-selling products by quantity, then revenue, then id.
    pub fn top_products(&self, limit: usize) -> Result<Vec<ProductRanking>, ShopError> {
        let mut by_product: BTreeMap<ProductId, ProductRanking> = BTreeMap::new();

        for sale in self.revenue_sales() {
            for line in &sale.lines {
                let entry = by_product
                    .entry(line.product_id)
                    .or_insert_with(|| ProductRanking {
                        product_id: line.product_id,
                        // Prefer the current name; fall back to the one sold.
                        product_name: self
                            .product(line.product_id)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|_| line.product_name.clone()),
                        vendor_id: sale.vendor_id,
                        quantity: 0,
                        revenue: Money::ZERO,
                    });
                entry.quantity += u64::from(line.quantity);
                entry.revenue = entry.revenue.checked_add(line.line_total)?;
            }
        }

        let mut ranking: Vec<ProductRanking> = by_product.into_values().collect();
        ranking.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.product_id.cmp(&b.product_id))
        });
        ranking.truncate(limit);
        Ok(ranking)
    }

    /// Active variants with at most `threshold` units, fewest first.
    #[must_use]
    pub fn low_stock(&self, threshold: u32) -> Vec<LowStockEntry> {
        let mut entries: Vec<LowStockEntry> = self
            .variants()
            .filter(|v| v.active && v.stock <= threshold)
            .map(|v| LowStockEntry {
                variant_id: v.id,
                product_id: v.product_id,
                product_name: self
                    .product(v.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                sku: v.sku.clone(),
                stock: v.stock,
            })
            .collect();
        entries.sort_by_key(|e| (e.stock, e.variant_id));
        entries
    }

    /// Revenue bucketed by UTC day for sales created in `[from, to)`.
    ///
    /// Days without sales are omitted.
    pub fn daily_revenue(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<DailyRevenue>, ShopError> {
        check_range(from, to)?;
        let mut days: BTreeMap<u64, DailyRevenue> = BTreeMap::new();

        for sale in self
            .revenue_sales()
            .filter(|s| s.created_at >= from && s.created_at < to)
        {
            let day = day_of(sale.created_at);
            let entry = days.entry(day).or_insert(DailyRevenue {
                day,
                day_start: day * SECONDS_PER_DAY,
                sales: 0,
                total: Money::ZERO,
            });
            entry.sales += 1;
            entry.total = entry.total.checked_add(sale.total)?;
        }
        Ok(days.into_values().collect())
    }

    /// Number of sales in every status, in lifecycle order.
    #[must_use]
    pub fn status_counts(&self) -> Vec<StatusCount> {
        SaleStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: self.sales().filter(|s| s.status == status).count() as u64,
            })
            .collect()
    }
}
