//! Request and response bodies that are not core types.

use serde::{Deserialize, Serialize};
use tienda_core::{
    CategoryId, Category, Money, SaleStatus, ShopStats, Subcategory, SubcategoryId, VariantId,
    VendorId,
};

// =============================================================================
// QUERIES
// =============================================================================

/// `GET /api/v1/catalog` query string.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<CategoryId>,
    pub subcategory: Option<SubcategoryId>,
    pub vendor: Option<VendorId>,
    pub q: Option<String>,
    #[serde(default)]
    pub available: bool,
}

/// Time range for reports. Missing `to` means "now".
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub from: u64,
    pub to: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct ThresholdQuery {
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

fn default_threshold() -> u32 {
    5
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub status: Option<SaleStatus>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub region: String,
    #[serde(default = "default_items")]
    pub items: u64,
    #[serde(default)]
    pub subtotal: Money,
}

fn default_items() -> u64 {
    1
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

/// `POST .../cart/items`
#[derive(Debug, Deserialize, Serialize)]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// `PUT .../cart/items/{variant_id}`
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StockRequest {
    pub stock: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RestockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PayRequest {
    pub reference: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ShipRequest {
    pub tracking_code: String,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub stats: ShopStats,
}

/// A category with its subcategories.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTree {
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// Id of a newly created record.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockResponse {
    pub variant_id: VariantId,
    pub stock: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub vendor_id: VendorId,
    pub region: String,
    pub shipping: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub sale_id: u64,
    pub status: SaleStatus,
}
