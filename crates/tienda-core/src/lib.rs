//! # Tienda Core
//!
//! The deterministic engine of a small multi-vendor storefront.
//!
//! ## Design Principles
//!
//! - All collections are `BTreeMap`s: iteration, listings and snapshots
//!   always come out in the same order
//! - No floating point: money is integer minor units (`Money`)
//! - No wall clock: every operation that records time takes a `Timestamp`
//! - Validate first, mutate last: a failed operation leaves the shop as it was
//!
//! ## Layout
//!
//! - [`shop`]: the `Shop` state and every operation on it
//! - [`vendor`], [`catalog`], [`cart`], [`sale`]: domain records
//! - [`report`]: read-only aggregates
//! - [`seed`]: demo data
//! - [`formats`]: binary snapshots
//! - [`storage`]: redb persistence and the `ShopStore` seam

pub mod cart;
pub mod catalog;
pub mod error;
pub mod formats;
pub mod money;
pub mod primitives;
pub mod report;
pub mod sale;
pub mod seed;
pub mod shop;
pub mod storage;
pub mod types;
pub mod vendor;

pub use cart::{Cart, CartLine, CartLineView, CartStatus, CartView, VendorGroup};
pub use catalog::{
    CatalogFilter, Category, ListingEntry, Product, ProductDetail, ProductInput, ProductUpdate,
    Subcategory, Variant, VariantInput, VariantUpdate, VariantView,
};
pub use error::{ShopError, ShopResult};
pub use formats::{SNAPSHOT_MAGIC, SNAPSHOT_VERSION, decode_snapshot, encode_snapshot};
#[cfg(feature = "crypto-hash")]
pub use formats::snapshot_digest;
pub use money::Money;
pub use report::{DailyRevenue, LowStockEntry, ProductRanking, SalesSummary, StatusCount, VendorSummary};
pub use sale::{
    Order, OrderView, PaymentInstructions, Sale, SaleAction, SaleLine, SaleStatus, ShippingAddress,
};
pub use seed::seed_demo;
pub use shop::{IdCounters, Shop, ShopSnapshot, ShopStats};
pub use storage::{RedbStore, ShopStore};
pub use types::{
    BankAccountId, CartId, CategoryId, CustomerKey, OrderId, ProductId, SaleId, SubcategoryId,
    TariffId, Timestamp, VariantId, VendorId,
};
pub use vendor::{
    BankAccount, BankAccountInput, ShippingTariff, TariffInput, Vendor, VendorInput,
    VendorUpdate,
};
