//! # Storage Module
//!
//! Disk-backed persistence of the shop.
//!
//! `ShopStore` is the seam between the engine and a backend. The redb
//! backend lives here; the snapshot-file backend lives in the app layer.
//!
//! redb gives us:
//! - ACID transactions (a save is all-or-nothing)
//! - Crash safety (copy-on-write B-trees)
//! - One table per entity kind, so records can be inspected individually

mod redb_store;

pub use redb_store::RedbStore;

use crate::error::ShopError;
use crate::shop::Shop;

/// A place the whole shop can be loaded from and saved to.
pub trait ShopStore: Send + Sync {
    /// Load the stored shop. Nothing stored yet loads as an empty shop.
    fn load(&self) -> Result<Shop, ShopError>;

    /// Replace the stored shop atomically.
    fn save(&self, shop: &Shop) -> Result<(), ShopError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

impl ShopStore for RedbStore {
    fn load(&self) -> Result<Shop, ShopError> {
        RedbStore::load(self)
    }

    fn save(&self, shop: &Shop) -> Result<(), ShopError> {
        RedbStore::save(self, shop)
    }

    fn describe(&self) -> String {
        format!("redb:{}", self.path().display())
    }
}
