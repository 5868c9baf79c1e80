//! redb-backed shop store.
//!
//! Every entity kind has its own `u64 -> postcard bytes` table keyed by id.
//! The `meta` table holds the id counters and the schema version.

use crate::error::ShopError;
use crate::shop::{IdCounters, Shop, ShopSnapshot};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, TableError,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

type BlobTable = TableDefinition<'static, u64, &'static [u8]>;

const VENDORS: BlobTable = TableDefinition::new("vendors");
const BANK_ACCOUNTS: BlobTable = TableDefinition::new("bank_accounts");
const TARIFFS: BlobTable = TableDefinition::new("tariffs");
const CATEGORIES: BlobTable = TableDefinition::new("categories");
const SUBCATEGORIES: BlobTable = TableDefinition::new("subcategories");
const PRODUCTS: BlobTable = TableDefinition::new("products");
const VARIANTS: BlobTable = TableDefinition::new("variants");
const CARTS: BlobTable = TableDefinition::new("carts");
const ORDERS: BlobTable = TableDefinition::new("orders");
const SALES: BlobTable = TableDefinition::new("sales");

const META: TableDefinition<'static, &'static str, &'static [u8]> = TableDefinition::new("meta");
const META_COUNTERS: &str = "counters";
const META_SCHEMA: &str = "schema";
const SCHEMA_VERSION: u8 = 1;

/// Shop persisted in a redb database file.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").field("path", &self.path).finish()
    }
}

impl RedbStore {
    /// Open the database at `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ShopError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(ShopError::storage)?;
        Ok(Self { db, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored shop with `shop` in a single write transaction.
    pub fn save(&self, shop: &Shop) -> Result<(), ShopError> {
        let snap = ShopSnapshot::from(shop);
        let txn = self.db.begin_write().map_err(ShopError::storage)?;

        write_table(&txn, VENDORS, snap.vendors.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, BANK_ACCOUNTS, snap.bank_accounts.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, TARIFFS, snap.tariffs.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, CATEGORIES, snap.categories.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, SUBCATEGORIES, snap.subcategories.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, PRODUCTS, snap.products.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, VARIANTS, snap.variants.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, CARTS, snap.carts.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, ORDERS, snap.orders.iter().map(|r| (r.id.0, r)))?;
        write_table(&txn, SALES, snap.sales.iter().map(|r| (r.id.0, r)))?;

        {
            let mut meta = txn.open_table(META).map_err(ShopError::storage)?;
            let counters = encode(&snap.counters)?;
            meta.insert(META_COUNTERS, counters.as_slice())
                .map_err(ShopError::storage)?;
            meta.insert(META_SCHEMA, [SCHEMA_VERSION].as_slice())
                .map_err(ShopError::storage)?;
        }

        txn.commit().map_err(ShopError::storage)
    }

    /// Load the stored shop. A fresh database loads as an empty shop.
    pub fn load(&self) -> Result<Shop, ShopError> {
        let txn = self.db.begin_read().map_err(ShopError::storage)?;
        let counters = match read_meta(&txn)? {
            Some(counters) => counters,
            None => return Ok(Shop::new()),
        };

        let snap = ShopSnapshot {
            vendors: read_table(&txn, VENDORS)?,
            bank_accounts: read_table(&txn, BANK_ACCOUNTS)?,
            tariffs: read_table(&txn, TARIFFS)?,
            categories: read_table(&txn, CATEGORIES)?,
            subcategories: read_table(&txn, SUBCATEGORIES)?,
            products: read_table(&txn, PRODUCTS)?,
            variants: read_table(&txn, VARIANTS)?,
            carts: read_table(&txn, CARTS)?,
            orders: read_table(&txn, ORDERS)?,
            sales: read_table(&txn, SALES)?,
            counters,
        };
        Shop::try_from(snap)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ShopError> {
    postcard::to_allocvec(value).map_err(|e| ShopError::Format(format!("encode: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ShopError> {
    postcard::from_bytes(bytes).map_err(|e| ShopError::Format(format!("decode: {e}")))
}

fn write_table<'a, T, I>(txn: &WriteTransaction, def: BlobTable, rows: I) -> Result<(), ShopError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = (u64, &'a T)>,
{
    txn.delete_table(def).map_err(ShopError::storage)?;
    let mut table = txn.open_table(def).map_err(ShopError::storage)?;
    for (id, row) in rows {
        let bytes = encode(row)?;
        table
            .insert(id, bytes.as_slice())
            .map_err(ShopError::storage)?;
    }
    Ok(())
}

fn read_table<T: DeserializeOwned>(txn: &ReadTransaction, def: BlobTable) -> Result<Vec<T>, ShopError> {
    let table = match txn.open_table(def) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
        Err(e) => return Err(ShopError::storage(e)),
    };
    let mut rows = Vec::new();
    for entry in table.iter().map_err(ShopError::storage)? {
        let (_, value) = entry.map_err(ShopError::storage)?;
        rows.push(decode(value.value())?);
    }
    Ok(rows)
}

fn read_meta(txn: &ReadTransaction) -> Result<Option<IdCounters>, ShopError> {
    let meta = match txn.open_table(META) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(None),
        Err(e) => return Err(ShopError::storage(e)),
    };
    if let Some(schema) = meta.get(META_SCHEMA).map_err(ShopError::storage)? {
        if schema.value() != [SCHEMA_VERSION].as_slice() {
            return Err(ShopError::Format(format!(
                "unsupported database schema {:?}",
                schema.value()
            )));
        }
    }
    match meta.get(META_COUNTERS).map_err(ShopError::storage)? {
        Some(bytes) => decode(bytes.value()).map(Some),
        None => Ok(None),
    }
}
