//! # CLI Module
//!
//! Command-line interface for Tienda.
//!
//! Every command is a `cmd_*` function returning `Result<(), String>` so it
//! can be driven from integration tests without spawning the binary.

use crate::config::{DEFAULT_ADDR, DEFAULT_RATE_LIMIT, ServerConfig};
use crate::store::open_store;
use crate::unix_now;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tienda_core::{
    SNAPSHOT_MAGIC, Shop, ShopSnapshot, decode_snapshot, encode_snapshot, seed_demo,
};

// =============================================================================
// CLI DEFINITIONS
// =============================================================================

/// Tienda - multi-vendor storefront
#[derive(Parser, Debug)]
#[command(name = "tienda")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the database
    #[arg(long, global = true, env = "TIENDA_DB", default_value = "tienda.db")]
    pub db: PathBuf,

    /// Storage backend: file or redb
    #[arg(long, global = true, env = "TIENDA_BACKEND", default_value = "file")]
    pub backend: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Fill an empty database with demo vendors and products
    Seed,

    /// Show entity counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a sales or stock report
    Report {
        /// summary, top, low-stock, daily or status
        kind: String,

        /// Range start, Unix seconds (inclusive)
        #[arg(long, default_value_t = 0)]
        from: u64,

        /// Range end, Unix seconds (exclusive; default: now + 1)
        #[arg(long)]
        to: Option<u64>,

        /// Rows for the top report
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Stock threshold for the low-stock report
        #[arg(long, default_value_t = 5)]
        threshold: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the whole shop
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// binary or json
        #[arg(short, long, default_value = "binary")]
        format: String,
    },

    /// Import a binary or JSON export into an empty database
    Import {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Start the HTTP API server
    Serve {
        /// Listen address
        #[arg(long, env = "TIENDA_ADDR", default_value = DEFAULT_ADDR)]
        addr: String,

        /// Admin API key (admin routes are refused without one)
        #[arg(long, env = "TIENDA_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Requests per second across all clients; 0 disables the limit
        #[arg(long, env = "TIENDA_RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
        rate_limit: u32,

        /// Allowed CORS origin (default: any)
        #[arg(long, env = "TIENDA_CORS_ORIGIN")]
        cors_origin: Option<String>,
    },
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

/// Load the shop at `db_path`, or an empty one if nothing is stored yet.
pub fn load_or_create_shop(db_path: &Path, backend: &str) -> Result<Shop, String> {
    let store = open_store(db_path, backend)?;
    store
        .load()
        .map_err(|e| format!("Failed to load {}: {}", store.describe(), e))
}

/// Save the shop to `db_path` with the given backend.
pub fn save_shop(shop: &Shop, db_path: &Path, backend: &str) -> Result<(), String> {
    let store = open_store(db_path, backend)?;
    store
        .save(shop)
        .map_err(|e| format!("Failed to save {}: {}", store.describe(), e))
}

// =============================================================================
// COMMANDS
// =============================================================================

pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), String> {
    if db_path.exists() {
        if !force {
            return Err(format!(
                "Database already exists at {}. Use --force to overwrite.",
                db_path.display()
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| format!("Failed to remove {}: {}", db_path.display(), e))?;
    }

    save_shop(&Shop::new(), db_path, backend)?;
    println!("Initialized empty shop at {} ({})", db_path.display(), backend);
    Ok(())
}

pub fn cmd_seed(db_path: &Path, backend: &str) -> Result<(), String> {
    let mut shop = load_or_create_shop(db_path, backend)?;
    let stats = seed_demo(&mut shop, unix_now()).map_err(|e| e.to_string())?;
    save_shop(&shop, db_path, backend)?;

    println!(
        "Seeded {} vendors, {} categories, {} products, {} variants",
        stats.vendors, stats.categories, stats.products, stats.variants
    );
    Ok(())
}

pub fn cmd_status(db_path: &Path, backend: &str, json: bool) -> Result<(), String> {
    let shop = load_or_create_shop(db_path, backend)?;
    let stats = shop.stats();

    if json {
        let value = serde_json::json!({
            "database": db_path.display().to_string(),
            "backend": backend,
            "stats": stats,
            "counters": shop.counters(),
        });
        print_json(&value)?;
    } else {
        println!("Database:      {} ({})", db_path.display(), backend);
        println!("Vendors:       {}", stats.vendors);
        println!("Categories:    {}", stats.categories);
        println!("Subcategories: {}", stats.subcategories);
        println!("Products:      {}", stats.products);
        println!("Variants:      {}", stats.variants);
        println!("Open carts:    {}", stats.open_carts);
        println!("Orders:        {}", stats.orders);
        println!("Sales:         {}", stats.sales);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_report(
    db_path: &Path,
    backend: &str,
    kind: &str,
    from: u64,
    to: Option<u64>,
    limit: usize,
    threshold: u32,
    json: bool,
) -> Result<(), String> {
    let shop = load_or_create_shop(db_path, backend)?;
    let to = to.unwrap_or_else(|| unix_now().saturating_add(1));

    match kind {
        "summary" => {
            let summary = shop.sales_summary(from, to).map_err(|e| e.to_string())?;
            if json {
                return print_json(&summary);
            }
            println!("Sales {}..{}", from, to);
            for v in &summary.vendors {
                println!(
                    "  {:<24} sales={:<4} items={:<5} subtotal={} shipping={} total={}",
                    v.vendor_name, v.sales, v.items, v.subtotal, v.shipping, v.total
                );
            }
            println!(
                "  {:<24} sales={:<4} items={:<5} subtotal={} shipping={} total={}",
                "TOTAL", summary.sales, summary.items, summary.subtotal, summary.shipping, summary.total
            );
        }
        "top" => {
            let ranking = shop.top_products(limit).map_err(|e| e.to_string())?;
            if json {
                return print_json(&ranking);
            }
            for (rank, p) in ranking.iter().enumerate() {
                println!(
                    "{:>3}. {:<32} qty={:<5} revenue={}",
                    rank + 1,
                    p.product_name,
                    p.quantity,
                    p.revenue
                );
            }
        }
        "low-stock" => {
            let entries = shop.low_stock(threshold);
            if json {
                return print_json(&entries);
            }
            for e in &entries {
                println!("{:<16} {:<32} stock={}", e.sku, e.product_name, e.stock);
            }
        }
        "daily" => {
            let days = shop.daily_revenue(from, to).map_err(|e| e.to_string())?;
            if json {
                return print_json(&days);
            }
            for d in &days {
                println!("day {:<6} sales={:<4} total={}", d.day, d.sales, d.total);
            }
        }
        "status" => {
            let counts = shop.status_counts();
            if json {
                return print_json(&counts);
            }
            for c in &counts {
                println!("{:<10} {}", c.status.as_str(), c.count);
            }
        }
        _ => {
            return Err(format!(
                "Unknown report '{}'. Valid reports: summary, top, low-stock, daily, status",
                kind
            ));
        }
    }
    Ok(())
}

pub fn cmd_export(db_path: &Path, backend: &str, output: &Path, format: &str) -> Result<(), String> {
    let shop = load_or_create_shop(db_path, backend)?;

    let data = match format {
        "binary" => encode_snapshot(&shop).map_err(|e| e.to_string())?,
        "json" => serde_json::to_vec_pretty(&ShopSnapshot::from(&shop))
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?,
        _ => {
            return Err(format!(
                "Unknown export format '{}'. Valid formats: binary, json",
                format
            ));
        }
    };

    std::fs::write(output, &data)
        .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
    println!("Exported {} bytes to {} ({})", data.len(), output.display(), format);
    Ok(())
}

pub fn cmd_import(db_path: &Path, backend: &str, input: &Path) -> Result<(), String> {
    let data = std::fs::read(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;

    let imported = if data.starts_with(SNAPSHOT_MAGIC) {
        decode_snapshot(&data).map_err(|e| e.to_string())?
    } else {
        let snapshot: ShopSnapshot = serde_json::from_slice(&data)
            .map_err(|e| format!("Input is neither a binary snapshot nor valid JSON: {}", e))?;
        Shop::try_from(snapshot).map_err(|e| e.to_string())?
    };

    let existing = load_or_create_shop(db_path, backend)?;
    if !existing.is_empty() {
        return Err(format!(
            "Database at {} is not empty; import only into an empty database",
            db_path.display()
        ));
    }

    save_shop(&imported, db_path, backend)?;
    let stats = imported.stats();
    println!(
        "Imported {} vendors, {} products, {} orders into {}",
        stats.vendors,
        stats.products,
        stats.orders,
        db_path.display()
    );
    Ok(())
}

pub async fn cmd_serve(db_path: &Path, backend: &str, config: ServerConfig) -> Result<(), String> {
    let store = open_store(db_path, backend)?;
    crate::api::start_server(store, config)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
    println!("{}", text);
    Ok(())
}
