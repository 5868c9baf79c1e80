//! # Tienda Library
//!
//! This library exposes the Tienda modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod store;

// Re-export tienda_core for convenience
pub use tienda_core;

/// Current wall-clock time as Unix seconds.
///
/// The core never reads the clock; every timestamp it stores comes from here.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
