//! # Formats Module
//!
//! Binary snapshot format for a whole `Shop`.
//!
//! This module contains:
//! - Snapshot encoding (magic + version header + postcard body)
//! - Snapshot digest (BLAKE3, behind the `crypto-hash` feature)
//!
//! Note: file I/O lives in the app layer (apps/tienda). This module only
//! converts between a `Shop` and bytes.

mod persistence;

pub use persistence::*;
