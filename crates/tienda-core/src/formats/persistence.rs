//! Snapshot encoding.
//!
//! Layout:
//!
//! ```text
//! +--------+---------+---------------------------+
//! | "TNDA" | version | postcard(ShopSnapshot)    |
//! | 4 B    | 1 B     | rest                      |
//! +--------+---------+---------------------------+
//! ```

use crate::error::ShopError;
use crate::shop::{Shop, ShopSnapshot};

/// Magic bytes at the start of every snapshot.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"TNDA";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 1;

/// Encode a shop as a versioned binary snapshot.
pub fn encode_snapshot(shop: &Shop) -> Result<Vec<u8>, ShopError> {
    let body = postcard::to_allocvec(&ShopSnapshot::from(shop))
        .map_err(|e| ShopError::Format(format!("encode: {e}")))?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(SNAPSHOT_MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a snapshot, checking the header and the shop's integrity.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Shop, ShopError> {
    let (magic, rest) = bytes
        .split_at_checked(SNAPSHOT_MAGIC.len())
        .ok_or_else(|| ShopError::Format("snapshot is truncated".into()))?;
    if magic != SNAPSHOT_MAGIC {
        return Err(ShopError::Format("not a tienda snapshot".into()));
    }
    let (&version, body) = rest
        .split_first()
        .ok_or_else(|| ShopError::Format("snapshot is truncated".into()))?;
    if version != SNAPSHOT_VERSION {
        return Err(ShopError::Format(format!(
            "unsupported snapshot version {version} (expected {SNAPSHOT_VERSION})"
        )));
    }

    let snapshot: ShopSnapshot =
        postcard::from_bytes(body).map_err(|e| ShopError::Format(format!("decode: {e}")))?;
    Shop::try_from(snapshot)
}

/// BLAKE3 digest of snapshot bytes, as lowercase hex.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
