//! # Core Types
//!
//! Identifier newtypes and the customer key.
//!
//! Every entity kind gets its own `u64` newtype so ids of different kinds
//! cannot be mixed up. Ids are allocated by the `Shop` from monotonic
//! counters and never reused.

use crate::error::ShopError;
use crate::primitives::MAX_CUSTOMER_KEY_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in seconds, supplied by the caller.
pub type Timestamp = u64;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

id_type!(
    /// Identifier of a vendor.
    VendorId
);
id_type!(
    /// Identifier of a vendor bank account.
    BankAccountId
);
id_type!(
    /// Identifier of a vendor shipping tariff.
    TariffId
);
id_type!(
    /// Identifier of a top-level category.
    CategoryId
);
id_type!(
    /// Identifier of a subcategory.
    SubcategoryId
);
id_type!(
    /// Identifier of a product.
    ProductId
);
id_type!(
    /// Identifier of a purchasable product variant.
    VariantId
);
id_type!(
    /// Identifier of a shopping cart.
    CartId
);
id_type!(
    /// Identifier of a customer order (one checkout).
    OrderId
);
id_type!(
    /// Identifier of a per-vendor sale within an order.
    SaleId
);

/// Opaque customer identity.
///
/// There is no membership system: the caller decides what the key means
/// (session id, email, external account id). It only has to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerKey(String);

impl CustomerKey {
    /// Validate and normalise a customer key (trimmed, 1..=128 bytes).
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ShopError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ShopError::validation("customer", "must not be empty"));
        }
        if trimmed.len() > MAX_CUSTOMER_KEY_LEN {
            return Err(ShopError::validation(
                "customer",
                format!("must be at most {MAX_CUSTOMER_KEY_LEN} bytes"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seconds per UTC day, used for daily report buckets.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// UTC day index of a timestamp.
#[must_use]
pub fn day_of(ts: Timestamp) -> u64 {
    ts / SECONDS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_key_is_trimmed() {
        let key = CustomerKey::new("  alice@example.com ").unwrap();
        assert_eq!(key.as_str(), "alice@example.com");
    }

    #[test]
    fn customer_key_rejects_blank() {
        assert!(CustomerKey::new("   ").is_err());
        assert!(CustomerKey::new("x".repeat(129)).is_err());
    }

    #[test]
    fn ids_order_numerically() {
        assert!(ProductId(2) < ProductId(10));
        assert_eq!(VariantId::from(7).to_string(), "7");
    }

    #[test]
    fn day_bucketing() {
        assert_eq!(day_of(0), 0);
        assert_eq!(day_of(86_399), 0);
        assert_eq!(day_of(86_400), 1);
    }
}
