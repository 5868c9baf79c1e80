//! # Vendors
//!
//! Vendors, the bank accounts their customers pay into, and the shipping
//! tariffs they charge per destination region.

use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::FALLBACK_REGION;
use crate::types::{BankAccountId, TariffId, Timestamp, VendorId};
use serde::{Deserialize, Serialize};

// =============================================================================
// VENDOR
// =============================================================================

/// A seller on the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub email: String,
    /// Inactive vendors are hidden from the catalog and cannot sell.
    pub active: bool,
    pub created_at: Timestamp,
}

/// Input for creating a vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInput {
    pub name: String,
    pub email: String,
}

/// Partial vendor update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Validate an email address: exactly one `@` with non-empty local and domain parts.
pub(crate) fn validate_email(raw: &str) -> Result<String, ShopError> {
    let email = raw.trim();
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    };
    if !valid {
        return Err(ShopError::validation(
            "email",
            format!("'{email}' is not a valid address"),
        ));
    }
    Ok(email.to_lowercase())
}

// =============================================================================
// BANK ACCOUNTS
// =============================================================================

/// Minimum normalised account number length.
const MIN_ACCOUNT_LEN: usize = 8;
/// Maximum normalised account number length (IBAN upper bound).
const MAX_ACCOUNT_LEN: usize = 34;

/// A vendor's bank account for bank-transfer payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub vendor_id: VendorId,
    pub bank_name: String,
    pub holder_name: String,
    /// Normalised: uppercase alphanumerics, no separators.
    pub account_number: String,
    /// Exactly one account per vendor carries this flag.
    pub primary: bool,
}

impl BankAccount {
    /// Account number with everything but the last four characters hidden.
    #[must_use]
    pub fn masked_number(&self) -> String {
        mask_account_number(&self.account_number)
    }
}

/// Input for registering a bank account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccountInput {
    pub bank_name: String,
    pub holder_name: String,
    pub account_number: String,
}

/// Strip spaces and dashes, uppercase, and check length and charset.
pub(crate) fn normalize_account_number(raw: &str) -> Result<String, ShopError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !cleaned.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ShopError::validation(
            "account_number",
            "only letters and digits are allowed",
        ));
    }
    if cleaned.len() < MIN_ACCOUNT_LEN || cleaned.len() > MAX_ACCOUNT_LEN {
        return Err(ShopError::validation(
            "account_number",
            format!("must be {MIN_ACCOUNT_LEN}-{MAX_ACCOUNT_LEN} characters"),
        ));
    }
    Ok(cleaned)
}

/// Mask all but the last four characters.
#[must_use]
pub fn mask_account_number(number: &str) -> String {
    let visible: String = number
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{visible}")
}

// =============================================================================
// SHIPPING TARIFFS
// =============================================================================

/// What a vendor charges to ship to a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingTariff {
    pub id: TariffId,
    pub vendor_id: VendorId,
    /// Uppercased region code, or `*` for the vendor's fallback.
    pub region: String,
    pub base_cost: Money,
    pub per_item_cost: Money,
    /// Shipping is free when the vendor subtotal reaches this amount.
    pub free_over: Option<Money>,
}

impl ShippingTariff {
    /// Shipping cost for a parcel of `item_count` items worth `subtotal`.
    pub fn cost(&self, item_count: u64, subtotal: Money) -> Result<Money, ShopError> {
        if let Some(threshold) = self.free_over {
            if subtotal >= threshold {
                return Ok(Money::ZERO);
            }
        }
        self.per_item_cost
            .checked_mul(item_count)?
            .checked_add(self.base_cost)
    }
}

/// Input for creating or replacing a tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffInput {
    pub region: String,
    pub base_cost: Money,
    pub per_item_cost: Money,
    pub free_over: Option<Money>,
}

/// Normalise a region code: trimmed and uppercased.
pub fn normalize_region(raw: &str) -> Result<String, ShopError> {
    let region = raw.trim().to_uppercase();
    if region.is_empty() {
        return Err(ShopError::validation("region", "must not be empty"));
    }
    if region.chars().count() > 64 {
        return Err(ShopError::validation("region", "must be at most 64 characters"));
    }
    Ok(region)
}

/// Pick the tariff for `region`: exact match first, then the `*` fallback.
pub fn select_tariff<'a, I>(tariffs: I, region: &str) -> Option<&'a ShippingTariff>
where
    I: IntoIterator<Item = &'a ShippingTariff>,
{
    let region = region.trim().to_uppercase();
    let mut fallback = None;
    for tariff in tariffs {
        if tariff.region == region {
            return Some(tariff);
        }
        if tariff.region == FALLBACK_REGION {
            fallback = Some(tariff);
        }
    }
    fallback
}
