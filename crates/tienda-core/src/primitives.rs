//! # Primitives
//!
//! Hard limits and small text-validation helpers shared by every module.

use crate::error::ShopError;

/// Maximum length of a display name (vendor, category, product...).
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length of a free-text description.
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// Maximum quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Maximum number of distinct lines in a cart.
pub const MAX_CART_LINES: usize = 50;

/// Maximum length of a customer key.
pub const MAX_CUSTOMER_KEY_LEN: usize = 128;

/// Maximum length of a SKU.
pub const MAX_SKU_LEN: usize = 64;

/// Region value that matches any destination.
pub const FALLBACK_REGION: &str = "*";

/// Trim a required name and enforce its length.
pub(crate) fn clean_name(field: &'static str, raw: &str) -> Result<String, ShopError> {
    clean_text(field, raw, MAX_NAME_LEN)
}

/// Trim a required text field and enforce a maximum length.
pub(crate) fn clean_text(field: &'static str, raw: &str, max: usize) -> Result<String, ShopError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ShopError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(ShopError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional description; empty input becomes an empty string.
pub(crate) fn clean_description(raw: &str) -> Result<String, ShopError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ShopError::validation(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Case-insensitive key used for uniqueness checks on names.
pub(crate) fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}
