//! # Error Types
//!
//! A single error enum for every storefront operation.

use thiserror::Error;

/// Errors produced by the storefront engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The operation would violate a uniqueness or reference constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input failed validation.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Not enough stock to satisfy the requested quantity.
    #[error("insufficient stock for variant {variant}: requested {requested}, available {available}")]
    InsufficientStock {
        variant: u64,
        requested: u32,
        available: u32,
    },

    /// The entity is inactive and cannot be sold.
    #[error("{kind} {id} is not available")]
    Unavailable { kind: &'static str, id: u64 },

    /// Sale status transition is not allowed.
    #[error("cannot {action} a sale in status {from}")]
    InvalidTransition { from: &'static str, action: &'static str },

    /// Checkout of a cart without lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Closed carts cannot be modified.
    #[error("cart {0} is closed")]
    CartClosed(u64),

    /// No tariff covers the destination region for this vendor.
    #[error("vendor {vendor} does not ship to region {region}")]
    NoShippingTariff { vendor: u64, region: String },

    /// The vendor cannot receive payments.
    #[error("vendor {0} has no primary bank account")]
    NoBankAccount(u64),

    /// Arithmetic overflow on money or quantities.
    #[error("arithmetic overflow")]
    Overflow,

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Snapshot encoding or decoding failure.
    #[error("format error: {0}")]
    Format(String),
}

impl ShopError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Short machine-readable kind, used by the HTTP layer.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Validation { .. } => "validation",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::Unavailable { .. } => "unavailable",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::EmptyCart => "empty_cart",
            Self::CartClosed(_) => "cart_closed",
            Self::NoShippingTariff { .. } => "no_shipping_tariff",
            Self::NoBankAccount(_) => "no_bank_account",
            Self::Overflow => "overflow",
            Self::Storage(_) => "storage",
            Self::Format(_) => "format",
        }
    }
}

/// Result alias for storefront operations.
pub type ShopResult<T> = Result<T, ShopError>;
