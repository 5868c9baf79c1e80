//! # Orders and Sales
//!
//! One checkout produces one `Order`. The order is split into one `Sale`
//! per vendor, because every vendor is paid into its own bank account and
//! ships on its own tariff.
//!
//! ## Sale lifecycle
//!
//! ```text
//! Pending ──pay──► Paid ──ship──► Shipped ──deliver──► Delivered
//!    │               │
//!    └────cancel─────┴──► Cancelled (stock returned)
//! ```

use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::clean_text;
use crate::types::{CustomerKey, OrderId, ProductId, SaleId, Timestamp, VariantId, VendorId};
use serde::{Deserialize, Serialize};

/// Status of a per-vendor sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl SaleStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the lowercase name.
    pub fn parse(raw: &str) -> Result<Self, ShopError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == raw.trim().to_lowercase())
            .ok_or_else(|| ShopError::validation("status", format!("unknown status '{raw}'")))
    }

    /// Whether the sale counts towards revenue reports.
    #[must_use]
    pub fn counts_as_revenue(self) -> bool {
        self != Self::Cancelled
    }
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleAction {
    /// Payment received; carries the transfer reference.
    Pay { reference: String },
    /// Handed to the carrier; carries the tracking code.
    Ship { tracking_code: String },
    Deliver,
    Cancel,
}

impl SaleAction {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pay { .. } => "pay",
            Self::Ship { .. } => "ship",
            Self::Deliver => "deliver",
            Self::Cancel => "cancel",
        }
    }
}

/// Compute the status after applying `action` to `from`.
pub fn next_status(from: SaleStatus, action: &SaleAction) -> Result<SaleStatus, ShopError> {
    use SaleStatus::{Cancelled, Delivered, Paid, Pending, Shipped};

    let to = match (from, action) {
        (Pending, SaleAction::Pay { .. }) => Paid,
        (Paid, SaleAction::Ship { .. }) => Shipped,
        (Shipped, SaleAction::Deliver) => Delivered,
        (Pending | Paid, SaleAction::Cancel) => Cancelled,
        _ => {
            return Err(ShopError::InvalidTransition {
                from: from.as_str(),
                action: action.name(),
            });
        }
    };
    Ok(to)
}

/// Where an order is shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub line1: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
}

impl ShippingAddress {
    /// Trim every field and require each to be non-empty.
    pub fn normalized(&self) -> Result<Self, ShopError> {
        Ok(Self {
            recipient: clean_text("recipient", &self.recipient, 120)?,
            line1: clean_text("line1", &self.line1, 200)?,
            city: clean_text("city", &self.city, 120)?,
            region: crate::vendor::normalize_region(&self.region)?,
            postal_code: clean_text("postal_code", &self.postal_code, 20)?,
        })
    }
}

/// Snapshot of a purchased variant at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// The part of an order fulfilled by one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub customer: CustomerKey,
    pub lines: Vec<SaleLine>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub status: SaleStatus,
    pub payment_reference: Option<String>,
    pub tracking_code: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Sale {
    /// Number of items across lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// A checkout: the customer-facing grouping of per-vendor sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: CustomerKey,
    pub address: ShippingAddress,
    pub sale_ids: Vec<SaleId>,
    pub total: Money,
    pub created_at: Timestamp,
}

/// Bank-transfer instructions for paying a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub sale_id: SaleId,
    pub vendor_name: String,
    pub bank_name: String,
    pub holder_name: String,
    pub masked_account: String,
    pub amount_due: Money,
    pub status: SaleStatus,
}

/// Order with its sales resolved, for customer order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub order: Order,
    pub sales: Vec<Sale>,
}
