//! Order domain model
//!
//! The order record is deliberately small: customer reference, line items,
//! status and the two timestamps the backdating endpoint rewrites. The
//! sequential order number is NOT a field on the order - it lives in its own
//! per-order metadata record ([`SequenceAssignment`]) and is written at most
//! once, so the assignment path can stay idempotent without touching the
//! order record itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::util::now_millis;

/// Order lifecycle status
///
/// The first four are the stock platform statuses; `Shipped`, `Returned` and
/// `PartiallyReturned` are merchant-specific fulfilment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Shipped,
    Returned,
    PartiallyReturned,
}

impl OrderStatus {
    /// Human-readable label, as shown in operator-facing listings
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Shipped => "Shipped",
            Self::Returned => "Returned",
            Self::PartiallyReturned => "Partially Returned",
        }
    }

    /// True for the merchant-specific fulfilment statuses
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Shipped | Self::Returned | Self::PartiallyReturned)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single purchased line on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier (stock ledger key)
    pub product_id: String,
    /// Product name at time of purchase
    pub name: String,
    /// Units purchased
    pub quantity: u32,
    /// Unit price at time of purchase
    pub unit_price: Decimal,
}

impl LineItem {
    /// Line subtotal (quantity x unit price)
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Order record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order id (UUID v4)
    pub id: String,
    /// Customer id, if the order belongs to a known customer
    pub customer_id: Option<String>,
    /// Current status
    pub status: OrderStatus,
    /// Purchased lines
    pub items: Vec<LineItem>,
    /// Free-form order note
    pub note: Option<String>,
    /// Creation time (Unix millis, rewritable by backdating)
    pub created_at: i64,
    /// Payment time (Unix millis), if paid
    pub paid_at: Option<i64>,
}

impl Order {
    /// Create a new order with a fresh UUID, stamped at the current time
    pub fn new(customer_id: Option<String>, items: Vec<LineItem>, note: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id,
            status: OrderStatus::Processing,
            items,
            note,
            created_at: now_millis(),
            paid_at: None,
        }
    }

    /// Order total across all lines
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|i| i.subtotal()).sum()
    }
}

/// Per-order sequence number record, written at most once per order
///
/// `number` is either the next value of the global sequence counter, or a
/// Unix-seconds timestamp when the counter lock could not be acquired. The
/// `fallback` flag marks the latter so the operator can reconcile those
/// orders later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceAssignment {
    /// Assigned order number
    pub number: u64,
    /// True when the number is a timestamp fallback, not a counter value
    pub fallback: bool,
    /// Assignment time (Unix millis)
    pub assigned_at: i64,
}

/// Customer profile with the operator-maintained notes shown on order detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: String,
    pub name: String,
    /// Operator notes about this customer (surfaced on every order detail)
    pub notes: Option<String>,
}
