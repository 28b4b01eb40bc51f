//! Shared domain types for the order utilities server
//!
//! # Modules
//!
//! - [`order`] - Order records, statuses, line items, sequence assignments
//! - [`response`] - Unified API response envelope and pagination
//! - [`util`] - Small time helpers

pub mod order;
pub mod response;
pub mod util;

// Re-export common types
pub use order::{CustomerProfile, LineItem, Order, OrderStatus, SequenceAssignment};
pub use response::{ApiResponse, Pagination};
pub use util::now_millis;
