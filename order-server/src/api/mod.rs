//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`orders`] - order creation, listing, backdating, statuses
//! - [`customers`] - customer notes
//! - [`sequence`] - sequence counter visibility
//! - [`stock`] - stock ledger seeding

pub mod customers;
pub mod health;
pub mod orders;
pub mod sequence;
pub mod stock;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build the API router (without middleware or state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(customers::router())
        .merge(sequence::router())
        .merge(stock::router())
}
