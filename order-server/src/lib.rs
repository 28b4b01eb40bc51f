//! Order Utilities Server - merchant order numbering and import tooling
//!
//! # Architecture overview
//!
//! A small HTTP service that owns merchant order records and layers the
//! utilities a storefront migration needs on top of them:
//!
//! - **Sequential numbering** (`sequence`): advisory-lock guarded counter
//!   with a timestamp fallback when the lock cannot be acquired
//! - **Database** (`db`): embedded redb store (orders, counter, locks,
//!   customers, stock, mail outbox)
//! - **Import safety** (`services`): email suppression and stock-reduction
//!   suppression toggles for bulk imports
//! - **HTTP API** (`api`): order creation, backdating, statuses, customer
//!   notes, stock seeding
//!
//! # Module structure
//!
//! ```text
//! order-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # admin-token middleware
//! ├── db/            # redb storage layer
//! ├── sequence/      # counter assigner + advisory lock
//! ├── services/      # notifications, inventory
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # errors, logging, time parsing
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod sequence;
pub mod services;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, Server, ServerState};
pub use db::OrderStore;
pub use sequence::{SequenceAssigner, SequencerConfig};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
///
/// Called once at startup, before config parsing, so LOG_LEVEL / LOG_DIR
/// from the dotenv file are honored.
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(level.as_deref(), log_dir.as_deref());

    Ok(())
}
