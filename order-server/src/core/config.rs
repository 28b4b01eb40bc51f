use std::path::PathBuf;

use crate::sequence::SequencerConfig;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/order-server | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | ADMIN_TOKEN | dev-admin-token | Bearer token for the admin API |
/// | SUPPRESS_ORDER_EMAILS | false | Import mode: log-and-drop order emails |
/// | SUPPRESS_STOCK_REDUCTION | false | Import mode: skip stock reduction |
/// | SEQUENCE_LOCK_WAIT_MS | 10000 | Per-attempt lock wait |
/// | SEQUENCE_MAX_ATTEMPTS | 5 | Lock acquisition attempts |
/// | SEQUENCE_RETRY_BACKOFF_MS | 1000 | Pause between attempts |
/// | SEQUENCE_LOCK_TTL_MS | 30000 | Lock record staleness bound |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 SUPPRESS_ORDER_EMAILS=true cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the embedded database
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Bearer token required on every `/api` route
    pub admin_token: String,
    /// Import mode: suppress new-order / processing emails
    pub suppress_order_emails: bool,
    /// Import mode: suppress stock reduction on order creation
    pub suppress_stock_reduction: bool,
    /// Sequential numbering tuning
    pub sequencer: SequencerConfig,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let config = Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/order-server".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            admin_token: std::env::var("ADMIN_TOKEN")
                .unwrap_or_else(|_| "dev-admin-token".into()),
            suppress_order_emails: std::env::var("SUPPRESS_ORDER_EMAILS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            suppress_stock_reduction: std::env::var("SUPPRESS_STOCK_REDUCTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            sequencer: SequencerConfig::from_env(),
        };

        if config.environment == "production" && config.admin_token == "dev-admin-token" {
            tracing::warn!("ADMIN_TOKEN is unset in production, using the development default");
        }

        config
    }

    /// Override working directory and port
    ///
    /// Commonly used in tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Path of the embedded database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }
}
