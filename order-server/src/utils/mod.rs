//! Utility modules: error handling, logging, time parsing

pub mod error;
pub mod logger;
pub mod time;

pub use error::{AppError, ok, ok_with_message};

/// Application-level Result type
///
/// Used in HTTP handlers and application logic
pub type AppResult<T> = Result<T, AppError>;
