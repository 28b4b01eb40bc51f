//! API Response types
//!
//! Standardized API response structure for the server

use serde::{Deserialize, Serialize};

/// Standard API response code
pub const API_CODE_SUCCESS: &str = "E0000";

/// Unified API response structure
///
/// All API responses follow this format:
/// ```json
/// {
///     "code": "E0000",
///     "message": "Success",
///     "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (E0000 = success, others = error codes)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// Create a successful response with custom message
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// True when the response carries the success code
    pub fn is_success(&self) -> bool {
        self.code == API_CODE_SUCCESS
    }
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pagination {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            ((total as f64) / (per_page as f64)).ceil() as u32
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}
