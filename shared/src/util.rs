//! Small time helpers
//!
//! Timestamps are stored as `i64` Unix millis everywhere; conversion from
//! date strings happens at the API handler layer.

/// Current time as Unix millis
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current time as Unix seconds
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
