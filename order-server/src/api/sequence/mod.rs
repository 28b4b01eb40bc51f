//! Sequence counter route
//!
//! Read-only visibility into the counter for operators reconciling
//! fallback-numbered orders.
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/sequence | GET | Current counter value |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use shared::ApiResponse;

use crate::core::ServerState;
use crate::utils::{AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/sequence", get(current))
}

#[derive(Debug, Serialize)]
pub struct SequenceResponse {
    pub last_sequential_number: u64,
}

async fn current(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<SequenceResponse>>> {
    let last_sequential_number = state.sequencer.current()?;
    Ok(ok(SequenceResponse {
        last_sequential_number,
    }))
}
