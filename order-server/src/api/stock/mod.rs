//! Stock ledger routes
//!
//! Used by import tooling to seed levels before replaying order history.
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/stock/{product_id} | GET | Current level |
//! | /api/stock/{product_id} | PUT | Set absolute level |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use shared::ApiResponse;

use crate::core::ServerState;
use crate::utils::{AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/stock/{product_id}",
        get(get_level).put(set_level),
    )
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub product_id: String,
    pub level: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub level: i64,
}

async fn get_level(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<StockResponse>>> {
    let level = state.store.get_stock(&product_id)?;
    Ok(ok(StockResponse { product_id, level }))
}

async fn set_level(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
    Json(payload): Json<SetStockRequest>,
) -> AppResult<Json<ApiResponse<StockResponse>>> {
    state.store.set_stock(&product_id, payload.level)?;
    Ok(ok(StockResponse {
        product_id,
        level: payload.level,
    }))
}
