//! Customer notes routes
//!
//! Operator-maintained notes about a customer, surfaced on every order
//! detail for that customer.
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/customers/{id} | GET | Fetch profile |
//! | /api/customers/{id}/notes | PUT | Upsert profile notes |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use serde::Deserialize;

use shared::ApiResponse;
use shared::order::CustomerProfile;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/customers/{id}", get(get_customer))
        .route("/api/customers/{id}/notes", put(update_notes))
}

async fn get_customer(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CustomerProfile>>> {
    let customer = state
        .store
        .get_customer(&id)?
        .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))?;
    Ok(ok(customer))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    /// Display name; kept from the existing profile when omitted
    pub name: Option<String>,
    /// Notes; `null` clears them
    pub notes: Option<String>,
}

async fn update_notes(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNotesRequest>,
) -> AppResult<Json<ApiResponse<CustomerProfile>>> {
    let existing = state.store.get_customer(&id)?;

    let customer = CustomerProfile {
        id: id.clone(),
        name: payload
            .name
            .or(existing.map(|c| c.name))
            .unwrap_or_default(),
        notes: payload.notes,
    };
    state.store.put_customer(&customer)?;

    tracing::info!(customer_id = %id, "customer notes updated");

    Ok(ok(customer))
}
