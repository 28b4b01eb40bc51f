//! Order routes
//!
//! # Routes
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/orders | POST | Create order (assigns sequential number) |
//! | /api/orders | GET | List orders, sortable by assigned number |
//! | /api/orders/{id} | GET | Order detail incl. customer notes |
//! | /api/orders/{id}/backdate | POST | Rewrite created/paid dates (import) |
//! | /api/orders/{id}/status | PUT | Set status (incl. custom fulfilment statuses) |

pub mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::create).get(handler::list))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/orders/{id}/backdate", post(handler::backdate))
        .route("/api/orders/{id}/status", put(handler::update_status))
}
