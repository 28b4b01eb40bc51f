//! Admin-token authentication middleware
//!
//! Every `/api` route requires `Authorization: Bearer <ADMIN_TOKEN>`. The
//! token is a single static operator credential from config; this service
//! has exactly one caller class (the merchant's import tooling and admin
//! scripts), so there is no user model behind it.
//!
//! # Skipped paths
//!
//! - `OPTIONS *` (CORS preflight)
//! - anything outside `/api/` (health check, unknown paths 404 normally)
//!
//! # Errors
//!
//! | Case | Status |
//! |------|--------|
//! | Missing / malformed Authorization header | 401 Unauthorized |
//! | Wrong token | 403 Forbidden |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::core::ServerState;
use crate::utils::AppError;

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

/// Constant-time token comparison
fn token_matches(provided: &str, expected: &str) -> bool {
    ring::constant_time::verify_slices_are_equal(provided.as_bytes(), expected.as_bytes()).is_ok()
}

/// Middleware requiring the admin token on API routes
pub async fn require_admin(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // Allow CORS preflight through
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes (incl. /health) skip auth
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(extract_bearer) {
        Some(token) => token,
        None => {
            tracing::warn!(target: "auth", uri = %req.uri(), "missing authorization header");
            return Err(AppError::unauthorized());
        }
    };

    if !token_matches(token, &state.config.admin_token) {
        tracing::warn!(target: "auth", uri = %req.uri(), "invalid admin token");
        return Err(AppError::forbidden("Invalid admin token".to_string()));
    }

    Ok(next.run(req).await)
}
