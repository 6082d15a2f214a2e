//! Heartbeat Endpoint
//!
//! `GET /health` answers 200 with an empty body. It never touches the
//! stats cache or the database, so load balancers can poll it freely.

use axum::http::StatusCode;

/// GET /health - Liveness heartbeat
pub async fn heartbeat() -> StatusCode {
    StatusCode::OK
}
