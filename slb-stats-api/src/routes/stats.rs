//! Stats Endpoint
//!
//! `GET /` serves the cached stats document exactly as it was encoded at
//! refresh time.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use slb_stats_core::StatsCache;

use crate::error::ApiResult;

/// GET / - Current bot statistics as compact JSON
pub async fn get_stats(State(cache): State<StatsCache>) -> ApiResult<Response> {
    let read = cache.get_stats().await?;
    tracing::debug!(
        cache_hit = read.was_cache_hit(),
        age_ms = read.age().as_millis() as u64,
        "Serving stats"
    );

    let body = read.into_bytes();
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
        (header::CONTENT_LENGTH, HeaderValue::from(body.len())),
    ];
    Ok((StatusCode::OK, headers, body).into_response())
}
