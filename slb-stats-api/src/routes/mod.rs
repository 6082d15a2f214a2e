//! HTTP Routes Module
//!
//! Two routes are served:
//! - `/` - the cached stats document
//! - `/health` - an empty 200 heartbeat
//!
//! Every other path answers 404. `HEAD` is accepted wherever `GET` is.

pub mod health;
pub mod stats;

use std::any::Any;
use std::time::Duration;

use axum::{
    http::{request::Parts, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use slb_stats_core::StatsCache;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Fallback for every unrouted path.
async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Turn a handler panic into the generic 500 body.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "Request handler panicked");
    ApiError::generation_failed().into_response()
}

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins every origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(cors::Any)
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        layer.allow_origin(cors::Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let allowed = config.clone();
        layer.allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request: &Parts| {
                origin
                    .to_str()
                    .map(|origin| allowed.is_origin_allowed(origin))
                    .unwrap_or(false)
            },
        ))
    }
}

/// Create the service router around a shared stats cache.
///
/// Layers, outermost first: request tracing, CORS, panic recovery.
pub fn create_router(cache: StatsCache, config: &ApiConfig) -> Router {
    let state = AppState::new(cache);

    Router::new()
        .route("/", get(stats::get_stats))
        .route("/health", get(health::heartbeat))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(build_cors_layer(config))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_response_is_generic() {
        let response = panic_response(Box::new("database password was hunter2"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_not_found_fallback() {
        let response = not_found().await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
