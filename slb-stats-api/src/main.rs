//! SLB Stats API Server Entry Point
//!
//! Bootstraps logging and configuration, confirms the database answers,
//! and serves the stats router until Ctrl-C or SIGTERM.

use std::sync::Arc;

use slb_stats_api::telemetry::{init_tracer, TelemetryConfig};
use slb_stats_api::{create_router, ApiConfig, ApiError, ApiResult, DbClient, DbConfig};
use slb_stats_core::{StatsCache, StatsGenerator};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let db_config = DbConfig::from_env();
    tracing::info!(
        connection = %db_config.censored_connection_string(),
        "Database config loaded"
    );
    let db = DbClient::connect(&db_config).await?;

    let api_config = ApiConfig::from_env();
    let generator = StatsGenerator::new(Arc::new(db));
    let cache = StatsCache::new(generator, api_config.cache.clone())?;
    tracing::info!(
        ttl_secs = api_config.cache.ttl.as_secs(),
        refresh_timeout_secs = api_config.cache.refresh_timeout.as_secs(),
        refresh_policy = %api_config.cache.refresh_policy,
        "Stats cache ready"
    );

    let app = create_router(cache, &api_config);

    let addr = api_config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "Starting SLB stats server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
