//! SLB Stats API - HTTP Layer
//!
//! Serves SpaceXLaunchBot usage statistics from a TTL cache in front of
//! PostgreSQL. The cache, the stats generator and the source abstraction
//! live in `slb-stats-core`; this crate adds configuration, the Postgres
//! source, the axum router and logging setup.

pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
