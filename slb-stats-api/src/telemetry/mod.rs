//! Telemetry - Logging Infrastructure
//!
//! Structured `tracing` output for the stats service. JSON lines by default,
//! human-readable output for local runs.

pub mod tracer;

pub use tracer::{init_tracer, LogFormat, TelemetryConfig, DEFAULT_LOG_FILTER};
