//! API Configuration Module
//!
//! Server binding, CORS and stats cache settings. Configuration is loaded
//! from environment variables with defaults that match the production
//! deployment. Unparseable values fall back to the default.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use slb_stats_core::{CacheConfig, RefreshPolicy, DEFAULT_REFRESH_TIMEOUT, DEFAULT_TTL};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// DEFAULTS
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

/// Read `key` from the environment and parse it, falling back to `default`
/// when unset or unparseable.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok(), default)
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for binding, CORS and caching.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Stats cache freshness window, refresh bound and policy.
    pub cache: CacheConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            cache: CacheConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SLB_STATS_BIND`: Host to bind (default: 0.0.0.0)
    /// - `PORT` or `SLB_STATS_PORT`: Port to listen on (default: 8080)
    /// - `SLB_STATS_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `SLB_STATS_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `SLB_STATS_CACHE_TTL_SECS`: Freshness window (default: 5)
    /// - `SLB_STATS_REFRESH_TIMEOUT_SECS`: Bound on one refresh (default: 5)
    /// - `SLB_STATS_REFRESH_POLICY`: `single_flight` or `independent` (default: single_flight)
    pub fn from_env() -> Self {
        let bind_host =
            std::env::var("SLB_STATS_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());

        let port = parse_or(
            std::env::var("PORT").ok(),
            env_or("SLB_STATS_PORT", DEFAULT_PORT),
        );

        let cors_origins = std::env::var("SLB_STATS_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let cors_max_age_secs = env_or("SLB_STATS_CORS_MAX_AGE_SECS", DEFAULT_CORS_MAX_AGE_SECS);

        let ttl = Duration::from_secs(env_or(
            "SLB_STATS_CACHE_TTL_SECS",
            DEFAULT_TTL.as_secs(),
        ));
        let refresh_timeout = Duration::from_secs(env_or(
            "SLB_STATS_REFRESH_TIMEOUT_SECS",
            DEFAULT_REFRESH_TIMEOUT.as_secs(),
        ));
        let refresh_policy = env_or("SLB_STATS_REFRESH_POLICY", RefreshPolicy::default());

        Self {
            bind_host,
            port,
            cors_origins,
            cors_max_age_secs,
            cache: CacheConfig::new()
                .with_ttl(ttl)
                .with_refresh_timeout(refresh_timeout)
                .with_policy(refresh_policy),
        }
    }

    /// Resolve the socket address to bind.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == origin)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.cache.ttl, Duration::from_secs(5));
        assert_eq!(config.cache.refresh_policy, RefreshPolicy::SingleFlight);
    }

    #[test]
    fn test_bind_addr() -> ApiResult<()> {
        let config = ApiConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.bind_addr()?.to_string(), "127.0.0.1:9000");

        let bad = ApiConfig {
            bind_host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.bind_addr().is_err());
        Ok(())
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_origin_allowed() {
        let mut config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));

        config.cors_origins = vec!["https://slb.example".to_string()];
        assert!(config.is_origin_allowed("https://slb.example"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }

    #[test]
    fn test_env_or_falls_back_when_unset() {
        assert_eq!(env_or("SLB_STATS_TEST_UNSET_VARIABLE", 42u16), 42);
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or(Some("abc".to_string()), 42u16), 42);
        assert_eq!(parse_or(Some("70000".to_string()), 42u16), 42);
        assert_eq!(parse_or(Some(String::new()), 42u16), 42);
        assert_eq!(parse_or(None, 42u16), 42);
    }

    #[test]
    fn test_parse_or_trims_valid_values() {
        assert_eq!(parse_or(Some(" 9000 ".to_string()), 42u16), 9000);
        assert_eq!(
            parse_or(Some("independent".to_string()), RefreshPolicy::default()),
            RefreshPolicy::Independent
        );
    }
}
