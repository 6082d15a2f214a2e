//! Cache coordinator configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{StatsError, StatsResult};

/// Default freshness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Default bound on one refresh, covering both queries and serialization.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(5);

/// How concurrent requests that find the cache stale are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// At most one refresh runs at a time. Requests that find the cache
    /// stale while a refresh is in flight wait for it and reuse its result.
    #[default]
    SingleFlight,

    /// Every request that finds the cache stale refreshes on its own.
    /// N simultaneous stale readers cause N backing store round trips.
    Independent,
}

impl RefreshPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleFlight => "single_flight",
            Self::Independent => "independent",
        }
    }
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshPolicy {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "single_flight" | "singleflight" | "coalesce" => Ok(Self::SingleFlight),
            "independent" | "none" => Ok(Self::Independent),
            other => Err(StatsError::invalid_config(
                "refresh_policy",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

/// Configuration for [`StatsCache`](super::StatsCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum age of a cached payload before a request triggers a refresh.
    pub ttl: Duration,
    /// Bound on a single refresh, independent of any caller deadline.
    pub refresh_timeout: Duration,
    /// Coalescing behavior for concurrent stale reads.
    pub refresh_policy: RefreshPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the refresh timeout.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Set the refresh policy.
    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Reject zero durations.
    pub fn validate(&self) -> StatsResult<()> {
        if self.ttl.is_zero() {
            return Err(StatsError::invalid_config(
                "ttl",
                "must be greater than zero",
            ));
        }
        if self.refresh_timeout.is_zero() {
            return Err(StatsError::invalid_config(
                "refresh_timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(5));
        assert_eq!(config.refresh_timeout, Duration::from_secs(5));
        assert_eq!(config.refresh_policy, RefreshPolicy::SingleFlight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::new()
            .with_ttl(Duration::from_secs(60))
            .with_refresh_timeout(Duration::from_secs(2))
            .with_policy(RefreshPolicy::Independent);
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_timeout, Duration::from_secs(2));
        assert_eq!(config.refresh_policy, RefreshPolicy::Independent);
    }

    #[test]
    fn test_zero_durations_rejected() {
        let zero_ttl = CacheConfig::new().with_ttl(Duration::ZERO);
        assert!(matches!(
            zero_ttl.validate(),
            Err(StatsError::InvalidConfig { ref field, .. }) if field == "ttl"
        ));

        let zero_timeout = CacheConfig::new().with_refresh_timeout(Duration::ZERO);
        assert!(matches!(
            zero_timeout.validate(),
            Err(StatsError::InvalidConfig { ref field, .. }) if field == "refresh_timeout"
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("single_flight".parse(), Ok(RefreshPolicy::SingleFlight));
        assert_eq!("Single-Flight".parse(), Ok(RefreshPolicy::SingleFlight));
        assert_eq!("independent".parse(), Ok(RefreshPolicy::Independent));
        assert!("sometimes".parse::<RefreshPolicy>().is_err());
        assert_eq!(RefreshPolicy::Independent.to_string(), "independent");
    }
}
