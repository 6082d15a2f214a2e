//! TTL cache for the stats payload.
//!
//! A single in-process entry guarded by a reader/writer lock, plus the
//! refresh protocol that decides when to go back to the backing store.
//!
//! Backing store load is bounded to roughly one refresh per TTL window.
//! Every read returns a [`CacheRead`] carrying when its bytes were produced.
//!
//! # Example
//!
//! ```ignore
//! let generator = StatsGenerator::new(Arc::new(source));
//! let cache = StatsCache::new(generator, CacheConfig::new().with_ttl(Duration::from_secs(10)))?;
//!
//! let read = cache.get_stats().await?;
//! if read.was_cache_hit() {
//!     tracing::debug!(age_ms = read.age().as_millis() as u64, "served cached stats");
//! }
//! let body = read.into_bytes();
//! ```

pub mod config;
pub mod coordinator;
pub mod freshness;
pub mod stats;

pub use config::{CacheConfig, RefreshPolicy, DEFAULT_REFRESH_TIMEOUT, DEFAULT_TTL};
pub use coordinator::{CacheEntry, StatsCache};
pub use freshness::CacheRead;
pub use stats::CacheStats;
