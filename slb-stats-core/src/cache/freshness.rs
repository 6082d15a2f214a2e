//! Freshness metadata for cache reads.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// Result of a cache read, carrying staleness metadata.
///
/// The bytes are an immutable snapshot. A caller may hold them for as long
/// as it needs (slow client, backpressure) without holding any lock, and
/// never observes a later refresh.
#[derive(Debug, Clone)]
pub struct CacheRead {
    bytes: Bytes,
    produced_at: Instant,
    was_cache_hit: bool,
}

impl CacheRead {
    /// Create a new cache read from a cache hit.
    pub fn from_cache(bytes: Bytes, produced_at: Instant) -> Self {
        Self {
            bytes,
            produced_at,
            was_cache_hit: true,
        }
    }

    /// Create a new cache read from a refresh (cache miss).
    pub fn from_refresh(bytes: Bytes, produced_at: Instant) -> Self {
        Self {
            bytes,
            produced_at,
            was_cache_hit: false,
        }
    }

    /// Consume the wrapper and return the payload bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// When the payload was produced.
    pub fn produced_at(&self) -> Instant {
        self.produced_at
    }

    /// How long ago the payload was produced.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.produced_at)
    }

    /// Check if this was a cache hit.
    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    /// Check if this read triggered (or waited on) a refresh.
    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_read_from_cache() {
        let bytes = Bytes::from_static(b"{}");
        let read = CacheRead::from_cache(bytes.clone(), Instant::now());

        assert!(read.was_cache_hit());
        assert!(!read.was_cache_miss());
        assert_eq!(read.bytes(), &bytes);
    }

    #[test]
    fn test_cache_read_from_refresh() {
        let read = CacheRead::from_refresh(Bytes::from_static(b"[]"), Instant::now());

        assert!(read.was_cache_miss());
        assert_eq!(read.into_bytes(), Bytes::from_static(b"[]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_read_age() {
        let read = CacheRead::from_cache(Bytes::new(), Instant::now());
        tokio::time::advance(Duration::from_secs(4)).await;

        assert_eq!(read.age(), Duration::from_secs(4));
    }
}
