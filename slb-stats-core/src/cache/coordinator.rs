//! TTL cache coordinator for the stats payload.
//!
//! Holds the single "last known good" payload and decides, per request,
//! whether to serve it or recompute it. Reads take a shared lock just long
//! enough to clone a reference-counted buffer, so readers never block each
//! other and never hold a lock while writing to a client.
//!
//! Under [`RefreshPolicy::SingleFlight`] at most one refresh attempt is in
//! flight. Every stale request that arrives during the attempt subscribes
//! to it and receives the same outcome, success or failure, so no caller
//! waits longer than one refresh timeout.

use std::sync::{Arc, Mutex, RwLock};

use bytes::Bytes;
use tokio::sync::watch;
use tokio::time::Instant;

use super::config::{CacheConfig, RefreshPolicy};
use super::freshness::CacheRead;
use super::stats::{CacheCounters, CacheStats};
use crate::error::{StatsError, StatsResult};
use crate::generator::StatsGenerator;

/// Body held before the first successful refresh. Never served.
const PLACEHOLDER_PAYLOAD: &[u8] = b"{}";

/// The single cached payload and the instant it was produced.
///
/// `produced_at` is `None` until the first successful refresh, which makes
/// the entry older than any TTL. Both fields are replaced together.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    bytes: Bytes,
    produced_at: Option<Instant>,
}

impl CacheEntry {
    fn placeholder() -> Self {
        Self {
            bytes: Bytes::from_static(PLACEHOLDER_PAYLOAD),
            produced_at: None,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn produced_at(&self) -> Option<Instant> {
        self.produced_at
    }

    /// True if the entry was produced less than `ttl` before `now`.
    pub fn is_fresh(&self, ttl: std::time::Duration, now: Instant) -> bool {
        self.produced_at
            .is_some_and(|produced| now.saturating_duration_since(produced) < ttl)
    }
}

/// Outcome of one refresh attempt, `None` while it is still running.
type AttemptOutcome = Option<StatsResult<CacheRead>>;

struct CacheInner {
    generator: StatsGenerator,
    config: CacheConfig,
    entry: RwLock<CacheEntry>,
    in_flight: Mutex<Option<watch::Receiver<AttemptOutcome>>>,
    counters: CacheCounters,
}

impl CacheInner {
    fn read_fresh(&self) -> StatsResult<Option<(Bytes, Instant)>> {
        let entry = self.entry.read().map_err(|_| StatsError::LockPoisoned)?;
        if !entry.is_fresh(self.config.ttl, Instant::now()) {
            return Ok(None);
        }
        Ok(entry
            .produced_at
            .map(|produced| (entry.bytes.clone(), produced)))
    }

    async fn refresh(&self) -> StatsResult<CacheRead> {
        let started = Instant::now();
        let bytes = match self
            .generator
            .generate_bytes(self.config.refresh_timeout)
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => {
                self.counters.record_failed_refresh();
                tracing::error!(
                    error = %err,
                    source = self.generator.source_name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Stats refresh failed, keeping previous entry"
                );
                return Err(err);
            }
        };

        // Stamp under the write lock so concurrent writers publish in order.
        let produced_at = {
            let mut entry = self.entry.write().map_err(|_| StatsError::LockPoisoned)?;
            let produced_at = Instant::now();
            *entry = CacheEntry {
                bytes: bytes.clone(),
                produced_at: Some(produced_at),
            };
            produced_at
        };

        self.counters.record_refresh();
        let stats = self.counters.snapshot();
        tracing::info!(
            source = self.generator.source_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            payload_bytes = bytes.len(),
            refresh_attempts = stats.refresh_attempts(),
            hit_rate = stats.hit_rate(),
            "Stats cache refreshed"
        );

        Ok(CacheRead::from_refresh(bytes, produced_at))
    }
}

/// Shared stats cache.
///
/// Cloning is cheap and every clone refers to the same entry.
#[derive(Clone)]
pub struct StatsCache {
    inner: Arc<CacheInner>,
}

impl StatsCache {
    /// Create a cache that starts expired, so the first read refreshes.
    pub fn new(generator: StatsGenerator, config: CacheConfig) -> StatsResult<Self> {
        config.validate()?;
        tracing::debug!(
            ttl_ms = config.ttl.as_millis() as u64,
            refresh_timeout_ms = config.refresh_timeout.as_millis() as u64,
            policy = %config.refresh_policy,
            "Stats cache created"
        );

        Ok(Self {
            inner: Arc::new(CacheInner {
                generator,
                config,
                entry: RwLock::new(CacheEntry::placeholder()),
                in_flight: Mutex::new(None),
                counters: CacheCounters::default(),
            }),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Usage counters since creation.
    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    /// Current entry, without refreshing.
    pub fn peek(&self) -> StatsResult<CacheEntry> {
        let entry = self
            .inner
            .entry
            .read()
            .map_err(|_| StatsError::LockPoisoned)?;
        Ok(entry.clone())
    }

    /// Serve the cached payload if it is fresh, otherwise refresh it.
    ///
    /// A failed refresh leaves the previous entry in place and returns the
    /// failure unchanged. The entry is not marked fresh, so the next request
    /// tries again.
    pub async fn get_stats(&self) -> StatsResult<CacheRead> {
        if let Some((bytes, produced_at)) = self.inner.read_fresh()? {
            self.inner.counters.record_hit();
            tracing::debug!(payload_bytes = bytes.len(), "Stats cache hit");
            return Ok(CacheRead::from_cache(bytes, produced_at));
        }

        self.inner.counters.record_miss();
        match self.inner.config.refresh_policy {
            RefreshPolicy::SingleFlight => self.refresh_single_flight().await,
            RefreshPolicy::Independent => self.spawn_refresh().await,
        }
    }

    async fn refresh_single_flight(&self) -> StatsResult<CacheRead> {
        let mut attempt = match self.join_or_start_attempt()? {
            Joined::Fresh(read) => return Ok(read),
            Joined::Attempt(receiver) => receiver,
        };

        let outcome = attempt
            .wait_for(Option::is_some)
            .await
            .map_err(|_| attempt_abandoned())?;
        outcome.clone().unwrap_or_else(|| Err(attempt_abandoned()))
    }

    /// Subscribe to the running attempt, or start one if none is running.
    ///
    /// Freshness is re-checked under the slot lock so a request that lost
    /// the race with a just-finished attempt does not start another.
    fn join_or_start_attempt(&self) -> StatsResult<Joined> {
        let mut slot = self
            .inner
            .in_flight
            .lock()
            .map_err(|_| StatsError::LockPoisoned)?;

        if let Some(receiver) = slot.as_ref() {
            self.inner.counters.record_coalesced();
            tracing::debug!("Stats request joined in-flight refresh");
            return Ok(Joined::Attempt(receiver.clone()));
        }

        if let Some((bytes, produced_at)) = self.inner.read_fresh()? {
            self.inner.counters.record_coalesced();
            tracing::debug!("Stats request coalesced onto completed refresh");
            return Ok(Joined::Fresh(CacheRead::from_refresh(bytes, produced_at)));
        }

        let (sender, receiver) = watch::channel(None);
        *slot = Some(receiver.clone());
        drop(slot);

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.spawn_refresh().await;
            // Clear the slot before publishing so the next stale request
            // after a failure starts a new attempt.
            match this.inner.in_flight.lock() {
                Ok(mut slot) => *slot = None,
                Err(poisoned) => *poisoned.into_inner() = None,
            }
            // No receivers left means every waiter gave up; the entry is
            // already updated.
            let _ = sender.send(Some(result));
        });

        Ok(Joined::Attempt(receiver))
    }

    /// Run the refresh on its own task so a dropped request cannot cancel it.
    async fn spawn_refresh(&self) -> StatsResult<CacheRead> {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.refresh().await });

        handle.await.map_err(|e| StatsError::RefreshAborted {
            reason: e.to_string(),
        })?
    }
}

enum Joined {
    Fresh(CacheRead),
    Attempt(watch::Receiver<AttemptOutcome>),
}

fn attempt_abandoned() -> StatsError {
    StatsError::RefreshAborted {
        reason: "refresh attempt ended without an outcome".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStatsSource;
    use std::time::Duration;

    fn cache_over(source: &InMemoryStatsSource, config: CacheConfig) -> StatsResult<StatsCache> {
        let generator = StatsGenerator::new(Arc::new(source.clone()));
        StatsCache::new(generator, config)
    }

    #[test]
    fn test_new_rejects_zero_ttl() {
        let source = InMemoryStatsSource::new();
        let result = cache_over(&source, CacheConfig::new().with_ttl(Duration::ZERO));
        assert!(matches!(result, Err(StatsError::InvalidConfig { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_expired_with_placeholder() -> StatsResult<()> {
        let source = InMemoryStatsSource::new();
        let cache = cache_over(&source, CacheConfig::default())?;

        let entry = cache.peek()?;
        assert_eq!(entry.bytes(), &Bytes::from_static(b"{}"));
        assert!(entry.produced_at().is_none());
        assert!(!entry.is_fresh(Duration::from_secs(3600), Instant::now()));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_strictly_below_ttl() -> StatsResult<()> {
        let source = InMemoryStatsSource::new();
        let cache = cache_over(&source, CacheConfig::new().with_ttl(Duration::from_secs(10)))?;
        cache.get_stats().await?;

        let entry = cache.peek()?;
        let produced = entry
            .produced_at()
            .ok_or_else(|| StatsError::backing_store("entry was never produced"))?;
        assert!(entry.is_fresh(Duration::from_secs(10), produced + Duration::from_secs(9)));
        assert!(!entry.is_fresh(Duration::from_secs(10), produced + Duration::from_secs(10)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_and_miss_counters() -> StatsResult<()> {
        let source = InMemoryStatsSource::new();
        let cache = cache_over(&source, CacheConfig::default())?;

        assert!(cache.get_stats().await?.was_cache_miss());
        assert!(cache.get_stats().await?.was_cache_hit());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.refreshes, 1);
        Ok(())
    }
}
