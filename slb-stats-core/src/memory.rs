//! In-memory StatsSource implementation for testing.
//!
//! Holds raw counter samples and raw action identifiers and performs the
//! same aggregation the Postgres queries do. Failures and latency can be
//! injected, and every query is counted, so tests can assert exactly how
//! often the backing store was hit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{StatsError, StatsResult};
use crate::models::{ActionTally, CountSample};
use crate::normalize::tally_actions;
use crate::source::StatsSource;

/// One raw row of the counter time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRow {
    pub guild_count: i64,
    pub subscribed_count: i64,
    pub time: DateTime<Utc>,
}

impl CounterRow {
    pub fn new(guild_count: i64, subscribed_count: i64, time: DateTime<Utc>) -> Self {
        Self {
            guild_count,
            subscribed_count,
            time,
        }
    }
}

/// In-memory backing store.
///
/// Clones share state, so a test can keep a handle while the cache owns
/// another one.
#[derive(Clone, Default)]
pub struct InMemoryStatsSource {
    counters: Arc<RwLock<Vec<CounterRow>>>,
    actions: Arc<RwLock<Vec<String>>>,
    failure: Arc<RwLock<Option<StatsError>>>,
    latency: Arc<RwLock<Duration>>,
    count_queries: Arc<AtomicU64>,
    action_queries: Arc<AtomicU64>,
}

impl InMemoryStatsSource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a counter sample.
    pub fn push_counter(&self, row: CounterRow) -> StatsResult<()> {
        self.counters
            .write()
            .map_err(|_| StatsError::LockPoisoned)?
            .push(row);
        Ok(())
    }

    /// Record one raw action row.
    pub fn push_action(&self, action: impl Into<String>) -> StatsResult<()> {
        self.actions
            .write()
            .map_err(|_| StatsError::LockPoisoned)?
            .push(action.into());
        Ok(())
    }

    /// Make every query fail with `err` until [`clear_failure`](Self::clear_failure).
    pub fn fail_with(&self, err: StatsError) -> StatsResult<()> {
        *self.failure.write().map_err(|_| StatsError::LockPoisoned)? = Some(err);
        Ok(())
    }

    pub fn clear_failure(&self) -> StatsResult<()> {
        *self.failure.write().map_err(|_| StatsError::LockPoisoned)? = None;
        Ok(())
    }

    /// Delay every query by `latency`.
    pub fn set_latency(&self, latency: Duration) -> StatsResult<()> {
        *self.latency.write().map_err(|_| StatsError::LockPoisoned)? = latency;
        Ok(())
    }

    /// Number of times the counts query has run.
    pub fn count_queries(&self) -> u64 {
        self.count_queries.load(Ordering::SeqCst)
    }

    /// Number of times the action counts query has run.
    pub fn action_queries(&self) -> u64 {
        self.action_queries.load(Ordering::SeqCst)
    }

    async fn simulate_query(&self) -> StatsResult<()> {
        let latency = *self.latency.read().map_err(|_| StatsError::LockPoisoned)?;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self
            .failure
            .read()
            .map_err(|_| StatsError::LockPoisoned)?
            .clone();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Per-day maximum of both counters, ascending by day.
pub fn daily_maxima(rows: &[CounterRow]) -> Vec<CountSample> {
    let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for row in rows {
        let day = days
            .entry(row.time.date_naive())
            .or_insert((row.guild_count, row.subscribed_count));
        day.0 = day.0.max(row.guild_count);
        day.1 = day.1.max(row.subscribed_count);
    }

    days.into_iter()
        .map(|(date, (guilds, subscribed))| {
            CountSample::new(guilds, subscribed, date.format("%Y-%m-%d").to_string())
        })
        .collect()
}

#[async_trait]
impl StatsSource for InMemoryStatsSource {
    async fn fetch_counts(&self) -> StatsResult<Vec<CountSample>> {
        self.count_queries.fetch_add(1, Ordering::SeqCst);
        self.simulate_query().await?;

        let rows = self.counters.read().map_err(|_| StatsError::LockPoisoned)?;
        Ok(daily_maxima(&rows))
    }

    async fn fetch_action_counts(&self) -> StatsResult<Vec<ActionTally>> {
        self.action_queries.fetch_add(1, Ordering::SeqCst);
        self.simulate_query().await?;

        let actions = self.actions.read().map_err(|_| StatsError::LockPoisoned)?;
        Ok(tally_actions(actions.iter().map(String::as_str)))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn test_daily_maxima_groups_and_orders_by_day() {
        let rows = vec![
            CounterRow::new(7, 120, at(2024, 1, 2, 3)),
            CounterRow::new(5, 100, at(2024, 1, 1, 1)),
            CounterRow::new(6, 90, at(2024, 1, 1, 22)),
            CounterRow::new(8, 110, at(2024, 1, 2, 20)),
        ];

        assert_eq!(
            daily_maxima(&rows),
            vec![
                CountSample::new(6, 100, "2024-01-01"),
                CountSample::new(8, 120, "2024-01-02"),
            ]
        );
    }

    #[tokio::test]
    async fn test_in_memory_source_aggregates() -> StatsResult<()> {
        let source = InMemoryStatsSource::new();
        source.push_counter(CounterRow::new(5, 100, at(2024, 1, 1, 12)))?;
        source.push_action("command_launch_cmd")?;
        source.push_action("command_launch_cmd")?;
        source.push_action("command__notify_cmd")?;
        source.push_action("shard_ready")?;

        assert_eq!(
            source.fetch_counts().await?,
            vec![CountSample::new(5, 100, "2024-01-01")]
        );
        assert_eq!(
            source.fetch_action_counts().await?,
            vec![ActionTally::new("launch", 2), ActionTally::new("notify", 1)]
        );
        assert_eq!(source.count_queries(), 1);
        assert_eq!(source.action_queries(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned_until_cleared() -> StatsResult<()> {
        let source = InMemoryStatsSource::new();
        source.fail_with(StatsError::backing_store("down"))?;

        assert_eq!(
            source.fetch_counts().await,
            Err(StatsError::backing_store("down"))
        );

        source.clear_failure()?;
        assert!(source.fetch_counts().await?.is_empty());
        Ok(())
    }
}
