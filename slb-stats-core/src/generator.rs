//! Stats payload generation.
//!
//! Runs the two aggregation queries against a [`StatsSource`] under a
//! single deadline and assembles the result. Any failure aborts the whole
//! generation; a partially populated payload is never returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{StatsError, StatsResult};
use crate::models::StatsPayload;
use crate::source::StatsSource;

/// Produces [`StatsPayload`]s from a backing store.
#[derive(Clone)]
pub struct StatsGenerator {
    source: Arc<dyn StatsSource>,
}

impl StatsGenerator {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self { source }
    }

    /// Name of the underlying source, for logs.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Run both queries, failing with [`StatsError::Timeout`] if they do not
    /// finish within `deadline`.
    pub async fn generate(&self, deadline: Duration) -> StatsResult<StatsPayload> {
        within(deadline, self.run_queries()).await
    }

    /// Generate and serialize in one step. Serialization counts against
    /// the same deadline as the queries.
    pub async fn generate_bytes(&self, deadline: Duration) -> StatsResult<Bytes> {
        within(deadline, async { self.run_queries().await?.to_bytes() }).await
    }

    async fn run_queries(&self) -> StatsResult<StatsPayload> {
        // Not wrapped in a transaction; skew between the two is acceptable.
        let counts = self.source.fetch_counts().await?;
        let action_counts = self.source.fetch_action_counts().await?;

        tracing::debug!(
            source = self.source.name(),
            days = counts.len(),
            actions = action_counts.len(),
            "Stats queries completed"
        );

        Ok(StatsPayload::new(counts, action_counts))
    }
}

async fn within<T>(
    deadline: Duration,
    work: impl Future<Output = StatsResult<T>>,
) -> StatsResult<T> {
    tokio::time::timeout(deadline, work)
        .await
        .map_err(|_| StatsError::timeout("stats generation", deadline))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CounterRow, InMemoryStatsSource};
    use crate::models::{ActionTally, CountSample};
    use chrono::{TimeZone, Utc};

    fn seeded_source() -> StatsResult<InMemoryStatsSource> {
        let source = InMemoryStatsSource::new();
        let day = Utc
            .with_ymd_and_hms(2024, 1, 1, 9, 30, 0)
            .single()
            .ok_or_else(|| StatsError::backing_store("bad timestamp"))?;
        source.push_counter(CounterRow::new(5, 100, day))?;
        for _ in 0..3 {
            source.push_action("command_launch_cmd")?;
        }
        Ok(source)
    }

    #[tokio::test]
    async fn test_generate_assembles_both_queries() -> StatsResult<()> {
        let source = seeded_source()?;
        let generator = StatsGenerator::new(Arc::new(source));

        let payload = generator.generate(Duration::from_secs(5)).await?;
        assert_eq!(payload.counts, vec![CountSample::new(5, 100, "2024-01-01")]);
        assert_eq!(payload.action_counts, vec![ActionTally::new("launch", 3)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_bytes_matches_wire_format() -> StatsResult<()> {
        let generator = StatsGenerator::new(Arc::new(seeded_source()?));

        let bytes = generator.generate_bytes(Duration::from_secs(5)).await?;
        assert_eq!(
            &bytes[..],
            br#"{"counts":[{"g":5,"s":100,"d":"2024-01-01"}],"action_counts":[{"a":"launch","c":3}]}"#
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_propagates_source_failure() -> StatsResult<()> {
        let source = seeded_source()?;
        source.fail_with(StatsError::backing_store("connection reset"))?;
        let generator = StatsGenerator::new(Arc::new(source.clone()));

        let result = generator.generate(Duration::from_secs(5)).await;
        assert_eq!(result, Err(StatsError::backing_store("connection reset")));
        // First query failed, so the second never ran.
        assert_eq!(source.action_queries(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_times_out() -> StatsResult<()> {
        let source = seeded_source()?;
        source.set_latency(Duration::from_secs(30))?;
        let generator = StatsGenerator::new(Arc::new(source));

        let result = generator.generate(Duration::from_secs(5)).await;
        match result {
            Err(StatsError::Timeout { after, .. }) => assert_eq!(after, Duration::from_secs(5)),
            other => panic!("expected timeout, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_bytes_shares_the_deadline() -> StatsResult<()> {
        let source = seeded_source()?;
        source.set_latency(Duration::from_secs(60))?;
        let generator = StatsGenerator::new(Arc::new(source));

        let started = tokio::time::Instant::now();
        let result = generator.generate_bytes(Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(6));
        match result {
            Err(StatsError::Timeout { after, .. }) => assert_eq!(after, Duration::from_secs(5)),
            other => panic!("expected timeout, got {other:?}"),
        }
        Ok(())
    }
}
