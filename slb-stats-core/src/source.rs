//! Backing store abstraction consumed by the stats generator.

use async_trait::async_trait;

use crate::error::StatsResult;
use crate::models::{ActionTally, CountSample};

/// A relational source able to run the two stats aggregations.
///
/// Implementations do not need to run both queries against the same
/// snapshot. A small skew between the two result sets is acceptable.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Per-day maximum guild and subscriber counts, ascending by day.
    async fn fetch_counts(&self) -> StatsResult<Vec<CountSample>>;

    /// Command invocation counts grouped by normalized action name.
    async fn fetch_action_counts(&self) -> StatsResult<Vec<ActionTally>>;

    /// Short identifier used in log lines.
    fn name(&self) -> &str;
}
