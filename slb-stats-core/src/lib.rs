//! SLB Stats Core - Stats model, generator and cache coordinator
//!
//! Produces the aggregate statistics payload served by the stats API and
//! bounds how often the backing store is queried for it.
//!
//! - [`StatsSource`] abstracts the two aggregation queries.
//! - [`StatsGenerator`] runs them under a deadline and builds a [`StatsPayload`].
//! - [`StatsCache`] holds the last good payload and arbitrates refreshes.
//!
//! The actual Postgres source lives in slb-stats-api.

pub mod cache;
pub mod error;
pub mod generator;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod source;

pub use cache::{
    CacheConfig, CacheEntry, CacheRead, CacheStats, RefreshPolicy, StatsCache,
    DEFAULT_REFRESH_TIMEOUT, DEFAULT_TTL,
};
pub use error::{StatsError, StatsResult};
pub use generator::StatsGenerator;
pub use memory::{daily_maxima, CounterRow, InMemoryStatsSource};
pub use models::{ActionTally, CountSample, StatsPayload};
pub use normalize::{
    is_command_action, normalize_action, tally_actions, COMMAND_PREFIX, COMMAND_SUFFIX,
};
pub use source::StatsSource;
