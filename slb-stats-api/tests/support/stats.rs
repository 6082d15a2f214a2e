#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{TimeZone, Utc};
use slb_stats_api::{create_router, ApiConfig};
use slb_stats_core::{
    CacheConfig, CounterRow, InMemoryStatsSource, StatsCache, StatsError, StatsGenerator,
    StatsResult, StatsSource,
};

pub const SCENARIO_BODY: &[u8] =
    br#"{"counts":[{"g":5,"s":100,"d":"2024-01-01"}],"action_counts":[{"a":"launch","c":3}]}"#;

pub const GENERIC_500_BODY: &[u8] = br#"{"code":"INTERNAL_ERROR","message":"Internal server error"}"#;

pub const NOT_FOUND_BODY: &[u8] = br#"{"code":"NOT_FOUND","message":"Not found"}"#;

/// One day of counters and three launch commands.
pub fn seeded_source() -> StatsResult<InMemoryStatsSource> {
    let source = InMemoryStatsSource::new();
    let day = Utc
        .with_ymd_and_hms(2024, 1, 1, 18, 0, 0)
        .single()
        .ok_or_else(|| StatsError::backing_store("bad fixture timestamp"))?;
    source.push_counter(CounterRow::new(5, 100, day))?;
    for _ in 0..3 {
        source.push_action("command_launch_cmd")?;
    }
    Ok(source)
}

/// Full router over `source` with default API settings.
pub fn router_over<S>(source: S, cache: CacheConfig) -> StatsResult<Router>
where
    S: StatsSource + 'static,
{
    router_with(source, ApiConfig {
        cache,
        ..ApiConfig::default()
    })
}

/// Full router over `source` with the given API settings.
pub fn router_with<S>(source: S, config: ApiConfig) -> StatsResult<Router>
where
    S: StatsSource + 'static,
{
    let cache = StatsCache::new(StatsGenerator::new(Arc::new(source)), config.cache.clone())?;
    Ok(create_router(cache, &config))
}
