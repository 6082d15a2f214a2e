//! Shared application state for Axum routers.

use slb_stats_core::StatsCache;

/// Application-wide state shared across all routes.
///
/// The cache is the only shared object; it already clones as a handle, so
/// every request sees the same entry.
#[derive(Clone)]
pub struct AppState {
    pub cache: StatsCache,
}

impl AppState {
    pub fn new(cache: StatsCache) -> Self {
        Self { cache }
    }
}

crate::impl_from_ref!(StatsCache, cache);
