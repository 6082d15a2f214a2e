//! Utility macros for reducing boilerplate

/// Macro to implement `FromRef<AppState>` for state extractors.
///
/// Lets handlers take `State<StatsCache>` instead of the whole `AppState`.
///
/// # Example
/// ```ignore
/// impl_from_ref!(StatsCache, cache);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for StatsCache {
///     fn from_ref(state: &AppState) -> Self {
///         state.cache.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
