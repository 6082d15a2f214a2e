//! Command action name normalization.
//!
//! Raw metric rows record actions as machine identifiers such as
//! `command_next_launch_cmd`. The stats endpoint reports them as
//! `nextlaunch`. The transformation here matches the SQL used by the
//! Postgres source exactly, so in-memory and database aggregation agree.

use std::collections::BTreeMap;

use crate::models::ActionTally;

/// Prefix that marks an action row as a command invocation.
pub const COMMAND_PREFIX: &str = "command_";

/// Suffix carried by most command identifiers.
pub const COMMAND_SUFFIX: &str = "_cmd";

/// Returns true if the raw action identifier is a command invocation.
pub fn is_command_action(raw: &str) -> bool {
    raw.starts_with(COMMAND_PREFIX)
}

/// Normalize a raw action identifier.
///
/// Removes every occurrence of the prefix, then every occurrence of the
/// suffix, then every underscore. Applying it to its own output is a no-op.
pub fn normalize_action(raw: &str) -> String {
    raw.replace(COMMAND_PREFIX, "")
        .replace(COMMAND_SUFFIX, "")
        .replace('_', "")
}

/// Count command invocations grouped by normalized name.
///
/// Non-command actions are ignored. Output is ordered by name.
pub fn tally_actions<'a, I>(raw_actions: I) -> Vec<ActionTally>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for raw in raw_actions.into_iter().filter(|a| is_command_action(a)) {
        *counts.entry(normalize_action(raw)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(action, count)| ActionTally::new(action, count))
        .collect()
}
