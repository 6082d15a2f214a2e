//! Wire model for the stats payload.
//!
//! Field names on the wire are deliberately short (`g`, `s`, `d`, `a`, `c`)
//! because the payload is polled by public clients and every byte is
//! multiplied by the poll rate.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::StatsResult;

/// Per-day maximum of the two bot counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSample {
    #[serde(rename = "g")]
    pub guild_count: i64,
    #[serde(rename = "s")]
    pub subscribed_count: i64,
    /// Day bucket formatted as `YYYY-MM-DD`.
    #[serde(rename = "d")]
    pub date: String,
}

impl CountSample {
    pub fn new(guild_count: i64, subscribed_count: i64, date: impl Into<String>) -> Self {
        Self {
            guild_count,
            subscribed_count,
            date: date.into(),
        }
    }
}

/// Number of invocations of one normalized command name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTally {
    #[serde(rename = "a")]
    pub action: String,
    #[serde(rename = "c")]
    pub count: i64,
}

impl ActionTally {
    pub fn new(action: impl Into<String>, count: i64) -> Self {
        Self {
            action: action.into(),
            count,
        }
    }
}

/// The full response body served on `GET /`.
///
/// `counts` is ascending by date. `action_counts` has no defined order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub counts: Vec<CountSample>,
    pub action_counts: Vec<ActionTally>,
}

impl StatsPayload {
    pub fn new(counts: Vec<CountSample>, action_counts: Vec<ActionTally>) -> Self {
        Self {
            counts,
            action_counts,
        }
    }

    /// Serialize once into an immutable buffer.
    pub fn to_bytes(&self) -> StatsResult<Bytes> {
        let json = serde_json::to_vec(self)?;
        Ok(Bytes::from(json))
    }
}
