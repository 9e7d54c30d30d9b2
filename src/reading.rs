use serde::{Deserialize, Serialize};

/// One flow-meter sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reading {
    /// Epoch milliseconds, UTC.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    pub volume: i64,
}

impl Reading {
    pub fn new(timestamp_ms: i64, volume: i64) -> Self {
        Self {
            timestamp_ms,
            volume,
        }
    }

    /// Only positive volumes are persisted.
    pub fn is_storable(&self) -> bool {
        self.volume > 0
    }
}
