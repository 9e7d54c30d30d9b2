//! Bucket granularity.

use serde::{Deserialize, Serialize};

/// Width of a time bucket in the reverse-time keyspace.
///
/// `Hour` is the granularity rows are written with. `Day` is only meaningful for
/// coarse bucket arithmetic since its offsets do not fit the 2-byte offset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketInterval {
    #[default]
    Hour,
    Day,
}

impl BucketInterval {
    /// Bucket width in seconds.
    pub const fn seconds(self) -> i64 {
        match self {
            BucketInterval::Hour => 3_600,
            BucketInterval::Day => 86_400,
        }
    }

    /// Largest offset a timestamp can have inside one bucket.
    pub const fn max_offset(self) -> i64 {
        self.seconds() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(BucketInterval::Hour.seconds(), 3600);
        assert_eq!(BucketInterval::Day.seconds(), 86_400);
        assert_eq!(BucketInterval::Hour.max_offset(), 3599);
        assert_eq!(BucketInterval::default(), BucketInterval::Hour);
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&BucketInterval::Day).unwrap();
        assert_eq!(json, "\"day\"");
        let parsed: BucketInterval = serde_json::from_str("\"hour\"").unwrap();
        assert_eq!(parsed, BucketInterval::Hour);
    }
}
