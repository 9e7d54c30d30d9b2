//! Row-key and column-qualifier codec.
//!
//! Timestamps are stored in a reverse-time keyspace so an ascending scan returns the
//! most recent readings first:
//!
//! ```text
//! reverse(t) = i64::MAX - t / 1000          (seconds, strictly decreasing in t)
//! offset(t)  = reverse(t) mod interval
//! bucket(t)  = reverse(t) - offset(t)
//!
//! row key    = digest(device) [16] ++ bucket(t) BE [8]
//! qualifier  = offset(t) BE [2] ++ len [1] ++ tag
//! ```
//!
//! `bucket + offset` recovers `reverse(t)` exactly, so decoding is lossless down to
//! whole seconds. Millisecond remainders are discarded on write.

mod interval;
mod qualifier;

pub use interval::BucketInterval;
pub use qualifier::{Qualifier, VOLUME_TAG};

use crate::digest::DeviceDigest;
use crate::store::StoreError;
use crate::{Error, Result};

pub const DIGEST_LEN: usize = 16;
pub const BUCKET_LEN: usize = 8;
pub const OFFSET_LEN: usize = 2;
pub const ROW_KEY_LEN: usize = DIGEST_LEN + BUCKET_LEN;

const MILLIS_PER_SECOND: i64 = 1_000;

/// Order-reversing transform of a millisecond timestamp into whole seconds.
///
/// Negative timestamps would overflow the transform and are rejected.
pub fn reverse(timestamp_ms: i64) -> Result<i64> {
    if timestamp_ms < 0 {
        return Err(Error::validation(format!(
            "timestamp {timestamp_ms} is before the epoch"
        )));
    }
    Ok(i64::MAX - timestamp_ms / MILLIS_PER_SECOND)
}

/// Inverse of [`reverse`], to one-second resolution.
pub fn timestamp_from_reverse(reverse: i64) -> Option<i64> {
    i64::MAX
        .checked_sub(reverse)
        .filter(|secs| *secs >= 0)?
        .checked_mul(MILLIS_PER_SECOND)
}

/// Position of `timestamp_ms` inside its bucket.
pub fn offset(timestamp_ms: i64, interval: BucketInterval) -> Result<i64> {
    Ok(reverse(timestamp_ms)? % interval.seconds())
}

/// Start of the bucket holding `timestamp_ms` in reverse-time space.
pub fn bucket(timestamp_ms: i64, interval: BucketInterval) -> Result<i64> {
    let rev = reverse(timestamp_ms)?;
    Ok(rev - rev % interval.seconds())
}

pub fn encode_bucket(timestamp_ms: i64, interval: BucketInterval) -> Result<[u8; BUCKET_LEN]> {
    Ok(bucket(timestamp_ms, interval)?.to_be_bytes())
}

/// Fixed-width row key: device digest followed by the big-endian bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey([u8; ROW_KEY_LEN]);

impl RowKey {
    pub fn new(digest: &DeviceDigest, bucket: [u8; BUCKET_LEN]) -> Self {
        let mut key = [0u8; ROW_KEY_LEN];
        key[..DIGEST_LEN].copy_from_slice(digest.as_bytes());
        key[DIGEST_LEN..].copy_from_slice(&bucket);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bucket(&self) -> i64 {
        bucket_from_row(&self.0)
    }

    /// Stop key that keeps this row inside an exclusive-end scan.
    pub fn inclusive_stop(&self) -> Vec<u8> {
        let mut stop = Vec::with_capacity(ROW_KEY_LEN + 1);
        stop.extend_from_slice(&self.0);
        stop.push(0);
        stop
    }
}

fn bucket_from_row(row: &[u8; ROW_KEY_LEN]) -> i64 {
    let mut bucket = [0u8; BUCKET_LEN];
    bucket.copy_from_slice(&row[DIGEST_LEN..]);
    i64::from_be_bytes(bucket)
}

/// A stored column resolved back to its reading timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedColumn<'a> {
    pub timestamp_ms: i64,
    pub tag: &'a [u8],
}

impl DecodedColumn<'_> {
    pub fn is_volume(&self) -> bool {
        self.tag == VOLUME_TAG.as_bytes()
    }
}

/// Codec bound to one bucket interval.
///
/// Construction checks that every offset of the interval fits the 2-byte offset
/// field, so encoding never truncates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodec {
    interval: BucketInterval,
}

impl KeyCodec {
    pub fn new(interval: BucketInterval) -> Result<Self> {
        if interval.max_offset() > i64::from(u16::MAX) {
            return Err(Error::invariant(format!(
                "{interval:?} offsets reach {} and do not fit in {OFFSET_LEN} bytes",
                interval.max_offset()
            )));
        }
        Ok(Self { interval })
    }

    pub fn hourly() -> Self {
        Self {
            interval: BucketInterval::Hour,
        }
    }

    pub fn interval(&self) -> BucketInterval {
        self.interval
    }

    pub fn row_key(&self, digest: &DeviceDigest, timestamp_ms: i64) -> Result<RowKey> {
        Ok(RowKey::new(digest, encode_bucket(timestamp_ms, self.interval)?))
    }

    pub fn encode_offset(&self, timestamp_ms: i64) -> Result<[u8; OFFSET_LEN]> {
        let offset = offset(timestamp_ms, self.interval)?;
        let narrow = u16::try_from(offset)
            .map_err(|_| Error::invariant(format!("offset {offset} exceeds {OFFSET_LEN} bytes")))?;
        Ok(narrow.to_be_bytes())
    }

    pub fn qualifier(&self, timestamp_ms: i64, tag: &str) -> Result<Vec<u8>> {
        let offset = u16::from_be_bytes(self.encode_offset(timestamp_ms)?);
        Qualifier::encode(offset, tag)
    }

    /// Recovers the reading timestamp from a stored row key and qualifier.
    ///
    /// Malformed bytes are reported as corrupt storage.
    pub fn decode<'a>(&self, row_key: &[u8], qualifier: &'a [u8]) -> Result<DecodedColumn<'a>> {
        let row: &[u8; ROW_KEY_LEN] = row_key.try_into().map_err(|_| {
            StoreError::Corrupt(format!("row key is {} bytes", row_key.len()))
        })?;
        let bucket = bucket_from_row(row);
        let qualifier = Qualifier::decode(qualifier)?;
        let offset = i64::from(qualifier.offset);
        if offset > self.interval.max_offset() {
            return Err(StoreError::Corrupt(format!("offset {offset} outside bucket")).into());
        }
        let timestamp_ms = bucket
            .checked_add(offset)
            .and_then(timestamp_from_reverse)
            .ok_or_else(|| StoreError::Corrupt(format!("bucket {bucket} out of range")))?;
        Ok(DecodedColumn {
            timestamp_ms,
            tag: qualifier.tag,
        })
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::hourly()
    }
}
