//! Write path.
//!
//! Each storable reading becomes one point write:
//!
//! ```text
//! row       = digest(device) ++ bucket(t, hour)
//! qualifier = offset(t) ++ [1] ++ "v"
//! value     = volume as i64 BE
//! ```
//!
//! Writes are independent. A store failure stops the batch and earlier writes stay in
//! place; there is no rollback and no retry at this layer.

use log::debug;

use crate::codec::{KeyCodec, VOLUME_TAG};
use crate::digest::DeviceDigest;
use crate::reading::Reading;
use crate::store::SortedStore;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    /// Readings skipped for a non-positive volume.
    pub dropped: usize,
}

pub(crate) fn validate_device_key(device_key: &str) -> Result<()> {
    if device_key.trim().is_empty() {
        return Err(Error::validation("device key is empty"));
    }
    Ok(())
}

/// Persist `readings` for `device_key` into `family`.
///
/// Input is validated before the first write, so a validation error leaves the store
/// untouched.
///
/// # Errors
///
/// - `Error::Validation`: empty device key or a storable reading before the epoch
/// - `Error::Storage`: the store rejected a write; remaining readings are not written
/// - `Error::EncodingInvariant`: the codec produced a key of the wrong width
pub fn store_readings<S: SortedStore + ?Sized>(
    store: &S,
    codec: &KeyCodec,
    family: &str,
    device_key: &str,
    readings: &[Reading],
) -> Result<WriteSummary> {
    validate_device_key(device_key)?;
    for reading in readings.iter().filter(|r| r.is_storable()) {
        crate::codec::reverse(reading.timestamp_ms)?;
    }

    let digest = DeviceDigest::of(device_key);
    let mut summary = WriteSummary::default();
    for reading in readings {
        if !reading.is_storable() {
            summary.dropped += 1;
            continue;
        }
        let row = codec.row_key(&digest, reading.timestamp_ms)?;
        let qualifier = codec.qualifier(reading.timestamp_ms, VOLUME_TAG)?;
        store.put(row.as_bytes(), family, &qualifier, &reading.volume.to_be_bytes())?;
        summary.written += 1;
    }

    debug!(
        "device {digest}: wrote {} readings, dropped {}",
        summary.written, summary.dropped
    );
    Ok(summary)
}
