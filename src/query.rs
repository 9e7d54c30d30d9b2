//! Range query engine.
//!
//! Ascending key order is descending time, so the bucket of `end` is where the scan
//! starts and the bucket of `start` is the last row visited:
//!
//! ```text
//! start_row = digest ++ bucket(end)
//! stop_row  = digest ++ bucket(start) ++ 0x00     (exclusive; keeps bucket(start))
//! ```
//!
//! Inside a row, qualifiers ascend by offset, which is also descending time. The first
//! volume cell older than `start` therefore ends the whole scan.

use log::debug;

use crate::codec::KeyCodec;
use crate::digest::DeviceDigest;
use crate::reading::Reading;
use crate::store::{ScanSpec, SortedStore, StoreError};
use crate::writer::validate_device_key;
use crate::{Error, Result};

/// Scan bounds covering `[start_ms, end_ms]` for one device.
pub fn scan_bounds(
    codec: &KeyCodec,
    family: &str,
    digest: &DeviceDigest,
    start_ms: i64,
    end_ms: i64,
) -> Result<ScanSpec> {
    let start_row = codec.row_key(digest, end_ms)?;
    let last_row = codec.row_key(digest, start_ms)?;
    Ok(ScanSpec {
        start_row: start_row.as_bytes().to_vec(),
        stop_row: last_row.inclusive_stop(),
        family: family.to_string(),
    })
}

fn decode_volume(value: &[u8]) -> Result<i64> {
    let bytes: [u8; 8] = value
        .try_into()
        .map_err(|_| StoreError::Corrupt(format!("volume is {} bytes", value.len())))?;
    Ok(i64::from_be_bytes(bytes))
}

/// Readings of `device_key` with `start_ms <= timestamp <= end_ms`, oldest first.
///
/// Timestamps come back truncated to whole seconds. Results are all-or-nothing: a
/// store error discards anything read so far.
///
/// # Errors
///
/// - `Error::Validation`: empty device key, `start_ms > end_ms` or a negative bound
/// - `Error::Storage`: the scan failed or returned undecodable cells
pub fn query_interval<S: SortedStore + ?Sized>(
    store: &S,
    codec: &KeyCodec,
    family: &str,
    device_key: &str,
    start_ms: i64,
    end_ms: i64,
) -> Result<Vec<Reading>> {
    validate_device_key(device_key)?;
    if start_ms > end_ms {
        return Err(Error::validation(format!(
            "interval start {start_ms} is after end {end_ms}"
        )));
    }
    crate::codec::reverse(start_ms)?;

    let digest = DeviceDigest::of(device_key);
    let spec = scan_bounds(codec, family, &digest, start_ms, end_ms)?;

    let mut scanner = store.scan(&spec)?;
    let mut readings = Vec::new();
    let mut rows_visited = 0usize;
    'rows: while let Some(row) = scanner.next_row()? {
        rows_visited += 1;
        for cell in &row.cells {
            let column = codec.decode(&row.key, &cell.qualifier)?;
            if !column.is_volume() {
                continue;
            }
            if column.timestamp_ms < start_ms {
                debug!("device {digest}: scan passed interval start after {rows_visited} rows");
                break 'rows;
            }
            if column.timestamp_ms <= end_ms {
                readings.push(Reading::new(column.timestamp_ms, decode_volume(&cell.value)?));
            }
        }
    }
    drop(scanner);

    readings.sort_by_key(|r| r.timestamp_ms);
    Ok(readings)
}
