//! Durable store backed by an append-only cell log.
//!
//! # Layout
//!
//! ```text
//! {dir}/
//!   cells.log      ← one frame per point write
//!
//! frame   = [len u32 LE][crc32 u32 LE][payload; len]
//! payload = [family_len u8][family][row_len u16 LE][row]
//!           [qual_len u16 LE][qualifier][value_len u32 LE][value]
//! ```
//!
//! Opening the store maps the log read-only and replays every intact frame into an
//! in-memory index, which then serves all scans. A torn or checksum-failing tail left by
//! a crash is cut off before new frames are appended.
//!
//! A failed append is cut back to the last committed frame before `put` returns, so
//! later frames never land behind a torn one. If that cut fails the store refuses
//! further writes. The index is updated under the same lock as the log, so the live
//! view and a replay agree on the last write to each cell.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, warn};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use super::memory::MemoryStore;
use super::{RowScanner, ScanSpec, SortedStore, StoreError, StoreResult};

pub const LOG_FILE_NAME: &str = "cells.log";

const FRAME_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogStoreConfig {
    /// `sync_data` after every appended frame.
    /// Default: false
    pub sync_on_write: bool,
}

pub struct LogStore {
    path: PathBuf,
    log: Mutex<LogFile>,
    index: MemoryStore,
    config: LogStoreConfig,
}

impl LogStore {
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(dir, LogStoreConfig::default())
    }

    /// Open or create the store in `dir`, replaying any existing log.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io`: directory or log file could not be opened
    /// - `StoreError::Corrupt`: a checksummed frame holds an undecodable cell
    pub fn open_with_config(dir: impl AsRef<Path>, config: LogStoreConfig) -> StoreResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let index = MemoryStore::new();
        let file_len = file.metadata()?.len();
        let valid_len = replay(&file, file_len, &index)?;
        if valid_len < file_len {
            warn!(
                "truncating {} torn bytes from {}",
                file_len - valid_len,
                path.display()
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }
        debug!(
            "opened {} with {} cells",
            path.display(),
            index.cell_count()?
        );

        Ok(Self {
            path,
            log: Mutex::new(LogFile {
                file,
                committed_len: valid_len,
                failed: None,
            }),
            index,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cell_count(&self) -> StoreResult<usize> {
        self.index.cell_count()
    }

    pub fn row_count(&self) -> StoreResult<usize> {
        self.index.row_count()
    }

    pub fn sync(&self) -> StoreResult<()> {
        let log = self.log.lock().map_err(|_| StoreError::Poisoned)?;
        log.file.sync_all()?;
        Ok(())
    }
}

struct LogFile {
    file: File,
    /// End of the last fully written frame.
    committed_len: u64,
    /// Set when a failed append could not be cut back.
    failed: Option<String>,
}

impl LogFile {
    fn append(&mut self, frame: &[u8], sync: bool) -> StoreResult<()> {
        self.append_with(frame.len() as u64, |file| {
            file.write_all(frame)?;
            if sync {
                file.sync_data()?;
            }
            Ok(())
        })
    }

    /// Runs `write` at the end of the log. On error the file is truncated back to
    /// `committed_len`; on success `committed_len` advances by `frame_len`.
    fn append_with<F>(&mut self, frame_len: u64, write: F) -> StoreResult<()>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        if let Some(reason) = &self.failed {
            return Err(StoreError::Failed(reason.clone()));
        }
        match write(&mut self.file) {
            Ok(()) => {
                self.committed_len += frame_len;
                Ok(())
            }
            Err(err) => {
                if let Err(trim) = self.file.set_len(self.committed_len) {
                    error!(
                        "failed to cut log back to {} bytes after append error: {trim}",
                        self.committed_len
                    );
                    self.failed = Some(format!("log tail could not be truncated: {trim}"));
                } else {
                    warn!("append failed, log cut back to {} bytes: {err}", self.committed_len);
                }
                Err(err.into())
            }
        }
    }
}

impl SortedStore for LogStore {
    fn put(&self, row: &[u8], family: &str, qualifier: &[u8], value: &[u8]) -> StoreResult<()> {
        let frame = encode_frame(row, family, qualifier, value)?;
        let mut log = self.log.lock().map_err(|_| StoreError::Poisoned)?;
        log.append(&frame, self.config.sync_on_write)?;
        self.index.put(row, family, qualifier, value)
    }

    fn scan<'a>(&'a self, spec: &ScanSpec) -> StoreResult<Box<dyn RowScanner + 'a>> {
        self.index.scan(spec)
    }
}

fn crc32(payload: &[u8]) -> u32 {
    use crc32fast::Hasher;
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

fn encode_frame(row: &[u8], family: &str, qualifier: &[u8], value: &[u8]) -> StoreResult<Vec<u8>> {
    let family_len =
        u8::try_from(family.len()).map_err(|_| StoreError::Unsupported("family name too long"))?;
    let row_len = u16::try_from(row.len()).map_err(|_| StoreError::Unsupported("row key too long"))?;
    let qual_len =
        u16::try_from(qualifier.len()).map_err(|_| StoreError::Unsupported("qualifier too long"))?;
    let value_len =
        u32::try_from(value.len()).map_err(|_| StoreError::Unsupported("value too long"))?;

    let mut payload = Vec::with_capacity(1 + family.len() + 2 + row.len() + 2 + qualifier.len() + 4 + value.len());
    payload.push(family_len);
    payload.extend_from_slice(family.as_bytes());
    payload.extend_from_slice(&row_len.to_le_bytes());
    payload.extend_from_slice(row);
    payload.extend_from_slice(&qual_len.to_le_bytes());
    payload.extend_from_slice(qualifier);
    payload.extend_from_slice(&value_len.to_le_bytes());
    payload.extend_from_slice(value);

    let len = u32::try_from(payload.len()).map_err(|_| StoreError::Unsupported("frame too long"))?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&crc32(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

struct DecodedFrame<'a> {
    family: &'a str,
    row: &'a [u8],
    qualifier: &'a [u8],
    value: &'a [u8],
}

struct PayloadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadCursor<'a> {
    fn take(&mut self, len: usize) -> StoreResult<&'a [u8]> {
        let buf = self.buf;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or_else(|| StoreError::Corrupt("cell frame truncated".to_string()))?;
        self.pos = end;
        Ok(&buf[start..end])
    }

    fn take_array<const N: usize>(&mut self) -> StoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

fn decode_payload(payload: &[u8]) -> StoreResult<DecodedFrame<'_>> {
    let mut cursor = PayloadCursor { buf: payload, pos: 0 };
    let family_len = cursor.take_array::<1>()?[0] as usize;
    let family = std::str::from_utf8(cursor.take(family_len)?)
        .map_err(|_| StoreError::Corrupt("family name is not utf-8".to_string()))?;
    let row_len = u16::from_le_bytes(cursor.take_array()?) as usize;
    let row = cursor.take(row_len)?;
    let qual_len = u16::from_le_bytes(cursor.take_array()?) as usize;
    let qualifier = cursor.take(qual_len)?;
    let value_len = u32::from_le_bytes(cursor.take_array()?) as usize;
    let value = cursor.take(value_len)?;
    if cursor.pos != payload.len() {
        return Err(StoreError::Corrupt("trailing bytes in cell frame".to_string()));
    }
    Ok(DecodedFrame {
        family,
        row,
        qualifier,
        value,
    })
}

/// Replays intact frames into `index` and returns the length of the valid prefix.
fn replay(file: &File, file_len: u64, index: &MemoryStore) -> StoreResult<u64> {
    if file_len == 0 {
        return Ok(0);
    }
    // SAFETY: the log is only appended to through this process's `LogStore`, and the map
    // is dropped before any truncation.
    let map = unsafe { Mmap::map(file)? };

    let mut pos = 0usize;
    while pos + FRAME_HEADER_LEN <= map.len() {
        let len = u32::from_le_bytes(map[pos..pos + 4].try_into().expect("slice length")) as usize;
        let crc = u32::from_le_bytes(map[pos + 4..pos + 8].try_into().expect("slice length"));
        let start = pos + FRAME_HEADER_LEN;
        let Some(end) = start.checked_add(len).filter(|end| *end <= map.len()) else {
            break;
        };
        let payload = &map[start..end];
        if crc32(payload) != crc {
            break;
        }
        let frame = decode_payload(payload)?;
        index.put(frame.row, frame.family, frame.qualifier, frame.value)?;
        pos = end;
    }
    Ok(pos as u64)
}
