//! Sorted key-value store capability.
//!
//! The engine needs exactly two primitives from a store:
//! 1. **Point write** of one cell addressed by (row, family, qualifier)
//! 2. **Forward range scan** over `[start_row, stop_row)` restricted to one family
//!
//! Rows come back in ascending byte order of their keys and each row's cells in
//! ascending qualifier order. A scanner owns whatever the back-end holds open for the
//! scan and releases it when dropped.

mod log_store;
mod memory;

use std::sync::Arc;

use thiserror::Error as ThisError;

pub use log_store::{LogStore, LogStoreConfig, LOG_FILE_NAME};
pub use memory::{MemoryScanner, MemoryStore};

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt data: {0}")]
    Corrupt(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("store unwritable: {0}")]
    Failed(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: Vec<u8>,
    /// Cells of the scanned family, ascending by qualifier.
    pub cells: Vec<Cell>,
}

/// Bounds of a forward scan. `stop_row` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSpec {
    pub start_row: Vec<u8>,
    pub stop_row: Vec<u8>,
    pub family: String,
}

pub trait RowScanner {
    fn next_row(&mut self) -> StoreResult<Option<Row>>;
}

pub trait SortedStore: Send + Sync {
    fn put(&self, row: &[u8], family: &str, qualifier: &[u8], value: &[u8]) -> StoreResult<()>;

    fn scan<'a>(&'a self, spec: &ScanSpec) -> StoreResult<Box<dyn RowScanner + 'a>>;
}

impl<S: SortedStore + ?Sized> SortedStore for Arc<S> {
    fn put(&self, row: &[u8], family: &str, qualifier: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(row, family, qualifier, value)
    }

    fn scan<'a>(&'a self, spec: &ScanSpec) -> StoreResult<Box<dyn RowScanner + 'a>> {
        (**self).scan(spec)
    }
}
