use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard};

use super::{Cell, Row, RowScanner, ScanSpec, SortedStore, StoreError, StoreResult};

/// Cells of one row keyed by (family, qualifier).
type RowCells = BTreeMap<(String, Vec<u8>), Vec<u8>>;
type Rows = BTreeMap<Vec<u8>, RowCells>;

/// Ordered in-process store.
///
/// Point writes take the write lock for a single cell, which gives per-row atomicity.
/// Scanners hold the read lock until dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Rows>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn cell_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.values().map(BTreeMap::len).sum())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Rows>> {
        self.rows.read().map_err(|_| StoreError::Poisoned)
    }
}

impl SortedStore for MemoryStore {
    fn put(&self, row: &[u8], family: &str, qualifier: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        rows.entry(row.to_vec())
            .or_default()
            .insert((family.to_string(), qualifier.to_vec()), value.to_vec());
        Ok(())
    }

    fn scan<'a>(&'a self, spec: &ScanSpec) -> StoreResult<Box<dyn RowScanner + 'a>> {
        Ok(Box::new(MemoryScanner {
            rows: self.read()?,
            family: spec.family.clone(),
            cursor: Bound::Included(spec.start_row.clone()),
            stop: spec.stop_row.clone(),
        }))
    }
}

pub struct MemoryScanner<'a> {
    rows: RwLockReadGuard<'a, Rows>,
    family: String,
    cursor: Bound<Vec<u8>>,
    stop: Vec<u8>,
}

impl MemoryScanner<'_> {
    fn family_cells(&self, cells: &RowCells) -> Vec<Cell> {
        cells
            .iter()
            .filter(|((family, _), _)| *family == self.family)
            .map(|((_, qualifier), value)| Cell {
                qualifier: qualifier.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

impl RowScanner for MemoryScanner<'_> {
    fn next_row(&mut self) -> StoreResult<Option<Row>> {
        loop {
            let lower = match &self.cursor {
                Bound::Included(key) | Bound::Excluded(key) if key.as_slice() >= self.stop.as_slice() => {
                    return Ok(None);
                }
                Bound::Included(key) => Bound::Included(key.as_slice()),
                Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
                Bound::Unbounded => Bound::Unbounded,
            };

            let next = self
                .rows
                .range::<[u8], _>((lower, Bound::Excluded(self.stop.as_slice())))
                .next()
                .map(|(key, cells)| (key.clone(), self.family_cells(cells)));

            let Some((key, cells)) = next else {
                return Ok(None);
            };
            self.cursor = Bound::Excluded(key.clone());
            if !cells.is_empty() {
                return Ok(Some(Row { key, cells }));
            }
        }
    }
}
