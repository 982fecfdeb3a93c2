use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::CellRecord;

/// Sparse cell storage: row index → column index → cell record.
///
/// Only non-default cells are stored. The store exclusively owns its records:
/// `set` takes the record by value and `snapshot` hands out a clone, so no
/// external caller can alias store-owned state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellWarehouse {
    rows: HashMap<u32, HashMap<u32, CellRecord>>,
}

impl CellWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a cell is stored at the coordinate.
    pub fn exists(&self, row: u32, col: u32) -> bool {
        self.rows.get(&row).is_some_and(|r| r.contains_key(&col))
    }

    /// Borrow the record at the coordinate, if present.
    pub fn get(&self, row: u32, col: u32) -> Option<&CellRecord> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Clone the record at the coordinate, if present. This is the only way
    /// records cross an API boundary: callers receive snapshots, never
    /// references into the store.
    pub fn snapshot(&self, row: u32, col: u32) -> Option<CellRecord> {
        self.get(row, col).cloned()
    }

    /// Store `cell` at the coordinate, overwriting any prior entry. The
    /// row-level map is created lazily.
    pub fn set(&mut self, row: u32, col: u32, cell: CellRecord) {
        self.rows.entry(row).or_default().insert(col, cell);
    }

    /// Remove the cell at the coordinate. Returns true if something was
    /// removed. An emptied row-level map is pruned.
    pub fn remove(&mut self, row: u32, col: u32) -> bool {
        let Some(cols) = self.rows.get_mut(&row) else {
            return false;
        };
        let removed = cols.remove(&col).is_some();
        if cols.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Materialized snapshot of all occupied coordinates.
    ///
    /// The list is collected before being returned, so callers may freely
    /// remove cells while iterating it (a documented caller pattern).
    pub fn occupied(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::with_capacity(self.len());
        for (&row, cols) in &self.rows {
            for &col in cols.keys() {
                out.push((row, col));
            }
        }
        out
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove every record matching the really-empty predicate.
    ///
    /// This sweep is not run on every mutation; callers invoke it after
    /// operations that may have reintroduced default cells (e.g. style
    /// removal).
    pub fn compact(&mut self) {
        for (row, col) in self.occupied() {
            let really_empty = self
                .get(row, col)
                .map_or(false, CellRecord::is_really_empty);
            if really_empty {
                self.remove(row, col);
            }
        }
    }

    /// Drop every stored cell.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
