use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    CellRange, CellWarehouse, Coordinate, Hyperlink, MergeError, MergedRegions, SharedFormulas,
    SheetAutoFilter, Table,
};

/// One worksheet: sparse cells plus the sheet-level structures the edit
/// engine operates on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,

    pub cells: CellWarehouse,

    /// Shared-formula groups loaded from the package; flattened before any
    /// structural edit.
    pub shared_formulas: SharedFormulas,

    pub merged_regions: MergedRegions,

    pub hyperlinks: Vec<Hyperlink>,

    /// Protected regions that merges and filters must not overlap.
    pub tables: Vec<Table>,

    pub autofilter: Option<SheetAutoFilter>,

    /// Row-level style overrides (row index → style index). A coordinate
    /// with no stored cell still "inherits" this style.
    pub row_styles: HashMap<u32, u32>,

    /// Column-level style overrides (column index → style index).
    pub col_styles: HashMap<u32, u32>,

    /// Calculation-chain membership for this sheet. The engine never
    /// maintains the chain (no evaluation); paste invalidates entries that
    /// fall inside the destination rectangle.
    pub calc_chain: Vec<Coordinate>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: CellWarehouse::new(),
            shared_formulas: SharedFormulas::new(),
            merged_regions: MergedRegions::new(),
            hyperlinks: Vec::new(),
            tables: Vec::new(),
            autofilter: None,
            row_styles: HashMap::new(),
            col_styles: HashMap::new(),
            calc_chain: Vec::new(),
        }
    }

    /// Style index a coordinate would display with when it has no stored
    /// cell: the row override wins over the column override, 0 otherwise.
    pub fn inherited_style_index(&self, row: u32, col: u32) -> u32 {
        if let Some(&s) = self.row_styles.get(&row) {
            return s;
        }
        if let Some(&s) = self.col_styles.get(&col) {
            return s;
        }
        0
    }

    /// Merge a cell range. Rejected (false) when the range is out of bounds
    /// or overlaps an existing merge or table region; no partial mutation
    /// occurs on rejection.
    pub fn merge_cells(&mut self, range: CellRange) -> bool {
        if self.tables.iter().any(|t| t.range.overlaps(&range)) {
            return false;
        }
        match self.merged_regions.insert(range) {
            Ok(()) => true,
            Err(MergeError::OverlapsMerge | MergeError::OverlapsTable | MergeError::OutOfBounds) => {
                false
            }
        }
    }

    /// Remove a merge region by exact range match.
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        self.merged_regions.remove(range)
    }

    /// Set the sheet autofilter. Rejected when the range is out of bounds or
    /// overlaps a table region.
    pub fn set_filter(&mut self, range: CellRange) -> bool {
        if !range.in_bounds() {
            return false;
        }
        if self.tables.iter().any(|t| t.range.overlaps(&range)) {
            return false;
        }
        self.autofilter = Some(SheetAutoFilter::new(range));
        true
    }

    /// Remove the sheet autofilter. Returns true if one was present.
    pub fn remove_filter(&mut self) -> bool {
        self.autofilter.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_rejects_table_overlap() {
        let mut ws = Worksheet::new("Sheet1");
        ws.tables
            .push(Table::new("Table1", CellRange::new(1, 1, 5, 5)));

        assert!(!ws.merge_cells(CellRange::new(4, 4, 6, 6)));
        assert!(ws.merged_regions.is_empty());
        assert!(ws.merge_cells(CellRange::new(6, 6, 7, 7)));
    }

    #[test]
    fn filter_rejects_table_overlap() {
        let mut ws = Worksheet::new("Sheet1");
        ws.tables
            .push(Table::new("Table1", CellRange::new(1, 1, 5, 5)));

        assert!(!ws.set_filter(CellRange::new(5, 5, 9, 9)));
        assert!(ws.autofilter.is_none());

        assert!(ws.set_filter(CellRange::new(7, 1, 9, 9)));
        assert!(ws.remove_filter());
        assert!(!ws.remove_filter());
    }

    #[test]
    fn inherited_style_prefers_row_over_column() {
        let mut ws = Worksheet::new("Sheet1");
        ws.row_styles.insert(2, 7);
        ws.col_styles.insert(3, 9);

        assert_eq!(ws.inherited_style_index(2, 3), 7);
        assert_eq!(ws.inherited_style_index(1, 3), 9);
        assert_eq!(ws.inherited_style_index(1, 1), 0);
    }
}
