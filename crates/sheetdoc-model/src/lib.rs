//! `sheetdoc-model` defines the core in-memory spreadsheet data structures.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the edit engine (formula rewriting, copy/paste, sort)
//! - `.xlsx` import/export layers
//! - external callers via `serde` (JSON-safe snapshots)

mod address;
mod autofilter;
mod cell;
mod error;
mod hyperlink;
mod merge;
mod shared_formula;
mod shared_strings;
mod store;
mod table;
mod worksheet;

pub use address::{
    column_index, column_name, A1ParseError, CellRange, Coordinate, COL_LIMIT, ROW_LIMIT,
};
pub use autofilter::SheetAutoFilter;
pub use cell::{CellDataType, CellFormula, CellRecord};
pub use error::ErrorLiteral;
pub use hyperlink::{Hyperlink, HyperlinkTarget};
pub use merge::{MergeError, MergedRegions};
pub use shared_formula::{SharedFormulaGroup, SharedFormulas};
pub use shared_strings::SharedStringTable;
pub use store::CellWarehouse;
pub use table::Table;
pub use worksheet::Worksheet;

/// Case-insensitive sheet-name comparison, matching Excel semantics.
pub fn sheet_name_eq_case_insensitive(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
