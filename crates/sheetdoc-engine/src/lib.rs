//! Edit engine for sheetdoc workbooks.
//!
//! The engine transforms workbook state: formula reference rewriting,
//! shared-formula flattening, copy/cut/paste/transpose, rectangle sort, and
//! row/column structural edits. It never evaluates formulas.

pub mod clipboard;
pub mod document;
pub mod flatten;
pub mod rewrite;
pub mod sort;

pub use clipboard::{copy_cells, copy_cells_from, cut_cells, CellSource, PasteMode};
pub use document::{CellValue, Document};
pub use flatten::flatten_all;
pub use rewrite::{rewrite_formula, Axis, RefTransform};
pub use sort::{sort_range, SortKey};
