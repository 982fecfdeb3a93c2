use serde::{Deserialize, Serialize};

use crate::CellRange;

/// Minimal table model: a named rectangle.
///
/// Tables are protected regions for validation purposes only — merges and
/// filters must not overlap them. Column definitions, totals rows and table
/// styles live outside this engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub range: CellRange,
}

impl Table {
    pub fn new(name: impl Into<String>, range: CellRange) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }
}
