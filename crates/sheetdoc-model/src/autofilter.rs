use serde::{Deserialize, Serialize};

use crate::CellRange;

/// Sheet-level autofilter. At most one per worksheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAutoFilter {
    pub range: CellRange,
}

impl SheetAutoFilter {
    pub fn new(range: CellRange) -> Self {
        Self { range }
    }
}
