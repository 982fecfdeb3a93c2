//! Shared-formula flattening.
//!
//! A shared-formula group (one base formula applied across rectangular
//! regions) is only meaningful while cell coordinates are stable. Structural
//! edits cannot be trusted to preserve the group's delta model, so every
//! operation that can move cells flattens all groups into independent
//! per-cell formulas first. Conservative, and idempotent: after one pass the
//! group table is empty and a second pass is a no-op.

use sheetdoc_model::{CellDataType, CellFormula, Coordinate, ErrorLiteral, Worksheet};

use crate::rewrite::{rewrite_formula, RefTransform};

/// Flatten every shared-formula group on `sheet`.
///
/// For each coordinate of each group region with a stored cell, the group's
/// base text is rewritten by the delta from the base coordinate and stored
/// as an independent formula; the cached result is cleared (no evaluation
/// happens here). A rewrite that falls out of bounds turns the cell into an
/// error-typed cell carrying the reference-error literal.
pub fn flatten_all(sheet: &mut Worksheet) {
    if sheet.shared_formulas.is_empty() {
        return;
    }

    let groups: Vec<_> = sheet.shared_formulas.iter().cloned().collect();
    for group in &groups {
        for region in &group.regions {
            for row in region.start_row..=region.end_row {
                for col in region.start_col..=region.end_col {
                    let Some(mut cell) = sheet.cells.snapshot(row, col) else {
                        continue;
                    };
                    let coord = Coordinate::new(row, col);
                    if coord == group.base {
                        cell.formula = Some(CellFormula::normal(group.text.clone()));
                        cell.text = Some(String::new());
                    } else {
                        let transform = RefTransform::Shift {
                            source: group.base,
                            anchor: coord,
                            transpose: false,
                        };
                        let (text, has_error) =
                            rewrite_formula(&group.text, &sheet.name, false, &transform);
                        cell.formula = Some(CellFormula::normal(text));
                        if has_error {
                            cell.data_type = CellDataType::Error;
                            cell.text = Some(ErrorLiteral::Ref.as_str().to_string());
                        } else {
                            cell.text = Some(String::new());
                        }
                    }
                    sheet.cells.set(row, col, cell);
                }
            }
        }
    }

    sheet.shared_formulas.clear();
}
