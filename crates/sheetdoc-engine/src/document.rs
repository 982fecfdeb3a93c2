//! Workbook-level facade.
//!
//! A [`Document`] owns the worksheets and the shared-string table and keeps
//! one selected worksheet that the cell-level API operates on. Mutating
//! calls follow one convention: `false` means the input was rejected and
//! nothing changed.

use serde::{Deserialize, Serialize};

use sheetdoc_model::{
    sheet_name_eq_case_insensitive, CellDataType, CellFormula, CellRange, CellRecord, Coordinate,
    ErrorLiteral, SharedFormulas, SharedStringTable, Worksheet, COL_LIMIT, ROW_LIMIT,
};

use crate::clipboard::{self, PasteMode};
use crate::flatten::flatten_all;
use crate::rewrite::{rewrite_formula, Axis, RefTransform};
use crate::sort::{sort_range, SortKey};

/// A typed value for [`Document::set_cell_value`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Number(f64),
    Boolean(bool),
    /// Interned into the shared-string table on set.
    Text(String),
    /// Formula text; a leading `=` is accepted and stripped.
    Formula(String),
}

/// An in-memory workbook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    sheets: Vec<Worksheet>,
    shared_strings: SharedStringTable,
    selected: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A workbook with one empty worksheet named `Sheet1`, selected.
    pub fn new() -> Self {
        Self {
            sheets: vec![Worksheet::new("Sheet1")],
            shared_strings: SharedStringTable::new(),
            selected: 0,
        }
    }

    /// Build a document from already-loaded parts. The first sheet is
    /// selected; at least one sheet is required.
    pub fn from_parts(sheets: Vec<Worksheet>, shared_strings: SharedStringTable) -> Option<Self> {
        if sheets.is_empty() {
            return None;
        }
        Some(Self {
            sheets,
            shared_strings,
            selected: 0,
        })
    }

    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// The selected worksheet.
    pub fn sheet(&self) -> &Worksheet {
        &self.sheets[self.selected]
    }

    pub fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut self.sheets[self.selected]
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| sheet_name_eq_case_insensitive(&s.name, name))
    }

    /// Add an empty worksheet and select it. Rejected when the name is
    /// empty or already taken (case-insensitive).
    pub fn add_sheet(&mut self, name: &str) -> bool {
        if name.is_empty() || self.sheet_index(name).is_some() {
            return false;
        }
        self.sheets.push(Worksheet::new(name));
        self.selected = self.sheets.len() - 1;
        true
    }

    /// Select a worksheet by name (case-insensitive).
    pub fn select_sheet(&mut self, name: &str) -> bool {
        match self.sheet_index(name) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    // ---- cell values ----

    /// Set a cell on the selected sheet. Setting a value clears any formula;
    /// setting a formula clears the cached value.
    pub fn set_cell_value(&mut self, row: u32, col: u32, value: CellValue) -> bool {
        if !Coordinate::new(row, col).in_bounds() {
            return false;
        }
        // Intern before borrowing the sheet.
        let interned = match &value {
            CellValue::Text(text) => Some(self.shared_strings.intern(text)),
            _ => None,
        };

        let sheet = &mut self.sheets[self.selected];
        let mut cell = sheet.cells.snapshot(row, col).unwrap_or_default();
        match value {
            CellValue::Number(n) => {
                cell.data_type = CellDataType::Number;
                cell.text = None;
                cell.numeric = n;
                cell.formula = None;
            }
            CellValue::Boolean(b) => {
                cell.data_type = CellDataType::Boolean;
                cell.text = None;
                cell.numeric = if b { 1.0 } else { 0.0 };
                cell.formula = None;
            }
            CellValue::Text(_) => {
                cell.data_type = CellDataType::SharedString;
                cell.text = None;
                cell.numeric = f64::from(interned.unwrap_or(0));
                cell.formula = None;
            }
            CellValue::Formula(text) => {
                let text = text.strip_prefix('=').unwrap_or(&text).to_string();
                cell.data_type = CellDataType::Number;
                cell.text = Some(String::new());
                cell.numeric = 0.0;
                cell.formula = Some(CellFormula::normal(text));
            }
        }

        if cell.is_really_empty() {
            sheet.cells.remove(row, col);
        } else {
            sheet.cells.set(row, col, cell);
        }
        true
    }

    /// True when a stored, non-empty cell exists at the coordinate.
    pub fn has_cell_value(&self, row: u32, col: u32) -> bool {
        self.sheet()
            .cells
            .get(row, col)
            .is_some_and(|c| !c.is_really_empty())
    }

    /// True when the cell is error-typed.
    pub fn has_cell_error(&self, row: u32, col: u32) -> bool {
        self.sheet()
            .cells
            .get(row, col)
            .is_some_and(|c| c.data_type == CellDataType::Error)
    }

    /// String rendition of a cell value; empty string for absent cells.
    pub fn get_cell_value_as_string(&self, row: u32, col: u32) -> String {
        let Some(cell) = self.sheet().cells.get(row, col) else {
            return String::new();
        };
        match cell.data_type {
            CellDataType::SharedString => match cell.text.as_deref() {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => self
                    .shared_strings
                    .resolve(cell.numeric as u32)
                    .map(str::to_string)
                    .unwrap_or_default(),
            },
            CellDataType::Boolean => {
                if self.get_cell_value_as_bool(row, col) {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            CellDataType::Error => cell.text.clone().unwrap_or_default(),
            _ => match cell.text.as_deref() {
                Some(t) => t.to_string(),
                None => cell.numeric.to_string(),
            },
        }
    }

    /// Numeric rendition; 0.0 for absent or unparseable values. A present
    /// text value is authoritative and parsed.
    pub fn get_cell_value_as_f64(&self, row: u32, col: u32) -> f64 {
        let Some(cell) = self.sheet().cells.get(row, col) else {
            return 0.0;
        };
        match cell.data_type {
            CellDataType::SharedString => self
                .get_cell_value_as_string(row, col)
                .parse()
                .unwrap_or(0.0),
            _ => match cell.text.as_deref() {
                Some(t) if !t.is_empty() => t.parse().unwrap_or(0.0),
                _ => cell.numeric,
            },
        }
    }

    /// Boolean rendition: text `TRUE`/`FALSE` when present, otherwise
    /// numeric > 0.5.
    pub fn get_cell_value_as_bool(&self, row: u32, col: u32) -> bool {
        let Some(cell) = self.sheet().cells.get(row, col) else {
            return false;
        };
        match cell.text.as_deref() {
            Some(t) if !t.is_empty() => t.eq_ignore_ascii_case("true"),
            _ => cell.numeric > 0.5,
        }
    }

    /// The cell's formula text, if any. A shared-formula member reports its
    /// effective per-cell text (the group base rewritten by the member's
    /// delta), without materializing the flatten.
    pub fn get_cell_formula(&self, row: u32, col: u32) -> Option<String> {
        let sheet = self.sheet();
        let cell = sheet.cells.get(row, col)?;
        match cell.formula.as_ref()? {
            CellFormula::Normal { text } => Some(text.clone()),
            CellFormula::Shared { index } => {
                let group = sheet.shared_formulas.get(*index)?;
                let coord = Coordinate::new(row, col);
                if coord == group.base {
                    return Some(group.text.clone());
                }
                let transform = RefTransform::Shift {
                    source: group.base,
                    anchor: coord,
                    transpose: false,
                };
                let (text, _) = rewrite_formula(&group.text, &sheet.name, false, &transform);
                Some(text)
            }
        }
    }

    /// Shared-formula groups of the selected sheet.
    pub fn get_shared_formulas(&self) -> &SharedFormulas {
        &self.sheet().shared_formulas
    }

    /// Clear values and formulas in `range`, keeping styles, merges and
    /// hyperlinks. Shared formulas are flattened first since group members
    /// may be removed.
    pub fn clear_cell_content(&mut self, range: CellRange) -> bool {
        if !range.in_bounds() {
            return false;
        }
        let sheet = &mut self.sheets[self.selected];
        flatten_all(sheet);
        for (row, col) in sheet.cells.occupied() {
            if !range.contains(Coordinate::new(row, col)) {
                continue;
            }
            let style = sheet.cells.get(row, col).map_or(0, |c| c.style_index);
            if style != 0 {
                sheet.cells.set(
                    row,
                    col,
                    CellRecord {
                        style_index: style,
                        ..CellRecord::default()
                    },
                );
            } else {
                sheet.cells.remove(row, col);
            }
        }
        true
    }

    // ---- merges, filters ----

    pub fn merge_cells(&mut self, range: CellRange) -> bool {
        self.sheet_mut().merge_cells(range)
    }

    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        self.sheet_mut().unmerge_cells(range)
    }

    pub fn filter(&mut self, range: CellRange) -> bool {
        self.sheet_mut().set_filter(range)
    }

    pub fn remove_filter(&mut self) -> bool {
        self.sheet_mut().remove_filter()
    }

    // ---- clipboard ----

    /// Copy a single cell. Rejected when source and anchor are the same
    /// cell (the ranged form has no such restriction).
    pub fn copy_cell(
        &mut self,
        src_row: u32,
        src_col: u32,
        anchor: Coordinate,
        mode: PasteMode,
    ) -> bool {
        if Coordinate::new(src_row, src_col) == anchor {
            return false;
        }
        self.copy_cells(CellRange::new(src_row, src_col, src_row, src_col), anchor, mode)
    }

    /// Copy a rectangle on the selected sheet.
    pub fn copy_cells(&mut self, src: CellRange, anchor: Coordinate, mode: PasteMode) -> bool {
        self.flatten_all_sheets();
        clipboard::copy_cells(&mut self.sheets[self.selected], src, anchor, mode)
    }

    /// Move a rectangle on the selected sheet.
    pub fn cut_cells(&mut self, src: CellRange, anchor: Coordinate) -> bool {
        self.flatten_all_sheets();
        clipboard::cut_cells(&mut self.sheets[self.selected], src, anchor)
    }

    /// Copy a rectangle from another worksheet of this document onto the
    /// selected sheet.
    pub fn copy_cells_from_sheet(
        &mut self,
        source_sheet: &str,
        src: CellRange,
        anchor: Coordinate,
        mode: PasteMode,
    ) -> bool {
        let Some(src_idx) = self.sheet_index(source_sheet) else {
            return false;
        };
        self.flatten_all_sheets();
        if src_idx == self.selected {
            return clipboard::copy_cells(&mut self.sheets[self.selected], src, anchor, mode);
        }

        let dst_idx = self.selected;
        let (low, high) = self.sheets.split_at_mut(src_idx.max(dst_idx));
        let (source, dest) = if src_idx < dst_idx {
            (&low[src_idx], &mut high[0])
        } else {
            (&high[0], &mut low[dst_idx])
        };
        clipboard::copy_cells_from(source, dest, src, anchor, mode)
    }

    /// Sort a rectangle on the selected sheet.
    pub fn sort(&mut self, range: CellRange, key: SortKey, ascending: bool) -> bool {
        let sheet = &mut self.sheets[self.selected];
        flatten_all(sheet);
        sort_range(sheet, &self.shared_strings, range, key, ascending)
    }

    // ---- structural edits ----

    pub fn insert_rows(&mut self, at: u32, count: u32) -> bool {
        self.edit_axis(Axis::Row, at, count, true)
    }

    pub fn delete_rows(&mut self, at: u32, count: u32) -> bool {
        self.edit_axis(Axis::Row, at, count, false)
    }

    pub fn insert_columns(&mut self, at: u32, count: u32) -> bool {
        self.edit_axis(Axis::Col, at, count, true)
    }

    pub fn delete_columns(&mut self, at: u32, count: u32) -> bool {
        self.edit_axis(Axis::Col, at, count, false)
    }

    fn flatten_all_sheets(&mut self) {
        for sheet in &mut self.sheets {
            flatten_all(sheet);
        }
    }

    fn edit_axis(&mut self, axis: Axis, at: u32, count: u32, insert: bool) -> bool {
        let limit = match axis {
            Axis::Row => ROW_LIMIT,
            Axis::Col => COL_LIMIT,
        };
        if count == 0 || at < 1 || at > limit {
            return false;
        }
        if !insert && at as u64 + count as u64 - 1 > limit as u64 {
            return false;
        }

        let sheet = &mut self.sheets[self.selected];
        flatten_all(sheet);

        let transform = if insert {
            RefTransform::Insert { axis, at, count }
        } else {
            RefTransform::Delete { axis, at, count }
        };

        shift_cells(sheet, axis, at, count, insert, limit, &transform);
        shift_line_styles(sheet, axis, at, count, insert, limit);
        shift_regions(sheet, axis, at, count, insert, limit);
        true
    }
}

/// Map one index through an insert/delete. `None` means the index was
/// deleted or pushed past the limit.
fn map_index(idx: u32, at: u32, count: u32, insert: bool, limit: u32) -> Option<u32> {
    if insert {
        if idx < at {
            Some(idx)
        } else {
            let v = idx as u64 + count as u64;
            (v <= limit as u64).then_some(v as u32)
        }
    } else if idx < at {
        Some(idx)
    } else if (idx as u64) < at as u64 + count as u64 {
        None
    } else {
        Some(idx - count)
    }
}

/// Map a [start, end] span through an insert/delete. An insert growing past
/// the limit clamps the far edge; a delete swallowing the whole span drops
/// it.
fn map_span(
    start: u32,
    end: u32,
    at: u32,
    count: u32,
    insert: bool,
    limit: u32,
) -> Option<(u32, u32)> {
    if insert {
        let s = if start >= at { start + count } else { start };
        let e = if end >= at { end + count } else { end };
        if s > limit {
            return None;
        }
        Some((s, e.min(limit)))
    } else {
        let span_end = at as u64 + count as u64;
        let s = if (start as u64) < at as u64 {
            start
        } else if (start as u64) < span_end {
            at
        } else {
            start - count
        };
        let e = if (end as u64) < at as u64 {
            end
        } else if (end as u64) < span_end {
            at.checked_sub(1)?
        } else {
            end - count
        };
        (s <= e && s >= 1).then_some((s, e))
    }
}

fn shift_cells(
    sheet: &mut Worksheet,
    axis: Axis,
    at: u32,
    count: u32,
    insert: bool,
    limit: u32,
    transform: &RefTransform,
) {
    let mut staged = Vec::with_capacity(sheet.cells.len());
    for (row, col) in sheet.cells.occupied() {
        let Some(mut cell) = sheet.cells.snapshot(row, col) else {
            continue;
        };
        let (new_row, new_col) = match axis {
            Axis::Row => match map_index(row, at, count, insert, limit) {
                Some(r) => (r, col),
                None => continue,
            },
            Axis::Col => match map_index(col, at, count, insert, limit) {
                Some(c) => (row, c),
                None => continue,
            },
        };

        if let Some(CellFormula::Normal { text }) = &cell.formula {
            // Only formulas on the edited sheet are adjusted; tokens
            // qualified with another sheet's name stay untouched.
            let (new_text, has_error) = rewrite_formula(text, &sheet.name, true, transform);
            cell.formula = Some(CellFormula::normal(new_text));
            if has_error {
                cell.data_type = CellDataType::Error;
                cell.text = Some(ErrorLiteral::Ref.as_str().to_string());
            }
        }
        staged.push((new_row, new_col, cell));
    }

    sheet.cells.clear();
    for (row, col, cell) in staged {
        sheet.cells.set(row, col, cell);
    }

    sheet.calc_chain = std::mem::take(&mut sheet.calc_chain)
        .into_iter()
        .filter_map(|coord| {
            let idx = match axis {
                Axis::Row => coord.row,
                Axis::Col => coord.col,
            };
            let mapped = map_index(idx, at, count, insert, limit)?;
            Some(match axis {
                Axis::Row => Coordinate::new(mapped, coord.col),
                Axis::Col => Coordinate::new(coord.row, mapped),
            })
        })
        .collect();
}

fn shift_line_styles(
    sheet: &mut Worksheet,
    axis: Axis,
    at: u32,
    count: u32,
    insert: bool,
    limit: u32,
) {
    let styles = match axis {
        Axis::Row => &mut sheet.row_styles,
        Axis::Col => &mut sheet.col_styles,
    };
    *styles = std::mem::take(styles)
        .into_iter()
        .filter_map(|(idx, style)| Some((map_index(idx, at, count, insert, limit)?, style)))
        .collect();
}

fn shift_regions(
    sheet: &mut Worksheet,
    axis: Axis,
    at: u32,
    count: u32,
    insert: bool,
    limit: u32,
) {
    let map_range = |range: &CellRange| -> Option<CellRange> {
        let (start, end) = match axis {
            Axis::Row => (range.start_row, range.end_row),
            Axis::Col => (range.start_col, range.end_col),
        };
        let (s, e) = map_span(start, end, at, count, insert, limit)?;
        Some(match axis {
            Axis::Row => CellRange::new(s, range.start_col, e, range.end_col),
            Axis::Col => CellRange::new(range.start_row, s, range.end_row, e),
        })
    };

    let merges: Vec<CellRange> = sheet.merged_regions.iter().copied().collect();
    sheet.merged_regions = sheetdoc_model::MergedRegions::new();
    for region in merges {
        if let Some(mapped) = map_range(&region) {
            let _ = sheet.merged_regions.insert(mapped);
        }
    }

    sheet
        .hyperlinks
        .retain_mut(|link| match map_range(&link.region) {
            Some(mapped) => {
                link.region = mapped;
                true
            }
            None => false,
        });

    for table in &mut sheet.tables {
        if let Some(mapped) = map_range(&table.range) {
            table.range = mapped;
        }
    }

    if let Some(filter) = sheet.autofilter.as_ref() {
        match map_range(&filter.range) {
            Some(mapped) => {
                sheet.autofilter = Some(sheetdoc_model::SheetAutoFilter::new(mapped));
            }
            None => sheet.autofilter = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn value_round_trips() {
        let mut doc = Document::new();
        assert!(doc.set_cell_value(1, 1, CellValue::Number(1.5)));
        assert!(doc.set_cell_value(1, 2, CellValue::Text("hello".to_string())));
        assert!(doc.set_cell_value(1, 3, CellValue::Boolean(true)));

        assert_eq!(doc.get_cell_value_as_f64(1, 1), 1.5);
        assert_eq!(doc.get_cell_value_as_string(1, 2), "hello");
        assert!(doc.get_cell_value_as_bool(1, 3));
        assert_eq!(doc.get_cell_value_as_string(1, 3), "TRUE");
        assert!(doc.has_cell_value(1, 1));
        assert!(!doc.has_cell_value(9, 9));
    }

    #[test]
    fn boolean_read_back_as_number_uses_the_half_threshold() {
        let mut doc = Document::new();
        doc.set_cell_value(1, 1, CellValue::Number(0.6));
        assert!(doc.get_cell_value_as_bool(1, 1));
        doc.set_cell_value(1, 1, CellValue::Number(0.4));
        assert!(!doc.get_cell_value_as_bool(1, 1));
    }

    #[test]
    fn out_of_bounds_set_is_rejected() {
        let mut doc = Document::new();
        assert!(!doc.set_cell_value(0, 1, CellValue::Number(1.0)));
        assert!(!doc.set_cell_value(1, COL_LIMIT + 1, CellValue::Number(1.0)));
    }

    #[test]
    fn formula_set_strips_the_leading_equals() {
        let mut doc = Document::new();
        doc.set_cell_value(1, 1, CellValue::Formula("=A2+1".to_string()));
        assert_eq!(doc.get_cell_formula(1, 1).as_deref(), Some("A2+1"));
    }

    #[test]
    fn shared_formula_members_report_delta_rewritten_text() {
        use sheetdoc_model::SharedFormulaGroup;

        let mut doc = Document::new();
        let sheet = doc.sheet_mut();
        sheet.shared_formulas.insert(SharedFormulaGroup {
            shared_index: 0,
            base: Coordinate::new(1, 2),
            regions: vec![CellRange::new(1, 2, 2, 2)],
            text: "A1*2".to_string(),
        });
        for row in 1..=2 {
            sheet.cells.set(
                row,
                2,
                CellRecord {
                    formula: Some(CellFormula::Shared { index: 0 }),
                    ..CellRecord::default()
                },
            );
        }

        assert_eq!(doc.get_cell_formula(1, 2).as_deref(), Some("A1*2"));
        assert_eq!(doc.get_cell_formula(2, 2).as_deref(), Some("A2*2"));
    }

    #[test]
    fn sheet_selection_is_case_insensitive_and_rejects_duplicates() {
        let mut doc = Document::new();
        assert!(doc.add_sheet("Data"));
        assert!(!doc.add_sheet("data"));
        assert!(doc.select_sheet("SHEET1"));
        assert_eq!(doc.sheet().name, "Sheet1");
        assert!(!doc.select_sheet("nope"));
    }

    #[test]
    fn copy_cell_rejects_copying_onto_itself() {
        let mut doc = Document::new();
        doc.set_cell_value(2, 2, CellValue::Number(1.0));
        assert!(!doc.copy_cell(2, 2, Coordinate::new(2, 2), PasteMode::Paste));
        // The ranged form has no such restriction.
        assert!(doc.copy_cells(
            CellRange::new(2, 2, 2, 2),
            Coordinate::new(2, 2),
            PasteMode::Paste
        ));
    }

    #[test]
    fn cross_sheet_copy_rewrites_against_the_destination() {
        let mut doc = Document::new();
        assert!(doc.add_sheet("Data"));
        doc.set_cell_value(2, 2, CellValue::Formula("A1+C3".to_string()));
        assert!(doc.select_sheet("Sheet1"));

        assert!(doc.copy_cells_from_sheet(
            "Data",
            CellRange::new(2, 2, 2, 2),
            Coordinate::new(5, 5),
            PasteMode::Paste,
        ));
        assert_eq!(doc.get_cell_formula(5, 5).as_deref(), Some("D4+F6"));
    }

    #[test]
    fn clear_cell_content_keeps_styles() {
        let mut doc = Document::new();
        doc.set_cell_value(1, 1, CellValue::Number(5.0));
        doc.sheet_mut().cells.set(
            1,
            2,
            CellRecord {
                numeric: 6.0,
                style_index: 3,
                ..CellRecord::default()
            },
        );

        assert!(doc.clear_cell_content(CellRange::new(1, 1, 1, 2)));
        assert!(!doc.has_cell_value(1, 1));
        let styled = doc.sheet().cells.get(1, 2).unwrap();
        assert_eq!(styled.style_index, 3);
        assert_eq!(styled.numeric, 0.0);
    }

    #[test]
    fn insert_rows_moves_cells_and_rewrites_formulas() {
        let mut doc = Document::new();
        doc.set_cell_value(1, 1, CellValue::Number(10.0));
        doc.set_cell_value(5, 1, CellValue::Number(50.0));
        doc.set_cell_value(6, 1, CellValue::Formula("A5".to_string()));

        assert!(doc.insert_rows(3, 2));
        assert_eq!(doc.get_cell_value_as_f64(1, 1), 10.0);
        assert!(!doc.has_cell_value(5, 1));
        assert_eq!(doc.get_cell_value_as_f64(7, 1), 50.0);
        assert_eq!(doc.get_cell_formula(8, 1).as_deref(), Some("A7"));
    }

    #[test]
    fn delete_rows_invalidates_formulas_into_the_span() {
        let mut doc = Document::new();
        doc.set_cell_value(5, 1, CellValue::Number(50.0));
        doc.set_cell_value(6, 1, CellValue::Formula("A3".to_string()));

        assert!(doc.delete_rows(2, 3));
        assert_eq!(doc.get_cell_value_as_f64(2, 1), 50.0);
        assert!(doc.has_cell_error(3, 1));
        assert_eq!(doc.get_cell_formula(3, 1).as_deref(), Some("#REF!"));
    }

    #[test]
    fn delete_rows_drops_cells_in_the_span() {
        let mut doc = Document::new();
        doc.set_cell_value(2, 1, CellValue::Number(2.0));
        doc.set_cell_value(3, 1, CellValue::Number(3.0));

        assert!(doc.delete_rows(2, 1));
        assert_eq!(doc.get_cell_value_as_f64(2, 1), 3.0);
        assert_eq!(doc.sheet().cells.len(), 1);
    }

    #[test]
    fn insert_columns_adjusts_merges_and_filters() {
        let mut doc = Document::new();
        assert!(doc.merge_cells(CellRange::new(1, 2, 2, 3)));
        assert!(doc.filter(CellRange::new(1, 1, 10, 4)));

        assert!(doc.insert_columns(2, 1));
        let merges: Vec<_> = doc.sheet().merged_regions.iter().copied().collect();
        assert_eq!(merges, vec![CellRange::new(1, 3, 2, 4)]);
        assert_eq!(
            doc.sheet().autofilter.as_ref().unwrap().range,
            CellRange::new(1, 1, 10, 5)
        );
    }

    #[test]
    fn delete_columns_collapsing_a_merge_drops_it() {
        let mut doc = Document::new();
        assert!(doc.merge_cells(CellRange::new(1, 2, 2, 3)));

        assert!(doc.delete_columns(2, 2));
        assert!(doc.sheet().merged_regions.is_empty());
    }
}
