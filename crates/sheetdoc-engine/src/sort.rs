//! Rectangle sort.
//!
//! Cells along the key row/column are classified into number, text, boolean
//! and empty buckets, each bucket is sorted with its own comparer, and the
//! buckets are concatenated in a fixed order: numbers, text, booleans,
//! empties ascending; booleans, text, numbers, empties descending. The whole
//! rectangle is then remapped along the sorted axis through a staged copy of
//! its cells.
//!
//! Bucket sorting uses the standard library's stable sort, so equal keys
//! keep their original relative order.

use ahash::AHashMap;

use sheetdoc_model::{CellDataType, CellRange, SharedStringTable, Worksheet};

/// Key line for a sort: sort rows by the values in one column, or sort
/// columns by the values in one row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
    Column(u32),
    Row(u32),
}

#[derive(Debug)]
enum KeyClass {
    Number(f64),
    Text(String),
    Boolean(bool),
    Empty,
}

/// Sort `range` in place. Returns false (no mutation) when the range is out
/// of bounds or the key line lies outside it.
pub fn sort_range(
    sheet: &mut Worksheet,
    strings: &SharedStringTable,
    range: CellRange,
    key: SortKey,
    ascending: bool,
) -> bool {
    if !range.in_bounds() {
        return false;
    }
    match key {
        SortKey::Column(col) if col < range.start_col || col > range.end_col => return false,
        SortKey::Row(row) if row < range.start_row || row > range.end_row => return false,
        _ => {}
    }

    // Indices along the sorted axis (rows when keying on a column).
    let axis: Vec<u32> = match key {
        SortKey::Column(_) => (range.start_row..=range.end_row).collect(),
        SortKey::Row(_) => (range.start_col..=range.end_col).collect(),
    };

    let mut numbers: Vec<(f64, u32)> = Vec::new();
    let mut texts: Vec<(String, u32)> = Vec::new();
    let mut booleans: Vec<(bool, u32)> = Vec::new();
    let mut empties: Vec<u32> = Vec::new();

    for &index in &axis {
        let (row, col) = match key {
            SortKey::Column(key_col) => (index, key_col),
            SortKey::Row(key_row) => (key_row, index),
        };
        match classify(sheet, strings, row, col) {
            KeyClass::Number(n) => numbers.push((n, index)),
            KeyClass::Text(t) => texts.push((t, index)),
            KeyClass::Boolean(b) => booleans.push((b, index)),
            KeyClass::Empty => empties.push(index),
        }
    }

    numbers.sort_by(|a, b| a.0.total_cmp(&b.0));
    texts.sort_by(|a, b| a.0.cmp(&b.0));
    booleans.sort_by(|a, b| a.0.cmp(&b.0));
    if !ascending {
        numbers.reverse();
        texts.reverse();
        booleans.reverse();
    }

    // Empties always trail, regardless of direction.
    let mut order: Vec<u32> = Vec::with_capacity(axis.len());
    if ascending {
        order.extend(numbers.into_iter().map(|(_, i)| i));
        order.extend(texts.into_iter().map(|(_, i)| i));
        order.extend(booleans.into_iter().map(|(_, i)| i));
    } else {
        order.extend(booleans.into_iter().map(|(_, i)| i));
        order.extend(texts.into_iter().map(|(_, i)| i));
        order.extend(numbers.into_iter().map(|(_, i)| i));
    }
    order.extend(empties);

    remap(sheet, range, key, &order);
    true
}

/// Classification of one key cell, honoring the text/numeric duality: a
/// present text value is authoritative and parsed; otherwise the numeric
/// value is. A shared-string index that fails to resolve degrades to the
/// cell's literal content.
fn classify(sheet: &Worksheet, strings: &SharedStringTable, row: u32, col: u32) -> KeyClass {
    let Some(cell) = sheet.cells.get(row, col) else {
        return KeyClass::Empty;
    };
    if cell.is_really_empty() {
        return KeyClass::Empty;
    }

    match cell.data_type {
        CellDataType::Number => match cell.text.as_deref() {
            Some(t) if !t.is_empty() => match t.parse::<f64>() {
                Ok(n) => KeyClass::Number(n),
                Err(_) => KeyClass::Text(t.to_string()),
            },
            _ => KeyClass::Number(cell.numeric),
        },
        CellDataType::Boolean => match cell.text.as_deref() {
            Some(t) if !t.is_empty() => KeyClass::Boolean(t.eq_ignore_ascii_case("true")),
            _ => KeyClass::Boolean(cell.numeric > 0.5),
        },
        CellDataType::SharedString => {
            let resolved = match cell.text.as_deref() {
                Some(t) if !t.is_empty() => Some(t.to_string()),
                _ => strings
                    .resolve(cell.numeric as u32)
                    .map(str::to_string)
                    .or_else(|| cell.text.clone()),
            };
            KeyClass::Text(resolved.unwrap_or_else(|| cell.numeric.to_string()))
        }
        CellDataType::InlineString | CellDataType::String | CellDataType::Error => {
            KeyClass::Text(cell.text.clone().unwrap_or_default())
        }
    }
}

/// Rewrite the rectangle's cell positions: line `order[i]` of the staged
/// copy lands at line `i` of the range along the sorted axis.
fn remap(sheet: &mut Worksheet, range: CellRange, key: SortKey, order: &[u32]) {
    let mut staged: AHashMap<(u32, u32), _> = AHashMap::new();
    for (row, col) in sheet.cells.occupied() {
        if range.contains(sheetdoc_model::Coordinate::new(row, col)) {
            if let Some(cell) = sheet.cells.snapshot(row, col) {
                staged.insert((row, col), cell);
                sheet.cells.remove(row, col);
            }
        }
    }

    for (slot, &source_index) in order.iter().enumerate() {
        let slot = slot as u32;
        match key {
            SortKey::Column(_) => {
                let dest_row = range.start_row + slot;
                for col in range.start_col..=range.end_col {
                    if let Some(cell) = staged.get(&(source_index, col)) {
                        sheet.cells.set(dest_row, col, cell.clone());
                    }
                }
            }
            SortKey::Row(_) => {
                let dest_col = range.start_col + slot;
                for row in range.start_row..=range.end_row {
                    if let Some(cell) = staged.get(&(row, source_index)) {
                        sheet.cells.set(row, dest_col, cell.clone());
                    }
                }
            }
        }
    }
}
