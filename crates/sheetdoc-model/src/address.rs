use core::fmt;

use serde::{Deserialize, Serialize};

/// OOXML maximum rows per worksheet (1,048,576).
pub const ROW_LIMIT: u32 = 1_048_576;

/// OOXML maximum columns per worksheet (16,384).
pub const COL_LIMIT: u32 = 16_384;

/// A reference to a single cell within a worksheet.
///
/// Rows and columns are **1-based**, matching the OOXML `<c r="A1">` surface:
/// - `row = 1` is row `1`
/// - `col = 1` is column `A`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// 1-based row.
    pub row: u32,
    /// 1-based column.
    pub col: u32,
}

impl Coordinate {
    /// Construct a new [`Coordinate`].
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Returns true if the coordinate lies within the OOXML sheet limits.
    ///
    /// Coordinates outside the limits are always rejected by mutating APIs,
    /// never clamped.
    #[inline]
    pub const fn in_bounds(self) -> bool {
        self.row >= 1 && self.row <= ROW_LIMIT && self.col >= 1 && self.col <= COL_LIMIT
    }

    /// Convert to A1 notation (e.g. `A1`, `BC32`).
    pub fn to_a1(self) -> String {
        format!("{}{}", column_name(self.col), self.row)
    }

    /// Parse an A1-style reference (e.g. `A1`, `$B$2`). `$` markers are
    /// accepted and discarded.
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }

        let mut idx = 0usize;
        let bytes = s.as_bytes();
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }

        if idx == col_start {
            return Err(A1ParseError::MissingColumn);
        }

        let col_str = &s[col_start..idx];
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }

        if idx == row_start {
            return Err(A1ParseError::MissingRow);
        }
        if idx != bytes.len() {
            return Err(A1ParseError::TrailingCharacters);
        }

        let col = column_index(col_str).ok_or(A1ParseError::InvalidColumn)?;
        let row: u32 = s[row_start..idx]
            .parse()
            .map_err(|_| A1ParseError::InvalidRow)?;
        let coord = Self { row, col };
        if row == 0 || row > ROW_LIMIT {
            return Err(A1ParseError::InvalidRow);
        }
        if col > COL_LIMIT {
            return Err(A1ParseError::InvalidColumn);
        }
        Ok(coord)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// A rectangular region within a worksheet.
///
/// The range is inclusive and always normalized such that:
/// - `start_row <= end_row`
/// - `start_col <= end_col`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl CellRange {
    /// Construct a new range, normalizing endpoint order if needed.
    pub const fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        let (sr, er) = if start_row <= end_row {
            (start_row, end_row)
        } else {
            (end_row, start_row)
        };
        let (sc, ec) = if start_col <= end_col {
            (start_col, end_col)
        } else {
            (end_col, start_col)
        };
        Self {
            start_row: sr,
            start_col: sc,
            end_row: er,
            end_col: ec,
        }
    }

    /// Construct a range covering the two corner coordinates.
    pub const fn from_corners(a: Coordinate, b: Coordinate) -> Self {
        Self::new(a.row, a.col, b.row, b.col)
    }

    /// Top-left corner.
    #[inline]
    pub const fn start(&self) -> Coordinate {
        Coordinate::new(self.start_row, self.start_col)
    }

    /// Bottom-right corner.
    #[inline]
    pub const fn end(&self) -> Coordinate {
        Coordinate::new(self.end_row, self.end_col)
    }

    /// Returns true if both corners lie within the sheet limits.
    #[inline]
    pub const fn in_bounds(&self) -> bool {
        self.start().in_bounds() && self.end().in_bounds()
    }

    /// Returns true if `coord` lies within this range.
    #[inline]
    pub const fn contains(&self, coord: Coordinate) -> bool {
        coord.row >= self.start_row
            && coord.row <= self.end_row
            && coord.col >= self.start_col
            && coord.col <= self.end_col
    }

    /// Returns true if `other` lies entirely within this range.
    #[inline]
    pub const fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(other.start()) && self.contains(other.end())
    }

    /// Separating-axis overlap test: the ranges do NOT overlap iff one is
    /// entirely above/below or entirely left/right of the other.
    #[inline]
    pub const fn overlaps(&self, other: &CellRange) -> bool {
        !(self.end_row < other.start_row
            || self.start_row > other.end_row
            || self.end_col < other.start_col
            || self.start_col > other.end_col)
    }

    /// Intersection of two ranges, if they overlap.
    pub fn intersect(&self, other: &CellRange) -> Option<CellRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(CellRange {
            start_row: self.start_row.max(other.start_row),
            start_col: self.start_col.max(other.start_col),
            end_row: self.end_row.min(other.end_row),
            end_col: self.end_col.min(other.end_col),
        })
    }

    /// Shift the whole range by the given deltas. Returns `None` when any
    /// corner would leave the sheet limits.
    pub fn translate(&self, row_delta: i64, col_delta: i64) -> Option<CellRange> {
        let sr = self.start_row as i64 + row_delta;
        let er = self.end_row as i64 + row_delta;
        let sc = self.start_col as i64 + col_delta;
        let ec = self.end_col as i64 + col_delta;
        if sr < 1 || er > ROW_LIMIT as i64 || sc < 1 || ec > COL_LIMIT as i64 {
            return None;
        }
        Some(CellRange::new(sr as u32, sc as u32, er as u32, ec as u32))
    }

    /// Number of rows in the range.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    /// Number of columns in the range.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    /// Returns true if the range is exactly one cell.
    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start())
        } else {
            write!(f, "{}:{}", self.start(), self.end())
        }
    }
}

/// Errors that can occur when parsing an A1 cell reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum A1ParseError {
    #[error("empty A1 reference")]
    Empty,
    #[error("missing column in A1 reference")]
    MissingColumn,
    #[error("missing row in A1 reference")]
    MissingRow,
    #[error("invalid column in A1 reference")]
    InvalidColumn,
    #[error("invalid row in A1 reference")]
    InvalidRow,
    #[error("trailing characters in A1 reference")]
    TrailingCharacters,
}

/// Convert a 1-based column index to its letter name (1 = `A`, 28 = `AB`).
pub fn column_name(col: u32) -> String {
    let mut n = col;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).expect("column letters are always valid UTF-8")
}

/// Convert a column letter name to its 1-based index (`A` = 1). Returns
/// `None` for empty input, non-letters, or overflow.
pub fn column_index(name: &str) -> Option<u32> {
    let mut col: u32 = 0;
    for b in name.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(v)?;
    }
    if col == 0 {
        None
    } else {
        Some(col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_roundtrip() {
        let c = Coordinate::new(1, 1);
        assert_eq!(c.to_a1(), "A1");
        assert_eq!(Coordinate::from_a1("A1").unwrap(), c);
        assert_eq!(Coordinate::from_a1("$A$1").unwrap(), c);

        let c2 = Coordinate::new(32, 55); // BC32
        assert_eq!(c2.to_a1(), "BC32");
        assert_eq!(Coordinate::from_a1("bc32").unwrap(), c2);
    }

    #[test]
    fn a1_bounds_are_ooxml_compatible() {
        assert!(Coordinate::from_a1("XFD1048576").is_ok());
        assert!(Coordinate::from_a1("XFE1").is_err()); // col 16,385 is out of bounds
        assert!(Coordinate::from_a1("A1048577").is_err()); // row 1,048,577 is out of bounds
        assert!(Coordinate::from_a1("A0").is_err());
    }

    #[test]
    fn range_normalizes_corners() {
        let r = CellRange::new(5, 4, 2, 1);
        assert_eq!(r, CellRange::new(2, 1, 5, 4));
        assert_eq!(r.height(), 4);
        assert_eq!(r.width(), 4);
    }

    #[test]
    fn overlap_is_a_separating_axis_test() {
        let a = CellRange::new(1, 1, 2, 2);
        let b = CellRange::new(2, 2, 3, 3);
        let c = CellRange::new(3, 1, 4, 1);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn intersect_returns_common_rectangle() {
        let a = CellRange::new(1, 1, 4, 4);
        let b = CellRange::new(3, 3, 6, 6);
        assert_eq!(a.intersect(&b), Some(CellRange::new(3, 3, 4, 4)));
        assert_eq!(a.intersect(&CellRange::new(5, 5, 6, 6)), None);
    }

    #[test]
    fn translate_rejects_out_of_bounds() {
        let r = CellRange::new(1, 1, 2, 2);
        assert_eq!(r.translate(1, 1), Some(CellRange::new(2, 2, 3, 3)));
        assert_eq!(r.translate(-1, 0), None);
        assert_eq!(r.translate(0, COL_LIMIT as i64), None);
    }

    #[test]
    fn column_names_roundtrip() {
        for (idx, name) in [(1, "A"), (26, "Z"), (27, "AA"), (702, "ZZ"), (16_384, "XFD")] {
            assert_eq!(column_name(idx), name);
            assert_eq!(column_index(name), Some(idx));
        }
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }
}
