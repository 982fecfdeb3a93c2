//! Formula reference tokenizer and rewriter.
//!
//! Formulas are plain text without the leading `=`. The rewriter parses a
//! formula into literal-string spans and reference tokens (single cell, cell
//! range, row range, column range, error literal), rewrites the row/column
//! indices of each token according to a [`RefTransform`], and re-serializes.
//! It never evaluates anything.
//!
//! Tokenization is a hand-written single-pass scanner with first-match
//! priority, not a regex engine. The formula grammar is ambiguous (`LOG10`
//! must not be parsed as cell reference `LOG10`), so candidate references
//! followed by `(` or further word characters are rejected and the whole
//! word run is passed through verbatim.

use sheetdoc_model::{
    column_index, column_name, sheet_name_eq_case_insensitive, Coordinate, ErrorLiteral, COL_LIMIT,
    ROW_LIMIT,
};

/// Axis selector for structural-edit transforms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// Transform applied to every reference token of a formula.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RefTransform {
    /// Copy/cut shift: every non-absolute axis moves by
    /// `anchor − source` on that axis. With `transpose`, coordinates are
    /// translated to the origin of `source`, row/column swapped, then
    /// translated to `anchor`; absolute axes do not participate at all.
    Shift {
        source: Coordinate,
        anchor: Coordinate,
        transpose: bool,
    },
    /// Row/column insertion: indices at or past `at` shift forward by
    /// `count`. Applies to absolute axes too, matching interactive
    /// insert behavior.
    Insert { axis: Axis, at: u32, count: u32 },
    /// Row/column deletion: indices inside the deleted span become `#REF!`,
    /// indices past it shift backward by `count`.
    Delete { axis: Axis, at: u32, count: u32 },
}

impl RefTransform {
    fn row_delta(&self) -> i64 {
        match self {
            RefTransform::Shift { source, anchor, .. } => {
                anchor.row as i64 - source.row as i64
            }
            _ => 0,
        }
    }

    fn col_delta(&self) -> i64 {
        match self {
            RefTransform::Shift { source, anchor, .. } => {
                anchor.col as i64 - source.col as i64
            }
            _ => 0,
        }
    }

    fn is_transpose(&self) -> bool {
        matches!(self, RefTransform::Shift { transpose: true, .. })
    }
}

/// Rewrite `formula` under `transform`.
///
/// `ctx_sheet` is the worksheet the formula lives on; it is threaded
/// explicitly so the same logic serves the cross-worksheet copy path. When
/// `only_current_sheet` is set, only tokens resolving to `ctx_sheet` (by the
/// sheet-name-presence rules) are rewritten.
///
/// Returns the rewritten text and an error flag: true when any reference
/// fell out of bounds and was replaced with `#REF!`. The caller is expected
/// to propagate the error typing to the owning cell.
pub fn rewrite_formula(
    formula: &str,
    ctx_sheet: &str,
    only_current_sheet: bool,
    transform: &RefTransform,
) -> (String, bool) {
    let mut out = String::with_capacity(formula.len() + 8);
    let mut has_error = false;

    // Split on string-literal delimiters first: reference-like substrings
    // inside quoted literals must never be rewritten. Re-joining on `"`
    // reconstructs the input exactly, including unterminated literals.
    for (i, seg) in formula.split('"').enumerate() {
        if i > 0 {
            out.push('"');
        }
        if i % 2 == 1 {
            out.push_str(seg);
        } else {
            rewrite_segment(
                seg,
                ctx_sheet,
                only_current_sheet,
                transform,
                &mut out,
                &mut has_error,
            );
        }
    }

    (out, has_error)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn rewrite_segment(
    seg: &str,
    ctx_sheet: &str,
    only_current_sheet: bool,
    transform: &RefTransform,
    out: &mut String,
    has_error: &mut bool,
) {
    let mut i = 0;
    while i < seg.len() {
        let rest = &seg[i..];
        let c = rest.chars().next().expect("offset is on a char boundary");

        if c == '\'' || c == '$' || c == '#' || is_word_char(c) {
            if let Some((len, token)) = match_token(rest) {
                emit_token(
                    &rest[..len],
                    token,
                    ctx_sheet,
                    only_current_sheet,
                    transform,
                    out,
                    has_error,
                );
                i += len;
                continue;
            }
            if is_word_char(c) {
                // Not a reference: skip the entire word/number run so
                // identifier interiors are never rescanned.
                let end = rest.find(|ch| !is_word_char(ch)).unwrap_or(rest.len());
                out.push_str(&rest[..end]);
                i += end;
                continue;
            }
        }

        out.push(c);
        i += c.len_utf8();
    }
}

/// One endpoint of a reference token.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Endpoint {
    /// Verbatim sheet prefix including the trailing `!` (and quotes), empty
    /// when the endpoint is unqualified. Preserved on output.
    sheet_raw: String,
    /// Unquoted sheet name, if qualified.
    sheet: Option<String>,
    col_abs: bool,
    col: u32,
    row_abs: bool,
    row: u32,
}

impl Endpoint {
    fn unqualified() -> Self {
        Self {
            sheet_raw: String::new(),
            sheet: None,
            col_abs: false,
            col: 0,
            row_abs: false,
            row: 0,
        }
    }
}

#[derive(Clone, Debug)]
enum Token {
    /// Error literal (optionally sheet-qualified): opaque, passed through.
    ErrorLit,
    Cell {
        a: Endpoint,
        b: Option<Endpoint>,
    },
    RowRange {
        a: Endpoint,
        b: Endpoint,
    },
    ColRange {
        a: Endpoint,
        b: Endpoint,
    },
}

/// Match the first token at the start of `s`. Priority order: error
/// literal, cell reference / cell range, row range, column range.
fn match_token(s: &str) -> Option<(usize, Token)> {
    let (p_end, sheet) = match scan_sheet_prefix(s) {
        Some((end, name)) => (end, Some(name)),
        None => (0, None),
    };
    let after_prefix = &s[p_end..];

    if let Some((_, len)) = ErrorLiteral::match_prefix(after_prefix) {
        return Some((p_end + len, Token::ErrorLit));
    }

    let make_endpoint = |col_abs, col, row_abs, row| Endpoint {
        sheet_raw: s[..p_end].to_string(),
        sheet: sheet.clone(),
        col_abs,
        col,
        row_abs,
        row,
    };

    // Cell reference, possibly the first endpoint of a cell range.
    if let Some((len, col_abs, col, row_abs, row)) = scan_cell_part(after_prefix) {
        let mut consumed = p_end + len;
        if boundary_ok(&s[consumed..]) {
            let a = make_endpoint(col_abs, col, row_abs, row);
            if let Some(rest) = s[consumed..].strip_prefix(':') {
                if let Some((b_len, b)) = scan_cell_endpoint(rest) {
                    consumed += 1 + b_len;
                    return Some((consumed, Token::Cell { a, b: Some(b) }));
                }
            }
            return Some((consumed, Token::Cell { a, b: None }));
        }
        // Boundary failure (e.g. `LOG10(`): fall through so the caller can
        // skip the word run.
        return None;
    }

    // Row-only range.
    if let Some((len, row_abs, row)) = scan_row_part(after_prefix) {
        let consumed = p_end + len;
        if let Some(rest) = s[consumed..].strip_prefix(':') {
            if let Some((b_len, b)) = scan_row_endpoint(rest) {
                let a = make_endpoint(false, 0, row_abs, row);
                return Some((consumed + 1 + b_len, Token::RowRange { a, b }));
            }
        }
        return None;
    }

    // Column-only range.
    if let Some((len, col_abs, col)) = scan_col_part(after_prefix) {
        let consumed = p_end + len;
        if let Some(rest) = s[consumed..].strip_prefix(':') {
            if let Some((b_len, b)) = scan_col_endpoint(rest) {
                if boundary_ok(&s[consumed + 1 + b_len..]) {
                    let a = make_endpoint(col_abs, col, false, 0);
                    return Some((consumed + 1 + b_len, Token::ColRange { a, b }));
                }
            }
        }
        return None;
    }

    None
}

/// A matched reference must not be followed by a word character or `(`;
/// `LOG10(` is a function call, not a reference to cell LOG10.
fn boundary_ok(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => !is_word_char(c) && c != '(',
    }
}

fn scan_cell_endpoint(s: &str) -> Option<(usize, Endpoint)> {
    let (p_end, sheet) = match scan_sheet_prefix(s) {
        Some((end, name)) => (end, Some(name)),
        None => (0, None),
    };
    let (len, col_abs, col, row_abs, row) = scan_cell_part(&s[p_end..])?;
    if !boundary_ok(&s[p_end + len..]) {
        return None;
    }
    Some((
        p_end + len,
        Endpoint {
            sheet_raw: s[..p_end].to_string(),
            sheet,
            col_abs,
            col,
            row_abs,
            row,
        },
    ))
}

fn scan_row_endpoint(s: &str) -> Option<(usize, Endpoint)> {
    let (p_end, sheet) = match scan_sheet_prefix(s) {
        Some((end, name)) => (end, Some(name)),
        None => (0, None),
    };
    let (len, row_abs, row) = scan_row_part(&s[p_end..])?;
    Some((
        p_end + len,
        Endpoint {
            sheet_raw: s[..p_end].to_string(),
            sheet,
            col_abs: false,
            col: 0,
            row_abs,
            row,
        },
    ))
}

fn scan_col_endpoint(s: &str) -> Option<(usize, Endpoint)> {
    let (p_end, sheet) = match scan_sheet_prefix(s) {
        Some((end, name)) => (end, Some(name)),
        None => (0, None),
    };
    let (len, col_abs, col) = scan_col_part(&s[p_end..])?;
    Some((
        p_end + len,
        Endpoint {
            sheet_raw: s[..p_end].to_string(),
            sheet,
            col_abs,
            col,
            row_abs: false,
            row: 0,
        },
    ))
}

/// Optional `'quoted name'!` (with `''` escape) or unquoted word run
/// followed by `!`. Returns the byte length including the `!` and the
/// unquoted name.
fn scan_sheet_prefix(s: &str) -> Option<(usize, String)> {
    if s.starts_with('\'') {
        let mut name = String::new();
        let mut i = 1;
        loop {
            let rel = s[i..].find('\'')?;
            name.push_str(&s[i..i + rel]);
            i += rel + 1;
            if s[i..].starts_with('\'') {
                name.push('\'');
                i += 1;
            } else {
                break;
            }
        }
        if s[i..].starts_with('!') {
            return Some((i + 1, name));
        }
        return None;
    }

    let end = s.find(|c: char| !is_word_char(c)).unwrap_or(s.len());
    if end > 0 && s[end..].starts_with('!') {
        return Some((end + 1, s[..end].to_string()));
    }
    None
}

/// `$?A..Z{1,3}$?digits{1,7}`, validated against the sheet limits.
fn scan_cell_part(s: &str) -> Option<(usize, bool, u32, bool, u32)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let col_abs = bytes.first() == Some(&b'$');
    if col_abs {
        i += 1;
    }

    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == col_start || i - col_start > 3 {
        return None;
    }
    let col = column_index(&s[col_start..i])?;
    if col > COL_LIMIT {
        return None;
    }

    let row_abs = bytes.get(i) == Some(&b'$');
    if row_abs {
        i += 1;
    }

    let row_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == row_start || i - row_start > 7 {
        return None;
    }
    let row: u32 = s[row_start..i].parse().ok()?;
    if row == 0 || row > ROW_LIMIT {
        return None;
    }

    Some((i, col_abs, col, row_abs, row))
}

/// `$?digits{1,7}`, validated against the row limit.
fn scan_row_part(s: &str) -> Option<(usize, bool, u32)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let abs = bytes.first() == Some(&b'$');
    if abs {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == start || i - start > 7 {
        return None;
    }
    let row: u32 = s[start..i].parse().ok()?;
    if row == 0 || row > ROW_LIMIT {
        return None;
    }
    Some((i, abs, row))
}

/// `$?A..Z{1,3}`, validated against the column limit.
fn scan_col_part(s: &str) -> Option<(usize, bool, u32)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let abs = bytes.first() == Some(&b'$');
    if abs {
        i += 1;
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == start || i - start > 3 {
        return None;
    }
    let col = column_index(&s[start..i])?;
    if col > COL_LIMIT {
        return None;
    }
    Some((i, abs, col))
}

/// Does this token resolve to the context sheet?
///
/// Unqualified endpoints count as current; a qualifier counts as current
/// only when it names the context sheet (case-insensitive). Any genuinely
/// different sheet name makes the token foreign.
fn token_is_current_sheet(a: &Endpoint, b: Option<&Endpoint>, ctx_sheet: &str) -> bool {
    let ep_current = |ep: &Endpoint| match &ep.sheet {
        None => true,
        Some(name) => sheet_name_eq_case_insensitive(name, ctx_sheet),
    };
    ep_current(a) && b.map_or(true, ep_current)
}

fn emit_token(
    raw: &str,
    token: Token,
    ctx_sheet: &str,
    only_current_sheet: bool,
    transform: &RefTransform,
    out: &mut String,
    has_error: &mut bool,
) {
    match token {
        Token::ErrorLit => out.push_str(raw),
        Token::Cell { a, b } => {
            if only_current_sheet && !token_is_current_sheet(&a, b.as_ref(), ctx_sheet) {
                out.push_str(raw);
                return;
            }
            match rewrite_cell_token(&a, b.as_ref(), transform) {
                Ok((na, nb)) => {
                    if na == a && nb.as_ref() == b.as_ref() {
                        out.push_str(raw);
                    } else {
                        write_cell_endpoint(out, &na);
                        if let Some(nb) = nb {
                            out.push(':');
                            write_cell_endpoint(out, &nb);
                        }
                    }
                }
                Err(()) => emit_ref_error(out, &a, has_error),
            }
        }
        Token::RowRange { a, b } => {
            if only_current_sheet && !token_is_current_sheet(&a, Some(&b), ctx_sheet) {
                out.push_str(raw);
                return;
            }
            match rewrite_axis_range(&a, &b, Axis::Row, transform) {
                Ok(None) => out.push_str(raw),
                Ok(Some((kind, na, nb))) => write_axis_range(out, kind, &na, &nb),
                Err(()) => emit_ref_error(out, &a, has_error),
            }
        }
        Token::ColRange { a, b } => {
            if only_current_sheet && !token_is_current_sheet(&a, Some(&b), ctx_sheet) {
                out.push_str(raw);
                return;
            }
            match rewrite_axis_range(&a, &b, Axis::Col, transform) {
                Ok(None) => out.push_str(raw),
                Ok(Some((kind, na, nb))) => write_axis_range(out, kind, &na, &nb),
                Err(()) => emit_ref_error(out, &a, has_error),
            }
        }
    }
}

/// Replace a token whose rewrite left the sheet bounds with a
/// sheet-qualified reference-error literal.
fn emit_ref_error(out: &mut String, a: &Endpoint, has_error: &mut bool) {
    out.push_str(&a.sheet_raw);
    out.push_str(ErrorLiteral::Ref.as_str());
    *has_error = true;
}

fn rewrite_cell_token(
    a: &Endpoint,
    b: Option<&Endpoint>,
    transform: &RefTransform,
) -> Result<(Endpoint, Option<Endpoint>), ()> {
    let mut na = rewrite_cell_endpoint(a, transform)?;
    let Some(b) = b else {
        return Ok((na, None));
    };
    let mut nb = rewrite_cell_endpoint(b, transform)?;

    // Range auto-correction: keep the range top-left/bottom-right ordered
    // unless the endpoints are pinned to distinct sheets.
    if !distinct_sheets(&na, &nb) {
        if na.row > nb.row {
            std::mem::swap(&mut na.row, &mut nb.row);
            std::mem::swap(&mut na.row_abs, &mut nb.row_abs);
        }
        if na.col > nb.col {
            std::mem::swap(&mut na.col, &mut nb.col);
            std::mem::swap(&mut na.col_abs, &mut nb.col_abs);
        }
    }
    Ok((na, Some(nb)))
}

fn distinct_sheets(a: &Endpoint, b: &Endpoint) -> bool {
    match (&a.sheet, &b.sheet) {
        (Some(x), Some(y)) => !sheet_name_eq_case_insensitive(x, y),
        _ => false,
    }
}

fn rewrite_cell_endpoint(ep: &Endpoint, transform: &RefTransform) -> Result<Endpoint, ()> {
    let mut out = ep.clone();
    match transform {
        RefTransform::Shift {
            source,
            anchor,
            transpose: false,
        } => {
            let row_delta = anchor.row as i64 - source.row as i64;
            let col_delta = anchor.col as i64 - source.col as i64;
            out.row = shift_index(ep.row, ep.row_abs, row_delta, ROW_LIMIT)?;
            out.col = shift_index(ep.col, ep.col_abs, col_delta, COL_LIMIT)?;
        }
        RefTransform::Shift {
            source,
            anchor,
            transpose: true,
        } => {
            // Translate to the source origin, swap axes, translate to the
            // anchor. Absolute axes do not participate at all.
            if !ep.row_abs {
                let v = anchor.row as i64 + (ep.col as i64 - source.col as i64);
                out.row = checked_index(v, ROW_LIMIT)?;
            }
            if !ep.col_abs {
                let v = anchor.col as i64 + (ep.row as i64 - source.row as i64);
                out.col = checked_index(v, COL_LIMIT)?;
            }
        }
        RefTransform::Insert { axis, at, count } => match axis {
            Axis::Row => out.row = insert_index(ep.row, *at, *count, ROW_LIMIT)?,
            Axis::Col => out.col = insert_index(ep.col, *at, *count, COL_LIMIT)?,
        },
        RefTransform::Delete { axis, at, count } => match axis {
            Axis::Row => out.row = delete_index(ep.row, *at, *count)?,
            Axis::Col => out.col = delete_index(ep.col, *at, *count)?,
        },
    }
    Ok(out)
}

/// Rewrite a row-only or column-only range.
///
/// `Ok(None)` means the token is untouched (emit raw). A transpose converts
/// the range to the other kind; the returned axis kind reflects that.
fn rewrite_axis_range(
    a: &Endpoint,
    b: &Endpoint,
    kind: Axis,
    transform: &RefTransform,
) -> Result<Option<(Axis, Endpoint, Endpoint)>, ()> {
    let (idx_a, abs_a) = match kind {
        Axis::Row => (a.row, a.row_abs),
        Axis::Col => (a.col, a.col_abs),
    };
    let (idx_b, abs_b) = match kind {
        Axis::Row => (b.row, b.row_abs),
        Axis::Col => (b.col, b.col_abs),
    };

    let (new_kind, new_a, new_b) = match transform {
        RefTransform::Shift {
            transpose: false, ..
        } => {
            // Row-range rewriting is skipped entirely when the row delta is
            // zero (and likewise for column ranges): the token has no other
            // axis for the remaining delta to act on.
            let delta = match kind {
                Axis::Row => transform.row_delta(),
                Axis::Col => transform.col_delta(),
            };
            if delta == 0 {
                return Ok(None);
            }
            let limit = axis_limit(kind);
            (
                kind,
                shift_index(idx_a, abs_a, delta, limit)?,
                shift_index(idx_b, abs_b, delta, limit)?,
            )
        }
        RefTransform::Shift {
            source,
            anchor,
            transpose: true,
        } => {
            // A row range transposes into a column range and vice versa; the
            // other axis only exists when geometrically forced by the swap.
            // Fully absolute tokens do not participate in transposition.
            if abs_a && abs_b {
                return Ok(None);
            }
            let (from_origin, to_anchor) = match kind {
                Axis::Row => (source.row as i64, anchor.col as i64),
                Axis::Col => (source.col as i64, anchor.row as i64),
            };
            let swapped = match kind {
                Axis::Row => Axis::Col,
                Axis::Col => Axis::Row,
            };
            let limit = axis_limit(swapped);
            let map = |idx: u32, abs: bool| -> Result<u32, ()> {
                if abs {
                    if idx > limit {
                        return Err(());
                    }
                    return Ok(idx);
                }
                checked_index(to_anchor + (idx as i64 - from_origin), limit)
            };
            (swapped, map(idx_a, abs_a)?, map(idx_b, abs_b)?)
        }
        RefTransform::Insert { axis, at, count } => {
            if *axis != kind {
                return Ok(None);
            }
            let limit = axis_limit(kind);
            (
                kind,
                insert_index(idx_a, *at, *count, limit)?,
                insert_index(idx_b, *at, *count, limit)?,
            )
        }
        RefTransform::Delete { axis, at, count } => {
            if *axis != kind {
                return Ok(None);
            }
            (
                kind,
                delete_index(idx_a, *at, *count)?,
                delete_index(idx_b, *at, *count)?,
            )
        }
    };

    if new_kind == kind && new_a == idx_a && new_b == idx_b {
        return Ok(None);
    }

    let mut na = Endpoint {
        sheet_raw: a.sheet_raw.clone(),
        sheet: a.sheet.clone(),
        ..Endpoint::unqualified()
    };
    let mut nb = Endpoint {
        sheet_raw: b.sheet_raw.clone(),
        sheet: b.sheet.clone(),
        ..Endpoint::unqualified()
    };
    let (mut ia, mut aa) = (new_a, abs_a);
    let (mut ib, mut ab) = (new_b, abs_b);
    if !distinct_sheets(&na, &nb) && ia > ib {
        std::mem::swap(&mut ia, &mut ib);
        std::mem::swap(&mut aa, &mut ab);
    }
    match new_kind {
        Axis::Row => {
            na.row = ia;
            na.row_abs = aa;
            nb.row = ib;
            nb.row_abs = ab;
        }
        Axis::Col => {
            na.col = ia;
            na.col_abs = aa;
            nb.col = ib;
            nb.col_abs = ab;
        }
    }
    Ok(Some((new_kind, na, nb)))
}

const fn axis_limit(axis: Axis) -> u32 {
    match axis {
        Axis::Row => ROW_LIMIT,
        Axis::Col => COL_LIMIT,
    }
}

fn shift_index(idx: u32, abs: bool, delta: i64, limit: u32) -> Result<u32, ()> {
    if abs || delta == 0 {
        return Ok(idx);
    }
    checked_index(idx as i64 + delta, limit)
}

fn insert_index(idx: u32, at: u32, count: u32, limit: u32) -> Result<u32, ()> {
    if idx < at {
        return Ok(idx);
    }
    checked_index(idx as i64 + count as i64, limit)
}

fn delete_index(idx: u32, at: u32, count: u32) -> Result<u32, ()> {
    let span_end = at as i64 + count as i64 - 1;
    if (idx as i64) < at as i64 {
        Ok(idx)
    } else if idx as i64 <= span_end {
        Err(())
    } else {
        Ok(idx - count)
    }
}

fn checked_index(v: i64, limit: u32) -> Result<u32, ()> {
    if v < 1 || v > limit as i64 {
        Err(())
    } else {
        Ok(v as u32)
    }
}

fn write_cell_endpoint(out: &mut String, ep: &Endpoint) {
    out.push_str(&ep.sheet_raw);
    if ep.col_abs {
        out.push('$');
    }
    out.push_str(&column_name(ep.col));
    if ep.row_abs {
        out.push('$');
    }
    out.push_str(&ep.row.to_string());
}

fn write_axis_range(out: &mut String, kind: Axis, a: &Endpoint, b: &Endpoint) {
    write_axis_endpoint(out, kind, a);
    out.push(':');
    write_axis_endpoint(out, kind, b);
}

fn write_axis_endpoint(out: &mut String, kind: Axis, ep: &Endpoint) {
    out.push_str(&ep.sheet_raw);
    match kind {
        Axis::Row => {
            if ep.row_abs {
                out.push('$');
            }
            out.push_str(&ep.row.to_string());
        }
        Axis::Col => {
            if ep.col_abs {
                out.push('$');
            }
            out.push_str(&column_name(ep.col));
        }
    }
}
