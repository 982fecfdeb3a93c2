//! Copy/cut/paste/transpose orchestrator.
//!
//! All operations are two-phase: a staging pass snapshots everything it
//! needs from the source (and the destination, for modes that keep
//! destination state), then an apply pass clears the destination rectangle
//! and writes the staged cells. The staging pass never mutates, so
//! overlapping source and destination rectangles cannot corrupt each other.
//!
//! Shared formulas are flattened before any operation here runs; the
//! per-cell rewrite only ever sees independent formula text.

use ahash::AHashMap;
use smallvec::SmallVec;

use sheetdoc_model::{
    CellDataType, CellFormula, CellRange, CellRecord, Coordinate, ErrorLiteral, Hyperlink,
    Worksheet, COL_LIMIT, ROW_LIMIT,
};

use crate::flatten::flatten_all;
use crate::rewrite::{rewrite_formula, RefTransform};

/// Paste behavior selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PasteMode {
    /// Full paste: values, formulas (rewritten) and styles.
    Paste,
    /// Styles only; destination content is untouched.
    Formatting,
    /// Values and formulas (rewritten); destination styles are kept.
    Formulas,
    /// Values only; formulas are dropped, destination styles are kept.
    Values,
    /// Full paste with the rectangle transposed around the anchor.
    Transpose,
}

/// Per-mode behavior, collapsed into one set of switches so every mode runs
/// through the same per-cell dispatch.
#[derive(Copy, Clone, Debug)]
struct ModeFlags {
    /// Copy value, data type and cached text.
    content: bool,
    /// Copy and rewrite the formula (`false` with `content` drops it).
    formulas: bool,
    /// Copy the style index (`false` keeps the destination's).
    styles: bool,
    /// Transpose coordinates around the anchor.
    transpose: bool,
}

impl PasteMode {
    fn flags(self) -> ModeFlags {
        match self {
            PasteMode::Paste => ModeFlags {
                content: true,
                formulas: true,
                styles: true,
                transpose: false,
            },
            PasteMode::Formatting => ModeFlags {
                content: false,
                formulas: false,
                styles: true,
                transpose: false,
            },
            PasteMode::Formulas => ModeFlags {
                content: true,
                formulas: true,
                styles: false,
                transpose: false,
            },
            PasteMode::Values => ModeFlags {
                content: true,
                formulas: false,
                styles: false,
                transpose: false,
            },
            PasteMode::Transpose => ModeFlags {
                content: true,
                formulas: true,
                styles: true,
                transpose: true,
            },
        }
    }
}

/// Read-side of a paste source.
///
/// The in-memory path implements this on [`Worksheet`]; the package-streaming
/// cross-worksheet path implements it over a parsed worksheet part. Both feed
/// the same per-cell dispatch, which is what keeps the two paths behaviorally
/// identical.
pub trait CellSource {
    /// Snapshot of the cell at a coordinate, if present.
    fn cell(&self, row: u32, col: u32) -> Option<CellRecord>;

    /// Style a coordinate without a stored cell inherits from row/column
    /// overrides (0 when none).
    fn inherited_style(&self, row: u32, col: u32) -> u32;

    /// Hyperlinks of the source sheet, with targets already resolved to
    /// literal URIs.
    fn hyperlinks(&self) -> Vec<Hyperlink>;
}

impl CellSource for Worksheet {
    fn cell(&self, row: u32, col: u32) -> Option<CellRecord> {
        self.cells.snapshot(row, col)
    }

    fn inherited_style(&self, row: u32, col: u32) -> u32 {
        self.inherited_style_index(row, col)
    }

    fn hyperlinks(&self) -> Vec<Hyperlink> {
        self.hyperlinks.clone()
    }
}

/// Copy `src` to `anchor` on the same sheet. Returns false (no mutation)
/// when the geometry is invalid.
pub fn copy_cells(sheet: &mut Worksheet, src: CellRange, anchor: Coordinate, mode: PasteMode) -> bool {
    paste_on_sheet(sheet, src, anchor, mode, false)
}

/// Move `src` to `anchor` on the same sheet (full-paste semantics plus
/// source removal and merge/hyperlink relocation).
pub fn cut_cells(sheet: &mut Worksheet, src: CellRange, anchor: Coordinate) -> bool {
    paste_on_sheet(sheet, src, anchor, PasteMode::Paste, true)
}

fn paste_on_sheet(
    sheet: &mut Worksheet,
    src: CellRange,
    anchor: Coordinate,
    mode: PasteMode,
    cut: bool,
) -> bool {
    flatten_all(sheet);

    let Some(plan) = stage(sheet, sheet, src, anchor, mode) else {
        return false;
    };

    if cut {
        relocate_merges(sheet, &plan, true);
        relocate_contained_hyperlinks(sheet, &plan);
        for row in src.start_row..=src.end_row {
            for col in src.start_col..=src.end_col {
                sheet.cells.remove(row, col);
            }
        }
    } else {
        relocate_merges(sheet, &plan, false);
        let new_links = copied_hyperlinks(sheet, &plan);
        sheet.hyperlinks.extend(new_links);
    }

    apply(sheet, plan);
    true
}

/// Copy `src` from another source (a different worksheet, or a streamed
/// worksheet part) to `anchor` on `sheet`. Merge regions are not relocated
/// across sheets; hyperlinks overlapping the source rectangle are remapped
/// and added on the destination.
pub fn copy_cells_from<S: CellSource + ?Sized>(
    source: &S,
    sheet: &mut Worksheet,
    src: CellRange,
    anchor: Coordinate,
    mode: PasteMode,
) -> bool {
    flatten_all(sheet);

    let Some(plan) = stage(source, sheet, src, anchor, mode) else {
        return false;
    };

    let new_links = copied_hyperlinks(source, &plan);
    sheet.hyperlinks.extend(new_links);
    apply(sheet, plan);
    true
}

/// Everything the apply pass needs, computed without mutating anything.
struct PastePlan {
    src: CellRange,
    anchor: Coordinate,
    /// Destination rectangle (clipped to the sheet limits for transpose).
    dest: CellRange,
    flags: ModeFlags,
    row_delta: i64,
    col_delta: i64,
    staged: AHashMap<(u32, u32), CellRecord>,
}

fn stage<S: CellSource + ?Sized>(
    source: &S,
    dest_sheet: &Worksheet,
    src: CellRange,
    anchor: Coordinate,
    mode: PasteMode,
) -> Option<PastePlan> {
    if !src.in_bounds() || !anchor.in_bounds() {
        return None;
    }
    let flags = mode.flags();

    let row_delta = anchor.row as i64 - src.start_row as i64;
    let col_delta = anchor.col as i64 - src.start_col as i64;

    let dest = if flags.transpose {
        // Transposed extent, clipped: geometry past the limits is skipped
        // per cell rather than rejected.
        CellRange::new(
            anchor.row,
            anchor.col,
            (anchor.row as u64 + src.width() as u64 - 1).min(ROW_LIMIT as u64) as u32,
            (anchor.col as u64 + src.height() as u64 - 1).min(COL_LIMIT as u64) as u32,
        )
    } else {
        src.translate(row_delta, col_delta)?
    };

    let transform = RefTransform::Shift {
        source: src.start(),
        anchor,
        transpose: flags.transpose,
    };

    let mut staged = AHashMap::with_capacity(src.height() as usize * src.width() as usize);
    for row in src.start_row..=src.end_row {
        for col in src.start_col..=src.end_col {
            let Some(dest_coord) = map_coord(Coordinate::new(row, col), src.start(), anchor, flags)
            else {
                continue;
            };

            let src_cell = source.cell(row, col);
            let src_inherited = source.inherited_style(row, col);
            let dest_cell = dest_sheet.cells.snapshot(dest_coord.row, dest_coord.col);
            let dest_inherited = dest_sheet.inherited_style_index(dest_coord.row, dest_coord.col);

            if let Some(cell) = stage_cell(
                flags,
                src_cell,
                src_inherited,
                dest_cell,
                dest_inherited,
                &transform,
                &dest_sheet.name,
            ) {
                staged.insert((dest_coord.row, dest_coord.col), cell);
            }
        }
    }

    Some(PastePlan {
        src,
        anchor,
        dest,
        flags,
        row_delta,
        col_delta,
        staged,
    })
}

/// Destination coordinate for one source coordinate, or `None` when a
/// transposed coordinate falls past the sheet limits.
fn map_coord(
    coord: Coordinate,
    src_start: Coordinate,
    anchor: Coordinate,
    flags: ModeFlags,
) -> Option<Coordinate> {
    if flags.transpose {
        let row = anchor.row as u64 + (coord.col - src_start.col) as u64;
        let col = anchor.col as u64 + (coord.row - src_start.row) as u64;
        if row > ROW_LIMIT as u64 || col > COL_LIMIT as u64 {
            return None;
        }
        Some(Coordinate::new(row as u32, col as u32))
    } else {
        // In bounds by the destination-rectangle translate check.
        Some(Coordinate::new(
            (coord.row as i64 + anchor.row as i64 - src_start.row as i64) as u32,
            (coord.col as i64 + anchor.col as i64 - src_start.col as i64) as u32,
        ))
    }
}

/// The single parameterized per-cell decision all five modes run through.
fn stage_cell(
    flags: ModeFlags,
    src_cell: Option<CellRecord>,
    src_inherited: u32,
    dest_cell: Option<CellRecord>,
    dest_inherited: u32,
    transform: &RefTransform,
    dest_sheet_name: &str,
) -> Option<CellRecord> {
    if !flags.content {
        // Formatting: restyle the destination in place. When the source has
        // no direct cell, its effective style is the inherited row/column
        // style; a default-style result still needs a placeholder when the
        // destination would otherwise inherit a non-default style.
        let style = src_cell.map_or(src_inherited, |c| c.style_index);
        return match dest_cell {
            Some(mut cell) => {
                cell.style_index = style;
                Some(cell)
            }
            None if style != 0 => Some(CellRecord {
                style_index: style,
                ..CellRecord::default()
            }),
            None if dest_inherited != 0 => Some(CellRecord::default()),
            None => None,
        };
    }

    match src_cell {
        Some(mut cell) => {
            if flags.formulas {
                if let Some(CellFormula::Normal { text }) = &cell.formula {
                    let (new_text, has_error) =
                        rewrite_formula(text, dest_sheet_name, false, transform);
                    cell.formula = Some(CellFormula::normal(new_text));
                    if has_error {
                        cell.data_type = CellDataType::Error;
                        cell.text = Some(ErrorLiteral::Ref.as_str().to_string());
                    }
                }
            } else {
                cell.formula = None;
            }
            if !flags.styles {
                cell.style_index = dest_cell.map_or(0, |d| d.style_index);
            }
            Some(cell)
        }
        None => {
            if flags.styles {
                // Empty source: the destination is cleared, but a styled
                // row/column on either side needs an explicit style cell so
                // the result does not leak through inheritance.
                if src_inherited != 0 {
                    Some(CellRecord {
                        style_index: src_inherited,
                        ..CellRecord::default()
                    })
                } else if dest_inherited != 0 {
                    Some(CellRecord::default())
                } else {
                    None
                }
            } else {
                let dest_style = dest_cell.map_or(0, |d| d.style_index);
                if dest_style != 0 {
                    Some(CellRecord {
                        style_index: dest_style,
                        ..CellRecord::default()
                    })
                } else {
                    None
                }
            }
        }
    }
}

fn apply(sheet: &mut Worksheet, plan: PastePlan) {
    if plan.flags.content {
        // Clear-then-write; the staged map was computed before any
        // mutation, so overlap between source and destination is safe.
        for row in plan.dest.start_row..=plan.dest.end_row {
            for col in plan.dest.start_col..=plan.dest.end_col {
                sheet.cells.remove(row, col);
            }
        }
        // The recalculation chain is not maintained (no evaluation);
        // entries landing in the destination are invalidated outright.
        let dest = plan.dest;
        sheet.calc_chain.retain(|coord| !dest.contains(*coord));
    }

    for ((row, col), cell) in plan.staged {
        sheet.cells.set(row, col, cell);
    }
}

/// Remap a rectangle through the paste transform. `None` when a transposed
/// corner falls past the sheet limits.
fn remap_range(range: &CellRange, plan: &PastePlan) -> Option<CellRange> {
    if plan.flags.transpose {
        let a = map_coord(range.start(), plan.src.start(), plan.anchor, plan.flags)?;
        let b = map_coord(range.end(), plan.src.start(), plan.anchor, plan.flags)?;
        Some(CellRange::from_corners(a, b))
    } else {
        range.translate(plan.row_delta, plan.col_delta)
    }
}

/// Merge regions fully contained in the source rectangle are re-merged at
/// the destination; a cut removes the originals first. The destination's own
/// merges are left alone either way, so a relocated region that would
/// overlap one is dropped by validation.
fn relocate_merges(sheet: &mut Worksheet, plan: &PastePlan, cut: bool) {
    if !plan.flags.content {
        return;
    }
    let contained: SmallVec<[CellRange; 4]> = sheet
        .merged_regions
        .iter()
        .filter(|m| plan.src.contains_range(m))
        .copied()
        .collect();

    for region in contained {
        if cut {
            sheet.merged_regions.remove(&region);
        }
        if let Some(new_region) = remap_range(&region, plan) {
            let _ = sheet.merge_cells(new_region);
        }
    }
}

/// Cut: hyperlinks fully contained in the source rectangle move with it;
/// partial overlaps are left untouched.
fn relocate_contained_hyperlinks(sheet: &mut Worksheet, plan: &PastePlan) {
    for link in &mut sheet.hyperlinks {
        if plan.src.contains_range(&link.region) {
            if let Some(new_region) = link.region.translate(plan.row_delta, plan.col_delta) {
                link.region = new_region;
            }
        }
    }
}

/// Copy: any hyperlink overlapping the source rectangle contributes a new
/// hyperlink at the remapped intersection; existing links are never removed.
fn copied_hyperlinks<S: CellSource + ?Sized>(source: &S, plan: &PastePlan) -> SmallVec<[Hyperlink; 4]> {
    if !plan.flags.content {
        return SmallVec::new();
    }
    let mut out = SmallVec::new();
    for link in source.hyperlinks() {
        let Some(overlap) = link.region.intersect(&plan.src) else {
            continue;
        };
        if let Some(new_region) = remap_range(&overlap, plan) {
            out.push(Hyperlink {
                region: new_region,
                target: link.target.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn number(n: f64) -> CellRecord {
        CellRecord {
            numeric: n,
            ..CellRecord::default()
        }
    }

    fn formula(text: &str) -> CellRecord {
        CellRecord {
            formula: Some(CellFormula::normal(text)),
            text: Some(String::new()),
            ..CellRecord::default()
        }
    }

    fn formula_text(ws: &Worksheet, row: u32, col: u32) -> &str {
        match &ws.cells.get(row, col).unwrap().formula {
            Some(CellFormula::Normal { text }) => text,
            other => panic!("expected formula, got {other:?}"),
        }
    }

    #[test]
    fn full_paste_rewrites_relative_formulas() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(2, 2, formula("A1+C3"));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(2, 2, 2, 2),
            Coordinate::new(5, 5),
            PasteMode::Paste,
        ));
        assert_eq!(formula_text(&ws, 5, 5), "D4+F6");
        // Copy, not cut: the source stays.
        assert_eq!(formula_text(&ws, 2, 2), "A1+C3");
    }

    #[test]
    fn cut_removes_the_source() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(2, 2, number(7.0));

        assert!(cut_cells(
            &mut ws,
            CellRange::new(2, 2, 2, 2),
            Coordinate::new(4, 4),
        ));
        assert!(!ws.cells.exists(2, 2));
        assert_eq!(ws.cells.get(4, 4).unwrap().numeric, 7.0);
    }

    #[test]
    fn cut_pushing_a_reference_out_of_bounds_yields_an_error_cell() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(2, 2, formula("A1"));

        assert!(cut_cells(
            &mut ws,
            CellRange::new(2, 2, 2, 2),
            Coordinate::new(1, 1),
        ));
        let cell = ws.cells.get(1, 1).unwrap();
        assert_eq!(cell.data_type, CellDataType::Error);
        assert_eq!(cell.text.as_deref(), Some("#REF!"));
        assert_eq!(formula_text(&ws, 1, 1), "#REF!");
    }

    #[test]
    fn overlapping_source_and_destination_stage_cleanly() {
        let mut ws = Worksheet::new("Sheet1");
        for row in 1..=3 {
            ws.cells.set(row, 1, number(row as f64));
        }

        // Shift the column down by one onto itself.
        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 3, 1),
            Coordinate::new(2, 1),
            PasteMode::Paste,
        ));
        assert_eq!(ws.cells.get(1, 1).unwrap().numeric, 1.0);
        assert_eq!(ws.cells.get(2, 1).unwrap().numeric, 1.0);
        assert_eq!(ws.cells.get(3, 1).unwrap().numeric, 2.0);
        assert_eq!(ws.cells.get(4, 1).unwrap().numeric, 3.0);
    }

    #[test]
    fn values_paste_drops_formulas_and_keeps_destination_style() {
        let mut ws = Worksheet::new("Sheet1");
        let mut src = formula("A1");
        src.numeric = 42.0;
        src.text = None;
        ws.cells.set(1, 1, src);
        ws.cells.set(5, 5, CellRecord {
            style_index: 9,
            numeric: 1.0,
            ..CellRecord::default()
        });

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 1, 1),
            Coordinate::new(5, 5),
            PasteMode::Values,
        ));
        let cell = ws.cells.get(5, 5).unwrap();
        assert!(cell.formula.is_none());
        assert_eq!(cell.numeric, 42.0);
        assert_eq!(cell.style_index, 9);
    }

    #[test]
    fn formatting_paste_keeps_destination_content() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(1, 1, CellRecord {
            style_index: 3,
            numeric: 1.0,
            ..CellRecord::default()
        });
        ws.cells.set(5, 5, number(99.0));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 1, 1),
            Coordinate::new(5, 5),
            PasteMode::Formatting,
        ));
        let cell = ws.cells.get(5, 5).unwrap();
        assert_eq!(cell.numeric, 99.0);
        assert_eq!(cell.style_index, 3);
    }

    #[test]
    fn formatting_paste_synthesizes_a_reset_over_inherited_style() {
        let mut ws = Worksheet::new("Sheet1");
        ws.row_styles.insert(5, 7);

        // Default-style empty source onto an empty cell of a styled row:
        // an explicit default-style cell must appear so the inherited row
        // style does not survive.
        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 1, 1),
            Coordinate::new(5, 5),
            PasteMode::Formatting,
        ));
        let cell = ws.cells.get(5, 5).unwrap();
        assert_eq!(cell.style_index, 0);
    }

    #[test]
    fn empty_source_full_paste_clears_the_destination() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(5, 5, number(1.0));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 1, 1),
            Coordinate::new(5, 5),
            PasteMode::Paste,
        ));
        assert!(!ws.cells.exists(5, 5));
    }

    #[test]
    fn empty_source_on_styled_row_pastes_its_inherited_style() {
        let mut ws = Worksheet::new("Sheet1");
        ws.row_styles.insert(1, 4);

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 1, 1),
            Coordinate::new(5, 5),
            PasteMode::Paste,
        ));
        assert_eq!(ws.cells.get(5, 5).unwrap().style_index, 4);
    }

    #[test]
    fn transpose_remaps_cells_and_formulas() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(1, 1, number(1.0));
        ws.cells.set(1, 2, number(2.0));
        ws.cells.set(2, 2, formula("A1"));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 2, 2),
            Coordinate::new(10, 10),
            PasteMode::Transpose,
        ));
        // (1,1)->(10,10), (1,2)->(11,10), (2,2)->(11,11).
        assert_eq!(ws.cells.get(10, 10).unwrap().numeric, 1.0);
        assert_eq!(ws.cells.get(11, 10).unwrap().numeric, 2.0);
        // A1 relative to source start (1,1) transposes to (10,10)'s frame.
        assert_eq!(formula_text(&ws, 11, 11), "J10");
    }

    #[test]
    fn transpose_clips_cells_past_the_column_limit() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(1, 1, number(1.0));
        ws.cells.set(2, 1, number(2.0));

        // Row 2 transposes to column anchor+1, which is past the limit.
        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 2, 1),
            Coordinate::new(1, COL_LIMIT),
            PasteMode::Transpose,
        ));
        assert_eq!(ws.cells.get(1, COL_LIMIT).unwrap().numeric, 1.0);
    }

    #[test]
    fn out_of_bounds_destination_is_rejected_without_mutation() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(1, 1, number(1.0));
        let snapshot = ws.clone();

        assert!(!copy_cells(
            &mut ws,
            CellRange::new(1, 1, 2, 2),
            Coordinate::new(ROW_LIMIT, 1),
            PasteMode::Paste,
        ));
        assert_eq!(ws, snapshot);
    }

    #[test]
    fn cut_moves_fully_contained_merges() {
        let mut ws = Worksheet::new("Sheet1");
        assert!(ws.merge_cells(CellRange::new(1, 1, 2, 2)));

        assert!(cut_cells(
            &mut ws,
            CellRange::new(1, 1, 3, 3),
            Coordinate::new(10, 10),
        ));
        let merges: Vec<_> = ws.merged_regions.iter().copied().collect();
        assert_eq!(merges, vec![CellRange::new(10, 10, 11, 11)]);
    }

    #[test]
    fn copy_re_merges_at_destination_and_keeps_the_original() {
        let mut ws = Worksheet::new("Sheet1");
        assert!(ws.merge_cells(CellRange::new(1, 1, 2, 2)));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 3, 3),
            Coordinate::new(10, 10),
            PasteMode::Paste,
        ));
        let merges: Vec<_> = ws.merged_regions.iter().copied().collect();
        assert_eq!(
            merges,
            vec![CellRange::new(1, 1, 2, 2), CellRange::new(10, 10, 11, 11)]
        );
    }

    #[test]
    fn cut_leaves_partially_overlapping_hyperlinks_alone() {
        let mut ws = Worksheet::new("Sheet1");
        ws.hyperlinks
            .push(Hyperlink::external(CellRange::new(1, 1, 1, 1), "https://a"));
        ws.hyperlinks
            .push(Hyperlink::external(CellRange::new(2, 1, 4, 1), "https://b"));

        assert!(cut_cells(
            &mut ws,
            CellRange::new(1, 1, 2, 2),
            Coordinate::new(10, 10),
        ));
        assert_eq!(ws.hyperlinks[0].region, CellRange::new(10, 10, 10, 10));
        assert_eq!(ws.hyperlinks[1].region, CellRange::new(2, 1, 4, 1));
    }

    #[test]
    fn copy_adds_remapped_hyperlinks_for_the_intersection() {
        let mut ws = Worksheet::new("Sheet1");
        ws.hyperlinks
            .push(Hyperlink::external(CellRange::new(2, 1, 4, 1), "https://b"));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 2, 2),
            Coordinate::new(10, 10),
            PasteMode::Paste,
        ));
        assert_eq!(ws.hyperlinks.len(), 2);
        assert_eq!(ws.hyperlinks[0].region, CellRange::new(2, 1, 4, 1));
        // Intersection row 2 col 1, shifted by (+9, +9).
        assert_eq!(ws.hyperlinks[1].region, CellRange::new(11, 10, 11, 10));
    }

    #[test]
    fn paste_invalidates_calc_chain_entries_in_the_destination() {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(1, 1, number(1.0));
        ws.calc_chain.push(Coordinate::new(5, 5));
        ws.calc_chain.push(Coordinate::new(9, 9));

        assert!(copy_cells(
            &mut ws,
            CellRange::new(1, 1, 2, 2),
            Coordinate::new(5, 5),
            PasteMode::Paste,
        ));
        assert_eq!(ws.calc_chain, vec![Coordinate::new(9, 9)]);
    }

    #[test]
    fn cross_sheet_copy_matches_the_in_memory_path() {
        let mut src = Worksheet::new("Data");
        src.cells.set(2, 2, formula("A1+C3"));
        let mut dest = Worksheet::new("Report");

        assert!(copy_cells_from(
            &src,
            &mut dest,
            CellRange::new(2, 2, 2, 2),
            Coordinate::new(5, 5),
            PasteMode::Paste,
        ));
        assert_eq!(formula_text(&dest, 5, 5), "D4+F6");
    }
}
