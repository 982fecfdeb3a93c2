//! End-to-end editing scenarios through the document facade.

use pretty_assertions::assert_eq;
use sheetdoc_engine::{CellValue, Document, PasteMode, SortKey};
use sheetdoc_model::{
    CellDataType, CellFormula, CellRange, CellRecord, Coordinate, SharedFormulaGroup,
};

fn doc_with(formula: &str, row: u32, col: u32) -> Document {
    let mut doc = Document::new();
    assert!(doc.set_cell_value(row, col, CellValue::Formula(formula.to_string())));
    doc
}

#[test]
fn copy_shifts_a_formula_by_the_anchor_delta() {
    // B2 holds A1+C3; copying B2 to E5 shifts by (+3, +3).
    let mut doc = doc_with("A1+C3", 2, 2);
    assert!(doc.copy_cell(2, 2, Coordinate::new(5, 5), PasteMode::Paste));
    assert_eq!(doc.get_cell_formula(5, 5).as_deref(), Some("D4+F6"));
}

#[test]
fn transpose_copy_remaps_references_through_the_anchor() {
    // Source start B2, anchor D4: B2 maps to D4 and A1 maps to C3.
    let mut doc = doc_with("A1+B2", 2, 2);
    assert!(doc.copy_cells(
        CellRange::new(2, 2, 2, 2),
        Coordinate::new(4, 4),
        PasteMode::Transpose,
    ));
    assert_eq!(doc.get_cell_formula(4, 4).as_deref(), Some("C3+D4"));
}

#[test]
fn transpose_back_restores_the_original_references() {
    let mut doc = doc_with("A1+B2", 2, 2);
    assert!(doc.copy_cells(
        CellRange::new(2, 2, 2, 2),
        Coordinate::new(4, 4),
        PasteMode::Transpose,
    ));
    assert!(doc.copy_cells(
        CellRange::new(4, 4, 4, 4),
        Coordinate::new(2, 2),
        PasteMode::Transpose,
    ));
    assert_eq!(doc.get_cell_formula(2, 2).as_deref(), Some("A1+B2"));
}

#[test]
fn absolute_references_survive_any_copy() {
    let mut doc = doc_with("$A$1", 2, 2);
    assert!(doc.copy_cell(2, 2, Coordinate::new(500, 300), PasteMode::Paste));
    assert_eq!(doc.get_cell_formula(500, 300).as_deref(), Some("$A$1"));

    let mut doc = doc_with("$A$1", 2, 2);
    assert!(doc.copy_cells(
        CellRange::new(2, 2, 2, 2),
        Coordinate::new(7, 9),
        PasteMode::Transpose,
    ));
    assert_eq!(doc.get_cell_formula(7, 9).as_deref(), Some("$A$1"));
}

#[test]
fn row_range_is_untouched_by_a_column_only_copy() {
    let mut doc = doc_with("SUM(3:5)", 2, 2);
    // Same row, different column: row delta is zero.
    assert!(doc.copy_cell(2, 2, Coordinate::new(2, 8), PasteMode::Paste));
    assert_eq!(doc.get_cell_formula(2, 8).as_deref(), Some("SUM(3:5)"));
}

#[test]
fn cut_out_of_bounds_produces_an_error_cell() {
    let mut doc = doc_with("A1", 2, 2);
    assert!(doc.cut_cells(CellRange::new(2, 2, 2, 2), Coordinate::new(1, 1)));

    assert!(doc.has_cell_error(1, 1));
    assert_eq!(doc.get_cell_value_as_string(1, 1), "#REF!");
    assert_eq!(doc.get_cell_formula(1, 1).as_deref(), Some("#REF!"));
    assert!(!doc.has_cell_value(2, 2));
}

#[test]
fn merge_overlap_is_rejected_without_mutation() {
    let mut doc = Document::new();
    assert!(doc.merge_cells(CellRange::new(1, 1, 2, 2)));
    assert!(!doc.merge_cells(CellRange::new(2, 2, 3, 3)));

    let merges: Vec<_> = doc.sheet().merged_regions.iter().copied().collect();
    assert_eq!(merges, vec![CellRange::new(1, 1, 2, 2)]);
}

#[test]
fn copy_flattens_shared_formulas_first() {
    let mut doc = Document::new();
    let sheet = doc.sheet_mut();
    sheet.shared_formulas.insert(SharedFormulaGroup {
        shared_index: 0,
        base: Coordinate::new(1, 2),
        regions: vec![CellRange::new(1, 2, 3, 2)],
        text: "A1*2".to_string(),
    });
    for row in 1..=3 {
        sheet.cells.set(
            row,
            2,
            CellRecord {
                formula: Some(CellFormula::Shared { index: 0 }),
                ..CellRecord::default()
            },
        );
    }

    // Any copy triggers the flatten; the member at B3 must hold its own
    // independent text before it is shifted.
    assert!(doc.copy_cell(3, 2, Coordinate::new(5, 5), PasteMode::Paste));
    assert!(doc.get_shared_formulas().is_empty());
    assert_eq!(doc.get_cell_formula(3, 2).as_deref(), Some("A3*2"));
    assert_eq!(doc.get_cell_formula(5, 5).as_deref(), Some("D5*2"));
}

#[test]
fn values_paste_strips_formulas() {
    let mut doc = Document::new();
    doc.set_cell_value(1, 1, CellValue::Formula("A2+1".to_string()));
    assert!(doc.copy_cell(1, 1, Coordinate::new(3, 3), PasteMode::Paste));
    assert!(doc.copy_cell(1, 1, Coordinate::new(5, 5), PasteMode::Values));

    assert!(doc.get_cell_formula(3, 3).is_some());
    assert!(doc.get_cell_formula(5, 5).is_none());
}

#[test]
fn sheet_qualified_references_follow_case_insensitive_matching() {
    let mut doc = Document::new();
    assert!(doc.add_sheet("Data"));
    assert!(doc.select_sheet("Sheet1"));
    doc.set_cell_value(2, 2, CellValue::Formula("Data!A1+sheet1!A1".to_string()));

    assert!(doc.copy_cell(2, 2, Coordinate::new(3, 3), PasteMode::Paste));
    assert_eq!(
        doc.get_cell_formula(3, 3).as_deref(),
        Some("Data!B2+sheet1!B2")
    );
}

#[test]
fn string_literals_pass_through_every_operation() {
    let mut doc = doc_with("IF(A1>0,\"A1 is positive\",B1)", 1, 2);
    assert!(doc.copy_cell(1, 2, Coordinate::new(2, 3), PasteMode::Paste));
    assert_eq!(
        doc.get_cell_formula(2, 3).as_deref(),
        Some("IF(B2>0,\"A1 is positive\",C2)")
    );
}

#[test]
fn sort_orders_mixed_types_into_buckets() {
    let mut doc = Document::new();
    doc.set_cell_value(1, 1, CellValue::Text("pear".to_string()));
    doc.set_cell_value(2, 1, CellValue::Number(3.0));
    doc.set_cell_value(3, 1, CellValue::Boolean(true));
    doc.set_cell_value(4, 1, CellValue::Text("apple".to_string()));

    assert!(doc.sort(CellRange::new(1, 1, 4, 1), SortKey::Column(1), true));

    assert_eq!(doc.get_cell_value_as_f64(1, 1), 3.0);
    assert_eq!(doc.get_cell_value_as_string(2, 1), "apple");
    assert_eq!(doc.get_cell_value_as_string(3, 1), "pear");
    assert_eq!(doc.sheet().cells.get(4, 1).unwrap().data_type, CellDataType::Boolean);
}

#[test]
fn structural_edits_chain_with_copies() {
    let mut doc = Document::new();
    doc.set_cell_value(1, 1, CellValue::Number(1.0));
    doc.set_cell_value(2, 1, CellValue::Formula("A1*10".to_string()));

    assert!(doc.insert_rows(2, 1));
    assert_eq!(doc.get_cell_formula(3, 1).as_deref(), Some("A1*10"));

    assert!(doc.copy_cell(3, 1, Coordinate::new(4, 1), PasteMode::Paste));
    assert_eq!(doc.get_cell_formula(4, 1).as_deref(), Some("A2*10"));
}
