//! Worksheet-part writer.

use std::collections::HashMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use sheetdoc_model::{Coordinate, HyperlinkTarget, Table, Worksheet};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const HYPERLINK_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const TABLE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";

/// One serialized worksheet: the sheet XML, its `.rels` part (present when
/// the sheet has external hyperlinks or tables), and the table parts, in
/// package numbering order starting at `first_table_number`.
pub struct WorksheetPartXml {
    pub sheet_xml: String,
    pub rels_xml: Option<String>,
    /// `(table_number, xml)` pairs for `xl/tables/table{N}.xml`.
    pub tables: Vec<(usize, String)>,
}

/// Serialize one worksheet part. Table parts are numbered from
/// `first_table_number` (table numbering is package-wide).
pub fn write_worksheet_part(sheet: &Worksheet, first_table_number: usize) -> WorksheetPartXml {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();

    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", MAIN_NS));
    root.push_attribute(("xmlns:r", REL_NS));
    writer.write_event(Event::Start(root)).ok();

    write_cols(&mut writer, sheet);
    write_sheet_data(&mut writer, sheet);

    if let Some(filter) = &sheet.autofilter {
        let mut e = BytesStart::new("autoFilter");
        e.push_attribute(("ref", filter.range.to_string().as_str()));
        writer.write_event(Event::Empty(e)).ok();
    }

    if !sheet.merged_regions.is_empty() {
        let mut e = BytesStart::new("mergeCells");
        e.push_attribute(("count", sheet.merged_regions.len().to_string().as_str()));
        writer.write_event(Event::Start(e)).ok();
        for region in sheet.merged_regions.iter() {
            let mut m = BytesStart::new("mergeCell");
            m.push_attribute(("ref", region.to_string().as_str()));
            writer.write_event(Event::Empty(m)).ok();
        }
        writer.write_event(Event::End(BytesEnd::new("mergeCells"))).ok();
    }

    let mut rels: Vec<(String, &str, String, bool)> = Vec::new();

    if !sheet.hyperlinks.is_empty() {
        writer
            .write_event(Event::Start(BytesStart::new("hyperlinks")))
            .ok();
        for link in &sheet.hyperlinks {
            let mut e = BytesStart::new("hyperlink");
            e.push_attribute(("ref", link.region.to_string().as_str()));
            match &link.target {
                HyperlinkTarget::External(uri) => {
                    let id = format!("rId{}", rels.len() + 1);
                    e.push_attribute(("r:id", id.as_str()));
                    rels.push((id, HYPERLINK_REL, uri.clone(), true));
                }
                HyperlinkTarget::Internal(location) => {
                    e.push_attribute(("location", location.as_str()));
                }
            }
            writer.write_event(Event::Empty(e)).ok();
        }
        writer
            .write_event(Event::End(BytesEnd::new("hyperlinks")))
            .ok();
    }

    let mut tables = Vec::new();
    if !sheet.tables.is_empty() {
        let mut e = BytesStart::new("tableParts");
        e.push_attribute(("count", sheet.tables.len().to_string().as_str()));
        writer.write_event(Event::Start(e)).ok();
        for (offset, table) in sheet.tables.iter().enumerate() {
            let number = first_table_number + offset;
            let id = format!("rId{}", rels.len() + 1);
            let mut part = BytesStart::new("tablePart");
            part.push_attribute(("r:id", id.as_str()));
            writer.write_event(Event::Empty(part)).ok();
            rels.push((id, TABLE_REL, format!("../tables/table{number}.xml"), false));
            tables.push((number, write_table_xml(table, number)));
        }
        writer.write_event(Event::End(BytesEnd::new("tableParts"))).ok();
    }

    writer.write_event(Event::End(BytesEnd::new("worksheet"))).ok();

    WorksheetPartXml {
        sheet_xml: String::from_utf8(writer.into_inner()).unwrap_or_default(),
        rels_xml: write_rels(&rels),
        tables,
    }
}

/// Serialize one worksheet part without table numbering (convenience for
/// sheets known to have no tables).
pub fn write_worksheet_xml(sheet: &Worksheet) -> (String, Option<String>) {
    let part = write_worksheet_part(sheet, 1);
    (part.sheet_xml, part.rels_xml)
}

fn write_rels(rels: &[(String, &str, String, bool)]) -> Option<String> {
    if rels.is_empty() {
        return None;
    }
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", PKG_RELS_NS));
    writer.write_event(Event::Start(root)).ok();
    for (id, rel_type, target, external) in rels {
        let mut e = BytesStart::new("Relationship");
        e.push_attribute(("Id", id.as_str()));
        e.push_attribute(("Type", *rel_type));
        e.push_attribute(("Target", target.as_str()));
        if *external {
            e.push_attribute(("TargetMode", "External"));
        }
        writer.write_event(Event::Empty(e)).ok();
    }
    writer
        .write_event(Event::End(BytesEnd::new("Relationships")))
        .ok();
    Some(String::from_utf8(writer.into_inner()).unwrap_or_default())
}

/// Minimal table part: name and region. Column definitions are not modeled;
/// generic column headers are regenerated to keep the part schema-valid.
fn write_table_xml(table: &Table, number: usize) -> String {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();
    let mut root = BytesStart::new("table");
    root.push_attribute(("xmlns", MAIN_NS));
    root.push_attribute(("id", number.to_string().as_str()));
    root.push_attribute(("name", table.name.as_str()));
    root.push_attribute(("displayName", table.name.as_str()));
    root.push_attribute(("ref", table.range.to_string().as_str()));
    writer.write_event(Event::Start(root)).ok();

    let width = table.range.width();
    let mut cols = BytesStart::new("tableColumns");
    cols.push_attribute(("count", width.to_string().as_str()));
    writer.write_event(Event::Start(cols)).ok();
    for i in 1..=width {
        let mut col = BytesStart::new("tableColumn");
        col.push_attribute(("id", i.to_string().as_str()));
        col.push_attribute(("name", format!("Column{i}").as_str()));
        writer.write_event(Event::Empty(col)).ok();
    }
    writer
        .write_event(Event::End(BytesEnd::new("tableColumns")))
        .ok();
    writer.write_event(Event::End(BytesEnd::new("table"))).ok();
    String::from_utf8(writer.into_inner()).unwrap_or_default()
}

/// Column style overrides, grouped into contiguous same-style runs.
fn write_cols(writer: &mut Writer<Vec<u8>>, sheet: &Worksheet) {
    if sheet.col_styles.is_empty() {
        return;
    }
    let mut cols: Vec<(u32, u32)> = sheet
        .col_styles
        .iter()
        .map(|(&col, &style)| (col, style))
        .collect();
    cols.sort_unstable();

    writer.write_event(Event::Start(BytesStart::new("cols"))).ok();
    let mut run_start = 0;
    while run_start < cols.len() {
        let (first_col, style) = cols[run_start];
        let mut run_end = run_start;
        while run_end + 1 < cols.len()
            && cols[run_end + 1].0 == cols[run_end].0 + 1
            && cols[run_end + 1].1 == style
        {
            run_end += 1;
        }
        let mut e = BytesStart::new("col");
        e.push_attribute(("min", first_col.to_string().as_str()));
        e.push_attribute(("max", cols[run_end].0.to_string().as_str()));
        e.push_attribute(("style", style.to_string().as_str()));
        writer.write_event(Event::Empty(e)).ok();
        run_start = run_end + 1;
    }
    writer.write_event(Event::End(BytesEnd::new("cols"))).ok();
}

fn write_sheet_data(writer: &mut Writer<Vec<u8>>, sheet: &Worksheet) {
    writer
        .write_event(Event::Start(BytesStart::new("sheetData")))
        .ok();

    // Rows with cells plus style-only rows, in row order.
    let mut by_row: HashMap<u32, Vec<u32>> = HashMap::new();
    for (row, col) in sheet.cells.occupied() {
        by_row.entry(row).or_default().push(col);
    }
    let mut rows: Vec<u32> = by_row.keys().copied().collect();
    for &row in sheet.row_styles.keys() {
        if !by_row.contains_key(&row) {
            rows.push(row);
        }
    }
    rows.sort_unstable();

    let bases: HashMap<Coordinate, u32> = sheet
        .shared_formulas
        .iter()
        .map(|g| (g.base, g.shared_index))
        .collect();

    for row in rows {
        let mut e = BytesStart::new("row");
        e.push_attribute(("r", row.to_string().as_str()));
        if let Some(style) = sheet.row_styles.get(&row) {
            e.push_attribute(("s", style.to_string().as_str()));
            e.push_attribute(("customFormat", "1"));
        }

        let Some(mut cols) = by_row.remove(&row) else {
            writer.write_event(Event::Empty(e)).ok();
            continue;
        };
        cols.sort_unstable();

        writer.write_event(Event::Start(e)).ok();
        for col in cols {
            let Some(cell) = sheet.cells.get(row, col) else {
                continue;
            };
            let coord = Coordinate::new(row, col);
            let group = bases
                .get(&coord)
                .and_then(|index| sheet.shared_formulas.get(*index));
            crate::cell_xml::write_cell(writer, coord, cell, group);
        }
        writer.write_event(Event::End(BytesEnd::new("row"))).ok();
    }

    writer
        .write_event(Event::End(BytesEnd::new("sheetData")))
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::Relationships;
    use crate::sheet_reader::{parse_worksheet_xml, ReadOptions};
    use pretty_assertions::assert_eq;
    use sheetdoc_model::{
        CellFormula, CellRange, CellRecord, Hyperlink, SharedFormulaGroup, SharedStringTable,
    };

    fn sample_sheet() -> Worksheet {
        let mut ws = Worksheet::new("Sheet1");
        ws.cells.set(
            1,
            1,
            CellRecord {
                numeric: 1.5,
                ..CellRecord::default()
            },
        );
        ws.cells.set(
            2,
            2,
            CellRecord {
                formula: Some(CellFormula::Shared { index: 0 }),
                ..CellRecord::default()
            },
        );
        ws.cells.set(
            3,
            2,
            CellRecord {
                formula: Some(CellFormula::Shared { index: 0 }),
                ..CellRecord::default()
            },
        );
        ws.shared_formulas.insert(SharedFormulaGroup {
            shared_index: 0,
            base: Coordinate::new(2, 2),
            regions: vec![CellRange::new(2, 2, 3, 2)],
            text: "A2*2".to_string(),
        });
        ws.merged_regions.insert(CellRange::new(1, 5, 2, 6)).unwrap();
        ws.row_styles.insert(1, 5);
        ws.col_styles.insert(3, 7);
        ws.col_styles.insert(4, 7);
        ws.hyperlinks
            .push(Hyperlink::external(CellRange::new(1, 1, 1, 1), "https://example.com/"));
        ws.hyperlinks
            .push(Hyperlink::internal(CellRange::new(1, 2, 1, 2), "Sheet2!A1"));
        ws
    }

    #[test]
    fn writer_output_parses_back_to_the_same_sheet() {
        let ws = sample_sheet();
        let (xml, rels_xml) = write_worksheet_xml(&ws);
        let rels = Relationships::parse(&rels_xml.expect("external link needs rels")).unwrap();

        let parsed = parse_worksheet_xml(
            "Sheet1",
            &xml,
            &SharedStringTable::new(),
            &rels,
            ReadOptions { strict: true },
        )
        .unwrap();

        assert_eq!(parsed.cells, ws.cells);
        assert_eq!(parsed.shared_formulas, ws.shared_formulas);
        assert_eq!(parsed.merged_regions, ws.merged_regions);
        assert_eq!(parsed.hyperlinks, ws.hyperlinks);
        assert_eq!(parsed.row_styles, ws.row_styles);
        assert_eq!(parsed.col_styles, ws.col_styles);
    }

    #[test]
    fn contiguous_column_styles_collapse_into_one_col_element() {
        let ws = sample_sheet();
        let (xml, _) = write_worksheet_xml(&ws);
        assert!(xml.contains(r#"<col min="3" max="4" style="7"/>"#));
    }

    #[test]
    fn tables_emit_parts_and_relationships() {
        let mut ws = Worksheet::new("Sheet1");
        ws.tables
            .push(Table::new("Sales", CellRange::new(1, 1, 5, 3)));

        let part = write_worksheet_part(&ws, 4);
        assert!(part.sheet_xml.contains(r#"<tablePart r:id="rId1"/>"#));
        let rels = part.rels_xml.expect("table needs a rels part");
        assert!(rels.contains("../tables/table4.xml"));
        assert_eq!(part.tables.len(), 1);
        assert_eq!(part.tables[0].0, 4);
        assert!(part.tables[0].1.contains(r#"name="Sales""#));
        assert!(part.tables[0].1.contains(r#"ref="A1:C5""#));
    }
}
