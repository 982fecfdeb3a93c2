//! Whole-package read and write.
//!
//! A package is a zip container: `xl/workbook.xml` names the sheets and
//! points (through its `.rels` part) at the worksheet parts; shared strings,
//! the calculation chain and table parts hang off the same structure. This
//! module assembles a [`Document`] from those parts and serializes one back.

use std::io::{Read, Seek, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use sheetdoc_engine::{flatten_all, CellSource, Document};
use sheetdoc_model::{
    sheet_name_eq_case_insensitive, CellDataType, CellRecord, Coordinate, Hyperlink,
    SharedStringTable, Table, Worksheet,
};

use crate::relationships::Relationships;
use crate::shared_strings::{parse_shared_strings_xml, write_shared_strings_xml};
use crate::sheet_reader::{parse_range, parse_worksheet_xml, ReadOptions};
use crate::sheet_writer::write_worksheet_part;
use crate::XlsxError;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const OFFICE_DOC_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const SHARED_STRINGS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const CALC_CHAIN_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";

// ---- read ----

/// Read a whole package into a [`Document`].
pub fn read_package<R: Read + Seek>(reader: R, options: ReadOptions) -> Result<Document, XlsxError> {
    let mut package = OpenedPackage::open(reader)?;

    let mut sheets = Vec::with_capacity(package.entries.len());
    for index in 0..package.entries.len() {
        sheets.push(package.load_sheet(index, options)?);
    }

    if let Some(xml) = read_optional_part(&mut package.archive, "xl/calcChain.xml")? {
        for (sheet_id, coord) in parse_calc_chain_xml(&xml)? {
            let Some(pos) = package.entries.iter().position(|e| e.sheet_id == sheet_id) else {
                log::warn!("calc chain entry {coord} names unknown sheet id {sheet_id}");
                continue;
            };
            sheets[pos].calc_chain.push(coord);
        }
    }

    Document::from_parts(sheets, package.strings)
        .ok_or_else(|| XlsxError::malformed("workbook.xml", "workbook has no sheets"))
}

/// One worksheet loaded straight from a package, usable as a paste source
/// without materializing the whole document.
///
/// Shared formulas are flattened and shared-string cells are resolved to
/// inline text on load, so the part carries no references into the source
/// package and can feed a paste into any destination worksheet.
pub struct SheetPart {
    sheet: Worksheet,
}

impl SheetPart {
    /// Load one worksheet (by name, case-insensitive) from a package.
    pub fn load<R: Read + Seek>(
        reader: R,
        sheet_name: &str,
        options: ReadOptions,
    ) -> Result<Self, XlsxError> {
        let mut package = OpenedPackage::open(reader)?;
        let index = package
            .entries
            .iter()
            .position(|e| sheet_name_eq_case_insensitive(&e.name, sheet_name))
            .ok_or_else(|| XlsxError::MissingPart(format!("worksheet {sheet_name:?}")))?;

        let mut sheet = package.load_sheet(index, options)?;
        flatten_all(&mut sheet);
        materialize_shared_strings(&mut sheet, &package.strings);
        Ok(Self { sheet })
    }

    pub fn worksheet(&self) -> &Worksheet {
        &self.sheet
    }

    pub fn into_worksheet(self) -> Worksheet {
        self.sheet
    }
}

impl CellSource for SheetPart {
    fn cell(&self, row: u32, col: u32) -> Option<CellRecord> {
        self.sheet.cells.snapshot(row, col)
    }

    fn inherited_style(&self, row: u32, col: u32) -> u32 {
        self.sheet.inherited_style_index(row, col)
    }

    fn hyperlinks(&self) -> Vec<Hyperlink> {
        self.sheet.hyperlinks.clone()
    }
}

/// Rewrite shared-string cells to inline text so the sheet no longer depends
/// on its source package's string table.
fn materialize_shared_strings(sheet: &mut Worksheet, strings: &SharedStringTable) {
    for (row, col) in sheet.cells.occupied() {
        let Some(mut cell) = sheet.cells.snapshot(row, col) else {
            continue;
        };
        if cell.data_type != CellDataType::SharedString {
            continue;
        }
        let index = cell.numeric as u32;
        let text = strings
            .resolve(index)
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string());
        cell.data_type = CellDataType::InlineString;
        cell.text = Some(text);
        cell.numeric = 0.0;
        sheet.cells.set(row, col, cell);
    }
}

struct SheetEntry {
    name: String,
    rel_id: String,
    sheet_id: u32,
}

struct OpenedPackage<R> {
    archive: ZipArchive<R>,
    entries: Vec<SheetEntry>,
    workbook_rels: Relationships,
    strings: SharedStringTable,
}

impl<R: Read + Seek> OpenedPackage<R> {
    fn open(reader: R) -> Result<Self, XlsxError> {
        let mut archive = ZipArchive::new(reader)?;
        let workbook = read_part(&mut archive, "xl/workbook.xml")?;
        let entries = parse_workbook_xml(&workbook)?;
        let workbook_rels =
            Relationships::parse(&read_part(&mut archive, "xl/_rels/workbook.xml.rels")?)?;
        let strings = match read_optional_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings_xml(&xml)?,
            None => SharedStringTable::new(),
        };
        Ok(Self {
            archive,
            entries,
            workbook_rels,
            strings,
        })
    }

    /// Load one worksheet part plus its `.rels`-linked table parts.
    fn load_sheet(&mut self, index: usize, options: ReadOptions) -> Result<Worksheet, XlsxError> {
        let entry = &self.entries[index];
        let rel = self.workbook_rels.get(&entry.rel_id).ok_or_else(|| {
            XlsxError::MissingPart(format!("relationship {:?} for sheet {:?}", entry.rel_id, entry.name))
        })?;
        let part_path = resolve_target("xl", &rel.target);

        let part_rels = match read_optional_part(&mut self.archive, &rels_path(&part_path))? {
            Some(xml) => Relationships::parse(&xml)?,
            None => Relationships::default(),
        };

        let xml = read_part(&mut self.archive, &part_path)?;
        let mut sheet =
            parse_worksheet_xml(&entry.name, &xml, &self.strings, &part_rels, options)?;

        let base_dir = part_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let table_targets: Vec<String> = part_rels
            .of_type("/table")
            .map(|rel| resolve_target(base_dir, &rel.target))
            .collect();
        for target in table_targets {
            let xml = read_part(&mut self.archive, &target)?;
            if let Some(table) = parse_table_xml(&xml, options.strict)? {
                sheet.tables.push(table);
            }
        }
        // Relationship iteration order is not stable.
        sheet.tables.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(sheet)
    }
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, XlsxError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut out = String::new();
            file.read_to_string(&mut out)?;
            Ok(out)
        }
        Err(zip::result::ZipError::FileNotFound) => Err(XlsxError::MissingPart(name.to_string())),
        Err(err) => Err(err.into()),
    }
}

fn read_optional_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, XlsxError> {
    match read_part(archive, name) {
        Ok(xml) => Ok(Some(xml)),
        Err(XlsxError::MissingPart(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// `xl/worksheets/sheet1.xml` -> `xl/worksheets/_rels/sheet1.xml.rels`.
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn parse_workbook_xml(xml: &str) -> Result<Vec<SheetEntry>, XlsxError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut entries = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                let mut sheet_id = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(value),
                        b"id" => rel_id = Some(value),
                        b"sheetId" => sheet_id = value.parse().ok(),
                        _ => {}
                    }
                }
                match (name, rel_id) {
                    (Some(name), Some(rel_id)) => entries.push(SheetEntry {
                        name,
                        rel_id,
                        sheet_id: sheet_id.unwrap_or(entries.len() as u32 + 1),
                    }),
                    _ => {
                        return Err(XlsxError::malformed(
                            "workbook.xml",
                            "sheet element without name or r:id",
                        ));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// `<table name ref>`; the display name wins when both are present.
fn parse_table_xml(xml: &str, strict: bool) -> Result<Option<Table>, XlsxError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"table" => {
                let mut name = None;
                let mut display_name = None;
                let mut reference = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(value),
                        b"displayName" => display_name = Some(value),
                        b"ref" => reference = Some(value),
                        _ => {}
                    }
                }
                let name = display_name.or(name);
                let range = reference.as_deref().and_then(parse_range);
                return match (name, range) {
                    (Some(name), Some(range)) => Ok(Some(Table::new(name, range))),
                    _ if strict => Err(XlsxError::malformed(
                        "table part",
                        "table without a name or a valid ref",
                    )),
                    _ => {
                        log::warn!("dropping table part without a name or a valid ref");
                        Ok(None)
                    }
                };
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// `<c r i>` entries; an omitted `i` inherits the previous entry's sheet id.
fn parse_calc_chain_xml(xml: &str) -> Result<Vec<(u32, Coordinate)>, XlsxError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut sheet_id = 1u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                let mut reference = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"r" => reference = Some(value),
                        b"i" => {
                            if let Ok(id) = value.parse() {
                                sheet_id = id;
                            }
                        }
                        _ => {}
                    }
                }
                match reference.as_deref().map(Coordinate::from_a1) {
                    Some(Ok(coord)) => out.push((sheet_id, coord)),
                    _ => log::warn!("skipping calc chain entry with bad reference"),
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

// ---- write ----

/// Serialize a [`Document`] as a package.
pub fn write_package<W: Write + Seek>(doc: &Document, writer: W) -> Result<(), XlsxError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let sheets = doc.sheets();
    let has_strings = !doc.shared_strings().is_empty();
    let has_calc_chain = sheets.iter().any(|s| !s.calc_chain.is_empty());
    let table_count: usize = sheets.iter().map(|s| s.tables.len()).sum();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        content_types_xml(sheets.len(), table_count, has_strings, has_calc_chain).as_bytes(),
    )?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        rels_xml(&[("rId1".to_string(), OFFICE_DOC_REL, "xl/workbook.xml".to_string(), false)])
            .as_bytes(),
    )?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(sheets).as_bytes())?;

    let mut workbook_rels: Vec<(String, &str, String, bool)> = sheets
        .iter()
        .enumerate()
        .map(|(i, _)| {
            (
                format!("rId{}", i + 1),
                WORKSHEET_REL,
                format!("worksheets/sheet{}.xml", i + 1),
                false,
            )
        })
        .collect();
    if has_strings {
        workbook_rels.push((
            format!("rId{}", workbook_rels.len() + 1),
            SHARED_STRINGS_REL,
            "sharedStrings.xml".to_string(),
            false,
        ));
    }
    if has_calc_chain {
        workbook_rels.push((
            format!("rId{}", workbook_rels.len() + 1),
            CALC_CHAIN_REL,
            "calcChain.xml".to_string(),
            false,
        ));
    }
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(rels_xml(&workbook_rels).as_bytes())?;

    let mut next_table_number = 1;
    for (i, sheet) in sheets.iter().enumerate() {
        let part = write_worksheet_part(sheet, next_table_number);
        next_table_number += part.tables.len();

        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(part.sheet_xml.as_bytes())?;
        if let Some(rels) = part.rels_xml {
            zip.start_file(format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1), options)?;
            zip.write_all(rels.as_bytes())?;
        }
        for (number, xml) in part.tables {
            zip.start_file(format!("xl/tables/table{number}.xml"), options)?;
            zip.write_all(xml.as_bytes())?;
        }
    }

    if has_strings {
        let count = shared_string_reference_count(sheets);
        zip.start_file("xl/sharedStrings.xml", options)?;
        zip.write_all(write_shared_strings_xml(doc.shared_strings(), count).as_bytes())?;
    }

    if has_calc_chain {
        zip.start_file("xl/calcChain.xml", options)?;
        zip.write_all(calc_chain_xml(sheets).as_bytes())?;
    }

    zip.finish()?;
    Ok(())
}

/// Number of shared-string cell references across the workbook (the `count`
/// header of `sharedStrings.xml`).
fn shared_string_reference_count(sheets: &[Worksheet]) -> usize {
    sheets
        .iter()
        .map(|sheet| {
            sheet
                .cells
                .occupied()
                .into_iter()
                .filter(|&(row, col)| {
                    sheet
                        .cells
                        .get(row, col)
                        .is_some_and(|c| c.data_type == CellDataType::SharedString)
                })
                .count()
        })
        .sum()
}

fn content_types_xml(
    sheet_count: usize,
    table_count: usize,
    has_strings: bool,
    has_calc_chain: bool,
) -> String {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();
    let mut root = BytesStart::new("Types");
    root.push_attribute((
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/content-types",
    ));
    writer.write_event(Event::Start(root)).ok();

    for (extension, content_type) in [
        ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
        ("xml", "application/xml"),
    ] {
        let mut e = BytesStart::new("Default");
        e.push_attribute(("Extension", extension));
        e.push_attribute(("ContentType", content_type));
        writer.write_event(Event::Empty(e)).ok();
    }

    let mut overrides: Vec<(String, &str)> = vec![(
        "/xl/workbook.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    )];
    for i in 1..=sheet_count {
        overrides.push((
            format!("/xl/worksheets/sheet{i}.xml"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        ));
    }
    for i in 1..=table_count {
        overrides.push((
            format!("/xl/tables/table{i}.xml"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml",
        ));
    }
    if has_strings {
        overrides.push((
            "/xl/sharedStrings.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
        ));
    }
    if has_calc_chain {
        overrides.push((
            "/xl/calcChain.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml",
        ));
    }
    for (part_name, content_type) in overrides {
        let mut e = BytesStart::new("Override");
        e.push_attribute(("PartName", part_name.as_str()));
        e.push_attribute(("ContentType", content_type));
        writer.write_event(Event::Empty(e)).ok();
    }

    writer.write_event(Event::End(BytesEnd::new("Types"))).ok();
    String::from_utf8(writer.into_inner()).unwrap_or_default()
}

fn rels_xml(rels: &[(String, &str, String, bool)]) -> String {
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
    String::from_utf8(writer.into_inner()).unwrap_or_default()
}

fn workbook_xml(sheets: &[Worksheet]) -> String {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();
    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", MAIN_NS));
    root.push_attribute(("xmlns:r", REL_NS));
    writer.write_event(Event::Start(root)).ok();
    writer.write_event(Event::Start(BytesStart::new("sheets"))).ok();
    for (i, sheet) in sheets.iter().enumerate() {
        let mut e = BytesStart::new("sheet");
        e.push_attribute(("name", sheet.name.as_str()));
        e.push_attribute(("sheetId", (i + 1).to_string().as_str()));
        e.push_attribute(("r:id", format!("rId{}", i + 1).as_str()));
        writer.write_event(Event::Empty(e)).ok();
    }
    writer.write_event(Event::End(BytesEnd::new("sheets"))).ok();
    writer.write_event(Event::End(BytesEnd::new("workbook"))).ok();
    String::from_utf8(writer.into_inner()).unwrap_or_default()
}

fn calc_chain_xml(sheets: &[Worksheet]) -> String {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();
    let mut root = BytesStart::new("calcChain");
    root.push_attribute(("xmlns", MAIN_NS));
    writer.write_event(Event::Start(root)).ok();
    for (i, sheet) in sheets.iter().enumerate() {
        for coord in &sheet.calc_chain {
            let mut e = BytesStart::new("c");
            e.push_attribute(("r", coord.to_a1().as_str()));
            e.push_attribute(("i", (i + 1).to_string().as_str()));
            writer.write_event(Event::Empty(e)).ok();
        }
    }
    writer.write_event(Event::End(BytesEnd::new("calcChain"))).ok();
    String::from_utf8(writer.into_inner()).unwrap_or_default()
}
