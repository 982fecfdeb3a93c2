//! Streaming worksheet-part reader.
//!
//! Builds a [`Worksheet`] from a `xl/worksheets/sheetN.xml` part in one
//! pass: cells (with shared-formula group reconstruction), row/column style
//! overrides, merge regions, the autofilter and hyperlinks. Hyperlink
//! relationship ids are resolved against the part's `.rels` table so the
//! model only ever carries literal URIs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use sheetdoc_model::{
    CellRange, Coordinate, Hyperlink, SharedFormulaGroup, SharedStringTable, Worksheet, COL_LIMIT,
};

use crate::cell_xml::{data_type_from_attr, record_from_raw, RawCell, RawFormula};
use crate::relationships::Relationships;
use crate::XlsxError;

/// Read behavior toggles.
#[derive(Copy, Clone, Debug, Default)]
pub struct ReadOptions {
    /// Fail on malformed content instead of degrading with a warning.
    pub strict: bool,
}

/// Parse one worksheet part.
pub fn parse_worksheet_xml(
    name: &str,
    xml: &str,
    strings: &SharedStringTable,
    rels: &Relationships,
    options: ReadOptions,
) -> Result<Worksheet, XlsxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sheet = Worksheet::new(name);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"col" => {
                parse_col(&e, &mut sheet)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                parse_row_attrs(&e, &mut sheet)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                parse_row_attrs(&e, &mut sheet)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                parse_cell(&mut reader, &e, &mut sheet, strings, options)?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                store_cell(&e, RawCell::default(), &mut sheet, strings, options)?;
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"mergeCell" => {
                if let Some(range) = attr(&e, b"ref")?.and_then(|r| parse_range(&r)) {
                    if sheet.merged_regions.insert(range).is_err() {
                        if options.strict {
                            return Err(XlsxError::malformed(
                                "worksheet",
                                format!("invalid merge region {range}"),
                            ));
                        }
                        log::warn!("dropping invalid merge region {range} on sheet {name}");
                    }
                }
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"autoFilter" => {
                if let Some(range) = attr(&e, b"ref")?.and_then(|r| parse_range(&r)) {
                    sheet.set_filter(range);
                }
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"hyperlink" => {
                parse_hyperlink(&e, &mut sheet, rels, options)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}

/// `A1` or `A1:B3`.
pub(crate) fn parse_range(s: &str) -> Option<CellRange> {
    match s.split_once(':') {
        Some((a, b)) => {
            let a = Coordinate::from_a1(a).ok()?;
            let b = Coordinate::from_a1(b).ok()?;
            Some(CellRange::from_corners(a, b))
        }
        None => {
            let c = Coordinate::from_a1(s).ok()?;
            Some(CellRange::from_corners(c, c))
        }
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, XlsxError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == name {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_col(e: &BytesStart<'_>, sheet: &mut Worksheet) -> Result<(), XlsxError> {
    let style: u32 = match attr(e, b"style")?.and_then(|s| s.parse().ok()) {
        Some(s) if s != 0 => s,
        _ => return Ok(()),
    };
    let min: u32 = attr(e, b"min")?.and_then(|s| s.parse().ok()).unwrap_or(0);
    let max: u32 = attr(e, b"max")?.and_then(|s| s.parse().ok()).unwrap_or(0);
    if min == 0 || max < min {
        return Ok(());
    }
    for col in min..=max.min(COL_LIMIT) {
        sheet.col_styles.insert(col, style);
    }
    Ok(())
}

fn parse_row_attrs(e: &BytesStart<'_>, sheet: &mut Worksheet) -> Result<(), XlsxError> {
    let custom = attr(e, b"customFormat")?.is_some_and(|v| v == "1" || v == "true");
    if !custom {
        return Ok(());
    }
    let row: Option<u32> = attr(e, b"r")?.and_then(|s| s.parse().ok());
    let style: Option<u32> = attr(e, b"s")?.and_then(|s| s.parse().ok());
    if let (Some(row), Some(style)) = (row, style) {
        if style != 0 {
            sheet.row_styles.insert(row, style);
        }
    }
    Ok(())
}

fn parse_cell(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    sheet: &mut Worksheet,
    strings: &SharedStringTable,
    options: ReadOptions,
) -> Result<(), XlsxError> {
    let mut raw = RawCell::default();
    let mut buf = Vec::new();
    let mut text_target: Option<&'static str> = None;
    let mut formula_attrs: Option<(Option<u32>, Option<String>)> = None;
    let mut formula_text = String::new();
    let mut inline_text = String::new();
    let mut value_text = String::new();
    let mut in_inline_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"v" => text_target = Some("v"),
                b"f" => {
                    let shared = attr(&e, b"t")?.as_deref() == Some("shared");
                    let si = attr(&e, b"si")?.and_then(|s| s.parse().ok());
                    let reference = attr(&e, b"ref")?;
                    formula_attrs = Some(if shared {
                        (si, reference)
                    } else {
                        (None, None)
                    });
                    text_target = Some("f");
                }
                b"is" => {}
                b"t" => in_inline_t = true,
                _ => {
                    reader.read_to_end_into(e.name(), &mut Vec::new())?;
                }
            },
            Event::Empty(e) if e.local_name().as_ref() == b"f" => {
                let shared = attr(&e, b"t")?.as_deref() == Some("shared");
                let si = attr(&e, b"si")?.and_then(|s| s.parse().ok());
                formula_attrs = Some(if shared { (si, None) } else { (None, None) });
            }
            Event::Text(t) => {
                let t = t.unescape()?;
                if in_inline_t {
                    inline_text.push_str(&t);
                } else {
                    match text_target {
                        Some("v") => value_text.push_str(&t),
                        Some("f") => formula_text.push_str(&t),
                        _ => {}
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"f" => text_target = None,
                b"t" => in_inline_t = false,
                b"c" => break,
                _ => {}
            },
            Event::Eof => return Err(XlsxError::malformed("worksheet", "unexpected eof in <c>")),
            _ => {}
        }
        buf.clear();
    }

    if !value_text.is_empty() {
        raw.value = Some(value_text);
    }
    if !inline_text.is_empty() || attr(start, b"t")?.as_deref() == Some("inlineStr") {
        raw.inline = Some(inline_text);
    }
    if let Some((shared_index, shared_ref)) = formula_attrs {
        raw.formula = Some(RawFormula {
            text: formula_text,
            shared_index,
            shared_ref,
        });
    } else if !formula_text.is_empty() {
        raw.formula = Some(RawFormula {
            text: formula_text,
            shared_index: None,
            shared_ref: None,
        });
    }

    store_cell(start, raw, sheet, strings, options)
}

fn store_cell(
    start: &BytesStart<'_>,
    mut raw: RawCell,
    sheet: &mut Worksheet,
    strings: &SharedStringTable,
    options: ReadOptions,
) -> Result<(), XlsxError> {
    let Some(r) = attr(start, b"r")? else {
        return if options.strict {
            Err(XlsxError::malformed("worksheet", "cell without r attribute"))
        } else {
            log::warn!("skipping cell without r attribute on sheet {}", sheet.name);
            Ok(())
        };
    };
    let coord = match Coordinate::from_a1(&r) {
        Ok(c) => c,
        Err(err) if options.strict => {
            return Err(XlsxError::malformed(
                "worksheet",
                format!("bad cell reference {r:?}: {err}"),
            ));
        }
        Err(_) => {
            log::warn!("skipping cell with bad reference {r:?}");
            return Ok(());
        }
    };

    raw.style = attr(start, b"s")?.and_then(|s| s.parse().ok()).unwrap_or(0);
    raw.data_type = data_type_from_attr(attr(start, b"t")?.as_deref().unwrap_or(""));

    // The group-defining <f t="shared"> carries the base text and region.
    if let Some(f) = &raw.formula {
        if let (Some(index), Some(reference)) = (f.shared_index, f.shared_ref.as_deref()) {
            if let Some(region) = parse_range(reference) {
                sheet.shared_formulas.insert(SharedFormulaGroup {
                    shared_index: index,
                    base: coord,
                    regions: vec![region],
                    text: f.text.clone(),
                });
            }
        }
    }

    let cell = record_from_raw(raw, coord, strings, options.strict)?;
    if !cell.is_really_empty() {
        sheet.cells.set(coord.row, coord.col, cell);
    }
    Ok(())
}

fn parse_hyperlink(
    e: &BytesStart<'_>,
    sheet: &mut Worksheet,
    rels: &Relationships,
    options: ReadOptions,
) -> Result<(), XlsxError> {
    let Some(region) = attr(e, b"ref")?.and_then(|r| parse_range(&r)) else {
        return Ok(());
    };

    if let Some(id) = attr(e, b"id")? {
        match rels.get(&id) {
            Some(rel) => {
                sheet
                    .hyperlinks
                    .push(Hyperlink::external(region, rel.target.clone()));
                return Ok(());
            }
            None if options.strict => {
                return Err(XlsxError::malformed(
                    "worksheet",
                    format!("unresolved hyperlink relationship {id:?}"),
                ));
            }
            None => {
                log::warn!("dropping hyperlink with unresolved relationship {id:?}");
                return Ok(());
            }
        }
    }
    if let Some(location) = attr(e, b"location")? {
        sheet.hyperlinks.push(Hyperlink::internal(region, location));
    }
    Ok(())
}
