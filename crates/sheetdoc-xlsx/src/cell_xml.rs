//! Lossless conversion between `<c>` elements and cell records.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use sheetdoc_model::{
    CellDataType, CellFormula, CellRecord, Coordinate, SharedFormulaGroup, SharedStringTable,
};

use crate::XlsxError;

/// A `<c>` element as parsed, before shared-string resolution.
#[derive(Clone, Debug, Default)]
pub(crate) struct RawCell {
    pub style: u32,
    pub data_type: CellDataType,
    /// `<v>` content.
    pub value: Option<String>,
    /// `<is>` flattened text.
    pub inline: Option<String>,
    pub formula: Option<RawFormula>,
}

#[derive(Clone, Debug)]
pub(crate) struct RawFormula {
    pub text: String,
    /// `si` of a `<f t="shared">`.
    pub shared_index: Option<u32>,
    /// `ref` of the group-defining `<f t="shared">`.
    pub shared_ref: Option<String>,
}

pub(crate) fn data_type_from_attr(t: &str) -> CellDataType {
    match t {
        "b" => CellDataType::Boolean,
        "s" => CellDataType::SharedString,
        "inlineStr" => CellDataType::InlineString,
        "str" => CellDataType::String,
        "e" => CellDataType::Error,
        _ => CellDataType::Number,
    }
}

fn data_type_attr(data_type: CellDataType) -> Option<&'static str> {
    match data_type {
        CellDataType::Number => None,
        CellDataType::Boolean => Some("b"),
        CellDataType::SharedString => Some("s"),
        CellDataType::InlineString => Some("inlineStr"),
        CellDataType::String => Some("str"),
        CellDataType::Error => Some("e"),
    }
}

/// Convert a parsed `<c>` to a cell record.
///
/// In strict mode a malformed value is an error; otherwise it degrades to
/// the raw text as a literal value, with a warning.
pub(crate) fn record_from_raw(
    raw: RawCell,
    coord: Coordinate,
    strings: &SharedStringTable,
    strict: bool,
) -> Result<CellRecord, XlsxError> {
    let mut cell = CellRecord {
        data_type: raw.data_type,
        style_index: raw.style,
        ..CellRecord::default()
    };

    match raw.data_type {
        CellDataType::Number => {
            if let Some(v) = raw.value {
                match v.parse::<f64>() {
                    Ok(n) => cell.numeric = n,
                    Err(_) if strict => {
                        return Err(XlsxError::malformed(
                            "worksheet",
                            format!("non-numeric <v> at {coord}: {v:?}"),
                        ));
                    }
                    Err(_) => {
                        log::warn!("non-numeric <v> at {coord}; keeping raw text {v:?}");
                        cell.text = Some(v);
                    }
                }
            }
        }
        CellDataType::Boolean => {
            let v = raw.value.unwrap_or_default();
            cell.numeric = if v == "1" || v.eq_ignore_ascii_case("true") {
                1.0
            } else {
                0.0
            };
        }
        CellDataType::SharedString => {
            let v = raw.value.unwrap_or_default();
            match v.parse::<u32>() {
                Ok(idx) if (idx as usize) < strings.unique_count() => cell.numeric = f64::from(idx),
                _ if strict => {
                    return Err(XlsxError::malformed(
                        "worksheet",
                        format!("bad shared-string index at {coord}: {v:?}"),
                    ));
                }
                _ => {
                    log::warn!("bad shared-string index at {coord}; keeping raw text {v:?}");
                    cell.data_type = CellDataType::InlineString;
                    cell.text = Some(v);
                }
            }
        }
        CellDataType::InlineString => cell.text = raw.inline,
        CellDataType::String | CellDataType::Error => cell.text = raw.value,
    }

    cell.formula = raw.formula.map(|f| match f.shared_index {
        Some(index) => CellFormula::Shared { index },
        None => CellFormula::normal(f.text),
    });

    Ok(cell)
}

/// Write one `<c>` element. `group` is the shared-formula group when this
/// cell is its base (the group-defining `<f>` carries `ref` and the text).
pub(crate) fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    coord: Coordinate,
    cell: &CellRecord,
    group: Option<&SharedFormulaGroup>,
) {
    let mut c = BytesStart::new("c");
    c.push_attribute(("r", coord.to_a1().as_str()));
    if cell.style_index != 0 {
        c.push_attribute(("s", cell.style_index.to_string().as_str()));
    }
    if let Some(t) = data_type_attr(cell.data_type) {
        c.push_attribute(("t", t));
    }

    let value = cell_value_text(cell);
    let has_children =
        cell.formula.is_some() || value.is_some() || cell.data_type == CellDataType::InlineString;
    if !has_children {
        writer.write_event(Event::Empty(c)).ok();
        return;
    }
    writer.write_event(Event::Start(c)).ok();

    match &cell.formula {
        Some(CellFormula::Normal { text }) => {
            writer.write_event(Event::Start(BytesStart::new("f"))).ok();
            writer.write_event(Event::Text(BytesText::new(text))).ok();
            writer.write_event(Event::End(BytesEnd::new("f"))).ok();
        }
        Some(CellFormula::Shared { index }) => {
            let mut f = BytesStart::new("f");
            f.push_attribute(("t", "shared"));
            f.push_attribute(("si", index.to_string().as_str()));
            match group {
                Some(group) => {
                    if let Some(region) = group.regions.first() {
                        f.push_attribute(("ref", region.to_string().as_str()));
                    }
                    writer.write_event(Event::Start(f)).ok();
                    writer
                        .write_event(Event::Text(BytesText::new(&group.text)))
                        .ok();
                    writer.write_event(Event::End(BytesEnd::new("f"))).ok();
                }
                None => {
                    writer.write_event(Event::Empty(f)).ok();
                }
            }
        }
        None => {}
    }

    if cell.data_type == CellDataType::InlineString {
        writer.write_event(Event::Start(BytesStart::new("is"))).ok();
        writer.write_event(Event::Start(BytesStart::new("t"))).ok();
        writer
            .write_event(Event::Text(BytesText::new(
                cell.text.as_deref().unwrap_or(""),
            )))
            .ok();
        writer.write_event(Event::End(BytesEnd::new("t"))).ok();
        writer.write_event(Event::End(BytesEnd::new("is"))).ok();
    } else if let Some(value) = value {
        writer.write_event(Event::Start(BytesStart::new("v"))).ok();
        writer.write_event(Event::Text(BytesText::new(&value))).ok();
        writer.write_event(Event::End(BytesEnd::new("v"))).ok();
    }

    writer.write_event(Event::End(BytesEnd::new("c"))).ok();
}

/// The `<v>` content for a record, honoring the text/numeric duality.
fn cell_value_text(cell: &CellRecord) -> Option<String> {
    match cell.data_type {
        CellDataType::InlineString => None,
        CellDataType::SharedString => Some((cell.numeric as u32).to_string()),
        CellDataType::Boolean => Some(if cell.numeric > 0.5 { "1" } else { "0" }.to_string()),
        CellDataType::String | CellDataType::Error => cell.text.clone(),
        CellDataType::Number => match cell.text.as_deref() {
            Some("") => None,
            Some(t) => Some(t.to_string()),
            // A zero with no text round-trips through an empty cell.
            None if cell.numeric == 0.0 => None,
            None => Some(cell.numeric.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table_with(items: &[&str]) -> SharedStringTable {
        let mut table = SharedStringTable::new();
        for item in items {
            table.intern(item);
        }
        table
    }

    #[test]
    fn shared_string_cells_carry_the_index_in_numeric() {
        let raw = RawCell {
            data_type: CellDataType::SharedString,
            value: Some("1".to_string()),
            ..RawCell::default()
        };
        let cell =
            record_from_raw(raw, Coordinate::new(1, 1), &table_with(&["a", "b"]), true).unwrap();
        assert_eq!(cell.numeric, 1.0);
        assert_eq!(cell.text, None);
    }

    #[test]
    fn bad_shared_string_index_degrades_to_inline_text() {
        let raw = RawCell {
            data_type: CellDataType::SharedString,
            value: Some("9".to_string()),
            ..RawCell::default()
        };
        let table = table_with(&["a"]);

        let cell = record_from_raw(raw.clone(), Coordinate::new(1, 1), &table, false).unwrap();
        assert_eq!(cell.data_type, CellDataType::InlineString);
        assert_eq!(cell.text.as_deref(), Some("9"));

        assert!(record_from_raw(raw, Coordinate::new(1, 1), &table, true).is_err());
    }

    #[test]
    fn non_numeric_value_degrades_to_raw_text() {
        let raw = RawCell {
            value: Some("not-a-number".to_string()),
            ..RawCell::default()
        };
        let table = SharedStringTable::new();

        let cell = record_from_raw(raw.clone(), Coordinate::new(2, 3), &table, false).unwrap();
        assert_eq!(cell.text.as_deref(), Some("not-a-number"));

        assert!(record_from_raw(raw, Coordinate::new(2, 3), &table, true).is_err());
    }

    #[test]
    fn written_cell_includes_style_type_and_value() {
        let mut writer = Writer::new(Vec::new());
        let cell = CellRecord {
            data_type: CellDataType::Boolean,
            numeric: 1.0,
            style_index: 2,
            ..CellRecord::default()
        };
        write_cell(&mut writer, Coordinate::new(2, 2), &cell, None);

        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(xml, r#"<c r="B2" s="2" t="b"><v>1</v></c>"#);
    }

    #[test]
    fn formula_cell_with_unknown_result_omits_the_value() {
        let mut writer = Writer::new(Vec::new());
        let cell = CellRecord {
            formula: Some(CellFormula::normal("A1+1")),
            text: Some(String::new()),
            ..CellRecord::default()
        };
        write_cell(&mut writer, Coordinate::new(1, 2), &cell, None);

        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(xml, r#"<c r="B1"><f>A1+1</f></c>"#);
    }
}
