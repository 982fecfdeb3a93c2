//! `xl/sharedStrings.xml` parsing and writing.
//!
//! Rich-text runs are flattened to their concatenated plain text; run
//! styling is outside this engine's scope.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use sheetdoc_model::SharedStringTable;

use crate::XlsxError;

const SST_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Parse a shared-strings part into an interning table.
pub fn parse_shared_strings_xml(xml: &str) -> Result<SharedStringTable, XlsxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut table = SharedStringTable::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                let text = parse_si(&mut reader)?;
                table.intern(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(table)
}

/// One `<si>`: either a plain `<t>` or a sequence of `<r><t>` runs.
fn parse_si(reader: &mut Reader<&[u8]>) -> Result<String, XlsxError> {
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::Start(e) if !matches!(e.local_name().as_ref(), b"r" | b"t") => {
                // Run properties, phonetic runs and extension subtrees may
                // carry their own <t> elements that are not display text.
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"si" => break,
            Event::Eof => {
                return Err(XlsxError::malformed("sharedStrings.xml", "unexpected eof in <si>"))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Serialize the table. `count` is the total number of shared-string cell
/// references across the workbook (the `count` header attribute, distinct
/// from `uniqueCount`).
pub fn write_shared_strings_xml(table: &SharedStringTable, count: usize) -> String {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .ok();

    let mut sst = BytesStart::new("sst");
    sst.push_attribute(("xmlns", SST_NS));
    sst.push_attribute(("count", count.to_string().as_str()));
    sst.push_attribute(("uniqueCount", table.unique_count().to_string().as_str()));
    writer.write_event(Event::Start(sst)).ok();

    for item in table.iter() {
        writer.write_event(Event::Start(BytesStart::new("si"))).ok();
        let mut t = BytesStart::new("t");
        if needs_space_preserve(item) {
            t.push_attribute(("xml:space", "preserve"));
        }
        writer.write_event(Event::Start(t)).ok();
        writer.write_event(Event::Text(BytesText::new(item))).ok();
        writer.write_event(Event::End(BytesEnd::new("t"))).ok();
        writer.write_event(Event::End(BytesEnd::new("si"))).ok();
    }

    writer.write_event(Event::End(BytesEnd::new("sst"))).ok();
    String::from_utf8(writer.into_inner()).unwrap_or_default()
}

fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}
