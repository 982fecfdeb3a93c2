//! OPC relationship (`.rels`) part parsing.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::XlsxError;

/// One relationship entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub target: String,
    pub rel_type: String,
    /// `TargetMode="External"`.
    pub external: bool,
}

/// Relationships of one part, keyed by `Id`.
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Relationships whose type URI ends with `suffix` (e.g. `/table`).
    /// Iteration order is unspecified.
    pub fn of_type<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.by_id
            .values()
            .filter(move |rel| rel.rel_type.ends_with(suffix))
    }

    pub fn parse(xml: &str) -> Result<Self, XlsxError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut by_id = HashMap::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e)
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut external = false;
                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.local_name().as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            b"Type" => rel_type = Some(value),
                            b"TargetMode" => external = value == "External",
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        by_id.insert(
                            id,
                            Relationship {
                                target,
                                rel_type: rel_type.unwrap_or_default(),
                                external,
                            },
                        );
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { by_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_targets_and_external_mode() {
        let xml = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

        let rels = Relationships::parse(xml).unwrap();
        let link = rels.get("rId1").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com/");
        assert!(!rels.get("rId2").unwrap().external);
        assert!(rels.get("rId3").is_none());
    }
}
