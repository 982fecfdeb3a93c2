use serde::{Deserialize, Serialize};

/// OOXML cell data type (the `t` attribute of a `<c>` element).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellDataType {
    #[default]
    Number,
    Boolean,
    SharedString,
    InlineString,
    String,
    Error,
}

/// Formula payload of a cell: either an independent formula string, or a
/// reference into a shared-formula group (see
/// [`SharedFormulas`](crate::SharedFormulas)).
///
/// Formula text is stored without the leading `=`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellFormula {
    Normal { text: String },
    Shared { index: u32 },
}

impl CellFormula {
    /// Build an independent (non-shared) formula.
    pub fn normal(text: impl Into<String>) -> Self {
        CellFormula::Normal { text: text.into() }
    }
}

/// A single cell record.
///
/// The coordinate is not stored here; it is the key of the sparse store.
///
/// The text/numeric duality is an invariant every reader must honor: when
/// `text` is `Some`, it is authoritative and must be parsed; when `None`,
/// `numeric` is authoritative. Shared-string indices and booleans (0/1) are
/// stored in `numeric` when `text` is absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    #[serde(default)]
    pub data_type: CellDataType,

    /// Raw text value; authoritative when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Numeric value; authoritative when `text` is `None`.
    #[serde(default)]
    pub numeric: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<CellFormula>,

    /// Index into the (external) style table; 0 is the default style.
    #[serde(default)]
    pub style_index: u32,
}

impl Default for CellRecord {
    fn default() -> Self {
        Self {
            data_type: CellDataType::Number,
            text: None,
            numeric: 0.0,
            formula: None,
            style_index: 0,
        }
    }
}

impl CellRecord {
    /// A cell with default style, no formula, no text and zero numeric value
    /// carries no information and must not be stored in the sparse map.
    pub fn is_really_empty(&self) -> bool {
        self.style_index == 0
            && self.formula.is_none()
            && self.text.as_deref().map_or(true, str::is_empty)
            && self.numeric == 0.0
            && self.data_type == CellDataType::Number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_really_empty() {
        assert!(CellRecord::default().is_really_empty());
    }

    #[test]
    fn any_payload_defeats_the_empty_predicate() {
        let styled = CellRecord {
            style_index: 3,
            ..CellRecord::default()
        };
        assert!(!styled.is_really_empty());

        let texty = CellRecord {
            text: Some("x".to_string()),
            ..CellRecord::default()
        };
        assert!(!texty.is_really_empty());

        let with_formula = CellRecord {
            formula: Some(CellFormula::normal("A1+1")),
            ..CellRecord::default()
        };
        assert!(!with_formula.is_really_empty());

        let boolean_false = CellRecord {
            data_type: CellDataType::Boolean,
            ..CellRecord::default()
        };
        assert!(!boolean_false.is_really_empty());
    }

    #[test]
    fn empty_text_counts_as_no_text() {
        let rec = CellRecord {
            text: Some(String::new()),
            ..CellRecord::default()
        };
        assert!(rec.is_really_empty());
    }
}
