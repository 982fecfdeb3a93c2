use serde::{Deserialize, Serialize};

use crate::CellRange;

/// Hyperlink destination.
///
/// External targets always carry the resolved literal URI — never a package
/// relationship id, which is only valid inside its source part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HyperlinkTarget {
    /// External or relative URI.
    External(String),
    /// In-workbook cell reference or defined name (the `location` attribute).
    Internal(String),
}

/// A hyperlink spanning a rectangular cell region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub region: CellRange,
    pub target: HyperlinkTarget,
}

impl Hyperlink {
    pub fn external(region: CellRange, uri: impl Into<String>) -> Self {
        Self {
            region,
            target: HyperlinkTarget::External(uri.into()),
        }
    }

    pub fn internal(region: CellRange, location: impl Into<String>) -> Self {
        Self {
            region,
            target: HyperlinkTarget::Internal(location.into()),
        }
    }
}
