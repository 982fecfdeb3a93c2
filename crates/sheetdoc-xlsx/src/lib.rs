//! OOXML spreadsheet package import/export.
//!
//! The persistence boundary of the engine: worksheet parts, the
//! shared-string table and the calculation chain are converted losslessly
//! to/from the in-memory model. Styles, themes, charts and drawings are
//! outside this crate's scope; their style *indices* round-trip through the
//! cell records untouched.

mod cell_xml;
pub mod package;
mod relationships;
pub mod shared_strings;
pub mod sheet_reader;
pub mod sheet_writer;

pub use package::{read_package, write_package, SheetPart};
pub use sheet_reader::ReadOptions;

/// Errors for package read/write.
#[derive(Debug, thiserror::Error)]
pub enum XlsxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("missing package part: {0}")]
    MissingPart(String),
    #[error("malformed {part}: {detail}")]
    Malformed {
        part: &'static str,
        detail: String,
    },
}

impl XlsxError {
    pub(crate) fn malformed(part: &'static str, detail: impl Into<String>) -> Self {
        XlsxError::Malformed {
            part,
            detail: detail.into(),
        }
    }
}
