use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven standard spreadsheet error literals.
///
/// Formula rewriting treats these as opaque tokens; a reference that falls
/// out of bounds is replaced with [`ErrorLiteral::Ref`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorLiteral {
    Div0,
    NA,
    Name,
    Null,
    Num,
    Ref,
    Value,
}

impl ErrorLiteral {
    /// All error literals, longest-first so that prefix-free scanning can
    /// try them in order (`#NULL!` before `#NUM!` is irrelevant, but `#N/A`
    /// must come after the `!`-terminated codes that share its prefix).
    pub const ALL: [ErrorLiteral; 7] = [
        ErrorLiteral::Div0,
        ErrorLiteral::Value,
        ErrorLiteral::Name,
        ErrorLiteral::Null,
        ErrorLiteral::Num,
        ErrorLiteral::Ref,
        ErrorLiteral::NA,
    ];

    /// The literal text, e.g. `#REF!`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorLiteral::Div0 => "#DIV/0!",
            ErrorLiteral::NA => "#N/A",
            ErrorLiteral::Name => "#NAME?",
            ErrorLiteral::Null => "#NULL!",
            ErrorLiteral::Num => "#NUM!",
            ErrorLiteral::Ref => "#REF!",
            ErrorLiteral::Value => "#VALUE!",
        }
    }

    /// Parse an exact error literal.
    pub fn from_str_exact(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }

    /// Match an error literal at the start of `s`, returning it and the
    /// matched length.
    pub fn match_prefix(s: &str) -> Option<(Self, usize)> {
        Self::ALL
            .into_iter()
            .find(|e| s.starts_with(e.as_str()))
            .map(|e| (e, e.as_str().len()))
    }
}

impl fmt::Display for ErrorLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_text_roundtrips() {
        for e in ErrorLiteral::ALL {
            assert_eq!(ErrorLiteral::from_str_exact(e.as_str()), Some(e));
        }
        assert_eq!(ErrorLiteral::from_str_exact("#REF"), None);
    }

    #[test]
    fn prefix_match_consumes_whole_literal() {
        assert_eq!(
            ErrorLiteral::match_prefix("#N/A+1"),
            Some((ErrorLiteral::NA, 4))
        );
        assert_eq!(
            ErrorLiteral::match_prefix("#NUM!*2"),
            Some((ErrorLiteral::Num, 5))
        );
        assert_eq!(ErrorLiteral::match_prefix("REF!"), None);
    }
}
