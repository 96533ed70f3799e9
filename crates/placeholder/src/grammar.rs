//! Delimiter grammar shared by the scanner and the substitutor

use crate::error::PlaceholderError;
use crate::substitute::SubstitutionMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Placeholder delimiter grammar.
///
/// Exactly one grammar is active for a scan/substitute pair; the two are
/// never mixed within one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Grammar {
    /// `{name}`
    #[default]
    #[serde(rename = "single", alias = "single_brace")]
    SingleBrace,
    /// `{{name}}`
    #[serde(rename = "double", alias = "double_brace")]
    DoubleBrace,
}

impl Grammar {
    /// Opening delimiter
    pub fn open(&self) -> &'static str {
        match self {
            Grammar::SingleBrace => "{",
            Grammar::DoubleBrace => "{{",
        }
    }

    /// Closing delimiter
    pub fn close(&self) -> &'static str {
        match self {
            Grammar::SingleBrace => "}",
            Grammar::DoubleBrace => "}}",
        }
    }

    /// Wrap a name in this grammar's delimiters.
    pub fn wrap(&self, name: &str) -> String {
        format!("{}{}{}", self.open(), name, self.close())
    }

    /// Locate every complete placeholder in `text`.
    ///
    /// Single left-to-right pass. An opening delimiter always restarts
    /// capture, so `{a{b}` yields only `b`. A closing delimiter outside a
    /// capture is literal text. Captures whose trimmed content is empty are
    /// dropped, as are captures still open at the end of input.
    pub fn spans<'a>(&self, text: &'a str) -> Vec<Span<'a>> {
        let bytes = text.as_bytes();
        let open = self.open().as_bytes();
        let close = self.close().as_bytes();

        let mut spans = Vec::new();
        let mut capture_start: Option<usize> = None;
        let mut i = 0;

        // Delimiters are ASCII, so every index we slice at is a char boundary.
        while i < bytes.len() {
            if bytes[i..].starts_with(open) {
                capture_start = Some(i);
                i += open.len();
                continue;
            }

            if let Some(start) = capture_start {
                if bytes[i..].starts_with(close) {
                    let end = i + close.len();
                    let name = text[start + open.len()..i].trim();
                    if !name.is_empty() {
                        spans.push(Span {
                            range: start..end,
                            name,
                        });
                    }
                    capture_start = None;
                    i = end;
                    continue;
                }
            }

            i += 1;
        }

        spans
    }

    /// Distinct placeholder names in `text`, in order of first appearance.
    pub fn scan(&self, text: &str) -> Vec<String> {
        crate::scanner::scan(text, *self)
    }

    /// Replace every placeholder whose name is in `values`.
    pub fn substitute<'a>(&self, text: &'a str, values: &SubstitutionMap) -> Cow<'a, str> {
        crate::substitute::substitute(text, values, *self)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grammar::SingleBrace => write!(f, "single"),
            Grammar::DoubleBrace => write!(f, "double"),
        }
    }
}

impl FromStr for Grammar {
    type Err = PlaceholderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "single_brace" | "{}" => Ok(Grammar::SingleBrace),
            "double" | "double_brace" | "{{}}" => Ok(Grammar::DoubleBrace),
            other => Err(PlaceholderError::UnknownGrammar(other.to_string())),
        }
    }
}

/// A complete placeholder occurrence in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    /// Byte range of the whole token, delimiters included
    pub range: Range<usize>,
    /// Trimmed name between the delimiters
    pub name: &'a str,
}
