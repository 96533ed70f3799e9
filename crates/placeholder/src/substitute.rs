//! Placeholder substitution
//!
//! Rewrites one unit of text at a time. Placeholders named in the map are
//! replaced by their values; every other placeholder is copied through
//! verbatim, delimiters and inner whitespace included.

use crate::grammar::Grammar;
use std::borrow::Cow;
use std::collections::HashMap;

/// Mapping from placeholder name to replacement text
pub type SubstitutionMap = HashMap<String, String>;

/// Replace every placeholder in `text` whose name is a key of `values`.
///
/// Returns `Cow::Borrowed` when nothing was replaced, so callers can cheaply
/// detect unchanged units.
pub fn substitute<'a>(text: &'a str, values: &SubstitutionMap, grammar: Grammar) -> Cow<'a, str> {
    if values.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut out: Option<String> = None;
    let mut copied_to = 0;

    for span in grammar.spans(text) {
        let Some(value) = values.get(span.name) else {
            continue;
        };
        let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
        buf.push_str(&text[copied_to..span.range.start]);
        buf.push_str(value);
        copied_to = span.range.end;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}
