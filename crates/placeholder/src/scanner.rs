//! Placeholder scanner
//!
//! Lists the distinct placeholder names found in document text. The scan is
//! tolerant: malformed or unterminated tokens are skipped, never reported as
//! errors.

use crate::grammar::Grammar;
use std::collections::HashSet;

/// Distinct placeholder names in `text`, in order of first appearance.
///
/// Callers must not rely on the order; it is stable only because it makes
/// output easier to read.
pub fn scan(text: &str, grammar: Grammar) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for span in grammar.spans(text) {
        if seen.insert(span.name) {
            names.push(span.name.to_string());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_empty_text() {
        assert!(scan("", Grammar::SingleBrace).is_empty());
        assert!(scan("", Grammar::DoubleBrace).is_empty());
    }

    #[test]
    fn test_deduplicates() {
        assert_eq!(sorted(scan("{a}{b}{a}", Grammar::SingleBrace)), vec!["a", "b"]);
    }

    #[test]
    fn test_unterminated_recovery() {
        assert_eq!(scan("{a{b}", Grammar::SingleBrace), vec!["b"]);
    }

    #[test]
    fn test_adjacent_empty() {
        assert_eq!(scan("{}{x}", Grammar::SingleBrace), vec!["x"]);
    }

    #[test]
    fn test_trimmed_names_merge() {
        assert_eq!(scan("{ nama } and {nama}", Grammar::SingleBrace), vec!["nama"]);
    }

    #[test]
    fn test_permissive_names() {
        assert_eq!(
            scan("{first name} {tanggal-lahir} {x.y}", Grammar::SingleBrace),
            vec!["first name", "tanggal-lahir", "x.y"]
        );
    }

    #[test]
    fn test_double_grammar_ignores_single() {
        assert_eq!(scan("{a} {{b}} {{ c }}", Grammar::DoubleBrace), vec!["b", "c"]);
    }

    #[test]
    fn test_single_grammar_on_double_text() {
        // `{{b}}` under the single grammar: the second `{` restarts capture.
        assert_eq!(scan("{{b}}", Grammar::SingleBrace), vec!["b"]);
    }
}
