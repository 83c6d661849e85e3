//! Key concept extraction and highlighting.
//!
//! Concepts are the salient words of a query (longer than three characters,
//! not a stop word). They drive highlighting of titles and excerpts.

use regex::RegexBuilder;
use serde::Serialize;

use crate::semantic::preprocess::{terms, tokenize};

/// Tokens of this length or shorter are never concepts.
const MIN_CONCEPT_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "what", "when", "where", "which", "with", "would", "could", "should", "about", "these",
    "those", "their", "there",
];

/// Markup wrapped around highlighted matches.
const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

/// Salient query terms, in order of first occurrence, without duplicates.
pub fn extract_concepts(query: &str) -> Vec<String> {
    let mut concepts: Vec<String> = Vec::new();

    for token in tokenize(query) {
        if token.len() <= MIN_CONCEPT_LEN || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if !concepts.contains(&token) {
            concepts.push(token);
        }
    }

    concepts
}

/// Wrap every case-insensitive occurrence of any concept in `<mark>` tags.
///
/// Matching is by substring, so "light" also marks the start of "lightning".
/// Matched text keeps its original case; everything else is left untouched.
pub fn highlight(text: &str, concepts: &[String]) -> String {
    let alternatives: Vec<String> = concepts
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| regex::escape(c))
        .collect();

    if alternatives.is_empty() {
        return text.to_string();
    }

    let pattern = format!("({})", alternatives.join("|"));
    let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex,
        Err(err) => {
            log::warn!("could not build highlight pattern {pattern:?}: {err}");
            return text.to_string();
        }
    };

    regex
        .replace_all(text, format!("{MARK_OPEN}${{1}}{MARK_CLOSE}").as_str())
        .into_owned()
}

/// Everything derived from a raw query before ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryContext {
    pub query: String,
    /// Lowercase tokens longer than two characters
    pub tokens: Vec<String>,
    pub concepts: Vec<String>,
}

impl QueryContext {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            tokens: terms(query),
            concepts: extract_concepts(query),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    pub fn highlight(&self, text: &str) -> String {
        highlight(text, &self.concepts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concepts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_concepts_example() {
        assert_eq!(extract_concepts("What is time dilation?"), vec!["time", "dilation"]);
    }

    #[test]
    fn test_extract_concepts_drops_stop_words() {
        let result = extract_concepts("Where would these light cones be about there");
        assert_eq!(result, vec!["light", "cones"]);
        for stop in STOP_WORDS {
            assert!(!extract_concepts(stop).contains(&stop.to_string()));
        }
    }

    #[test]
    fn test_extract_concepts_drops_short_tokens() {
        let result = extract_concepts("how are the GPS and FTL used");
        assert_eq!(result, vec!["used"]);
        assert!(result.iter().all(|c| c.len() > 3));
    }

    #[test]
    fn test_extract_concepts_dedupes_in_order() {
        let result = extract_concepts("Light speed, LIGHT cones and light");
        assert_eq!(result, vec!["light", "speed", "cones"]);
    }

    #[test]
    fn test_extract_concepts_empty() {
        assert!(extract_concepts("").is_empty());
        assert!(extract_concepts("   ").is_empty());
    }

    #[test]
    fn test_highlight_no_concepts_is_identity() {
        let text = "Light cones <b>and</b> causality.";
        assert_eq!(highlight(text, &[]), text);
        assert_eq!(highlight(text, &concepts(&[""])), text);
    }

    #[test]
    fn test_highlight_preserves_case() {
        let result = highlight("Time Dilation in Relativity", &concepts(&["time", "dilation"]));
        assert_eq!(result, "<mark>Time</mark> <mark>Dilation</mark> in Relativity");
    }

    #[test]
    fn test_highlight_matches_substrings() {
        let result = highlight("Lightning and light", &concepts(&["light"]));
        assert_eq!(result, "<mark>Light</mark>ning and <mark>light</mark>");
    }

    #[test]
    fn test_highlight_escapes_regex_metacharacters() {
        let result = highlight("a (c++) b", &concepts(&["c++"]));
        assert_eq!(result, "a (<mark>c++</mark>) b");
    }

    #[test]
    fn test_highlight_leaves_non_matching_text_untouched() {
        let text = "Nothing to see here, γ = 1/√(1-v²/c²).";
        assert_eq!(highlight(text, &concepts(&["quantum"])), text);
    }

    #[test]
    fn test_query_context() {
        let ctx = QueryContext::new("What is time dilation?");
        assert_eq!(ctx.tokens, vec!["what", "time", "dilation"]);
        assert_eq!(ctx.concepts, vec!["time", "dilation"]);
        assert!(!ctx.is_blank());
        assert_eq!(ctx.highlight("Dilation"), "<mark>Dilation</mark>");
        assert!(QueryContext::new("  ").is_blank());
    }
}
