//! Extractive answer synthesis.
//!
//! Builds a short answer from the top ranked documents by picking the
//! sentences that mention the most query terms. Nothing is generated: every
//! sentence in the answer is copied from the corpus.
//!
//! Answer layout:
//!
//! ```text
//! Based on our knowledge base: <sentence>. <sentence>. ...
//!
//! Sources:
//! - <title>: <first source>
//! - <title>
//!
//! Information retrieved on <YYYY-MM-DD>. All data is current as of the latest update.
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::semantic::hybrid::SearchResult;
use crate::semantic::preprocess::{sentences, terms, tokenize};

/// Returned verbatim when nothing relevant was found.
pub const NOT_FOUND_MESSAGE: &str = "I couldn't find specific information about that topic in our knowledge base. Would you like to try a different search query?";

/// Separates the answer body from its citations.
pub const SOURCES_DELIMITER: &str = "\n\nSources:";

const ANSWER_PREFIX: &str = "Based on our knowledge base: ";

/// Answer size limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerOptions {
    /// How many top results contribute sentences and citations
    #[serde(default = "default_source_documents")]
    pub source_documents: usize,

    /// Maximum sentences in the answer body
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
}

fn default_source_documents() -> usize {
    3
}

fn default_max_sentences() -> usize {
    5
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            source_documents: default_source_documents(),
            max_sentences: default_max_sentences(),
        }
    }
}

/// Synthesize an answer dated today (UTC).
pub fn synthesize(query: &str, results: &[SearchResult<'_>], options: &AnswerOptions) -> String {
    synthesize_on(query, results, options, chrono::Utc::now().date_naive())
}

/// Synthesize an answer with an explicit retrieval date.
pub fn synthesize_on(
    query: &str,
    results: &[SearchResult<'_>],
    options: &AnswerOptions,
    date: NaiveDate,
) -> String {
    if results.is_empty() {
        return NOT_FOUND_MESSAGE.to_string();
    }

    let top = &results[..results.len().min(options.source_documents)];

    let combined = top
        .iter()
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let query_terms = terms(query);

    let mut scored: Vec<(String, usize)> = sentences(&combined)
        .into_iter()
        .map(|sentence| {
            let words = tokenize(sentence);
            let score = query_terms.iter().filter(|t| words.contains(t)).count();
            (format!("{}.", sentence.trim()), score)
        })
        .collect();

    // stable: equally scored sentences keep document order
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let body = scored
        .into_iter()
        .take(options.max_sentences)
        .map(|(sentence, _)| sentence)
        .collect::<Vec<_>>()
        .join(" ");

    let mut response = format!("{ANSWER_PREFIX}{body}{SOURCES_DELIMITER}");

    for result in top {
        let doc = result.document;
        match doc.primary_source() {
            Some(source) => response.push_str(&format!("\n- {}: {}", doc.title, source)),
            None => response.push_str(&format!("\n- {}", doc.title)),
        }
    }

    response.push_str(&format!(
        "\n\nInformation retrieved on {}. All data is current as of the latest update.",
        date.format("%Y-%m-%d")
    ));

    response
}

/// A synthesized answer split into its parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub body: String,
    /// Citation lines without the leading "- "
    pub sources: Vec<String>,
    /// Trailing freshness note, if any
    pub footer: Option<String>,
}

impl Answer {
    /// Split answer text at the sources delimiter.
    ///
    /// Text without a delimiter (such as the not-found message) becomes a
    /// body with no sources.
    pub fn parse(text: &str) -> Self {
        let Some((body, rest)) = text.split_once(SOURCES_DELIMITER) else {
            return Self {
                body: text.to_string(),
                sources: vec![],
                footer: None,
            };
        };

        let (citations, footer) = match rest.split_once("\n\n") {
            Some((citations, footer)) => (citations, Some(footer.trim().to_string())),
            None => (rest, None),
        };

        let sources = citations
            .lines()
            .filter_map(|line| line.strip_prefix("- "))
            .map(str::to_string)
            .collect();

        Self {
            body: body.to_string(),
            sources,
            footer: footer.filter(|f| !f.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use crate::semantic::hybrid::Relevance;

    fn doc(id: &str, title: &str, content: &str, source: Option<&str>) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags: vec![],
            sources: source.map(|s| vec![s.to_string()]),
        }
    }

    fn result(document: &Document) -> SearchResult<'_> {
        SearchResult {
            document,
            score: 0.9,
            relevance: Relevance::High,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[test]
    fn test_no_results_returns_not_found() {
        let answer = synthesize_on("", &[], &AnswerOptions::default(), date());
        assert_eq!(answer, NOT_FOUND_MESSAGE);
        assert_eq!(synthesize("anything", &[], &AnswerOptions::default()), NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_full_answer_layout() {
        let a = doc(
            "a",
            "Clocks",
            "Clocks tick. Moving clocks tick slower! Why?",
            Some("Hafele (1972)"),
        );
        let results = vec![result(&a)];

        let answer = synthesize_on("moving clocks", &results, &AnswerOptions::default(), date());
        assert_eq!(
            answer,
            "Based on our knowledge base: Moving clocks tick slower. Clocks tick. Why.\
             \n\nSources:\n- Clocks: Hafele (1972)\
             \n\nInformation retrieved on 2024-03-14. All data is current as of the latest update."
        );
    }

    #[test]
    fn test_sentences_ranked_by_whole_token_matches() {
        let a = doc(
            "a",
            "A",
            "Lightning is bright. Light bends near mass. Light cones tilt near light speed.",
            None,
        );
        let results = vec![result(&a)];

        let answer = synthesize_on("light cones", &results, &AnswerOptions::default(), date());
        let body = Answer::parse(&answer).body;
        assert_eq!(
            body,
            "Based on our knowledge base: Light cones tilt near light speed. Light bends near mass. Lightning is bright."
        );
    }

    #[test]
    fn test_limits_sentences_and_documents() {
        let docs: Vec<Document> = (0..5)
            .map(|i| {
                doc(
                    &format!("d{i}"),
                    &format!("Doc {i}"),
                    "One. Two. Three. Four.",
                    None,
                )
            })
            .collect();
        let results: Vec<SearchResult<'_>> = docs.iter().map(result).collect();

        let options = AnswerOptions {
            source_documents: 2,
            max_sentences: 3,
        };
        let answer = Answer::parse(&synthesize_on("zzz", &results, &options, date()));

        assert_eq!(answer.body, "Based on our knowledge base: One. Two. Three.");
        assert_eq!(answer.sources, vec!["Doc 0", "Doc 1"]);
    }

    #[test]
    fn test_default_uses_top_three_documents() {
        let docs: Vec<Document> = (0..4)
            .map(|i| doc(&format!("d{i}"), &format!("Doc {i}"), &format!("Sentence {i}."), None))
            .collect();
        let results: Vec<SearchResult<'_>> = docs.iter().map(result).collect();

        let answer = Answer::parse(&synthesize_on("query", &results, &AnswerOptions::default(), date()));
        assert_eq!(answer.sources, vec!["Doc 0", "Doc 1", "Doc 2"]);
        assert!(!answer.body.contains("Sentence 3"));
    }

    #[test]
    fn test_answer_parse() {
        let a = doc("a", "Title A", "Alpha.", Some("Ref A"));
        let b = doc("b", "Title B", "Beta.", None);
        let results = vec![result(&a), result(&b)];

        let parsed = Answer::parse(&synthesize_on("alpha", &results, &AnswerOptions::default(), date()));
        assert_eq!(parsed.body, "Based on our knowledge base: Alpha. Beta.");
        assert_eq!(parsed.sources, vec!["Title A: Ref A", "Title B"]);
        assert_eq!(
            parsed.footer.as_deref(),
            Some("Information retrieved on 2024-03-14. All data is current as of the latest update.")
        );
    }

    #[test]
    fn test_answer_parse_not_found() {
        let parsed = Answer::parse(NOT_FOUND_MESSAGE);
        assert_eq!(parsed.body, NOT_FOUND_MESSAGE);
        assert!(parsed.sources.is_empty());
        assert_eq!(parsed.footer, None);
    }
}
