//! Text preprocessing shared by the scorers.
//!
//! Every component tokenizes the same way:
//! 1. Lowercase
//! 2. Split on anything that is not an ASCII letter, digit or underscore
//! 3. Drop empty fragments
//!
//! Components then apply their own minimum length.

/// Minimum token length (exclusive) for embedding and lexical scoring.
pub const MIN_TERM_LEN: usize = 2;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lowercase and split into word tokens, keeping duplicates and order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokens longer than [`MIN_TERM_LEN`], duplicates kept.
pub fn terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.len() > MIN_TERM_LEN)
        .collect()
}

/// Split text into sentence fragments on `.`, `!` and `?`.
/// Blank fragments are dropped; the remaining ones are returned untrimmed.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Time Dilation"), vec!["time", "dilation"]);
    }

    #[test]
    fn test_tokenize_handles_punctuation() {
        let tokens = tokenize("faster-than-light, (FTL) travel!");
        assert_eq!(tokens, vec!["faster", "than", "light", "ftl", "travel"]);
    }

    #[test]
    fn test_tokenize_keeps_underscore_and_digits() {
        assert_eq!(tokenize("snake_case 1905"), vec!["snake_case", "1905"]);
    }

    #[test]
    fn test_tokenize_non_ascii_is_a_separator() {
        // γ = 1/√(1-v²/c²)
        let tokens = tokenize("γ = 1/√(1-v²/c²)");
        assert_eq!(tokens, vec!["1", "1", "v", "c"]);
    }

    #[test]
    fn test_terms_filters_short_tokens() {
        assert_eq!(terms("What is a light cone"), vec!["what", "light", "cone"]);
    }

    #[test]
    fn test_terms_keeps_duplicates() {
        assert_eq!(terms("time and time again"), vec!["time", "and", "time", "again"]);
    }

    #[test]
    fn test_terms_empty() {
        assert!(terms("").is_empty());
        assert!(terms("   ").is_empty());
        assert!(terms("a b c").is_empty());
    }

    #[test]
    fn test_sentences_split_and_drop_blank() {
        let parts = sentences("One. Two!  ? Three? ");
        assert_eq!(parts, vec!["One", " Two", " Three"]);
    }
}
