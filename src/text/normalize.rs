// Normalizer and tokenizer.
//
// normalize() produces the canonical form stored as a record's
// normalized_text. It is idempotent: running it on its own output changes
// nothing, which the frequency engine relies on when it re-normalizes
// pre-joined input.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::stopwords::{is_apostrophe, is_stop_word};

/// `[text](url)` and `![alt](url)`: keep only the visible text.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid link regex"));

/// Bare URLs carry no content words worth counting.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?|ftp)://\S+").expect("valid url regex"));

/// Default minimum token length in characters.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;

/// Canonicalize raw text: case-fold, strip markup and punctuation, drop stop
/// words, collapse whitespace.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let text = LINK_RE.replace_all(text, "$1");
    let text = URL_RE.replace_all(&text, " ");
    let lower = text.to_lowercase();

    let mut cleaned = String::with_capacity(lower.len());
    for c in lower.chars() {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if is_apostrophe(c) {
            // "don't" -> "dont"
        } else {
            cleaned.push(' ');
        }
    }

    cleaned
        .split_whitespace()
        .filter(|word| !is_stop_word(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits normalized text into tokens.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    /// Tokens with fewer characters than this are dropped
    pub min_token_len: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

impl Tokenizer {
    pub fn tokenize(&self, normalized: &str) -> Vec<String> {
        normalized
            .split_whitespace()
            .filter(|token| token.chars().count() >= self.min_token_len)
            .filter(|token| !is_stop_word(token))
            .map(str::to_string)
            .collect()
    }
}

/// Tokenize with the default tokenizer.
pub fn tokenize(normalized: &str) -> Vec<String> {
    Tokenizer::default().tokenize(normalized)
}
