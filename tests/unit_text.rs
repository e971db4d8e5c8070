// Unit tests for text normalization and tokenization.
//
// normalize() feeds every other analysis, so the properties here (idempotence,
// stop-word removal, markup stripping) are relied on throughout the crate.

use textmining::text::stopwords::{is_stop_word, word_list};
use textmining::text::{normalize, tokenize, Tokenizer};

// ============================================================
// normalize: properties
// ============================================================

#[test]
fn normalize_is_idempotent() {
    let samples = [
        "Recursion in **Python** was great!",
        "## Heading\n> quoted `code` and [rust docs](https://doc.rust-lang.org)",
        "Didn't expect Haskell's type checker to be THIS strict...",
        "",
        "   \n\t ",
        "Ünïcödé wörds, numbers 42 and symbols #@$%",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
    }
}

#[test]
fn normalize_empty_and_whitespace() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("  \n\n\t"), "");
}

#[test]
fn normalize_only_stop_words_is_empty() {
    assert_eq!(normalize("The and of to a"), "");
}

#[test]
fn normalize_keeps_link_text_not_url() {
    let out = normalize("[haskell tutorial](https://example.com/haskell)");
    assert_eq!(out, "haskell tutorial");
}

#[test]
fn normalize_drops_bare_urls() {
    let out = normalize("recursion https://example.com/page.html docker");
    assert_eq!(out, "recursion docker");
}

#[test]
fn normalize_drops_apostrophes_inside_words() {
    assert_eq!(normalize("Python's"), "pythons");
}

#[test]
fn normalize_collapses_whitespace() {
    let out = normalize("recursion\n\n   docker\t\tkubernetes");
    assert_eq!(out, "recursion docker kubernetes");
    assert!(!out.starts_with(' ') && !out.ends_with(' '));
}

// ============================================================
// tokenize
// ============================================================

#[test]
fn tokenize_empty() {
    assert!(tokenize("").is_empty());
}

#[test]
fn tokenize_drops_short_tokens() {
    let tokenizer = Tokenizer { min_token_len: 4 };
    assert_eq!(
        tokenizer.tokenize("rust haskell ab xyz"),
        vec!["rust".to_string(), "haskell".to_string()]
    );
}

#[test]
fn tokenize_default_min_len_is_two() {
    assert_eq!(tokenize("x recursion"), vec!["recursion".to_string()]);
}

#[test]
fn tokens_of_normalized_text_are_never_stop_words() {
    let tokens = tokenize(&normalize("I think that the recursion was really about loops"));
    assert!(!tokens.is_empty());
    assert!(tokens.iter().all(|t| !is_stop_word(t)));
}

// ============================================================
// stop-word set
// ============================================================

#[test]
fn stop_word_list_is_sorted_and_contains_common_words() {
    let list = word_list();
    assert!(list.windows(2).all(|w| w[0] <= w[1]));
    assert!(is_stop_word("the"));
    assert!(is_stop_word("and"));
    assert!(!is_stop_word("recursion"));
}
