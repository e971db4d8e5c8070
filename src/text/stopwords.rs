// The fixed English stop-word set.
//
// Taken from the `stop-words` crate's English list. Each entry is also
// stored with its apostrophes removed, because normalization turns
// "don't" into "dont" before the stop-word check runs.

use std::collections::HashSet;
use std::sync::LazyLock;

use stop_words::{get, LANGUAGE};

static STOP_WORDS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    let mut set = HashSet::new();
    for word in get(LANGUAGE::English).iter().map(|s| s.to_string()) {
        let lower = word.to_lowercase();
        let stripped: String = lower.chars().filter(|c| !is_apostrophe(*c)).collect();
        if !stripped.is_empty() {
            set.insert(stripped);
        }
        set.insert(lower);
    }
    set
});

/// Whether `word` (already lower-cased) is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// The whole set as a sorted list, for libraries that take one.
pub fn word_list() -> Vec<String> {
    let mut words: Vec<String> = STOP_WORDS.iter().cloned().collect();
    words.sort_unstable();
    words
}

/// Number of entries in the stop-word set.
pub fn len() -> usize {
    STOP_WORDS.len()
}

pub(crate) fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '\u{2018}')
}
