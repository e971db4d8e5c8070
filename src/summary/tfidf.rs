// TF-IDF extractive summarizer.
//
// Each sentence is treated as a separate document for IDF, so words that
// run through the whole text get downweighted and words distinctive to a
// few sentences get boosted. A sentence scores the mean weight of its
// words; the best sentences are returned in their original order.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::Result;
use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use regex_lite::Regex;
use tracing::debug;

use super::traits::Summarizer;
use crate::text::stopwords;

/// Sentence boundary: terminal punctuation followed by whitespace, or a
/// line break.
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+|\n+").expect("valid sentence regex"));

pub struct TfIdfSummarizer {
    /// How many sentences the summary keeps
    pub max_sentences: usize,
}

impl Default for TfIdfSummarizer {
    fn default() -> Self {
        Self { max_sentences: 3 }
    }
}

impl Summarizer for TfIdfSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        let sentences = split_sentences(text);
        if sentences.len() <= self.max_sentences {
            return Ok(sentences.join(" "));
        }

        let stop_words = stopwords::word_list();
        let tfidf = TfIdf::new(TfIdfParams::UnprocessedDocuments(&sentences, &stop_words, None));
        let word_count = text.split_whitespace().count();
        let scores: HashMap<String, f32> = tfidf
            .get_ranked_word_scores(word_count)
            .into_iter()
            .collect();

        let mut ranked: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(i, s)| (i, sentence_score(s, &scores)))
            .collect();
        // Stable: equal scores keep sentence order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut keep: Vec<usize> = ranked
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        keep.sort_unstable();

        debug!(
            sentences = sentences.len(),
            kept = keep.len(),
            "Summarized text"
        );
        Ok(keep
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Sentences of `text`, trimmed, with terminal punctuation kept.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_RE.find_iter(text) {
        let end = m.start() + m.as_str().trim_end().len();
        push_sentence(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.trim();
    if sentence.chars().any(char::is_alphanumeric) {
        sentences.push(sentence.to_string());
    }
}

fn sentence_score(sentence: &str, scores: &HashMap<String, f32>) -> f64 {
    let weights: Vec<f64> = sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter_map(|w| scores.get(&w.to_lowercase()))
        .map(|&s| s as f64)
        .collect();
    if weights.is_empty() {
        0.0
    } else {
        weights.iter().sum::<f64>() / weights.len() as f64
    }
}
