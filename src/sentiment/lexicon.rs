// Lexicon sentiment scorer.
//
// Each sentiment-bearing word carries a fixed polarity. An intensifier right
// before a word scales it, a negator in the few tokens before it flips and
// dampens it. The text's polarity is the mean over the words that carried
// any sentiment.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::traits::SentimentScorer;
use crate::text::stopwords::is_apostrophe;

const POLARITY: &[(&str, f64)] = &[
    // positive
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("brilliant", 0.9),
    ("clean", 0.37),
    ("clear", 0.1),
    ("comfortable", 0.4),
    ("confident", 0.5),
    ("cool", 0.35),
    ("easier", 0.4),
    ("easy", 0.43),
    ("effective", 0.6),
    ("elegant", 0.6),
    ("enjoy", 0.4),
    ("enjoyable", 0.4),
    ("enjoyed", 0.4),
    ("excellent", 1.0),
    ("excited", 0.38),
    ("exciting", 0.3),
    ("fantastic", 0.4),
    ("fascinating", 0.6),
    ("fine", 0.42),
    ("fun", 0.3),
    ("glad", 0.5),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("impressive", 1.0),
    ("interesting", 0.5),
    ("like", 0.2),
    ("liked", 0.6),
    ("love", 0.5),
    ("loved", 0.7),
    ("lucky", 0.33),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleasant", 0.73),
    ("pleased", 0.5),
    ("powerful", 0.3),
    ("proud", 0.8),
    ("rewarding", 0.5),
    ("satisfied", 0.5),
    ("satisfying", 0.5),
    ("simple", 0.2),
    ("smooth", 0.4),
    ("straightforward", 0.4),
    ("success", 0.3),
    ("successful", 0.75),
    ("successfully", 0.75),
    ("useful", 0.3),
    ("valuable", 0.4),
    ("well", 0.3),
    ("wonderful", 1.0),
    ("worked", 0.2),
    // negative
    ("annoying", -0.8),
    ("anxious", -0.25),
    ("awful", -1.0),
    ("bad", -0.7),
    ("boring", -1.0),
    ("broken", -0.4),
    ("challenging", -0.1),
    ("confused", -0.4),
    ("confusing", -0.3),
    ("difficult", -0.5),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("dislike", -0.5),
    ("failed", -0.5),
    ("frustrated", -0.7),
    ("frustrating", -0.4),
    ("hard", -0.3),
    ("harder", -0.35),
    ("hate", -0.8),
    ("hated", -0.9),
    ("horrible", -1.0),
    ("impossible", -0.67),
    ("lost", -0.2),
    ("messy", -0.4),
    ("painful", -0.7),
    ("poor", -0.4),
    ("sad", -0.5),
    ("slow", -0.3),
    ("stressed", -0.5),
    ("stressful", -0.6),
    ("stuck", -0.4),
    ("struggle", -0.3),
    ("struggled", -0.4),
    ("terrible", -1.0),
    ("tedious", -0.5),
    ("tired", -0.4),
    ("tough", -0.39),
    ("ugly", -0.7),
    ("unclear", -0.3),
    ("unhappy", -0.6),
    ("useless", -0.5),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.3),
    ("pretty", 1.3),
    ("super", 1.4),
    ("highly", 1.4),
    ("incredibly", 1.5),
    ("extremely", 1.5),
    ("totally", 1.5),
    ("completely", 1.6),
    ("absolutely", 1.8),
    ("most", 2.0),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "nothing", "neither", "nor", "hardly", "without", "dont", "doesnt",
    "didnt", "cant", "cannot", "couldnt", "wont", "wouldnt", "isnt", "wasnt", "arent", "werent",
    "havent", "hasnt", "shouldnt",
];

/// Multiplier applied to a negated sentiment word.
const NEGATION_FACTOR: f64 = -0.5;

static LEXICON: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| POLARITY.iter().copied().collect());

static INTENSITY: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| INTENSIFIERS.iter().copied().collect());

/// Lexicon-based polarity scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    /// How many tokens before a sentiment word a negator still applies
    pub negation_window: usize,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self { negation_window: 2 }
    }
}

impl LexiconScorer {
    /// Polarity of a single word, or `None` if it carries no sentiment.
    pub fn word_polarity(word: &str) -> Option<f64> {
        LEXICON.get(word).copied()
    }
}

impl SentimentScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let words = words(text);
        let mut total = 0.0;
        let mut scored = 0usize;

        for (i, word) in words.iter().enumerate() {
            let Some(mut value) = Self::word_polarity(word) else {
                continue;
            };

            if i > 0 {
                if let Some(factor) = INTENSITY.get(words[i - 1].as_str()) {
                    value *= factor;
                }
            }

            let window_start = i.saturating_sub(self.negation_window);
            if words[window_start..i]
                .iter()
                .any(|w| NEGATORS.contains(&w.as_str()))
            {
                value *= NEGATION_FACTOR;
            }

            total += value.clamp(-1.0, 1.0);
            scored += 1;
        }

        if scored == 0 {
            return 0.0;
        }
        (total / scored as f64).clamp(-1.0, 1.0)
    }
}

/// Lower-cased words of raw text. Apostrophes are dropped so contractions
/// like "didn't" match the negator list.
fn words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !is_apostrophe(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}
