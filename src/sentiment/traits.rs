// Sentiment scorer trait: the swap-ready abstraction.
//
// The default implementation is a fixed polarity lexicon. Anything that can
// map text to a polarity in [-1.0, 1.0] can stand in for it.

/// Trait for scoring the polarity of a piece of text.
pub trait SentimentScorer: Send + Sync {
    /// Polarity in [-1.0, 1.0]. Neutral and empty text score 0.0.
    fn polarity(&self, text: &str) -> f64;

    /// Score multiple texts, returning results in the same order.
    fn polarity_batch(&self, texts: &[String]) -> Vec<f64> {
        texts.iter().map(|t| self.polarity(t)).collect()
    }
}
