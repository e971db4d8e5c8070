// Summarizer trait: the swap-ready abstraction.

use anyhow::Result;

/// Trait for extractive summarization: a long text in, a short text out.
pub trait Summarizer {
    fn summarize(&self, text: &str) -> Result<String>;
}
