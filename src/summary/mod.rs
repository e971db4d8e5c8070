// Summaries: extractive summaries of documents, and a one-off inspection
// of free text (tokens, sentiment and summary together).

pub mod tfidf;
pub mod traits;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, Selection};
use crate::sentiment::sentiment;
use crate::text::{normalize, tokenize};

pub use tfidf::TfIdfSummarizer;
pub use traits::Summarizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub assignment: String,
    pub student: String,
    pub summary: String,
}

/// Everything the engine can say about a single piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInspection {
    pub tokens: Vec<String>,
    pub sentiment: f64,
    pub summary: String,
}

/// One summary per selected document, in corpus order.
pub fn summarize_documents<S>(
    corpus: &Corpus,
    selection: &Selection,
    summarizer: &S,
) -> Result<Vec<DocumentSummary>>
where
    S: Summarizer + ?Sized,
{
    corpus
        .select(selection)
        .into_iter()
        .map(|record| {
            Ok(DocumentSummary {
                assignment: record.assignment_id.clone(),
                student: record.student_id.clone(),
                summary: summarizer.summarize(record.combined_text())?,
            })
        })
        .collect()
}

pub fn inspect_text<S>(text: &str, summarizer: &S) -> Result<TextInspection>
where
    S: Summarizer + ?Sized,
{
    Ok(TextInspection {
        tokens: tokenize(&normalize(text)),
        sentiment: sentiment(text),
        summary: summarizer.summarize(text)?,
    })
}
