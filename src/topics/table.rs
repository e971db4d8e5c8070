// Topic tables: per-document and per-topic views of a fitted model, and
// the 2D projection of confident documents.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::lda::{fit_lda, LdaConfig, LdaModel};
use super::projection::{tsne, TsneConfig};
use crate::corpus::{Corpus, DocumentRecord, Selection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

/// The top terms of one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTerms {
    pub topic: usize,
    pub terms: Vec<TermWeight>,
}

impl TopicTerms {
    /// The terms joined with commas, as a human-readable label.
    pub fn label(&self) -> String {
        self.terms
            .iter()
            .map(|t| t.term.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One row of the per-document topic table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTopics {
    /// Position of the document in the fitted input
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<String>,
    pub dominant_topic: usize,
    /// Top terms of the dominant topic
    pub keywords: Vec<String>,
    pub text: String,
    /// Weight of the dominant topic in this document
    pub contribution: f64,
    pub topic_vector: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicFit {
    pub documents: Vec<DocumentTopics>,
    pub topics: Vec<TopicTerms>,
    pub model: LdaModel,
    /// False when the iteration cap was reached first; the tables then
    /// hold the best state seen
    pub converged: bool,
    pub iterations: usize,
}

impl TopicFit {
    /// Copies of the fitted corpus records with `topic_vector` set. The
    /// corpus itself is left untouched.
    pub fn annotated(&self, corpus: &Corpus) -> Vec<DocumentRecord> {
        self.documents
            .iter()
            .filter_map(|doc| {
                let record = corpus.record(doc.assignment.as_deref()?, doc.student.as_deref()?)?;
                let mut record = record.clone();
                record.topic_vector = Some(doc.topic_vector.clone());
                Some(record)
            })
            .collect()
    }
}

/// A projected document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Index into `TopicFit::documents`
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub dominant_topic: usize,
}

/// Fit a topic model to tokenized documents. `texts` are carried into the
/// document table as-is; when absent, each document's tokens stand in.
pub fn fit_topics(
    tokens: &[Vec<String>],
    texts: Option<&[String]>,
    config: &LdaConfig,
) -> Result<TopicFit> {
    if let Some(texts) = texts {
        if texts.len() != tokens.len() {
            anyhow::bail!(
                "Got {} texts for {} tokenized documents",
                texts.len(),
                tokens.len()
            );
        }
    }

    let fit = fit_lda(tokens, config)?;
    let topics: Vec<TopicTerms> = (0..config.num_topics)
        .map(|topic| TopicTerms {
            topic,
            terms: fit
                .model
                .top_terms(topic, config.words_per_topic)
                .into_iter()
                .map(|(term, weight)| TermWeight { term, weight })
                .collect(),
        })
        .collect();

    let documents = fit
        .doc_topic
        .into_iter()
        .enumerate()
        .map(|(index, topic_vector)| {
            let (dominant_topic, contribution) = dominant(&topic_vector);
            DocumentTopics {
                index,
                assignment: None,
                student: None,
                dominant_topic,
                keywords: topics[dominant_topic]
                    .terms
                    .iter()
                    .map(|t| t.term.clone())
                    .collect(),
                text: match texts {
                    Some(texts) => texts[index].clone(),
                    None => tokens[index].join(" "),
                },
                contribution,
                topic_vector,
            }
        })
        .collect();

    Ok(TopicFit {
        documents,
        topics,
        model: fit.model,
        converged: fit.converged,
        iterations: fit.iterations,
    })
}

/// Fit a topic model over the selected records. Rows carry the record's
/// assignment and student, and its combined text.
pub fn corpus_topic_table(
    corpus: &Corpus,
    selection: &Selection,
    config: &LdaConfig,
) -> Result<TopicFit> {
    let selected = corpus.select(selection);
    let tokens: Vec<Vec<String>> = selected.iter().map(|r| r.tokens().to_vec()).collect();
    let texts: Vec<String> = selected
        .iter()
        .map(|r| r.combined_text().to_string())
        .collect();

    let mut fit = fit_topics(&tokens, Some(texts.as_slice()), config)?;
    for (doc, record) in fit.documents.iter_mut().zip(&selected) {
        doc.assignment = Some(record.assignment_id.clone());
        doc.student = Some(record.student_id.clone());
    }

    info!(
        documents = fit.documents.len(),
        topics = config.num_topics,
        vocabulary = fit.model.vocabulary.len(),
        converged = fit.converged,
        "Fitted topic model"
    );
    Ok(fit)
}

/// Project documents whose dominant topic weight exceeds the confidence
/// threshold. Diffuse documents stay in the table but are not plotted.
pub fn project_topics(fit: &TopicFit, config: &TsneConfig) -> Vec<ProjectedPoint> {
    let confident: Vec<&DocumentTopics> = fit
        .documents
        .iter()
        .filter(|d| d.contribution > config.confidence_threshold)
        .collect();
    let vectors: Vec<Vec<f64>> = confident.iter().map(|d| d.topic_vector.clone()).collect();

    tsne(&vectors, config)
        .into_iter()
        .zip(confident)
        .map(|([x, y], doc)| ProjectedPoint {
            index: doc.index,
            x,
            y,
            dominant_topic: doc.dominant_topic,
        })
        .collect()
}

/// Index and weight of the largest entry; the first wins ties.
fn dominant(weights: &[f64]) -> (usize, f64) {
    weights
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, w)| {
            if w > best.1 {
                (i, w)
            } else {
                best
            }
        })
}
