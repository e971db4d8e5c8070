// TF-IDF cosine similarity.
//
// Each document becomes a sparse vector of raw term counts weighted by the
// smoothed inverse document frequency of the term. Terms are the words of the
// normalized text, with no minimum length, so two documents with the same
// normalized text always score 1.0. The IDF is computed over
// the documents passed in, which are the documents of one assignment, so the
// same two students can score differently across assignments.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tracing::debug;

use super::pairs::StudentPair;
use super::traits::SimilarityMetric;
use crate::corpus::DocumentRecord;

type SparseVector<'a> = HashMap<&'a str, f64>;

/// Lexical similarity: cosine of TF-IDF vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfCosine;

impl SimilarityMetric for TfIdfCosine {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn pairwise_similarity(
        &self,
        pairs: &[StudentPair],
        docs: &[&DocumentRecord],
    ) -> Result<BTreeMap<StudentPair, f64>> {
        let vectors = tfidf_vectors(docs);
        let by_student: HashMap<&str, &SparseVector> = docs
            .iter()
            .map(|d| d.student_id.as_str())
            .zip(vectors.iter())
            .collect();

        let scores = pairs
            .iter()
            .map(|pair| {
                let score = match (
                    by_student.get(pair.first.as_str()),
                    by_student.get(pair.second.as_str()),
                ) {
                    (Some(a), Some(b)) => sparse_cosine(a, b),
                    _ => 0.0,
                };
                (pair.clone(), score)
            })
            .collect();

        debug!(documents = docs.len(), pairs = pairs.len(), "Computed TF-IDF similarity");
        Ok(scores)
    }
}

/// Smoothed inverse document frequency: `ln((1 + n) / (1 + df)) + 1`.
pub fn smoothed_idf(documents: usize, document_frequency: usize) -> f64 {
    ((1.0 + documents as f64) / (1.0 + document_frequency as f64)).ln() + 1.0
}

fn tfidf_vectors<'a>(docs: &[&'a DocumentRecord]) -> Vec<SparseVector<'a>> {
    let counts: Vec<HashMap<&'a str, usize>> = docs
        .iter()
        .map(|d| {
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for term in d.normalized_text().split_whitespace() {
                *tf.entry(term).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let mut df: HashMap<&str, usize> = HashMap::new();
    for tf in &counts {
        for term in tf.keys() {
            *df.entry(*term).or_insert(0) += 1;
        }
    }

    let n = docs.len();
    counts
        .into_iter()
        .map(|tf| {
            tf.into_iter()
                .map(|(term, count)| (term, count as f64 * smoothed_idf(n, df[term])))
                .collect()
        })
        .collect()
}

fn sparse_cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    let mag_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.values().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}
