// Similarity: pairwise document similarity between students, per assignment.
//
// Each selected assignment gets its own matrix. Scores are only ever
// compared within one assignment because the lexical metric's IDF is
// computed over that assignment's documents alone.

pub mod download;
pub mod embeddings;
pub mod pairs;
pub mod tfidf;
pub mod traits;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{Corpus, DocumentRecord, Selection};

pub use embeddings::{EmbeddingCosine, SentenceEmbedder};
pub use pairs::{canonical_pairs, StudentPair};
pub use tfidf::TfIdfCosine;
pub use traits::{EmbeddingProvider, SimilarityMetric};

/// Pairwise scores for the students of one assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    pub assignment: String,
    pub metric: String,
    /// Students in sorted order
    pub students: Vec<String>,
    /// Students whose document has no content after normalization
    pub empty: Vec<String>,
    #[serde(with = "pair_scores")]
    pub scores: BTreeMap<StudentPair, f64>,
}

impl SimilarityMatrix {
    /// Score between two students. Symmetric; a student compared with
    /// itself scores 1.0 unless its document is empty.
    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        if !self.students.iter().any(|s| s == a) || !self.students.iter().any(|s| s == b) {
            return None;
        }
        match StudentPair::new(a, b) {
            Some(pair) => self.scores.get(&pair).copied(),
            None => Some(if self.empty.iter().any(|s| s == a) {
                0.0
            } else {
                1.0
            }),
        }
    }

    /// Pairs from most to least similar.
    pub fn ranked(&self) -> Vec<(&StudentPair, f64)> {
        let mut ranked: Vec<(&StudentPair, f64)> =
            self.scores.iter().map(|(p, s)| (p, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// One similarity matrix per selected assignment that has any selected
/// documents, in selection order.
pub fn similarity_matrices<M>(
    corpus: &Corpus,
    selection: &Selection,
    metric: &M,
) -> Result<Vec<SimilarityMatrix>>
where
    M: SimilarityMetric + ?Sized,
{
    let selected = corpus.select(selection);
    let mut matrices = Vec::new();

    for assignment in &selection.assignments {
        let docs: Vec<&DocumentRecord> = selected
            .iter()
            .copied()
            .filter(|r| &r.assignment_id == assignment)
            .collect();
        if docs.is_empty() {
            continue;
        }

        let mut students: Vec<String> = docs.iter().map(|d| d.student_id.clone()).collect();
        students.sort();
        let empty = docs
            .iter()
            .filter(|d| d.normalized_text().is_empty())
            .map(|d| d.student_id.clone())
            .collect();

        let pairs = canonical_pairs(&students);
        let scores = metric.pairwise_similarity(&pairs, &docs)?;
        debug!(
            assignment = %assignment,
            metric = metric.name(),
            pairs = pairs.len(),
            "Computed similarity matrix"
        );

        matrices.push(SimilarityMatrix {
            assignment: assignment.clone(),
            metric: metric.name().to_string(),
            students,
            empty,
            scores,
        });
    }

    Ok(matrices)
}

/// JSON object keys must be strings, so pair scores serialize as a list.
mod pair_scores {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::StudentPair;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        first: String,
        second: String,
        score: f64,
    }

    pub fn serialize<S: Serializer>(
        scores: &BTreeMap<StudentPair, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = scores
            .iter()
            .map(|(pair, score)| Entry {
                first: pair.first.clone(),
                second: pair.second.clone(),
                score: *score,
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<StudentPair, f64>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .filter_map(|e| StudentPair::new(e.first, e.second).map(|p| (p, e.score)))
            .collect())
    }
}
