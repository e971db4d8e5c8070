// Similarity traits: the swap-ready abstractions.
//
// A metric scores student pairs within one assignment. The semantic metric
// delegates to an embedding provider, which the default build backs with a
// local ONNX sentence transformer.

use std::collections::BTreeMap;

use anyhow::Result;

use super::pairs::StudentPair;
use crate::corpus::DocumentRecord;

/// Trait for scoring document similarity between pairs of students.
pub trait SimilarityMetric {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Score every pair against the documents of one assignment.
    ///
    /// Scores are in [0.0, 1.0]. A pair involving a document with empty
    /// normalized text, or a student with no document in `docs`, scores 0.0.
    fn pairwise_similarity(
        &self,
        pairs: &[StudentPair],
        docs: &[&DocumentRecord],
    ) -> Result<BTreeMap<StudentPair, f64>>;
}

/// Trait for turning text into fixed-length vectors.
pub trait EmbeddingProvider {
    /// Embed multiple texts, returning vectors in the same order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding provider returned no vector"))
    }
}
