// Semantic similarity with sentence embeddings (all-MiniLM-L6-v2).
//
// TF-IDF only sees shared words. Two reflections that describe the same
// struggle in different vocabulary score near zero lexically but land close
// together in embedding space. Each document's combined answer text is
// embedded into a 384-dimensional vector and pairs are compared by cosine.
//
// The model runs locally via ONNX. Mean pooling is applied to the token
// embeddings, matching how the model was trained.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::pairs::StudentPair;
use super::traits::{EmbeddingProvider, SimilarityMetric};
use crate::corpus::DocumentRecord;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Sentence embedder backed by a local ONNX model.
pub struct SentenceEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceEmbedder {
    /// Load the model and tokenizer from `model_dir`.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `textmining download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\n\
                 Run `textmining download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!(
                    "Failed to load embedding model from {}",
                    model_path.display()
                )
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        debug!(
            "Loaded sentence embedding model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }
}

impl EmbeddingProvider for SentenceEmbedder {
    /// Tokenize, run the BERT model, and mean-pool each text into one
    /// 384-dimensional vector.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings: Vec<_> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if max_len == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
        }

        // BERT inputs, padded to max_len with id 0 and mask 0
        let mut input_ids: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let token_type_ids: Vec<i64> = vec![0; batch_size * max_len];

        for enc in &encodings {
            let ids = enc.get_ids();
            let pad_len = max_len - ids.len();
            input_ids.extend(ids.iter().map(|&id| id as i64));
            attention_mask.extend(enc.get_attention_mask().iter().map(|&m| m as i64));
            input_ids.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask.extend(std::iter::repeat_n(0i64, pad_len));
        }

        let shape = [batch_size as i64, max_len as i64];
        let input_ids_tensor =
            Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask.clone()))
            .context("Failed to create attention_mask tensor")?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids))
            .context("Failed to create token_type_ids tensor")?;

        // last_hidden_state: [batch, seq_len, 384]
        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .context("Embedding ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract embedding output tensor")?;

            data.to_vec()
        };

        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut sum = vec![0.0_f64; EMBEDDING_DIM];
            let mut mask_sum = 0.0_f64;

            for j in 0..max_len {
                let mask = attention_mask[i * max_len + j] as f64;
                if mask > 0.0 {
                    mask_sum += mask;
                    let offset = (i * max_len + j) * EMBEDDING_DIM;
                    for (k, s) in sum.iter_mut().enumerate() {
                        *s += hidden_states[offset + k] as f64 * mask;
                    }
                }
            }

            if mask_sum > 0.0 {
                for val in &mut sum {
                    *val /= mask_sum;
                }
            }
            embeddings.push(sum);
        }

        debug!(batch_size, dim = EMBEDDING_DIM, "Computed sentence embeddings");
        Ok(embeddings)
    }
}

/// Semantic similarity: cosine of document embeddings.
pub struct EmbeddingCosine<P: EmbeddingProvider> {
    provider: P,
}

impl<P: EmbeddingProvider> EmbeddingCosine<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: EmbeddingProvider> SimilarityMetric for EmbeddingCosine<P> {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn pairwise_similarity(
        &self,
        pairs: &[StudentPair],
        docs: &[&DocumentRecord],
    ) -> Result<BTreeMap<StudentPair, f64>> {
        // Empty documents are never embedded; they score 0.0 against everyone
        let embeddable: Vec<&DocumentRecord> = docs
            .iter()
            .copied()
            .filter(|d| !d.normalized_text().is_empty())
            .collect();
        // The model reads whole sentences, so it gets the raw answers
        let texts: Vec<String> = embeddable
            .iter()
            .map(|d| d.combined_text().to_string())
            .collect();
        let vectors = self
            .provider
            .embed_batch(&texts)
            .context("Failed to embed documents")?;
        if vectors.len() != texts.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} documents",
                vectors.len(),
                texts.len()
            );
        }

        let by_student: HashMap<&str, &Vec<f64>> = embeddable
            .iter()
            .map(|d| d.student_id.as_str())
            .zip(vectors.iter())
            .collect();

        Ok(pairs
            .iter()
            .map(|pair| {
                let score = match (
                    by_student.get(pair.first.as_str()),
                    by_student.get(pair.second.as_str()),
                ) {
                    (Some(a), Some(b)) => cosine_similarity_embeddings(a, b),
                    _ => 0.0,
                };
                (pair.clone(), score)
            })
            .collect())
    }
}

/// Cosine similarity between two embedding vectors, clamped to 0.0..=1.0.
pub fn cosine_similarity_embeddings(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Field;
    use std::cell::Cell;

    /// Deterministic provider: a vector of letter counts.
    struct LetterCounts {
        calls: Cell<usize>,
    }

    impl EmbeddingProvider for LetterCounts {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
            self.calls.set(self.calls.get() + texts.len());
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; 26];
                    for c in t.bytes().filter(u8::is_ascii_lowercase) {
                        v[(c - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    fn doc(student: &str, text: &str) -> DocumentRecord {
        DocumentRecord::new(
            "lab1",
            student,
            format!("lab1/{student}.md"),
            vec![Field::new("Q1", Some(text.to_string()))],
        )
    }

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity_embeddings(&a, &a) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity_embeddings(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-10);
    }

    #[test]
    fn test_cosine_opposite_clamps_to_zero() {
        let sim = cosine_similarity_embeddings(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!(sim.abs() < f64::EPSILON, "Opposite vectors should clamp to 0.0, got {sim}");
    }

    #[test]
    fn test_cosine_zero_and_mismatched() {
        assert_eq!(cosine_similarity_embeddings(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity_embeddings(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity_embeddings(&[], &[]), 0.0);
    }

    #[test]
    fn test_empty_documents_are_not_embedded() {
        let a = doc("alice", "recursion python");
        let b = doc("bob", "recursion python");
        let empty = doc("carol", "the and of");
        let metric = EmbeddingCosine::new(LetterCounts { calls: Cell::new(0) });

        let pairs = super::super::pairs::canonical_pairs(&["alice", "bob", "carol"]);
        let scores = metric.pairwise_similarity(&pairs, &[&a, &b, &empty]).unwrap();

        assert_eq!(metric.provider.calls.get(), 2);
        assert!((scores[&StudentPair::new("alice", "bob").unwrap()] - 1.0).abs() < 1e-10);
        assert_eq!(scores[&StudentPair::new("alice", "carol").unwrap()], 0.0);
        assert_eq!(scores[&StudentPair::new("bob", "carol").unwrap()], 0.0);
    }

    #[test]
    fn test_provider_sees_raw_answer_text() {
        struct Recording(std::cell::RefCell<Vec<String>>);

        impl EmbeddingProvider for Recording {
            fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
                self.0.borrow_mut().extend(texts.iter().cloned());
                Ok(texts.iter().map(|_| vec![1.0]).collect())
            }
        }

        let a = doc("alice", "I found Recursion hard.");
        let b = doc("bob", "Python was fun!");
        let metric = EmbeddingCosine::new(Recording(Default::default()));
        let pair = StudentPair::new("alice", "bob").unwrap();
        metric.pairwise_similarity(&[pair], &[&a, &b]).unwrap();

        let seen = metric.provider.0.borrow();
        assert_eq!(
            *seen,
            vec![a.combined_text().to_string(), b.combined_text().to_string()]
        );
        assert!(seen[0].contains("Recursion hard."));
    }
}
