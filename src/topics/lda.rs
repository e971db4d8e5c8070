// Latent Dirichlet allocation by collapsed Gibbs sampling.
//
// Every token carries a topic assignment. One sweep resamples each token's
// topic from its conditional given all other assignments. After burn-in the
// joint log-likelihood of words and assignments is checked at a fixed
// interval; the sampler stops once it settles, and the best-scoring state
// seen is the one reported.

use std::collections::HashMap;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Hard ceiling on sampling sweeps, whatever the config asks for.
pub const MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaConfig {
    pub num_topics: usize,
    /// Terms reported per topic
    pub words_per_topic: usize,
    /// Document-topic prior; `None` means `1 / num_topics`
    pub alpha: Option<f64>,
    /// Topic-word prior
    pub beta: f64,
    pub max_iterations: usize,
    /// Sweeps before the first convergence check
    pub burn_in: usize,
    pub check_every: usize,
    /// Relative log-likelihood change treated as converged
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            num_topics: 5,
            words_per_topic: 5,
            alpha: None,
            beta: 0.01,
            max_iterations: 1000,
            burn_in: 50,
            check_every: 10,
            tolerance: 1e-4,
            seed: 500,
        }
    }
}

impl LdaConfig {
    pub fn alpha(&self) -> f64 {
        self.alpha.unwrap_or(1.0 / self.num_topics.max(1) as f64)
    }

    pub fn iteration_cap(&self) -> usize {
        self.max_iterations.min(MAX_ITERATIONS)
    }

    fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            anyhow::bail!("Topic model needs at least one topic");
        }
        if self.alpha() <= 0.0 || !self.alpha().is_finite() {
            anyhow::bail!("alpha must be positive, got {}", self.alpha());
        }
        if self.beta <= 0.0 || !self.beta.is_finite() {
            anyhow::bail!("beta must be positive, got {}", self.beta);
        }
        Ok(())
    }
}

/// A fitted model: topic-word distributions over a fixed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaModel {
    pub num_topics: usize,
    pub alpha: f64,
    pub beta: f64,
    /// Terms in first-occurrence order
    pub vocabulary: Vec<String>,
    /// `topic_word[k][w]`: probability of term `w` under topic `k`
    pub topic_word: Vec<Vec<f64>>,
    pub log_likelihood: f64,
}

impl LdaModel {
    /// The `n` most probable terms of `topic`, most probable first. Ties
    /// keep vocabulary order.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(String, f64)> {
        let Some(weights) = self.topic_word.get(topic) else {
            return Vec::new();
        };
        let mut ranked: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(w, p)| (self.vocabulary[w].clone(), p))
            .collect()
    }
}

/// Result of one sampling run.
#[derive(Debug, Clone)]
pub struct LdaFit {
    pub model: LdaModel,
    /// `doc_topic[d][k]`: weight of topic `k` in document `d`; sums to 1
    pub doc_topic: Vec<Vec<f64>>,
    pub converged: bool,
    pub iterations: usize,
}

/// Vocabulary and per-document word ids.
struct BagOfWords {
    vocabulary: Vec<String>,
    documents: Vec<Vec<usize>>,
}

impl BagOfWords {
    fn build(documents: &[Vec<String>]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut vocabulary = Vec::new();
        let documents = documents
            .iter()
            .map(|tokens| {
                tokens
                    .iter()
                    .map(|t| {
                        *index.entry(t.as_str()).or_insert_with(|| {
                            vocabulary.push(t.clone());
                            vocabulary.len() - 1
                        })
                    })
                    .collect()
            })
            .collect();
        Self {
            vocabulary,
            documents,
        }
    }
}

/// Sampler state: assignments and the count tables derived from them.
#[derive(Clone)]
struct Counts {
    doc_topic: Vec<Vec<usize>>,
    topic_word: Vec<Vec<usize>>,
    topic_total: Vec<usize>,
}

/// Fit LDA to tokenized documents.
pub fn fit_lda(documents: &[Vec<String>], config: &LdaConfig) -> Result<LdaFit> {
    config.validate()?;

    let k = config.num_topics;
    let alpha = config.alpha();
    let beta = config.beta;
    let bow = BagOfWords::build(documents);
    let v = bow.vocabulary.len();

    if v == 0 {
        debug!(documents = documents.len(), "No tokens to model");
        return Ok(LdaFit {
            model: LdaModel {
                num_topics: k,
                alpha,
                beta,
                vocabulary: Vec::new(),
                topic_word: vec![Vec::new(); k],
                log_likelihood: 0.0,
            },
            doc_topic: vec![vec![1.0 / k as f64; k]; documents.len()],
            converged: true,
            iterations: 0,
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut counts = Counts {
        doc_topic: vec![vec![0; k]; bow.documents.len()],
        topic_word: vec![vec![0; v]; k],
        topic_total: vec![0; k],
    };
    let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(bow.documents.len());
    for (d, words) in bow.documents.iter().enumerate() {
        let topics: Vec<usize> = words
            .iter()
            .map(|&w| {
                let z = rng.random_range(0..k);
                counts.doc_topic[d][z] += 1;
                counts.topic_word[z][w] += 1;
                counts.topic_total[z] += 1;
                z
            })
            .collect();
        assignments.push(topics);
    }

    let cap = config.iteration_cap();
    let check_every = config.check_every.max(1);
    let v_beta = v as f64 * beta;
    let mut weights = vec![0.0_f64; k];

    let mut best: Option<(f64, Counts)> = None;
    let mut previous: Option<f64> = None;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < cap {
        for (d, words) in bow.documents.iter().enumerate() {
            for (i, &w) in words.iter().enumerate() {
                let old = assignments[d][i];
                counts.doc_topic[d][old] -= 1;
                counts.topic_word[old][w] -= 1;
                counts.topic_total[old] -= 1;

                let mut total = 0.0;
                for (t, weight) in weights.iter_mut().enumerate() {
                    *weight = (counts.doc_topic[d][t] as f64 + alpha)
                        * (counts.topic_word[t][w] as f64 + beta)
                        / (counts.topic_total[t] as f64 + v_beta);
                    total += *weight;
                }
                let new = sample(&weights, total, &mut rng);

                assignments[d][i] = new;
                counts.doc_topic[d][new] += 1;
                counts.topic_word[new][w] += 1;
                counts.topic_total[new] += 1;
            }
        }
        iterations += 1;

        if iterations <= config.burn_in || iterations % check_every != 0 {
            continue;
        }

        let ll = log_likelihood(&counts, alpha, beta);
        debug!(iteration = iterations, log_likelihood = ll, "Convergence check");
        if best.as_ref().is_none_or(|(b, _)| ll > *b) {
            best = Some((ll, counts.clone()));
        }
        if let Some(prev) = previous {
            if ((ll - prev) / prev.abs().max(f64::MIN_POSITIVE)).abs() < config.tolerance {
                converged = true;
                break;
            }
        }
        previous = Some(ll);
    }

    if converged {
        info!(iterations, topics = k, "Topic model converged");
    } else {
        warn!(
            iterations,
            topics = k,
            "Topic model hit the iteration cap before converging; returning best state"
        );
    }

    let (ll, counts) = match best {
        Some(best) => best,
        None => (log_likelihood(&counts, alpha, beta), counts),
    };

    let topic_word = counts
        .topic_word
        .iter()
        .zip(&counts.topic_total)
        .map(|(row, &total)| {
            row.iter()
                .map(|&c| (c as f64 + beta) / (total as f64 + v_beta))
                .collect()
        })
        .collect();

    let k_alpha = k as f64 * alpha;
    let doc_topic = counts
        .doc_topic
        .iter()
        .map(|row| {
            let len: usize = row.iter().sum();
            row.iter()
                .map(|&c| (c as f64 + alpha) / (len as f64 + k_alpha))
                .collect()
        })
        .collect();

    Ok(LdaFit {
        model: LdaModel {
            num_topics: k,
            alpha,
            beta,
            vocabulary: bow.vocabulary,
            topic_word,
            log_likelihood: ll,
        },
        doc_topic,
        converged,
        iterations,
    })
}

fn sample(weights: &[f64], total: f64, rng: &mut StdRng) -> usize {
    let mut u = rng.random::<f64>() * total;
    for (t, w) in weights.iter().enumerate() {
        u -= w;
        if u <= 0.0 {
            return t;
        }
    }
    weights.len() - 1
}

/// Joint log-likelihood `log p(w, z)` of the current assignments.
fn log_likelihood(counts: &Counts, alpha: f64, beta: f64) -> f64 {
    let k = counts.topic_total.len();
    let v = counts.topic_word.first().map_or(0, Vec::len);
    let v_beta = v as f64 * beta;
    let k_alpha = k as f64 * alpha;

    let mut ll = k as f64 * (ln_gamma(v_beta) - v as f64 * ln_gamma(beta));
    for (row, &total) in counts.topic_word.iter().zip(&counts.topic_total) {
        ll += row.iter().map(|&c| ln_gamma(c as f64 + beta)).sum::<f64>();
        ll -= ln_gamma(total as f64 + v_beta);
    }

    let doc_norm = ln_gamma(k_alpha) - k as f64 * ln_gamma(alpha);
    for row in &counts.doc_topic {
        let len: usize = row.iter().sum();
        ll += doc_norm;
        ll += row.iter().map(|&c| ln_gamma(c as f64 + alpha)).sum::<f64>();
        ll -= ln_gamma(len as f64 + k_alpha);
    }
    ll
}

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function for `x > 0` (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Γ(x)Γ(1-x) = π / sin(πx)
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = LANCZOS[0];
    for (i, &c) in LANCZOS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn corpus() -> Vec<Vec<String>> {
        docs(&[
            "python loops recursion python loops",
            "recursion python functions loops",
            "git merge branch commit git",
            "branch commit merge git rebase",
            "python recursion loops functions",
            "git commit branch merge",
        ])
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!(ln_gamma(2.0).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
        // Γ(0.01) ≈ 99.4326
        assert!((ln_gamma(0.01) - 99.432_585_119_150_6f64.ln()).abs() < 1e-8);
    }

    #[test]
    fn test_doc_topic_rows_sum_to_one() {
        let config = LdaConfig {
            num_topics: 3,
            ..LdaConfig::default()
        };
        let fit = fit_lda(&corpus(), &config).unwrap();
        assert_eq!(fit.doc_topic.len(), 6);
        for row in &fit.doc_topic {
            assert_eq!(row.len(), 3);
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
        for row in &fit.model.topic_word {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_same_seed_same_fit() {
        let config = LdaConfig::default();
        let a = fit_lda(&corpus(), &config).unwrap();
        let b = fit_lda(&corpus(), &config).unwrap();
        assert_eq!(a.doc_topic, b.doc_topic);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_vocabulary_first_occurrence_order() {
        let fit = fit_lda(&docs(&["beta alpha", "gamma alpha"]), &LdaConfig::default()).unwrap();
        assert_eq!(fit.model.vocabulary, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_empty_document_is_uniform() {
        let mut input = corpus();
        input.push(Vec::new());
        let config = LdaConfig {
            num_topics: 4,
            ..LdaConfig::default()
        };
        let fit = fit_lda(&input, &config).unwrap();
        let last = fit.doc_topic.last().unwrap();
        assert!(last.iter().all(|&w| (w - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_no_tokens_at_all() {
        let fit = fit_lda(&docs(&["", ""]), &LdaConfig::default()).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.iterations, 0);
        assert_eq!(fit.doc_topic, vec![vec![0.2; 5]; 2]);
    }

    #[test]
    fn test_zero_topics_is_an_error() {
        let config = LdaConfig {
            num_topics: 0,
            ..LdaConfig::default()
        };
        assert!(fit_lda(&corpus(), &config).is_err());
    }

    #[test]
    fn test_iteration_cap() {
        let config = LdaConfig {
            max_iterations: 20,
            burn_in: 50,
            ..LdaConfig::default()
        };
        let fit = fit_lda(&corpus(), &config).unwrap();
        assert_eq!(fit.iterations, 20);
        assert!(!fit.converged);

        let huge = LdaConfig {
            max_iterations: usize::MAX,
            ..LdaConfig::default()
        };
        assert_eq!(huge.iteration_cap(), MAX_ITERATIONS);
    }

    #[test]
    fn test_top_terms() {
        let config = LdaConfig {
            num_topics: 2,
            ..LdaConfig::default()
        };
        let fit = fit_lda(&corpus(), &config).unwrap();
        let terms = fit.model.top_terms(0, 3);
        assert_eq!(terms.len(), 3);
        assert!(terms[0].1 >= terms[1].1 && terms[1].1 >= terms[2].1);
        assert!(fit.model.top_terms(7, 3).is_empty());
    }
}
