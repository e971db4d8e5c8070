// Unit tests for the topic model and its projection.

use std::path::PathBuf;

use textmining::corpus::{Corpus, DocumentRecord, Field, Selection};
use textmining::topics::lda::ln_gamma;
use textmining::topics::{
    corpus_topic_table, fit_lda, fit_topics, project_topics, tsne, LdaConfig, TsneConfig,
    MAX_ITERATIONS,
};

fn tokens(texts: &[&str]) -> Vec<Vec<String>> {
    texts
        .iter()
        .map(|t| t.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn two_theme_documents() -> Vec<Vec<String>> {
    tokens(&[
        "recursion python lambdas recursion python",
        "python recursion lambdas closures python",
        "lambdas closures recursion python closures",
        "docker kubernetes helm docker containers",
        "kubernetes containers docker helm kubernetes",
        "helm docker containers kubernetes helm",
    ])
}

fn small_config(k: usize) -> LdaConfig {
    LdaConfig {
        num_topics: k,
        max_iterations: 200,
        ..LdaConfig::default()
    }
}

// ============================================================
// fit_lda
// ============================================================

#[test]
fn topic_vectors_have_k_entries_summing_to_one() {
    let fit = fit_lda(&two_theme_documents(), &small_config(3)).unwrap();
    assert_eq!(fit.doc_topic.len(), 6);
    for vector in &fit.doc_topic {
        assert_eq!(vector.len(), 3);
        let sum: f64 = vector.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum {sum}");
        assert!(vector.iter().all(|w| *w >= 0.0));
    }
}

#[test]
fn same_seed_same_fit() {
    let docs = two_theme_documents();
    let a = fit_lda(&docs, &small_config(2)).unwrap();
    let b = fit_lda(&docs, &small_config(2)).unwrap();
    assert_eq!(a.doc_topic, b.doc_topic);
    assert_eq!(a.model.vocabulary, b.model.vocabulary);
    assert_eq!(a.iterations, b.iterations);
}

#[test]
fn vocabulary_in_first_occurrence_order() {
    let fit = fit_lda(&tokens(&["zebra mango", "mango apple"]), &small_config(2)).unwrap();
    assert_eq!(fit.model.vocabulary, vec!["zebra", "mango", "apple"]);
}

#[test]
fn no_tokens_gives_uniform_distribution() {
    let fit = fit_lda(&tokens(&["", ""]), &small_config(4)).unwrap();
    assert!(fit.converged);
    assert_eq!(fit.iterations, 0);
    for vector in &fit.doc_topic {
        assert!(vector.iter().all(|w| (w - 0.25).abs() < 1e-12));
    }
}

#[test]
fn empty_document_among_others_is_uniform() {
    let mut docs = two_theme_documents();
    docs.push(Vec::new());
    let fit = fit_lda(&docs, &small_config(2)).unwrap();
    let last = fit.doc_topic.last().unwrap();
    assert!(last.iter().all(|w| (w - 0.5).abs() < 1e-9), "{last:?}");
}

#[test]
fn zero_topics_is_rejected() {
    assert!(fit_lda(&two_theme_documents(), &small_config(0)).is_err());
}

#[test]
fn iteration_cap_is_clamped() {
    let config = LdaConfig {
        max_iterations: MAX_ITERATIONS * 10,
        ..LdaConfig::default()
    };
    assert_eq!(config.iteration_cap(), MAX_ITERATIONS);
    assert!((LdaConfig::default().alpha() - 0.2).abs() < 1e-12);
}

#[test]
fn iterations_never_exceed_cap() {
    let config = LdaConfig {
        num_topics: 2,
        max_iterations: 60,
        tolerance: 0.0,
        ..LdaConfig::default()
    };
    let fit = fit_lda(&two_theme_documents(), &config).unwrap();
    assert!(fit.iterations <= 60);
    assert!(!fit.converged);
}

#[test]
fn top_terms_sorted_by_weight() {
    let fit = fit_lda(&two_theme_documents(), &small_config(2)).unwrap();
    for topic in 0..2 {
        let terms = fit.model.top_terms(topic, 4);
        assert_eq!(terms.len(), 4);
        assert!(terms.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}

#[test]
fn ln_gamma_known_values() {
    assert!(ln_gamma(1.0).abs() < 1e-10);
    assert!(ln_gamma(2.0).abs() < 1e-10);
    assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
    assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
}

// ============================================================
// Topic tables
// ============================================================

#[test]
fn fit_topics_builds_tables() {
    let fit = fit_topics(&two_theme_documents(), None, &small_config(2)).unwrap();
    assert_eq!(fit.topics.len(), 2);
    assert_eq!(fit.documents.len(), 6);
    for doc in &fit.documents {
        assert!(doc.dominant_topic < 2);
        let max = doc.topic_vector.iter().cloned().fold(f64::MIN, f64::max);
        assert!((doc.contribution - max).abs() < 1e-12);
        assert_eq!(doc.keywords.len(), fit.topics[doc.dominant_topic].terms.len());
        assert!(doc.assignment.is_none());
    }
    assert_eq!(
        fit.documents[0].text,
        "recursion python lambdas recursion python"
    );
}

#[test]
fn fit_topics_rejects_mismatched_texts() {
    let texts = vec!["only one".to_string()];
    let result = fit_topics(&two_theme_documents(), Some(texts.as_slice()), &small_config(2));
    assert!(result.is_err());
}

fn corpus() -> Corpus {
    let doc = |s: &str, text: &str| {
        DocumentRecord::new(
            "lab1",
            s,
            format!("lab1/{s}.md"),
            vec![Field::new("Q1", Some(text.to_string()))],
        )
    };
    Corpus::new(
        vec![PathBuf::from("root")],
        vec![
            doc("alice", "Recursion in Python with lambdas."),
            doc("bob", "Docker and Kubernetes containers."),
            doc("carol", "Python closures and recursion."),
        ],
        vec![],
    )
}

#[test]
fn corpus_table_carries_identity_and_raw_text() {
    let c = corpus();
    let fit = corpus_topic_table(&c, &Selection::all(&c), &small_config(2)).unwrap();
    assert_eq!(fit.documents.len(), 3);
    assert_eq!(fit.documents[1].student.as_deref(), Some("bob"));
    assert_eq!(fit.documents[1].assignment.as_deref(), Some("lab1"));
    assert_eq!(fit.documents[1].text, "Docker and Kubernetes containers.");
}

#[test]
fn annotated_records_carry_topic_vectors_without_touching_corpus() {
    let c = corpus();
    let fit = corpus_topic_table(&c, &Selection::all(&c), &small_config(2)).unwrap();
    let annotated = fit.annotated(&c);
    assert_eq!(annotated.len(), 3);
    for (record, doc) in annotated.iter().zip(&fit.documents) {
        assert_eq!(record.topic_vector.as_ref(), Some(&doc.topic_vector));
    }
    assert!(c.records().iter().all(|r| r.topic_vector.is_none()));
}

// ============================================================
// Projection
// ============================================================

#[test]
fn tsne_degenerate_inputs() {
    let config = TsneConfig::default();
    assert!(tsne(&[], &config).is_empty());
    assert_eq!(tsne(&[vec![0.3, 0.7]], &config), vec![[0.0, 0.0]]);
}

#[test]
fn tsne_is_deterministic_and_finite() {
    let points: Vec<Vec<f64>> = (0..12)
        .map(|i| {
            let t = i as f64 / 11.0;
            vec![t, 1.0 - t, (i % 3) as f64 / 3.0]
        })
        .collect();
    let config = TsneConfig {
        iterations: 300,
        ..TsneConfig::default()
    };
    let a = tsne(&points, &config);
    let b = tsne(&points, &config);
    assert_eq!(a.len(), 12);
    assert_eq!(a, b);
    assert!(a.iter().all(|p| p[0].is_finite() && p[1].is_finite()));
}

#[test]
fn projection_respects_strict_threshold() {
    let fit = fit_topics(&two_theme_documents(), None, &small_config(2)).unwrap();

    let none = TsneConfig {
        confidence_threshold: 1.0,
        ..TsneConfig::default()
    };
    assert!(project_topics(&fit, &none).is_empty());

    let all = TsneConfig {
        confidence_threshold: 0.0,
        iterations: 200,
        ..TsneConfig::default()
    };
    let points = project_topics(&fit, &all);
    assert_eq!(points.len(), fit.documents.len());
    for point in &points {
        assert_eq!(point.dominant_topic, fit.documents[point.index].dominant_topic);
    }
}
