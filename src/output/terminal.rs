// Colored terminal output for corpus overviews and analysis tables.
//
// This module handles all terminal-specific formatting: colors, bars,
// column layout. The main.rs command handlers delegate here.

use colored::Colorize;

use super::{one_line, truncate_chars};
use crate::corpus::Corpus;
use crate::db::{CacheEntry, CacheOutcome};
use crate::frequency::GroupFrequency;
use crate::sentiment::SentimentRow;
use crate::similarity::SimilarityMatrix;
use crate::summary::{DocumentSummary, TextInspection};
use crate::topics::{ProjectedPoint, TopicFit};

const BAR_WIDTH: usize = 20;

/// A bar of `=` proportional to `value / max`.
fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "=".repeat(filled.min(BAR_WIDTH))
}

/// Display record, assignment, student and question counts plus the skip list.
pub fn display_corpus_overview(corpus: &Corpus, outcome: Option<CacheOutcome>) {
    println!("\n{}", "=== Corpus ===".bold());
    if let Some(outcome) = outcome {
        println!("  Source: {}", outcome.to_string().dimmed());
    }
    for root in corpus.roots() {
        println!("  Root: {}", root.display());
    }
    println!("  Documents: {}", corpus.len());
    println!("  Assignments: {}", corpus.assignments().len());
    for assignment in corpus.assignments() {
        println!(
            "    {:<30} {:>4} documents",
            assignment,
            corpus.assignment_records(assignment).len()
        );
    }
    println!("  Students: {}", corpus.students().len());
    println!("  Questions: {}", corpus.questions().len());

    if corpus.skipped().is_empty() {
        println!("  Skipped: {}", "none".green());
    } else {
        println!(
            "  Skipped: {}",
            corpus.skipped().len().to_string().yellow()
        );
        for skipped in corpus.skipped() {
            println!(
                "    {} {}",
                skipped.path.display(),
                format!("({})", skipped.reason).dimmed()
            );
        }
    }
}

/// Display ranked word counts per group as bar charts.
pub fn display_frequency(groups: &[GroupFrequency]) {
    if groups.is_empty() {
        println!("Nothing selected.");
        return;
    }

    for group in groups {
        println!("\n{}", format!("=== {} ===", group.group).bold());
        if group.words.is_empty() {
            println!("  {}", "(no words)".dimmed());
            continue;
        }
        let max = group.words[0].count as f64;
        for word in &group.words {
            println!(
                "  {:<20} {:>5}  {}",
                word.word,
                word.count,
                bar(word.count as f64, max).cyan()
            );
        }
    }
}

/// Display polarity per row, colored by sign.
pub fn display_sentiment(rows: &[SentimentRow]) {
    if rows.is_empty() {
        println!("Nothing selected.");
        return;
    }

    println!("\n{}", "=== Sentiment ===".bold());
    println!(
        "  {:<40} {:>8}  {:>5}",
        "Group".dimmed(),
        "Polarity".dimmed(),
        "Docs".dimmed()
    );
    println!("  {}", "-".repeat(58).dimmed());
    for row in rows {
        let label = truncate_chars(&row.group.to_string(), 40);
        let polarity = format!("{:>8.3}", row.polarity);
        let polarity = if row.polarity > 0.05 {
            polarity.green()
        } else if row.polarity < -0.05 {
            polarity.red()
        } else {
            polarity.normal()
        };
        println!("  {:<40} {}  {:>5}", label, polarity, row.documents);
    }
}

/// Display each assignment's pairs, most similar first.
pub fn display_similarity(matrices: &[SimilarityMatrix]) {
    if matrices.is_empty() {
        println!("Nothing selected.");
        return;
    }

    for matrix in matrices {
        println!(
            "\n{}",
            format!(
                "=== {} ({}, {} students) ===",
                matrix.assignment,
                matrix.metric,
                matrix.students.len()
            )
            .bold()
        );
        if matrix.scores.is_empty() {
            println!("  {}", "(fewer than two students)".dimmed());
            continue;
        }
        for (pair, score) in matrix.ranked() {
            let score_str = format!("{score:.3}");
            let score_str = if score >= 0.8 {
                score_str.red().bold()
            } else if score >= 0.5 {
                score_str.yellow()
            } else {
                score_str.normal()
            };
            println!(
                "  {:<40} {}  {}",
                truncate_chars(&pair.to_string(), 40),
                score_str,
                bar(score, 1.0).cyan()
            );
        }
        if !matrix.empty.is_empty() {
            println!(
                "  {}",
                format!("Empty documents: {}", matrix.empty.join(", ")).dimmed()
            );
        }
    }
}

/// Display topic terms and the per-document table.
pub fn display_topics(fit: &TopicFit) {
    println!(
        "\n{}",
        format!("=== Topics ({}) ===", fit.topics.len()).bold()
    );
    if !fit.converged {
        println!(
            "  {} sampler stopped after {} iterations without converging",
            "!".yellow(),
            fit.iterations
        );
    }
    for topic in &fit.topics {
        let share = fit
            .documents
            .iter()
            .filter(|d| d.dominant_topic == topic.topic)
            .count();
        println!(
            "  {:>2}. {:<60} {}",
            topic.topic,
            topic.label(),
            format!("({share} docs)").dimmed()
        );
    }

    if fit.documents.is_empty() {
        return;
    }
    println!("\n{}", "=== Documents ===".bold());
    for doc in &fit.documents {
        let who = match (&doc.student, &doc.assignment) {
            (Some(s), Some(a)) => format!("{s} ({a})"),
            _ => format!("#{}", doc.index),
        };
        println!(
            "  {:<30} topic {:>2}  {:.2}  {}",
            truncate_chars(&who, 30),
            doc.dominant_topic,
            doc.contribution,
            truncate_chars(&one_line(&doc.text), 60).dimmed()
        );
    }
}

/// Display projected coordinates.
pub fn display_projection(points: &[ProjectedPoint], fit: &TopicFit) {
    println!(
        "\n{}",
        format!(
            "=== Projection ({} of {} documents) ===",
            points.len(),
            fit.documents.len()
        )
        .bold()
    );
    for point in points {
        let doc = &fit.documents[point.index];
        let who = doc.student.clone().unwrap_or_else(|| format!("#{}", doc.index));
        println!(
            "  {:<30} topic {:>2}  x {:>9.3}  y {:>9.3}",
            truncate_chars(&who, 30),
            point.dominant_topic,
            point.x,
            point.y
        );
    }
}

pub fn display_summaries(rows: &[DocumentSummary]) {
    if rows.is_empty() {
        println!("Nothing selected.");
        return;
    }
    for row in rows {
        println!(
            "\n{}",
            format!("=== {} ({}) ===", row.student, row.assignment).bold()
        );
        println!("  {}", one_line(&row.summary));
    }
}

pub fn display_inspection(report: &TextInspection) {
    println!("\n{}", "=== Tokens ===".bold());
    println!("  {}", report.tokens.join(" "));
    println!("\n{}", "=== Sentiment ===".bold());
    println!("  {:.3}", report.sentiment);
    println!("\n{}", "=== Summary ===".bold());
    println!("  {}", one_line(&report.summary));
}

pub fn display_cache_entries(entries: &[CacheEntry]) {
    if entries.is_empty() {
        println!("Cache is empty.");
        return;
    }
    println!("\n{}", format!("=== Cached corpora ({}) ===", entries.len()).bold());
    for entry in entries {
        println!("  {}", entry.roots().join(", "));
        println!(
            "    {} documents, {} assignments, {} skipped, built {}",
            entry.record_count,
            entry.assignment_count,
            entry.skipped_count,
            entry.built_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
