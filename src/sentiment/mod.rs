// Sentiment: polarity per document, per student or per question.
//
// Grouped scores are computed on the concatenated text of the group, not by
// averaging per-document scores, so a short glowing answer does not weigh
// as much as a long critical one.

pub mod lexicon;
pub mod traits;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, DocumentRecord, Selection};

pub use lexicon::LexiconScorer;
pub use traits::SentimentScorer;

/// Polarity of `text` in [-1.0, 1.0] with the default lexicon scorer.
pub fn sentiment(text: &str) -> f64 {
    LexiconScorer::default().polarity(text)
}

/// Granularity of a grouped sentiment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentScope {
    /// One row per selected document
    Document,
    /// One row per selected student, across the selected assignments
    Student,
    /// One row per active question, across students
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SentimentGroup {
    Document { student: String, assignment: String },
    Student { student: String },
    Question { question: String },
}

impl fmt::Display for SentimentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentGroup::Document {
                student,
                assignment,
            } => write!(f, "{student} ({assignment})"),
            SentimentGroup::Student { student } => write!(f, "{student}"),
            SentimentGroup::Question { question } => write!(f, "{question}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRow {
    pub group: SentimentGroup,
    pub polarity: f64,
    /// Number of documents whose text went into this row
    pub documents: usize,
}

/// Sentiment rows for the selection at the given scope.
pub fn grouped_sentiment<S>(
    corpus: &Corpus,
    selection: &Selection,
    scope: SentimentScope,
    scorer: &S,
) -> Vec<SentimentRow>
where
    S: SentimentScorer + ?Sized,
{
    let selected = corpus.select(selection);
    if selected.is_empty() {
        return Vec::new();
    }

    match scope {
        SentimentScope::Document => selected
            .iter()
            .map(|r| SentimentRow {
                group: SentimentGroup::Document {
                    student: r.student_id.clone(),
                    assignment: r.assignment_id.clone(),
                },
                polarity: scorer.polarity(r.combined_text()),
                documents: 1,
            })
            .collect(),
        SentimentScope::Student => {
            let mut students: Vec<&str> = selected.iter().map(|r| r.student_id.as_str()).collect();
            students.sort_unstable();
            students.dedup();
            students
                .into_iter()
                .map(|student| {
                    let docs: Vec<&DocumentRecord> = selected
                        .iter()
                        .copied()
                        .filter(|r| r.student_id == student)
                        .collect();
                    let text = docs
                        .iter()
                        .map(|r| r.combined_text())
                        .collect::<Vec<_>>()
                        .join("\n");
                    SentimentRow {
                        group: SentimentGroup::Student {
                            student: student.to_string(),
                        },
                        polarity: scorer.polarity(&text),
                        documents: docs.len(),
                    }
                })
                .collect()
        }
        SentimentScope::Question => corpus
            .active_questions(selection)
            .into_iter()
            .map(|question| {
                let answers: Vec<&str> =
                    selected.iter().filter_map(|r| r.answer(&question)).collect();
                SentimentRow {
                    polarity: scorer.polarity(&answers.join("\n")),
                    documents: answers.len(),
                    group: SentimentGroup::Question { question },
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Field;
    use std::path::PathBuf;

    fn corpus() -> Corpus {
        let doc = |a: &str, s: &str, q1: &str, q2: Option<&str>| {
            DocumentRecord::new(
                a,
                s,
                format!("{a}/{s}.md"),
                vec![
                    Field::new("Q1", Some(q1.to_string())),
                    Field::new("Q2", q2.map(str::to_string)),
                ],
            )
        };
        Corpus::new(
            vec![PathBuf::from("root")],
            vec![
                doc("lab1", "alice", "great lab", Some("terrible deadline")),
                doc("lab1", "bob", "awful", None),
                doc("lab2", "alice", "wonderful", None),
            ],
            vec![],
        )
    }

    #[test]
    fn test_document_scope_matches_record_sentiment() {
        let c = corpus();
        let rows = grouped_sentiment(
            &c,
            &Selection::all(&c),
            SentimentScope::Document,
            &LexiconScorer::default(),
        );
        assert_eq!(rows.len(), 3);
        for (row, record) in rows.iter().zip(c.records()) {
            assert!((row.polarity - record.sentiment()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_student_scope_concatenates_before_scoring() {
        let c = corpus();
        let rows = grouped_sentiment(
            &c,
            &Selection::all(&c),
            SentimentScope::Student,
            &LexiconScorer::default(),
        );
        let alice = &rows[0];
        assert_eq!(alice.group, SentimentGroup::Student { student: "alice".into() });
        assert_eq!(alice.documents, 2);
        // great 0.8, terrible -1.0, wonderful 1.0 scored as one blob
        let expected = (0.8 - 1.0 + 1.0) / 3.0;
        assert!((alice.polarity - expected).abs() < 1e-9, "{}", alice.polarity);
    }

    #[test]
    fn test_question_scope_uses_active_questions() {
        let c = corpus();
        let sel = Selection::assignments(["lab2"]);
        let rows = grouped_sentiment(&c, &sel, SentimentScope::Question, &LexiconScorer::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group, SentimentGroup::Question { question: "Q1".into() });
    }

    #[test]
    fn test_empty_selection() {
        let c = corpus();
        let rows = grouped_sentiment(
            &c,
            &Selection::default(),
            SentimentScope::Document,
            &LexiconScorer::default(),
        );
        assert!(rows.is_empty());
    }
}
