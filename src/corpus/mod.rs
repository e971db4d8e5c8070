// Corpus: the normalized record set every analysis reads from.
//
// Built once per set of document roots and never modified afterwards.
// Analyses take `&Corpus` and produce their own result tables.

pub mod loader;
pub mod parser;
pub mod record;
pub mod selection;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use loader::{candidate_files, load_corpus};
pub use record::{DocumentRecord, Field};
pub use selection::Selection;

/// A document root that does not exist. Callers can detect it with
/// `err.downcast_ref::<RootNotFound>()` and fall back to a help view.
#[derive(Debug, Clone)]
pub struct RootNotFound {
    pub path: PathBuf,
}

impl fmt::Display for RootNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document root not found: {}", self.path.display())
    }
}

impl std::error::Error for RootNotFound {}

/// A document that was excluded from the corpus, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Serialized form of a corpus; the indices are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct CorpusSnapshot {
    roots: Vec<PathBuf>,
    records: Vec<DocumentRecord>,
    skipped: Vec<SkippedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CorpusSnapshot", into = "CorpusSnapshot")]
pub struct Corpus {
    roots: Vec<PathBuf>,
    records: Vec<DocumentRecord>,
    skipped: Vec<SkippedDocument>,
    by_assignment: BTreeMap<String, Vec<usize>>,
    by_student: BTreeMap<String, Vec<usize>>,
    by_question: BTreeMap<String, Vec<usize>>,
    assignment_order: Vec<String>,
    question_order: Vec<String>,
}

impl From<CorpusSnapshot> for Corpus {
    fn from(snapshot: CorpusSnapshot) -> Self {
        Corpus::new(snapshot.roots, snapshot.records, snapshot.skipped)
    }
}

impl From<Corpus> for CorpusSnapshot {
    fn from(corpus: Corpus) -> Self {
        CorpusSnapshot {
            roots: corpus.roots,
            records: corpus.records,
            skipped: corpus.skipped,
        }
    }
}

impl Corpus {
    /// Build a corpus and its indices. Records keep the given order.
    pub fn new(
        roots: Vec<PathBuf>,
        records: Vec<DocumentRecord>,
        skipped: Vec<SkippedDocument>,
    ) -> Self {
        let mut by_assignment: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_student: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_question: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut assignment_order = Vec::new();
        let mut question_order = Vec::new();

        for (i, record) in records.iter().enumerate() {
            if !by_assignment.contains_key(&record.assignment_id) {
                assignment_order.push(record.assignment_id.clone());
            }
            by_assignment
                .entry(record.assignment_id.clone())
                .or_default()
                .push(i);
            by_student
                .entry(record.student_id.clone())
                .or_default()
                .push(i);
            for field in record.fields() {
                if !by_question.contains_key(&field.label) {
                    question_order.push(field.label.clone());
                }
                let entry = by_question.entry(field.label.clone()).or_default();
                if field.is_answered() {
                    entry.push(i);
                }
            }
        }

        Self {
            roots,
            records,
            skipped,
            by_assignment,
            by_student,
            by_question,
            assignment_order,
            question_order,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Documents excluded during loading.
    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    /// Assignment ids in discovery order.
    pub fn assignments(&self) -> &[String] {
        &self.assignment_order
    }

    /// Student ids, sorted.
    pub fn students(&self) -> Vec<&str> {
        self.by_student.keys().map(String::as_str).collect()
    }

    /// Every question label seen in any document, in discovery order.
    pub fn questions(&self) -> &[String] {
        &self.question_order
    }

    pub fn assignment_records(&self, assignment: &str) -> Vec<&DocumentRecord> {
        self.indexed(self.by_assignment.get(assignment))
    }

    pub fn student_records(&self, student: &str) -> Vec<&DocumentRecord> {
        self.indexed(self.by_student.get(student))
    }

    /// Records that answered `question`.
    pub fn question_records(&self, question: &str) -> Vec<&DocumentRecord> {
        self.indexed(self.by_question.get(question))
    }

    pub fn record(&self, assignment: &str, student: &str) -> Option<&DocumentRecord> {
        self.by_assignment
            .get(assignment)?
            .iter()
            .map(|&i| &self.records[i])
            .find(|r| r.student_id == student)
    }

    /// Records in the selected assignments, narrowed to the selected students
    /// when any are given. An empty selection selects nothing.
    pub fn select(&self, selection: &Selection) -> Vec<&DocumentRecord> {
        self.records
            .iter()
            .filter(|r| selection.includes(r))
            .collect()
    }

    /// Question labels answered by at least one selected record, in discovery
    /// order, narrowed to `selection.questions` when any are given.
    pub fn active_questions(&self, selection: &Selection) -> Vec<String> {
        let selected = self.select(selection);
        self.question_order
            .iter()
            .filter(|q| selection.questions.is_empty() || selection.questions.contains(q))
            .filter(|q| selected.iter().any(|r| r.answer(q).is_some()))
            .cloned()
            .collect()
    }

    fn indexed(&self, indices: Option<&Vec<usize>>) -> Vec<&DocumentRecord> {
        indices
            .map(|ids| ids.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }
}
