// Selection: which assignments, students and questions an analysis covers.
//
// Passed explicitly into every grouped analysis. An empty assignment list
// means nothing is selected, and analyses return empty tables. The builders
// drop repeated ids, keeping first-seen order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::record::DocumentRecord;
use super::Corpus;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub assignments: Vec<String>,
    /// Empty means every student in the selected assignments
    pub students: Vec<String>,
    /// Empty means every active question
    pub questions: Vec<String>,
}

impl Selection {
    pub fn assignments<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assignments: unique(ids),
            ..Self::default()
        }
    }

    /// Every assignment in the corpus.
    pub fn all(corpus: &Corpus) -> Self {
        Self::assignments(corpus.assignments().iter().cloned())
    }

    pub fn with_students<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.students = unique(ids);
        self
    }

    pub fn with_questions<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.questions = unique(labels);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn includes(&self, record: &DocumentRecord) -> bool {
        self.assignments.contains(&record.assignment_id)
            && (self.students.is_empty() || self.students.contains(&record.student_id))
    }
}

fn unique<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(Into::into)
        .filter(|id: &String| seen.insert(id.clone()))
        .collect()
}
