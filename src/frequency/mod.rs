// Word frequency: ranked word counts at corpus, assignment, student or
// question granularity.
//
// The engine itself only knows about text. Grouping is done by joining the
// normalized text of the relevant records before counting, so one call per
// group produces one ranked list.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, DocumentRecord, Selection};
use crate::text::{normalize, tokenize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// The `top_k` most frequent tokens of `text`, most frequent first. Ties
/// keep the order in which the words first appear.
pub fn word_frequency(text: &str, top_k: usize) -> Vec<WordCount> {
    if top_k == 0 {
        return Vec::new();
    }

    let tokens = tokenize(&normalize(text));
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<WordCount> = Vec::new();

    for token in &tokens {
        match position.get(token.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                position.insert(token.as_str(), counts.len());
                counts.push(WordCount {
                    word: token.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort: equal counts stay in first-occurrence order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_k);
    counts
}

/// Granularity of a grouped frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyScope {
    /// Everything selected, as one group
    Corpus,
    /// One group per selected assignment
    Assignment,
    /// One group per student per assignment
    Student,
    /// One group per active question, across students
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencyGroup {
    Corpus,
    Assignment { assignment: String },
    Student { student: String, assignment: String },
    Question { question: String },
}

impl fmt::Display for FrequencyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyGroup::Corpus => write!(f, "all selected documents"),
            FrequencyGroup::Assignment { assignment } => write!(f, "{assignment}"),
            FrequencyGroup::Student {
                student,
                assignment,
            } => write!(f, "{student} ({assignment})"),
            FrequencyGroup::Question { question } => write!(f, "{question}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFrequency {
    pub group: FrequencyGroup,
    pub words: Vec<WordCount>,
}

/// Ranked word counts for each group of the selection at the given scope.
pub fn grouped_frequency(
    corpus: &Corpus,
    selection: &Selection,
    scope: FrequencyScope,
    top_k: usize,
) -> Vec<GroupFrequency> {
    let selected = corpus.select(selection);
    if selected.is_empty() {
        return Vec::new();
    }

    match scope {
        FrequencyScope::Corpus => vec![GroupFrequency {
            group: FrequencyGroup::Corpus,
            words: word_frequency(&join_normalized(&selected), top_k),
        }],
        FrequencyScope::Assignment => selection
            .assignments
            .iter()
            .filter_map(|assignment| {
                let docs: Vec<&DocumentRecord> = selected
                    .iter()
                    .copied()
                    .filter(|r| &r.assignment_id == assignment)
                    .collect();
                (!docs.is_empty()).then(|| GroupFrequency {
                    group: FrequencyGroup::Assignment {
                        assignment: assignment.clone(),
                    },
                    words: word_frequency(&join_normalized(&docs), top_k),
                })
            })
            .collect(),
        FrequencyScope::Student => {
            let mut docs = selected;
            docs.sort_by(|a, b| {
                a.student_id
                    .cmp(&b.student_id)
                    .then_with(|| assignment_rank(selection, a).cmp(&assignment_rank(selection, b)))
            });
            docs.into_iter()
                .map(|r| GroupFrequency {
                    group: FrequencyGroup::Student {
                        student: r.student_id.clone(),
                        assignment: r.assignment_id.clone(),
                    },
                    words: word_frequency(r.normalized_text(), top_k),
                })
                .collect()
        }
        FrequencyScope::Question => corpus
            .active_questions(selection)
            .into_iter()
            .map(|question| {
                let text = selected
                    .iter()
                    .filter_map(|r| r.answer(&question))
                    .map(normalize)
                    .collect::<Vec<_>>()
                    .join(" ");
                GroupFrequency {
                    words: word_frequency(&text, top_k),
                    group: FrequencyGroup::Question { question },
                }
            })
            .collect(),
    }
}

fn join_normalized(records: &[&DocumentRecord]) -> String {
    records
        .iter()
        .map(|r| r.normalized_text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assignment_rank(selection: &Selection, record: &DocumentRecord) -> usize {
    selection
        .assignments
        .iter()
        .position(|a| a == &record.assignment_id)
        .unwrap_or(usize::MAX)
}
