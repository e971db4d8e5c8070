// Document Record: one reflection document by one student for one assignment.
//
// The raw answers live in `fields`; everything else is derived from them and
// recomputed whenever a field changes. Sentiment is computed on first use and
// cached on the record.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::sentiment::{LexiconScorer, SentimentScorer};
use crate::text::{normalize, tokenize};

/// One question label and its answer. `answer` is `None` when the question
/// was present but left blank, so blank answers never count as answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    pub answer: Option<String>,
}

impl Field {
    pub fn new(label: impl Into<String>, answer: Option<String>) -> Self {
        Self {
            label: label.into(),
            answer: answer.filter(|a| !a.trim().is_empty()),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub assignment_id: String,
    pub student_id: String,
    /// File the record was parsed from
    pub path: PathBuf,
    fields: Vec<Field>,
    combined_text: String,
    normalized_text: String,
    tokens: Vec<String>,
    /// Topic weights; only set on copies produced by `TopicFit::annotated`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_vector: Option<Vec<f64>>,
    #[serde(skip)]
    sentiment: OnceLock<f64>,
}

impl DocumentRecord {
    pub fn new(
        assignment_id: impl Into<String>,
        student_id: impl Into<String>,
        path: impl Into<PathBuf>,
        fields: Vec<Field>,
    ) -> Self {
        let mut record = Self {
            assignment_id: assignment_id.into(),
            student_id: student_id.into(),
            path: path.into(),
            fields,
            combined_text: String::new(),
            normalized_text: String::new(),
            tokens: Vec::new(),
            topic_vector: None,
            sentiment: OnceLock::new(),
        };
        record.refresh_derived();
        record
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The answer to `label`, if the question is present and answered.
    pub fn answer(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .and_then(|f| f.answer.as_deref())
    }

    /// Set (or add) a field and recompute the derived text.
    pub fn set_field(&mut self, label: &str, answer: Option<String>) {
        let field = Field::new(label, answer);
        match self.fields.iter_mut().find(|f| f.label == label) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self.refresh_derived();
    }

    pub fn combined_text(&self) -> &str {
        &self.combined_text
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Polarity of `combined_text` in [-1.0, 1.0], computed on first call.
    pub fn sentiment(&self) -> f64 {
        *self
            .sentiment
            .get_or_init(|| LexiconScorer::default().polarity(&self.combined_text))
    }

    fn refresh_derived(&mut self) {
        self.combined_text = combine_fields(&self.fields);
        self.normalized_text = normalize(&self.combined_text);
        self.tokens = tokenize(&self.normalized_text);
        self.sentiment = OnceLock::new();
    }
}

/// Join the answered fields with newlines, in field order.
pub fn combine_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .filter_map(|f| f.answer.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}
