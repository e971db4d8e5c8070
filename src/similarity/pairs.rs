// Canonical student pairs.
//
// A pair is stored with its two ids in lexicographic order, so (a, b) and
// (b, a) are the same key and a student is never paired with itself.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentPair {
    pub first: String,
    pub second: String,
}

impl StudentPair {
    /// Build the canonical pair for two students. Returns `None` for a
    /// self-pair.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, student: &str) -> bool {
        self.first == student || self.second == student
    }
}

impl fmt::Display for StudentPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.first, self.second)
    }
}

/// Every unordered pair of distinct students, in sorted order.
pub fn canonical_pairs<S: AsRef<str>>(students: &[S]) -> Vec<StudentPair> {
    let mut ids: Vec<&str> = students.iter().map(AsRef::as_ref).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            pairs.push(StudentPair {
                first: a.to_string(),
                second: b.to_string(),
            });
        }
    }
    pairs
}
