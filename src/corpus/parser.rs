// Markdown reflection parser.
//
// A reflection document has a short header (author identity, optionally an
// assignment name) followed by question/answer sections:
//
//   # Lab 5 Reflection
//   Name: alice
//
//   ## What did you learn?
//   Recursion, mostly.
//
//   ## What was difficult?
//   ...
//
// Question labels are headings of level 2 or deeper. Headings inside fenced
// code blocks are answer text, not labels.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::record::Field;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{0,3}(#{1,6})\s+(.*?)\s*#*\s*$").expect("valid heading regex")
});

static HEADER_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*+]\s+)?(?:\*\*|__)?([A-Za-z][A-Za-z ]*?)(?:\*\*|__)?\s*:\s*(?:\*\*|__)?\s*(.*?)\s*(?:\*\*|__)?\s*$",
    )
    .expect("valid header field regex")
});

/// Header keys that name the document's author.
pub const AUTHOR_KEYS: [&str; 6] = [
    "name",
    "student",
    "author",
    "username",
    "github username",
    "github",
];

/// Header key that overrides the directory-derived assignment name.
pub const ASSIGNMENT_KEY: &str = "assignment";

/// The structured content of one document, before it becomes a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub author: String,
    pub assignment: Option<String>,
    pub fields: Vec<Field>,
}

/// Parse one document. The error string is the skip reason reported to the
/// caller; parse failures are never fatal to a corpus load.
pub fn parse_document(contents: &str) -> Result<ParsedDocument, String> {
    if contents.trim().is_empty() {
        return Err("empty document".to_string());
    }

    let lines: Vec<&str> = contents.lines().collect();
    let first_label = find_first_label(&lines);
    let header = &lines[..first_label.unwrap_or(lines.len())];

    let author = header_value(header, &AUTHOR_KEYS)
        .or_else(|| first_line_author(header))
        .ok_or_else(|| "missing author header".to_string())?;

    let assignment = header_value(header, &[ASSIGNMENT_KEY]);

    let Some(start) = first_label else {
        return Err("no question sections".to_string());
    };

    let fields = parse_sections(&lines[start..]);
    if fields.is_empty() {
        return Err("no question sections".to_string());
    }

    Ok(ParsedDocument {
        author,
        assignment,
        fields,
    })
}

/// Index of the first question-label line outside code fences.
fn find_first_label(lines: &[&str]) -> Option<usize> {
    let mut in_fence = false;
    for (i, line) in lines.iter().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && question_label(line).is_some() {
            return Some(i);
        }
    }
    None
}

fn parse_sections(lines: &[&str]) -> Vec<Field> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    let mut in_fence = false;

    for line in lines {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some(label) = question_label(line) {
                sections.push((label, Vec::new()));
                continue;
            }
        }
        if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
    }

    // Merge repeated labels into their first occurrence
    let mut fields: Vec<Field> = Vec::new();
    for (label, body) in sections {
        let answer = body.join("\n").trim().to_string();
        let answer = (!answer.is_empty()).then_some(answer);
        match fields.iter_mut().find(|f| f.label == label) {
            Some(existing) => {
                existing.answer = match (existing.answer.take(), answer) {
                    (Some(a), Some(b)) => Some(format!("{a}\n{b}")),
                    (a, b) => a.or(b),
                };
            }
            None => fields.push(Field::new(label, answer)),
        }
    }
    fields
}

/// Heading text of a level >= 2 heading, cleaned up for use as a label.
fn question_label(line: &str) -> Option<String> {
    let caps = HEADING_RE.captures(line)?;
    if caps.get(1)?.as_str().len() < 2 {
        return None;
    }
    let label = strip_emphasis(caps.get(2)?.as_str());
    let label = label.trim_end_matches(':').trim().to_string();
    (!label.is_empty()).then_some(label)
}

fn header_value(header: &[&str], keys: &[&str]) -> Option<String> {
    header.iter().find_map(|line| {
        let caps = HEADER_FIELD_RE.captures(line)?;
        let key = caps.get(1)?.as_str().trim().to_lowercase();
        if !keys.contains(&key.as_str()) {
            return None;
        }
        clean_identity(caps.get(2)?.as_str())
    })
}

/// Fallback author: the first non-empty line, when it sits in the header.
fn first_line_author(header: &[&str]) -> Option<String> {
    let line = header.iter().find(|l| !l.trim().is_empty())?;
    let text = match HEADING_RE.captures(line) {
        Some(caps) => caps.get(2)?.as_str().to_string(),
        None => line.to_string(),
    };
    clean_identity(&strip_emphasis(&text))
}

fn clean_identity(value: &str) -> Option<String> {
    let value = value.trim().trim_start_matches('@').trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn strip_emphasis(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '*' || c == '_')
        .trim()
        .to_string()
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_document() {
        let doc = "# Lab 1 Reflection\nName: alice\n\n\
                   ## What did you learn?\nLoops.\n\n\
                   ## What was hard?\nGit.\n";
        let parsed = parse_document(doc).unwrap();
        assert_eq!(parsed.author, "alice");
        assert_eq!(parsed.assignment, None);
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.fields[0].label, "What did you learn?");
        assert_eq!(parsed.fields[0].answer.as_deref(), Some("Loops."));
        assert_eq!(parsed.fields[1].answer.as_deref(), Some("Git."));
    }

    #[test]
    fn test_bold_header_field() {
        let doc = "**Name:** bob\n**Assignment:** lab2\n## Q1\nanswer";
        let parsed = parse_document(doc).unwrap();
        assert_eq!(parsed.author, "bob");
        assert_eq!(parsed.assignment.as_deref(), Some("lab2"));
    }

    #[test]
    fn test_first_line_is_author_without_header_field() {
        let doc = "# carol\n\n## Q1\nsome answer";
        assert_eq!(parse_document(doc).unwrap().author, "carol");
    }

    #[test]
    fn test_github_username_key_and_at_prefix() {
        let doc = "- GitHub Username: @dave\n## Q1\nx";
        assert_eq!(parse_document(doc).unwrap().author, "dave");
    }

    #[test]
    fn test_missing_author() {
        let doc = "## Q1\nanswer without a header";
        assert_eq!(parse_document(doc).unwrap_err(), "missing author header");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_document("  \n\n").unwrap_err(), "empty document");
    }

    #[test]
    fn test_no_question_sections() {
        let doc = "Name: erin\nJust some prose.";
        assert_eq!(parse_document(doc).unwrap_err(), "no question sections");
    }

    #[test]
    fn test_blank_answer_is_absent() {
        let doc = "Name: frank\n## Q1\n\n## Q2\nfilled";
        let parsed = parse_document(doc).unwrap();
        assert_eq!(parsed.fields[0].answer, None);
        assert_eq!(parsed.fields[1].answer.as_deref(), Some("filled"));
    }

    #[test]
    fn test_heading_inside_code_fence_is_answer_text() {
        let doc = "Name: gina\n## Q1\n```\n## not a label\n```\n## Q2\nend";
        let parsed = parse_document(doc).unwrap();
        assert_eq!(parsed.fields.len(), 2);
        assert!(parsed.fields[0]
            .answer
            .as_deref()
            .unwrap()
            .contains("## not a label"));
    }

    #[test]
    fn test_repeated_label_merges_answers() {
        let doc = "Name: hank\n## Q1\nfirst\n## Q1\nsecond";
        let parsed = parse_document(doc).unwrap();
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.fields[0].answer.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_label_cleanup() {
        let doc = "Name: ivy\n### **Reflection:** ###\ntext";
        let parsed = parse_document(doc).unwrap();
        assert_eq!(parsed.fields[0].label, "Reflection");
    }
}
