// Unit tests for corpus loading.
//
// Each test writes its own reflection tree under the system temp directory
// and removes it at the end.

use std::fs;
use std::path::{Path, PathBuf};

use textmining::corpus::{load_corpus, Corpus, DocumentRecord, Field, RootNotFound, Selection};

fn reflection(author: &str, answers: &[(&str, &str)]) -> String {
    let mut doc = format!("# Reflection\nName: {author}\n\n");
    for (question, answer) in answers {
        doc.push_str(&format!("## {question}\n{answer}\n\n"));
    }
    doc
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, file: &str, contents: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(file), contents).unwrap();
}

// ============================================================
// Loading
// ============================================================

#[test]
fn three_students_two_questions() {
    let root = fresh_dir("textmining-corpus-three-students");
    let lab = root.join("lab1");
    for (student, topic) in [("alice", "recursion"), ("bob", "pointers"), ("carol", "docker")] {
        write(
            &lab,
            &format!("{student}.md"),
            &reflection(
                student,
                &[
                    ("What did you learn?", topic),
                    ("What was difficult?", "debugging"),
                ],
            ),
        );
    }

    let corpus = load_corpus(std::slice::from_ref(&root)).unwrap();
    assert_eq!(corpus.len(), 3);
    assert!(corpus.skipped().is_empty());
    assert_eq!(corpus.assignments(), ["lab1"]);
    assert_eq!(corpus.students(), vec!["alice", "bob", "carol"]);
    for record in corpus.records() {
        assert_eq!(record.fields().len(), 2);
        assert_eq!(record.assignment_id, "lab1");
    }

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn records_visit_files_in_sorted_order() {
    let root = fresh_dir("textmining-corpus-sorted");
    let lab = root.join("lab1");
    write(&lab, "zed.md", &reflection("zed", &[("Q1", "kotlin")]));
    write(&lab, "amy.md", &reflection("amy", &[("Q1", "haskell")]));

    let corpus = load_corpus(std::slice::from_ref(&root)).unwrap();
    let students: Vec<&str> = corpus.records().iter().map(|r| r.student_id.as_str()).collect();
    assert_eq!(students, vec!["amy", "zed"]);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn multiple_roots_form_one_corpus() {
    let fall = fresh_dir("textmining-corpus-root-fall");
    let spring = fresh_dir("textmining-corpus-root-spring");
    write(&fall.join("lab1"), "a.md", &reflection("alice", &[("Q1", "recursion")]));
    write(&spring.join("lab2"), "a.md", &reflection("alice", &[("Q1", "docker")]));

    let corpus = load_corpus(&[fall.clone(), spring.clone()]).unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.assignments(), ["lab1", "lab2"]);
    assert_eq!(corpus.roots(), [fall.clone(), spring.clone()]);
    assert_eq!(corpus.student_records("alice").len(), 2);

    fs::remove_dir_all(&fall).unwrap();
    fs::remove_dir_all(&spring).unwrap();
}

#[test]
fn root_may_be_a_single_file() {
    let root = fresh_dir("textmining-corpus-single-file");
    let lab = root.join("lab3");
    write(&lab, "solo.md", &reflection("dana", &[("Q1", "lambda calculus")]));

    let corpus = load_corpus(&[lab.join("solo.md")]).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.records()[0].assignment_id, "lab3");

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn assignment_header_overrides_directory() {
    let root = fresh_dir("textmining-corpus-assignment-header");
    let dir = root.join("inbox");
    write(
        &dir,
        "a.md",
        "Name: erin\nAssignment: lab9\n\n## Q1\nregex engines\n",
    );

    let corpus = load_corpus(std::slice::from_ref(&root)).unwrap();
    assert_eq!(corpus.assignments(), ["lab9"]);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn hidden_and_non_markdown_files_are_ignored() {
    let root = fresh_dir("textmining-corpus-hidden");
    let lab = root.join("lab1");
    write(&lab, "a.md", &reflection("alice", &[("Q1", "recursion")]));
    write(&lab, ".draft.md", &reflection("ghost", &[("Q1", "hidden")]));
    write(&lab, "notes.txt", "Name: nobody\n## Q1\nignored");
    write(&root.join(".git"), "b.md", &reflection("bob", &[("Q1", "objects")]));

    let corpus = load_corpus(std::slice::from_ref(&root)).unwrap();
    assert_eq!(corpus.len(), 1);
    assert!(corpus.skipped().is_empty());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn unparseable_documents_are_skipped_with_reason() {
    let root = fresh_dir("textmining-corpus-skips");
    let lab = root.join("lab1");
    write(&lab, "a.md", &reflection("alice", &[("Q1", "recursion")]));
    write(&lab, "b.md", "");
    write(&lab, "c.md", "## Q1\nno author");
    write(&lab, "d.md", "Name: dana\nno sections at all");
    fs::write(lab.join("e.md"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

    let corpus = load_corpus(std::slice::from_ref(&root)).unwrap();
    assert_eq!(corpus.len(), 1);
    let reasons: Vec<&str> = corpus.skipped().iter().map(|s| s.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            "empty document",
            "missing author header",
            "no question sections",
            "file is not valid UTF-8",
        ]
    );

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn missing_root_is_detectable() {
    let missing = std::env::temp_dir().join("textmining-corpus-does-not-exist");
    let _ = fs::remove_dir_all(&missing);
    let err = load_corpus(std::slice::from_ref(&missing)).unwrap_err();
    let not_found = err
        .downcast_ref::<RootNotFound>()
        .expect("should be RootNotFound");
    assert_eq!(not_found.path, missing);
}

#[test]
fn blank_answers_are_absent_not_empty() {
    let root = fresh_dir("textmining-corpus-blank");
    write(
        &root.join("lab1"),
        "a.md",
        "Name: frank\n## Q1\n\n## Q2\nmerge conflicts\n",
    );

    let corpus = load_corpus(std::slice::from_ref(&root)).unwrap();
    let record = &corpus.records()[0];
    assert_eq!(record.fields()[0].answer, None);
    assert_eq!(record.answer("Q1"), None);
    assert_eq!(record.answer("Q2"), Some("merge conflicts"));
    assert_eq!(corpus.question_records("Q1").len(), 0);
    assert_eq!(corpus.question_records("Q2").len(), 1);

    fs::remove_dir_all(&root).unwrap();
}

// ============================================================
// Records
// ============================================================

#[test]
fn combined_text_round_trips_answers() {
    let answers = ["recursion in python", "debugging pointers", "docker compose"];
    let fields = answers
        .iter()
        .enumerate()
        .map(|(i, a)| Field::new(format!("Q{i}"), Some(a.to_string())))
        .collect();
    let record = DocumentRecord::new("lab1", "alice", "lab1/alice.md", fields);

    let split: Vec<&str> = record.combined_text().split('\n').collect();
    assert_eq!(split, answers);
}

#[test]
fn combined_text_skips_absent_fields() {
    let record = DocumentRecord::new(
        "lab1",
        "alice",
        "lab1/alice.md",
        vec![
            Field::new("Q1", Some("recursion".into())),
            Field::new("Q2", None),
            Field::new("Q3", Some("docker".into())),
        ],
    );
    assert_eq!(record.combined_text(), "recursion\ndocker");
}

#[test]
fn set_field_recomputes_derived_text() {
    let mut record = DocumentRecord::new(
        "lab1",
        "alice",
        "lab1/alice.md",
        vec![Field::new("Q1", Some("recursion".into()))],
    );
    record.set_field("Q2", Some("Kubernetes!".into()));
    assert_eq!(record.combined_text(), "recursion\nKubernetes!");
    assert_eq!(record.normalized_text(), "recursion kubernetes");
    assert_eq!(record.tokens(), ["recursion", "kubernetes"]);
}

// ============================================================
// Selection
// ============================================================

fn small_corpus() -> Corpus {
    let doc = |a: &str, s: &str, q: &str, text: &str| {
        DocumentRecord::new(a, s, format!("{a}/{s}.md"), vec![Field::new(q, Some(text.into()))])
    };
    Corpus::new(
        vec![PathBuf::from("root")],
        vec![
            doc("lab1", "alice", "Q1", "recursion"),
            doc("lab1", "bob", "Q1", "pointers"),
            doc("lab2", "alice", "Q2", "docker"),
        ],
        vec![],
    )
}

#[test]
fn selection_narrows_by_assignment_and_student() {
    let corpus = small_corpus();
    assert_eq!(corpus.select(&Selection::assignments(["lab1"])).len(), 2);
    assert_eq!(corpus.select(&Selection::all(&corpus)).len(), 3);

    let alice = Selection::all(&corpus).with_students(["alice"]);
    assert_eq!(corpus.select(&alice).len(), 2);
    assert_eq!(corpus.active_questions(&alice), vec!["Q1", "Q2"]);
}

#[test]
fn empty_selection_selects_nothing() {
    let corpus = small_corpus();
    assert!(Selection::default().is_empty());
    assert!(corpus.select(&Selection::default()).is_empty());
}

#[test]
fn unknown_assignment_selects_nothing() {
    let corpus = small_corpus();
    assert!(corpus.select(&Selection::assignments(["lab99"])).is_empty());
    assert!(corpus.record("lab99", "alice").is_none());
}
