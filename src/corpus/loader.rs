// Corpus loader: walks document roots and parses every reflection file.
//
// Roots are visited in the order given and all contribute to one corpus.
// Within a root, directory entries are visited in sorted order so repeated
// loads of unchanged files produce identical corpora.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::parser::parse_document;
use super::record::DocumentRecord;
use super::{Corpus, RootNotFound, SkippedDocument};

/// File extensions treated as reflection documents.
const DOCUMENT_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Show a progress bar only for corpora at least this large.
const PROGRESS_THRESHOLD: usize = 200;

/// Load every document under `roots` into a single corpus.
///
/// A missing root is an error (`RootNotFound`); a document that fails to
/// parse is recorded in the corpus skip list and the load continues.
pub fn load_corpus(roots: &[PathBuf]) -> Result<Corpus> {
    let mut files = Vec::new();
    for root in roots {
        files.extend(candidate_files(root)?);
    }

    let pb = if files.len() >= PROGRESS_THRESHOLD {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Parsing [{bar:40.cyan/blue}] {pos}/{len} documents")
                .expect("valid template")
                .progress_chars("=> "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for path in &files {
        pb.inc(1);
        match load_document(path) {
            Ok(record) => {
                let key = (record.assignment_id.clone(), record.student_id.clone());
                if seen.insert(key) {
                    records.push(record);
                } else {
                    let reason = format!(
                        "duplicate student '{}' in assignment '{}'",
                        record.student_id, record.assignment_id
                    );
                    warn!(path = %path.display(), %reason, "Skipping document");
                    skipped.push(SkippedDocument {
                        path: path.clone(),
                        reason,
                    });
                }
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Skipping document");
                skipped.push(SkippedDocument {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }
    pb.finish_and_clear();

    info!(
        roots = roots.len(),
        records = records.len(),
        skipped = skipped.len(),
        "Corpus loaded"
    );

    Ok(Corpus::new(roots.to_vec(), records, skipped))
}

/// Every candidate document under `root`, in visit order.
pub fn candidate_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(RootNotFound {
            path: root.to_path_buf(),
        }
        .into());
    }

    let mut files = Vec::new();
    if root.is_file() {
        files.push(root.to_path_buf());
    } else {
        walk(root, &mut files)?;
    }
    debug!(root = %root.display(), files = files.len(), "Collected candidate files");
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| !is_hidden(path))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_document(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn load_document(path: &Path) -> Result<DocumentRecord, String> {
    let bytes = fs::read(path).map_err(|e| format!("unreadable file: {e}"))?;
    let contents = String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())?;
    let parsed = parse_document(&contents)?;

    let assignment = parsed
        .assignment
        .or_else(|| assignment_from_path(path))
        .ok_or_else(|| "cannot determine assignment".to_string())?;

    Ok(DocumentRecord::new(
        assignment,
        parsed.author,
        path,
        parsed.fields,
    ))
}

/// The assignment a file belongs to: the name of its containing directory.
pub fn assignment_from_path(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
