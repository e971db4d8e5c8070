// Cache keys and content fingerprints for document roots.
//
// The key names *which* roots were loaded; the fingerprint captures *what*
// was in them. A cached corpus is reused only when both match.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::corpus::{candidate_files, RootNotFound};

/// Canonical form of each root, in the given order.
pub fn canonical_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    roots
        .iter()
        .map(|root| {
            if !root.exists() {
                return Err(RootNotFound { path: root.clone() }.into());
            }
            root.canonicalize()
                .with_context(|| format!("Failed to resolve {}", root.display()))
        })
        .collect()
}

/// Cache key for an ordered set of roots: canonical paths, newline-joined.
pub fn cache_key(roots: &[PathBuf]) -> Result<String> {
    Ok(canonical_roots(roots)?
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Cache key for roots that may no longer exist, so their entry can still
/// be dropped. Existing roots resolve exactly as in `cache_key`.
pub fn lenient_cache_key(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|root| {
            root.canonicalize()
                .or_else(|_| std::path::absolute(root))
                .unwrap_or_else(|_| root.clone())
                .to_string_lossy()
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// SHA-256 over the relative path, size and modification time of every
/// candidate document under the roots, hex-encoded.
pub fn corpus_fingerprint(roots: &[PathBuf]) -> Result<String> {
    let mut hasher = Sha256::new();
    for root in canonical_roots(roots)? {
        hasher.update(root.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        for file in candidate_files(&root)? {
            let meta = fs::metadata(&file)
                .with_context(|| format!("Failed to stat {}", file.display()))?;
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);

            hasher.update(relative(&file, &root).as_bytes());
            hasher.update([0u8]);
            hasher.update(meta.len().to_le_bytes());
            hasher.update(mtime.to_le_bytes());
        }
        hasher.update([0xffu8]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn relative(file: &Path, root: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .into_owned()
}
