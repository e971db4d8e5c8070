use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::similarity::download::{default_model_dir, embedding_files_present, embedding_model_dir};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Analysis
/// parameters (top-k, topic counts, seeds) are not configuration; they are
/// passed to each analysis explicitly.
pub struct Config {
    /// SQLite file holding cached corpora
    pub cache_path: PathBuf,
    /// Root directory for model files; the embedding model lives in a
    /// subdirectory of it
    pub model_dir: PathBuf,
    /// Skip the corpus cache entirely (TEXTMINING_NO_CACHE)
    pub no_cache: bool,
    /// Document roots used when the command line names none
    pub default_roots: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables. Everything has a
    /// default, so this only fails on unreadable values.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("TEXTMINING_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir());

        Ok(Self {
            cache_path: env::var("TEXTMINING_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./textmining-cache.db")),
            model_dir,
            no_cache: env::var("TEXTMINING_NO_CACHE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            default_roots: env::var("TEXTMINING_DIRS")
                .map(|v| parse_roots(&v))
                .unwrap_or_default(),
        })
    }

    /// Directory holding the sentence embedding model files.
    pub fn embedding_dir(&self) -> PathBuf {
        embedding_model_dir(&self.model_dir)
    }

    /// Check that the embedding model has been downloaded.
    /// Call this before semantic similarity.
    pub fn require_embedder(&self) -> Result<()> {
        if !embedding_files_present(&self.model_dir) {
            anyhow::bail!(
                "Embedding model files not found in {}\n\
                 Run `textmining download-model` to download them.\n\
                 Or use --metric tfidf for lexical similarity instead.",
                self.embedding_dir().display()
            );
        }
        Ok(())
    }
}

/// "1", "true", "yes" and "on" (any case) are true; everything else false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Comma-separated paths, blanks dropped.
pub fn parse_roots(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
