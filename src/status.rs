// System status display: config paths, cache contents, model presence.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::similarity::download::embedding_files_present;

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    if config.default_roots.is_empty() {
        println!("Document roots: none configured (pass --dir or set TEXTMINING_DIRS)");
    } else {
        let roots: Vec<String> = config
            .default_roots
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        println!("Document roots: {}", roots.join(", "));
    }

    if config.no_cache {
        println!("Cache: disabled (TEXTMINING_NO_CACHE)");
    } else if !config.cache_path.exists() {
        println!("Cache: {} (not created yet)", config.cache_path.display());
    } else {
        let file_size = std::fs::metadata(&config.cache_path)
            .map(|m| format_bytes(m.len()))
            .unwrap_or_else(|_| "unknown".to_string());
        println!("Cache: {} ({})", config.cache_path.display(), file_size);

        let store = db::open_store(&config.cache_path)?;
        let entries = db::CorpusStore::list(&store)?;
        match entries.first() {
            Some(latest) => println!(
                "Cached corpora: {} (latest built {})",
                entries.len(),
                latest.built_at.format("%Y-%m-%d %H:%M:%S")
            ),
            None => println!("Cached corpora: none"),
        }
    }

    if embedding_files_present(&config.model_dir) {
        println!("Embedding model: {}", config.embedding_dir().display());
    } else {
        println!("Embedding model: not downloaded");
        println!("  Run `textmining download-model` to enable --metric embedding");
    }

    Ok(())
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
