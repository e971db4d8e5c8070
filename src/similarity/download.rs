// Model download for the sentence embedding model (all-MiniLM-L6-v2, ~90MB).
//
// Files are stored in a platform data directory
// (~/.local/share/textmining/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the sentence embedding model.
const EMBEDDING_HF_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// One file the embedder needs on disk.
struct ModelFile {
    /// Path within the HuggingFace repo
    remote: &'static str,
    /// File name inside the embedding model directory
    local: &'static str,
    /// Shown next to the name while downloading
    size_hint: Option<&'static str>,
}

/// In download order.
const MODEL_FILES: [ModelFile; 2] = [
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
        size_hint: None,
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: "model.onnx",
        size_hint: Some("~90 MB"),
    },
];

/// Returns the default directory for storing model files.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("textmining")
        .join("models")
}

/// Subdirectory within the model directory for the sentence embedding model.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join("all-MiniLM-L6-v2")
}

/// Check whether every required embedding model file exists.
pub fn embedding_files_present(dir: &Path) -> bool {
    let embed_dir = embedding_model_dir(dir);
    MODEL_FILES.iter().all(|f| embed_dir.join(f.local).exists())
}

/// Names of the model files still missing from `dir`, in download order.
pub fn missing_model_files(dir: &Path) -> Vec<&'static str> {
    let embed_dir = embedding_model_dir(dir);
    MODEL_FILES
        .iter()
        .filter(|f| !embed_dir.join(f.local).exists())
        .map(|f| f.local)
        .collect()
}

/// Download the embedding model and tokenizer into `dir`.
///
/// Files already on disk are left alone; directories are created as needed.
pub async fn download_model(dir: &Path) -> Result<()> {
    let embed_dir = embedding_model_dir(dir);
    std::fs::create_dir_all(&embed_dir).with_context(|| {
        format!(
            "Failed to create embedding model directory: {}",
            embed_dir.display()
        )
    })?;

    println!("\nSentence embedding model (all-MiniLM-L6-v2):");
    let missing = missing_model_files(dir);

    for file in &MODEL_FILES {
        let dest = embed_dir.join(file.local);
        if !missing.contains(&file.local) {
            info!(file = file.local, "Model file already present, skipping");
            println!("  {} (already exists)", file.local);
            continue;
        }

        match file.size_hint {
            Some(size) => println!("  Downloading {} ({size})...", file.local),
            None => println!("  Downloading {}...", file.local),
        }
        let url = format!("{EMBEDDING_HF_URL}/{}", file.remote);
        download_file(&url, &dest, file.size_hint.is_some()).await?;
    }

    Ok(())
}

/// Fetch one file, writing to a `.partial` sibling and renaming on success.
/// Large files get a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = show_progress.then(|| match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    });

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    // Only a finished download gets the final name
    let partial = dest.with_extension("partial");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
