// Model download for the sentence embedding checkpoint.
//
// Fetches all-MiniLM-L6-v2 (ONNX export + tokenizer) from HuggingFace into a
// platform data directory (~/.local/share/topicmap/models/ on Linux) so it
// persists across runs. Files are streamed to `<name>.part` and renamed into
// place once complete; a run with files missing fetches them first.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Name of the pretrained checkpoint.
pub const EMBEDDING_MODEL_NAME: &str = "all-MiniLM-L6-v2";

const HF_REPO_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// One file of the checkpoint.
struct ModelFile {
    /// Path inside the HuggingFace repo
    remote: &'static str,
    /// File name on disk
    local: &'static str,
    /// Human-readable size for the console
    size_hint: &'static str,
    progress: bool,
}

const MODEL_FILES: [ModelFile; 2] = [
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
        size_hint: "~700 KB",
        progress: false,
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: "model.onnx",
        size_hint: "~90 MB",
        progress: true,
    },
];

/// Returns the default directory for storing model files.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topicmap")
        .join("models")
}

/// Subdirectory within model_dir for the sentence embedding model.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(EMBEDDING_MODEL_NAME)
}

/// Check whether every checkpoint file exists.
pub fn embedding_files_present(dir: &Path) -> bool {
    let embed_dir = embedding_model_dir(dir);
    MODEL_FILES.iter().all(|f| embed_dir.join(f.local).exists())
}

/// Make sure the embedding model is on disk, downloading it if needed.
///
/// Returns the directory to hand to `SentenceEmbedder::load`. The download
/// runs on a current-thread runtime; nothing else in the pipeline is async.
pub fn ensure_embedding_model(dir: &Path) -> Result<PathBuf> {
    if !embedding_files_present(dir) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start download runtime")?;
        runtime.block_on(download_model(dir))?;
    }
    Ok(embedding_model_dir(dir))
}

/// Download whichever checkpoint files are missing.
pub async fn download_model(dir: &Path) -> Result<()> {
    println!("\nSentence embedding model ({EMBEDDING_MODEL_NAME}):");

    let embed_dir = embedding_model_dir(dir);
    std::fs::create_dir_all(&embed_dir).with_context(|| {
        format!(
            "Failed to create embedding model directory: {}",
            embed_dir.display()
        )
    })?;

    let client = reqwest::Client::new();
    for file in &MODEL_FILES {
        let dest = embed_dir.join(file.local);
        if dest.exists() {
            info!(file = file.local, "Model file already present, skipping");
            println!("  {} (already exists)", file.local);
            continue;
        }
        println!("  Downloading {} ({})...", file.local, file.size_hint);
        let url = format!("{HF_REPO_URL}/{}", file.remote);
        fetch_to_file(&client, &url, &dest, file.progress).await?;
    }

    Ok(())
}

fn progress_bar(length: Option<u64>) -> ProgressBar {
    match length {
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
    }
}

/// Path a download is streamed to before it is complete.
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Stream `url` into `dest`.
async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        progress_bar(response.content_length())
    } else {
        ProgressBar::hidden()
    };

    let part = partial_path(dest);
    let mut out = BufWriter::new(
        File::create(&part).with_context(|| format!("Failed to create {}", part.display()))?,
    );
    let mut written: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        out.write_all(&chunk)
            .with_context(|| format!("Failed to write {}", part.display()))?;
        written += chunk.len() as u64;
        pb.set_position(written);
    }
    out.flush()
        .with_context(|| format!("Failed to flush {}", part.display()))?;
    pb.finish_and_clear();

    std::fs::rename(&part, dest)
        .with_context(|| format!("Failed to move {} into place", dest.display()))?;

    info!(url, dest = %dest.display(), bytes = written, "Downloaded model file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_dir_is_under_topicmap() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("topicmap") && path_str.contains("models"),
            "Expected path containing topicmap/models, got: {path_str}"
        );
    }

    #[test]
    fn test_embedding_model_dir_is_subdirectory() {
        let base = PathBuf::from("/tmp/test-models");
        assert_eq!(embedding_model_dir(&base), base.join("all-MiniLM-L6-v2"));
    }

    #[test]
    fn test_partial_path() {
        let dest = PathBuf::from("/models/model.onnx");
        assert_eq!(partial_path(&dest), PathBuf::from("/models/model.onnx.part"));
    }

    #[test]
    fn test_files_missing_in_empty_dir() {
        let dir = std::env::temp_dir().join("topicmap-test-nonexistent");
        assert!(!embedding_files_present(&dir));
    }

    #[test]
    fn test_present_files_skip_the_network() {
        let dir = std::env::temp_dir().join(format!("topicmap-embed-{}", std::process::id()));
        let embed_dir = embedding_model_dir(&dir);
        std::fs::create_dir_all(&embed_dir).unwrap();
        for file in &MODEL_FILES {
            std::fs::write(embed_dir.join(file.local), b"fake").unwrap();
        }

        assert!(embedding_files_present(&dir));
        assert_eq!(ensure_embedding_model(&dir).unwrap(), embed_dir);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
