// Corpus loading — one document per non-empty line of a text file.
//
// Line order is significant: every later stage (embeddings, coordinates,
// topic assignments) is aligned with documents by index.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Paths of the input file and the three output artifacts for a base name.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusPaths {
    pub input: PathBuf,
    pub document_html: PathBuf,
    pub hierarchical_html: PathBuf,
    pub datamap_png: PathBuf,
}

impl CorpusPaths {
    /// Derive all paths from a base name, relative to the working directory.
    pub fn from_base(base: &str) -> Self {
        Self::in_dir(Path::new("."), base)
    }

    /// Derive all paths from a base name inside `dir`.
    pub fn in_dir(dir: &Path, base: &str) -> Self {
        Self {
            input: dir.join(format!("{base}.txt")),
            document_html: dir.join(format!("{base}_document.html")),
            hierarchical_html: dir.join(format!("{base}_hierarchical.html")),
            datamap_png: dir.join(format!("{base}_datamap.png")),
        }
    }
}

/// Read a corpus file into documents.
///
/// A missing or unreadable file is fatal.
pub fn load_documents(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
    let docs = parse_documents(&text);
    info!(path = %path.display(), documents = docs.len(), "Loaded corpus");
    Ok(docs)
}

/// Split raw text into documents: one per line, line terminator stripped,
/// empty lines dropped. Whitespace-only lines are kept as documents.
pub fn parse_documents(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
