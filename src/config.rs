use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Base name used for the corpus file and every output artifact.
pub const DEFAULT_FILE_NAME: &str = "titles";

/// Which point set the density clusterer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterSpace {
    /// The fitted 2D reduction (default), the same projection the plots use
    Reduced,
    /// The full-dimensional sentence embeddings
    Embeddings,
}

/// Central configuration loaded from environment variables.
///
/// Nothing is required: every field has a default, so running with an
/// empty environment reproduces the standard `titles` run. The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Base name: reads `<file_name>.txt`, writes `<file_name>_*.{html,png}`
    pub file_name: String,
    /// Directory holding the downloaded sentence embedding model
    pub model_dir: PathBuf,
    /// TrueType font used for datamap labels (None = search system fonts)
    pub font_path: Option<PathBuf>,
    /// Point set handed to HDBSCAN
    pub cluster_space: ClusterSpace,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let cluster_space = match env::var("TOPICMAP_CLUSTER_SPACE").as_deref() {
            Ok("embeddings") => ClusterSpace::Embeddings,
            Ok("reduced") | Err(_) => ClusterSpace::Reduced,
            Ok(other) => anyhow::bail!(
                "Unknown TOPICMAP_CLUSTER_SPACE '{other}' (expected 'reduced' or 'embeddings')"
            ),
        };

        let model_dir = env::var("TOPICMAP_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embeddings::download::default_model_dir());

        Ok(Self {
            file_name: env::var("TOPICMAP_FILE_NAME")
                .unwrap_or_else(|_| DEFAULT_FILE_NAME.to_string()),
            model_dir,
            font_path: env::var("TOPICMAP_FONT").ok().map(PathBuf::from),
            cluster_space,
        })
    }

    /// Override the base name (from the `--name` CLI flag).
    pub fn with_file_name(mut self, name: Option<String>) -> Self {
        if let Some(name) = name {
            self.file_name = name;
        }
        self
    }
}
