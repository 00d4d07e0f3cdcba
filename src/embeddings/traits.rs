// Document embedder trait — swap-ready abstraction.
//
// The pipeline only needs "text in, fixed-length vectors out, same order".
// The default implementation runs all-MiniLM-L6-v2 locally via ONNX; tests
// plug in deterministic fakes.

use anyhow::Result;

/// Trait for mapping documents to dense vectors.
pub trait DocumentEmbedder {
    /// Embed every document, returning one vector per document in input order.
    fn embed(&self, docs: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector returned by `embed`.
    fn dimension(&self) -> usize;
}
