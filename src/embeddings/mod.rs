// Sentence embeddings — document text to dense vectors.

pub mod download;
pub mod sentence;
pub mod traits;
