// Topicmap: topic visualization for a corpus of short documents
//
// This is the library root. Each module corresponds to one stage of the
// pipeline, from corpus loading through to the rendered artifacts.

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod output;
pub mod pipeline;
pub mod reduce;
pub mod render;
pub mod runtime;
pub mod topics;
