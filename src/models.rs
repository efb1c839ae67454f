//! Core data types that flow through the ingestion and chat pipeline.

/// A chunk of text extracted from a source document, the unit of retrieval.
///
/// `source` is the document's path relative to the configured documents
/// root. Chunks are produced once at startup and are immutable after
/// ingestion into the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocChunk {
    pub text: String,
    pub source: String,
}

/// A chunk returned from a similarity search, with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocChunk,
    pub score: f32,
}

/// One completed (question, answer) exchange in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}
