//! Data types flowing through one pipeline run.
//!
//! Everything here is owned by a single run and discarded when the run
//! ends; nothing is persisted or shared between questions.

use serde::{Deserialize, Serialize};

/// A source document: raw text fetched once per run, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The identifier the document was fetched by (e.g. an article title).
    pub id: String,
    /// The raw text content.
    pub text: String,
}

/// A bounded, overlapping segment of [`Document`] text.
///
/// `index` is the chunk's zero-based position in the split sequence and is
/// stable for the whole run; it is how the reranker's output refers back
/// into the candidate set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Position in the original ordered chunk sequence.
    pub index: usize,
    /// The text content of the chunk.
    pub text: String,
}

/// A fixed-dimension vector representation of one text.
///
/// All embeddings produced within a run share the same dimensionality and
/// model configuration, so cosine comparisons between them are meaningful.
pub type Embedding = Vec<f32>;

/// A [`Chunk`] paired with its cosine similarity against the query.
///
/// Candidate sets are ordered descending by `score` and truncated to the
/// configured retrieval depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity against the query embedding, in [-1, 1].
    pub score: f32,
}

/// One member of the reranked set.
///
/// `index` points back into the candidate set the reranker was given.
/// `relevance` comes from the rerank model and supersedes the similarity
/// ordering; it is not comparable with cosine scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedChunk {
    /// Zero-based index into the candidate list passed to the reranker.
    pub index: usize,
    /// The text content of the reranked chunk.
    pub text: String,
    /// Relevance score assigned by the rerank model.
    pub relevance: f32,
}

/// The terminal artifact of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated natural-language answer.
    pub text: String,
    /// The grounding texts the answer was generated from, in rerank order.
    pub grounding: Vec<String>,
}
