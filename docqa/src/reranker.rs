//! Reranker trait for refining a similarity-ranked candidate set.

use async_trait::async_trait;

use crate::document::RerankedChunk;
use crate::error::Result;

/// A second-pass relevance model over a short-listed candidate set.
///
/// Rerankers judge query-candidate relevance directly (typically with a
/// cross-encoder) rather than comparing embeddings, and their ordering
/// supersedes the cosine-similarity ordering. Each returned
/// [`RerankedChunk::index`] refers to a position in the `candidates` slice
/// that was passed in.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Return at most `top_n` candidates in relevance order.
    async fn rerank(
        &self,
        query: &str,
        candidates: &[&str],
        top_n: usize,
    ) -> Result<Vec<RerankedChunk>>;
}
