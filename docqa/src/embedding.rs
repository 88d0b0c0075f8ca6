//! Embedder trait for converting text into vector embeddings.

use async_trait::async_trait;

use crate::document::Embedding;
use crate::error::Result;

/// Whether a text is embedded as searchable content or as a search query.
///
/// Embedding models that distinguish the two (Cohere's `input_type`,
/// Gemini's task types) place documents and queries in compatible but
/// differently-optimized regions of the vector space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingRole {
    /// The text is a document chunk to be searched over.
    Document,
    /// The text is a user query.
    Query,
}

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. One embedding is returned per input text, in input order, and
/// all embeddings produced by one provider instance share a dimensionality.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::embedding::{Embedder, EmbeddingRole};
///
/// let vectors = embedder.embed(&["first chunk", "second chunk"], EmbeddingRole::Document).await?;
/// assert_eq!(vectors.len(), 2);
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate one embedding per input text, preserving input order.
    async fn embed(&self, texts: &[&str], role: EmbeddingRole) -> Result<Vec<Embedding>>;
}
