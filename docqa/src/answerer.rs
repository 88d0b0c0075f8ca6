//! Answerer trait for grounded answer generation.

use async_trait::async_trait;

use crate::error::Result;

/// A generative model that answers a query from supplied grounding texts.
///
/// The pipeline hands the answerer the exact question string that was used
/// for retrieval, the reranked grounding texts in relevance order, and the
/// configured style instructions.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Generate a natural-language answer to `query` using only `grounding`.
    async fn generate(&self, query: &str, grounding: &[&str], style: &str) -> Result<String>;
}
