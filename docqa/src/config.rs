//! Configuration for the question-answering pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default style preamble handed to the answerer alongside the grounding.
pub const DEFAULT_STYLE_PREAMBLE: &str = "\
## Task and context
You help people answer questions on a wide range of topics interactively. \
Your response should be focused on answering the question in a step by step \
manner that is concise and clear.

## Style Guide
Answer in full sentences unless the user asks for a different style of response.";

/// Configuration parameters for one [`Pipeline`](crate::Pipeline).
///
/// Model names and generation temperature belong to the concrete
/// collaborators (see [`cohere`](crate::cohere)), not to this struct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of candidates kept after similarity ranking.
    pub retrieval_top_k: usize,
    /// Number of chunks kept after reranking, used as grounding.
    pub rerank_top_n: usize,
    /// Free-text instructions steering answer tone.
    pub style_preamble: String,
    /// Per-collaborator-call timeout; expiry counts as a collaborator failure.
    pub call_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
            retrieval_top_k: 10,
            rerank_top_n: 3,
            style_preamble: DEFAULT_STYLE_PREAMBLE.to_string(),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of candidates kept after similarity ranking.
    pub fn retrieval_top_k(mut self, k: usize) -> Self {
        self.config.retrieval_top_k = k;
        self
    }

    /// Set the number of chunks kept after reranking.
    pub fn rerank_top_n(mut self, n: usize) -> Self {
        self.config.rerank_top_n = n;
        self
    }

    /// Set the style preamble handed to the answerer.
    pub fn style_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.config.style_preamble = preamble.into();
        self
    }

    /// Set the per-collaborator-call timeout.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `retrieval_top_k == 0` or `rerank_top_n == 0`
    /// - `rerank_top_n > retrieval_top_k`
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.retrieval_top_k == 0 {
            return Err(Error::Config("retrieval_top_k must be greater than zero".to_string()));
        }
        if self.config.rerank_top_n == 0 {
            return Err(Error::Config("rerank_top_n must be greater than zero".to_string()));
        }
        if self.config.rerank_top_n > self.config.retrieval_top_k {
            return Err(Error::Config(format!(
                "rerank_top_n ({}) must not exceed retrieval_top_k ({})",
                self.config.rerank_top_n, self.config.retrieval_top_k
            )));
        }
        Ok(self.config)
    }
}
