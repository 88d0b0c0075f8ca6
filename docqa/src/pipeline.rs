//! Pipeline orchestrator: fetch → chunk → embed → retrieve → rerank → generate.
//!
//! The [`Pipeline`] composes a [`DocumentSource`], a [`Chunker`], an
//! [`Embedder`], a [`Reranker`], and an [`Answerer`] into one synchronous
//! question-answering run. Each run owns its chunks, embeddings, and
//! candidate set; nothing survives past the run boundary.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa::{Pipeline, PipelineConfig, chunking::BoundaryChunker};
//!
//! let pipeline = Pipeline::builder()
//!     .config(PipelineConfig::default())
//!     .source(Arc::new(source))
//!     .chunker(Arc::new(BoundaryChunker::new(512, 50)?))
//!     .embedder(Arc::new(embedder))
//!     .reranker(Arc::new(reranker))
//!     .answerer(Arc::new(answerer))
//!     .build()?;
//!
//! let answer = pipeline.answer("Machine learning", "What is overfitting?").await?;
//! println!("{}", answer.text);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{error, info};

use crate::answerer::Answerer;
use crate::chunking::Chunker;
use crate::config::PipelineConfig;
use crate::document::{Answer, Candidate};
use crate::embedding::{Embedder, EmbeddingRole};
use crate::error::{Error, Result};
use crate::ranking;
use crate::reranker::Reranker;
use crate::source::DocumentSource;

/// The stages a pipeline run moves through, in order.
///
/// A failure at any stage aborts the run; there is no partial answer and
/// no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching the reference document from its source.
    Fetching,
    /// Splitting the document into overlapping chunks.
    Chunking,
    /// Embedding the chunks and the question.
    Embedding,
    /// Similarity-ranking chunk embeddings against the question.
    Retrieving,
    /// Refining the candidate set with the rerank model.
    Reranking,
    /// Generating the grounded answer.
    Generating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Chunking => "chunking",
            Stage::Embedding => "embedding",
            Stage::Retrieving => "retrieving",
            Stage::Reranking => "reranking",
            Stage::Generating => "generating",
        };
        f.write_str(name)
    }
}

/// The question-answering pipeline orchestrator.
///
/// Construct one via [`Pipeline::builder()`]. All collaborators are
/// required; in particular there is no way to silently skip reranking —
/// a reranker failure fails the run.
pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn DocumentSource>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
    answerer: Arc<dyn Answerer>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a new [`PipelineBuilder`].
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one full question-answering pass over the document named by
    /// `document_id`.
    ///
    /// The identical question string is given to the embedder (for the
    /// query embedding) and to the answerer, keeping retrieval and
    /// generation semantically consistent.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a blank question, before any
    ///   collaborator is called.
    /// - [`Error::DimensionMismatch`] when the embedder's output does not
    ///   line up with the chunk sequence.
    /// - [`Error::EmptyResult`] when no chunks survive splitting or the
    ///   reranker returns zero documents.
    /// - [`Error::CollaboratorUnavailable`] for any collaborator failure,
    ///   including per-call timeout expiry.
    pub async fn answer(&self, document_id: &str, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }

        // Fetching
        let document = self
            .call(Stage::Fetching, "document source", self.source.fetch(document_id))
            .await?;
        info!(stage = %Stage::Fetching, document.id = %document.id, chars = document.text.len(), "document fetched");

        // Chunking
        let chunks = self.chunker.split(&document.text).inspect_err(|e| {
            error!(stage = %Stage::Chunking, error = %e, "chunking failed");
        })?;
        if chunks.is_empty() {
            return Err(Error::EmptyResult("no chunks survived splitting".to_string()));
        }
        info!(stage = %Stage::Chunking, chunk_count = chunks.len(), "document chunked");

        // Embedding: the whole chunk batch, then the question.
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let chunk_embeddings = self
            .call(Stage::Embedding, "embedder", self.embedder.embed(&texts, EmbeddingRole::Document))
            .await?;
        if chunk_embeddings.len() != chunks.len() {
            let err = Error::DimensionMismatch(format!(
                "embedder returned {} embeddings for {} chunks",
                chunk_embeddings.len(),
                chunks.len()
            ));
            error!(stage = %Stage::Embedding, error = %err, "embedding count mismatch");
            return Err(err);
        }

        let query_embeddings = self
            .call(Stage::Embedding, "embedder", self.embedder.embed(&[question], EmbeddingRole::Query))
            .await?;
        let query_embedding = match query_embeddings.as_slice() {
            [embedding] => embedding,
            other => {
                let err = Error::DimensionMismatch(format!(
                    "embedder returned {} query embeddings, expected 1",
                    other.len()
                ));
                error!(stage = %Stage::Embedding, error = %err, "query embedding mismatch");
                return Err(err);
            }
        };
        info!(stage = %Stage::Embedding, dimensions = query_embedding.len(), "embeddings ready");

        // Retrieving
        let ranked =
            ranking::rank(query_embedding, &chunk_embeddings, self.config.retrieval_top_k)
                .inspect_err(|e| {
                    error!(stage = %Stage::Retrieving, error = %e, "similarity ranking failed");
                })?;
        let candidates: Vec<Candidate> = ranked
            .iter()
            .map(|r| Candidate { chunk: chunks[r.index].clone(), score: r.score })
            .collect();
        info!(stage = %Stage::Retrieving, candidates = candidates.len(), "candidate set built");

        // Reranking
        let candidate_texts: Vec<&str> =
            candidates.iter().map(|c| c.chunk.text.as_str()).collect();
        let reranked = self
            .call(
                Stage::Reranking,
                "reranker",
                self.reranker.rerank(question, &candidate_texts, self.config.rerank_top_n),
            )
            .await?;
        if reranked.is_empty() {
            return Err(Error::EmptyResult("reranker returned zero documents".to_string()));
        }
        if reranked.len() > self.config.rerank_top_n {
            return Err(Error::collaborator(
                "reranker",
                format!(
                    "returned {} documents, at most {} were requested",
                    reranked.len(),
                    self.config.rerank_top_n
                ),
            ));
        }
        let mut seen = vec![false; candidates.len()];
        for entry in &reranked {
            if entry.index >= candidates.len() {
                return Err(Error::collaborator(
                    "reranker",
                    format!(
                        "returned index {} outside candidate set of {}",
                        entry.index,
                        candidates.len()
                    ),
                ));
            }
            if seen[entry.index] {
                return Err(Error::collaborator(
                    "reranker",
                    format!("returned candidate index {} more than once", entry.index),
                ));
            }
            seen[entry.index] = true;
        }
        info!(stage = %Stage::Reranking, grounding = reranked.len(), "candidate set reranked");

        // Generating
        let grounding: Vec<String> = reranked.into_iter().map(|r| r.text).collect();
        let grounding_refs: Vec<&str> = grounding.iter().map(String::as_str).collect();
        let text = self
            .call(
                Stage::Generating,
                "answerer",
                self.answerer.generate(question, &grounding_refs, &self.config.style_preamble),
            )
            .await?;
        info!(stage = %Stage::Generating, answer_chars = text.len(), "run complete");

        Ok(Answer { text, grounding })
    }

    /// Run a collaborator call under the configured timeout.
    ///
    /// Expiry is treated as a collaborator failure, not a retryable
    /// condition.
    async fn call<T, F>(&self, stage: Stage, collaborator: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout(self.config.call_timeout, fut).await {
            Ok(result) => result.inspect_err(|e| {
                error!(%stage, collaborator, error = %e, "collaborator call failed");
            }),
            Err(_) => {
                error!(%stage, collaborator, timeout = ?self.config.call_timeout, "collaborator call timed out");
                Err(Error::collaborator(
                    collaborator,
                    format!("timed out after {:?}", self.config.call_timeout),
                ))
            }
        }
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// All fields are required. Call [`build()`](PipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    source: Option<Arc<dyn DocumentSource>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn Embedder>>,
    reranker: Option<Arc<dyn Reranker>>,
    answerer: Option<Arc<dyn Answerer>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document source.
    pub fn source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedder.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the reranker.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the answerer.
    pub fn answerer(mut self, answerer: Arc<dyn Answerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    /// Build the [`Pipeline`], validating that all fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any field is missing.
    pub fn build(self) -> Result<Pipeline> {
        let config =
            self.config.ok_or_else(|| Error::Config("config is required".to_string()))?;
        let source =
            self.source.ok_or_else(|| Error::Config("source is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| Error::Config("chunker is required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| Error::Config("embedder is required".to_string()))?;
        let reranker =
            self.reranker.ok_or_else(|| Error::Config("reranker is required".to_string()))?;
        let answerer =
            self.answerer.ok_or_else(|| Error::Config("answerer is required".to_string()))?;

        Ok(Pipeline { config, source, chunker, embedder, reranker, answerer })
    }
}
