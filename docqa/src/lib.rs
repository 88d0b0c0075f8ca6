//! # docqa
//!
//! Single-document question answering with retrieval and reranking.
//!
//! ## Overview
//!
//! One run of the [`Pipeline`] answers one question over one reference
//! document: fetch the text, split it into overlapping chunks, embed the
//! chunks and the question, rank chunks by cosine similarity, refine the
//! short list with a rerank model, and generate an answer grounded in the
//! surviving chunks. All intermediate state lives inside the run and is
//! discarded when it ends; there is no persistent index.
//!
//! The AI-service calls sit behind four traits — [`Embedder`],
//! [`Reranker`], [`Answerer`], and [`DocumentSource`] — so providers can
//! be substituted (or stubbed for deterministic tests) without touching
//! the pipeline. Cohere-backed implementations of the first three live in
//! [`cohere`] and a Wikipedia document source in [`wikipedia`], each
//! behind a default-on feature flag.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa::{Pipeline, PipelineConfig};
//! use docqa::chunking::BoundaryChunker;
//! use docqa::cohere::{CohereEmbedder, CohereGenerator, CohereReranker};
//! use docqa::wikipedia::WikipediaSource;
//!
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::builder()
//!     .chunker(Arc::new(BoundaryChunker::new(config.chunk_size, config.chunk_overlap)?))
//!     .config(config)
//!     .source(Arc::new(WikipediaSource::new()))
//!     .embedder(Arc::new(CohereEmbedder::from_env()?))
//!     .reranker(Arc::new(CohereReranker::from_env()?))
//!     .answerer(Arc::new(CohereGenerator::from_env()?))
//!     .build()?;
//!
//! let answer = pipeline.answer("Machine learning", "What is overfitting?").await?;
//! println!("{}", answer.text);
//! ```

pub mod answerer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod ranking;
pub mod reranker;
pub mod source;

#[cfg(feature = "cohere")]
pub mod cohere;

#[cfg(feature = "wikipedia")]
pub mod wikipedia;

pub use answerer::Answerer;
pub use chunking::{BoundaryChunker, Chunker};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{Answer, Candidate, Chunk, Document, Embedding, RerankedChunk};
pub use embedding::{Embedder, EmbeddingRole};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use ranking::{Ranked, cosine_similarity, rank};
pub use reranker::Reranker;
pub use source::DocumentSource;
