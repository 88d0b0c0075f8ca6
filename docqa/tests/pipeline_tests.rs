//! End-to-end pipeline tests with deterministic stub collaborators.
//!
//! No network is involved: every collaborator is an in-process stub that
//! records how it was called, so these tests pin down the pipeline's
//! contract enforcement between stages.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use docqa::answerer::Answerer;
use docqa::chunking::BoundaryChunker;
use docqa::document::{Document, Embedding, RerankedChunk};
use docqa::embedding::{Embedder, EmbeddingRole};
use docqa::error::{Error, Result};
use docqa::reranker::Reranker;
use docqa::source::DocumentSource;
use docqa::{Pipeline, PipelineConfig};

const DIM: usize = 8;

/// Deterministic text-to-vector mapping so ranking has real structure.
fn mock_embed(text: &str) -> Embedding {
    let mut embedding = vec![0.0f32; DIM];
    for (i, b) in text.bytes().enumerate() {
        embedding[i % DIM] += b as f32 / 1000.0;
    }
    embedding
}

#[derive(Default)]
struct StaticSource {
    text: String,
    calls: AtomicUsize,
}

impl StaticSource {
    fn new(text: &str) -> Self {
        Self { text: text.to_string(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn fetch(&self, identifier: &str) -> Result<Document> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Document { id: identifier.to_string(), text: self.text.clone() })
    }
}

/// A source that never responds within any reasonable timeout.
struct StalledSource;

#[async_trait]
impl DocumentSource for StalledSource {
    async fn fetch(&self, _identifier: &str) -> Result<Document> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!("sleep outlives every test timeout")
    }
}

#[derive(Default)]
struct StubEmbedder {
    /// Return one embedding more than requested for document batches.
    extra_document_vector: bool,
    calls: AtomicUsize,
    query_texts: Mutex<Vec<String>>,
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[&str], role: EmbeddingRole) -> Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if role == EmbeddingRole::Query {
            let mut queries = self.query_texts.lock().unwrap();
            queries.extend(texts.iter().map(|t| t.to_string()));
        }

        let mut embeddings: Vec<Embedding> = texts.iter().map(|t| mock_embed(t)).collect();
        if self.extra_document_vector && role == EmbeddingRole::Document {
            embeddings.push(vec![0.0; DIM]);
        }
        Ok(embeddings)
    }
}

/// Returns up to `top_n` candidates in reverse order with synthetic
/// relevance scores, exercising "rerank order supersedes similarity order".
#[derive(Default)]
struct ReversingReranker {
    calls: AtomicUsize,
}

#[async_trait]
impl Reranker for ReversingReranker {
    async fn rerank(
        &self,
        _query: &str,
        candidates: &[&str],
        top_n: usize,
    ) -> Result<Vec<RerankedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let take = top_n.min(candidates.len());
        Ok((0..take)
            .rev()
            .enumerate()
            .map(|(rank, index)| RerankedChunk {
                index,
                text: candidates[index].to_string(),
                relevance: 0.9 - rank as f32 * 0.1,
            })
            .collect())
    }
}

struct EmptyReranker;

#[async_trait]
impl Reranker for EmptyReranker {
    async fn rerank(&self, _: &str, _: &[&str], _: usize) -> Result<Vec<RerankedChunk>> {
        Ok(Vec::new())
    }
}

struct OutOfRangeReranker;

#[async_trait]
impl Reranker for OutOfRangeReranker {
    async fn rerank(&self, _: &str, _: &[&str], _: usize) -> Result<Vec<RerankedChunk>> {
        Ok(vec![RerankedChunk { index: 999, text: "bogus".to_string(), relevance: 1.0 }])
    }
}

/// Ignores `top_n` and returns every candidate.
struct OversizedReranker;

#[async_trait]
impl Reranker for OversizedReranker {
    async fn rerank(
        &self,
        _query: &str,
        candidates: &[&str],
        _top_n: usize,
    ) -> Result<Vec<RerankedChunk>> {
        Ok(candidates
            .iter()
            .enumerate()
            .map(|(index, text)| RerankedChunk {
                index,
                text: text.to_string(),
                relevance: 0.5,
            })
            .collect())
    }
}

/// Returns the same candidate twice.
struct DuplicatingReranker;

#[async_trait]
impl Reranker for DuplicatingReranker {
    async fn rerank(
        &self,
        _query: &str,
        candidates: &[&str],
        _top_n: usize,
    ) -> Result<Vec<RerankedChunk>> {
        let entry = RerankedChunk { index: 0, text: candidates[0].to_string(), relevance: 0.5 };
        Ok(vec![entry.clone(), entry])
    }
}

#[derive(Default)]
struct RecordingAnswerer {
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
    last_grounding: Mutex<Vec<String>>,
}

#[async_trait]
impl Answerer for RecordingAnswerer {
    async fn generate(&self, query: &str, grounding: &[&str], _style: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());
        *self.last_grounding.lock().unwrap() = grounding.iter().map(|g| g.to_string()).collect();
        Ok(format!("answer from {} grounding texts", grounding.len()))
    }
}

const ARTICLE: &str = "Machine learning studies statistical models. \
Overfitting happens when a model memorizes noise. \
Regularization penalizes model complexity. \
Cross-validation estimates generalization error.";

fn test_config() -> PipelineConfig {
    PipelineConfig::builder()
        .chunk_size(60)
        .chunk_overlap(10)
        .retrieval_top_k(5)
        .rerank_top_n(3)
        .build()
        .unwrap()
}

fn build_pipeline(
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
    answerer: Arc<dyn Answerer>,
) -> Pipeline {
    let config = test_config();
    Pipeline::builder()
        .chunker(Arc::new(
            BoundaryChunker::new(config.chunk_size, config.chunk_overlap).unwrap(),
        ))
        .config(config)
        .source(source)
        .embedder(embedder)
        .reranker(reranker)
        .answerer(answerer)
        .build()
        .unwrap()
}

#[tokio::test]
async fn happy_path_produces_grounded_answer() {
    let reranker = Arc::new(ReversingReranker::default());
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        Arc::new(StubEmbedder::default()),
        reranker.clone(),
        answerer.clone(),
    );

    let answer = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap();

    assert_eq!(answer.text, "answer from 3 grounding texts");
    assert_eq!(answer.grounding.len(), 3);
    assert_eq!(reranker.calls.load(Ordering::SeqCst), 1);
    // The grounding handed to the answerer is exactly the reranked set,
    // in rerank order.
    assert_eq!(*answerer.last_grounding.lock().unwrap(), answer.grounding);
}

#[tokio::test]
async fn identical_question_reaches_embedder_and_answerer() {
    let embedder = Arc::new(StubEmbedder::default());
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        embedder.clone(),
        Arc::new(ReversingReranker::default()),
        answerer.clone(),
    );

    pipeline.answer("Machine learning", "  What is regularization?  ").await.unwrap();

    let queries = embedder.query_texts.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0], "What is regularization?");
    assert_eq!(
        answerer.last_query.lock().unwrap().as_deref(),
        Some("What is regularization?")
    );
}

#[tokio::test]
async fn blank_question_is_rejected_before_any_collaborator_call() {
    let source = Arc::new(StaticSource::new(ARTICLE));
    let embedder = Arc::new(StubEmbedder::default());
    let reranker = Arc::new(ReversingReranker::default());
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline =
        build_pipeline(source.clone(), embedder.clone(), reranker.clone(), answerer.clone());

    let err = pipeline.answer("Machine learning", "   ").await.unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embedding_count_mismatch_aborts_without_an_answer() {
    let embedder =
        Arc::new(StubEmbedder { extra_document_vector: true, ..StubEmbedder::default() });
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        embedder,
        Arc::new(ReversingReranker::default()),
        answerer.clone(),
    );

    let err = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap_err();

    assert!(matches!(err, Error::DimensionMismatch(_)), "got {err:?}");
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_rerank_result_fails_the_run() {
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        Arc::new(StubEmbedder::default()),
        Arc::new(EmptyReranker),
        answerer.clone(),
    );

    let err = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap_err();

    assert!(matches!(err, Error::EmptyResult(_)), "got {err:?}");
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn out_of_range_rerank_index_is_a_collaborator_failure() {
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        Arc::new(StubEmbedder::default()),
        Arc::new(OutOfRangeReranker),
        Arc::new(RecordingAnswerer::default()),
    );

    let err = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap_err();

    assert!(matches!(err, Error::CollaboratorUnavailable { .. }), "got {err:?}");
}

#[tokio::test]
async fn oversized_rerank_result_is_a_collaborator_failure() {
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        Arc::new(StubEmbedder::default()),
        Arc::new(OversizedReranker),
        answerer.clone(),
    );

    let err = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap_err();

    match err {
        Error::CollaboratorUnavailable { collaborator, message } => {
            assert_eq!(collaborator, "reranker");
            assert!(message.contains("at most 3"), "got {message}");
        }
        other => panic!("expected collaborator failure, got {other:?}"),
    }
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_rerank_index_is_a_collaborator_failure() {
    let answerer = Arc::new(RecordingAnswerer::default());
    let pipeline = build_pipeline(
        Arc::new(StaticSource::new(ARTICLE)),
        Arc::new(StubEmbedder::default()),
        Arc::new(DuplicatingReranker),
        answerer.clone(),
    );

    let err = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap_err();

    match err {
        Error::CollaboratorUnavailable { collaborator, message } => {
            assert_eq!(collaborator, "reranker");
            assert!(message.contains("more than once"), "got {message}");
        }
        other => panic!("expected collaborator failure, got {other:?}"),
    }
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_collaborator_times_out_as_a_failure() {
    let pipeline = build_pipeline(
        Arc::new(StalledSource),
        Arc::new(StubEmbedder::default()),
        Arc::new(ReversingReranker::default()),
        Arc::new(RecordingAnswerer::default()),
    );

    let err = pipeline.answer("Machine learning", "What is overfitting?").await.unwrap_err();

    match err {
        Error::CollaboratorUnavailable { collaborator, message } => {
            assert_eq!(collaborator, "document source");
            assert!(message.contains("timed out"), "got {message}");
        }
        other => panic!("expected timeout failure, got {other:?}"),
    }
}

#[test]
fn builder_requires_every_collaborator() {
    let err = Pipeline::builder().config(test_config()).build().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
