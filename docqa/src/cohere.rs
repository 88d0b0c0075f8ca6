//! Cohere-backed collaborators: embedding, reranking, and chat generation.
//!
//! This module is only available when the `cohere` feature is enabled.
//! Each collaborator calls the corresponding Cohere v1 endpoint directly
//! via `reqwest`; nothing is cached between calls and the API key is held
//! only for the lifetime of the client value.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::answerer::Answerer;
use crate::document::{Embedding, RerankedChunk};
use crate::embedding::{Embedder, EmbeddingRole};
use crate::error::{Error, Result};
use crate::reranker::Reranker;

/// Base URL for the Cohere v1 API.
const COHERE_API_BASE: &str = "https://api.cohere.com/v1";

/// Default embedding model.
const DEFAULT_EMBED_MODEL: &str = "embed-english-v3.0";

/// Default rerank model.
const DEFAULT_RERANK_MODEL: &str = "rerank-english-v2.0";

/// Default generation model.
const DEFAULT_CHAT_MODEL: &str = "command-r";

/// Default generation temperature.
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Environment variable consulted by the `from_env` constructors.
pub const COHERE_API_KEY_VAR: &str = "COHERE_API_KEY";

fn require_api_key(api_key: impl Into<String>) -> Result<String> {
    let api_key = api_key.into();
    if api_key.trim().is_empty() {
        return Err(Error::InvalidInput("Cohere API key must not be empty".to_string()));
    }
    Ok(api_key)
}

fn api_key_from_env() -> Result<String> {
    std::env::var(COHERE_API_KEY_VAR).map_err(|_| {
        Error::InvalidInput(format!("{COHERE_API_KEY_VAR} environment variable not set"))
    })
}

/// POST a JSON body to a Cohere endpoint and deserialize the response.
///
/// Non-2xx statuses are surfaced as [`Error::CollaboratorUnavailable`],
/// using the API's own error message when the body parses as one.
async fn post_json<B: Serialize, T: DeserializeOwned>(
    client: &reqwest::Client,
    api_key: &str,
    endpoint: &str,
    collaborator: &str,
    body: &B,
) -> Result<T> {
    let url = format!("{COHERE_API_BASE}/{endpoint}");
    let response =
        client.post(&url).bearer_auth(api_key).json(body).send().await.map_err(|e| {
            error!(collaborator, error = %e, "request failed");
            Error::collaborator(collaborator, format!("request failed: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        error!(collaborator, %status, "API error");
        return Err(Error::collaborator(collaborator, format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(collaborator, error = %e, "failed to parse response");
        Error::collaborator(collaborator, format!("failed to parse response: {e}"))
    })
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    message: String,
}

// ── Embedder ───────────────────────────────────────────────────────

/// An [`Embedder`] backed by the Cohere `/v1/embed` endpoint.
///
/// Documents are embedded with `input_type = search_document` and queries
/// with `input_type = search_query`, so the two land in compatible regions
/// of the vector space.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::cohere::CohereEmbedder;
/// use docqa::embedding::EmbeddingRole;
///
/// let embedder = CohereEmbedder::new("co-...")?;
/// let vectors = embedder.embed(&["hello world"], EmbeddingRole::Query).await?;
/// ```
pub struct CohereEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CohereEmbedder {
    /// Create a new embedder with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key is empty. No network
    /// call is made here.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_api_key(api_key)?,
            model: DEFAULT_EMBED_MODEL.to_string(),
        })
    }

    /// Create a new embedder from the `COHERE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the embedding model (e.g. `embed-multilingual-v3.0`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [&'a str],
    input_type: &'a str,
    embedding_types: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: EmbedVectors,
}

#[derive(Deserialize)]
struct EmbedVectors {
    float: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for CohereEmbedder {
    async fn embed(&self, texts: &[&str], role: EmbeddingRole) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let input_type = match role {
            EmbeddingRole::Document => "search_document",
            EmbeddingRole::Query => "search_query",
        };

        debug!(
            batch_size = texts.len(),
            model = %self.model,
            input_type,
            "Cohere embed request"
        );

        let request = EmbedRequest {
            model: &self.model,
            texts,
            input_type,
            embedding_types: ["float"],
        };

        let response: EmbedResponse =
            post_json(&self.client, &self.api_key, "embed", "Cohere embedder", &request).await?;

        Ok(response.embeddings.float)
    }
}

// ── Reranker ───────────────────────────────────────────────────────

/// A [`Reranker`] backed by the Cohere `/v1/rerank` endpoint.
///
/// Returned indices refer to positions in the candidate slice that was
/// passed in, and the relevance scores come from the rerank model rather
/// than cosine similarity.
pub struct CohereReranker {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CohereReranker {
    /// Create a new reranker with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_api_key(api_key)?,
            model: DEFAULT_RERANK_MODEL.to_string(),
        })
    }

    /// Create a new reranker from the `COHERE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the rerank model (e.g. `rerank-english-v3.0`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [&'a str],
    top_n: usize,
    return_documents: bool,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
    document: RerankDocument,
}

#[derive(Deserialize)]
struct RerankDocument {
    text: String,
}

#[async_trait]
impl Reranker for CohereReranker {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[&str],
        top_n: usize,
    ) -> Result<Vec<RerankedChunk>> {
        debug!(
            candidates = candidates.len(),
            top_n,
            model = %self.model,
            "Cohere rerank request"
        );

        let request = RerankRequest {
            model: &self.model,
            query,
            documents: candidates,
            top_n,
            return_documents: true,
        };

        let response: RerankResponse =
            post_json(&self.client, &self.api_key, "rerank", "Cohere reranker", &request).await?;

        Ok(response
            .results
            .into_iter()
            .map(|r| RerankedChunk {
                index: r.index,
                text: r.document.text,
                relevance: r.relevance_score,
            })
            .collect())
    }
}

// ── Answerer ───────────────────────────────────────────────────────

/// An [`Answerer`] backed by the Cohere `/v1/chat` endpoint.
///
/// Grounding texts are passed as `documents` entries so the model answers
/// from them rather than from open-ended recall; the style instructions
/// become the chat `preamble`.
pub struct CohereGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl CohereGenerator {
    /// Create a new generator with the given API key.
    ///
    /// Uses the default model (`command-r`) and temperature (0.3).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_api_key(api_key)?,
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a new generator from the `COHERE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env()?)
    }

    /// Set the generation model (e.g. `command-r-plus`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    documents: Vec<ChatDocument>,
    preamble: &'a str,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatDocument {
    title: String,
    snippet: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

#[async_trait]
impl Answerer for CohereGenerator {
    async fn generate(&self, query: &str, grounding: &[&str], style: &str) -> Result<String> {
        debug!(
            grounding = grounding.len(),
            model = %self.model,
            temperature = self.temperature,
            "Cohere chat request"
        );

        let documents = grounding
            .iter()
            .enumerate()
            .map(|(i, snippet)| ChatDocument {
                title: format!("chunk-{i}"),
                snippet: (*snippet).to_string(),
            })
            .collect();

        let request = ChatRequest {
            model: &self.model,
            message: query,
            documents,
            preamble: style,
            temperature: self.temperature,
        };

        let response: ChatResponse =
            post_json(&self.client, &self.api_key, "chat", "Cohere answerer", &request).await?;

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected_before_any_call() {
        assert!(matches!(CohereEmbedder::new(""), Err(Error::InvalidInput(_))));
        assert!(matches!(CohereReranker::new("  "), Err(Error::InvalidInput(_))));
        assert!(matches!(CohereGenerator::new(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn defaults_match_documented_models() {
        let embedder = CohereEmbedder::new("key").unwrap();
        assert_eq!(embedder.model, DEFAULT_EMBED_MODEL);

        let reranker = CohereReranker::new("key").unwrap();
        assert_eq!(reranker.model, DEFAULT_RERANK_MODEL);

        let generator = CohereGenerator::new("key").unwrap();
        assert_eq!(generator.model, DEFAULT_CHAT_MODEL);
        assert_eq!(generator.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn builders_override_model_and_temperature() {
        let generator =
            CohereGenerator::new("key").unwrap().with_model("command-r-plus").with_temperature(0.7);
        assert_eq!(generator.model, "command-r-plus");
        assert_eq!(generator.temperature, 0.7);
    }
}
