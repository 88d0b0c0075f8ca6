//! Wikipedia document source via the MediaWiki API.
//!
//! This module is only available when the `wikipedia` feature is enabled.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::source::DocumentSource;

/// Default MediaWiki API endpoint (English Wikipedia).
const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// A [`DocumentSource`] that fetches an article's plain-text extract.
///
/// Uses `action=query&prop=extracts&explaintext` with redirect following,
/// so common alternate titles resolve to the canonical article.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::wikipedia::WikipediaSource;
///
/// let source = WikipediaSource::new();
/// let document = source.fetch("Machine learning").await?;
/// ```
pub struct WikipediaSource {
    client: reqwest::Client,
    api_url: String,
}

impl WikipediaSource {
    /// Create a source for English Wikipedia.
    pub fn new() -> Self {
        Self { client: reqwest::Client::new(), api_url: DEFAULT_API_URL.to_string() }
    }

    /// Point the source at a different MediaWiki API endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

impl Default for WikipediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Deserialize)]
struct QueryPages {
    pages: std::collections::HashMap<String, Page>,
}

#[derive(Deserialize)]
struct Page {
    title: Option<String>,
    extract: Option<String>,
}

#[async_trait]
impl DocumentSource for WikipediaSource {
    async fn fetch(&self, identifier: &str) -> Result<Document> {
        if identifier.trim().is_empty() {
            return Err(Error::InvalidInput("document identifier must not be empty".to_string()));
        }

        debug!(title = identifier, "fetching Wikipedia extract");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", identifier),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(title = identifier, error = %e, "Wikipedia request failed");
                Error::collaborator("Wikipedia source", format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!(title = identifier, %status, "Wikipedia API error");
            return Err(Error::collaborator(
                "Wikipedia source",
                format!("API returned {status}"),
            ));
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| {
            error!(title = identifier, error = %e, "failed to parse Wikipedia response");
            Error::collaborator("Wikipedia source", format!("failed to parse response: {e}"))
        })?;

        // The pages map has one entry keyed by page ID ("-1" when missing).
        let page = parsed
            .query
            .and_then(|q| q.pages.into_values().next())
            .ok_or_else(|| Error::EmptyResult(format!("no page found for '{identifier}'")))?;

        let text = page
            .extract
            .filter(|extract| !extract.is_empty())
            .ok_or_else(|| Error::EmptyResult(format!("no extract for page '{identifier}'")))?;

        let id = page.title.unwrap_or_else(|| identifier.to_string());
        debug!(title = %id, chars = text.len(), "fetched Wikipedia extract");

        Ok(Document { id, text })
    }
}
