//! Document source trait for fetching the reference text.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

/// A source of reference documents, fetched once per pipeline run.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the raw text for `identifier` (e.g. an article title).
    async fn fetch(&self, identifier: &str) -> Result<Document>;
}
