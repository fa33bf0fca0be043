//! Direct URL fetch provider.
//!
//! Pulls the query's seed URLs and turns each response body into a document.
//! A URL that fails to fetch is logged and skipped; one bad seed never costs
//! the others.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::model::{DocumentResult, ProviderKind, ProviderQuery};
use crate::provider::Provider;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Cap on stored body size to avoid dragging whole sites into memory.
const MAX_CONTENT_CHARS: usize = 20_000;

/// Fetches raw documents from explicit URLs.
pub struct DirectFetchProvider {
    id: String,
    client: Client,
    timeout: Duration,
}

impl DirectFetchProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_one(&self, url: &str) -> Result<DocumentResult, ProviderError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else if e.is_connect() {
                    ProviderError::Connection(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpError(status.as_u16(), url.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        let content: String = body.chars().take(MAX_CONTENT_CHARS).collect();

        Ok(DocumentResult::new(url, content).with_url(url))
    }
}

#[async_trait]
impl Provider for DirectFetchProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DirectFetch
    }

    async fn search(&self, query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
        let mut docs = Vec::new();
        for url in &query.seed_urls {
            match self.fetch_one(url).await {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    warn!(provider = %self.id, url = %url, error = %e, "Seed URL fetch failed; skipping");
                }
            }
        }
        debug!(provider = %self.id, count = docs.len(), "Fetched seed documents");
        Ok(docs)
    }
}
