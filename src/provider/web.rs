//! Web-search provider.
//!
//! Speaks a JSON POST search API with bearer authentication. Each sub-query
//! in the [`ProviderQuery`] becomes one API call; transient failures are
//! retried with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::model::{DocumentResult, ProviderKind, ProviderQuery};
use crate::provider::Provider;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_RETRIES: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Web search over a JSON POST API.
pub struct WebSearchProvider {
    id: String,
    api_key: String,
    base_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u32,
}

impl WebSearchProvider {
    pub fn new(id: impl Into<String>, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
        }
    }

    /// Read the API key from `WEB_SEARCH_API_KEY`.
    pub fn from_env(id: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = std::env::var("WEB_SEARCH_API_KEY")
            .map_err(|_| ProviderError::MissingCredentials("WEB_SEARCH_API_KEY not set".into()))?;
        Ok(Self::new(id, api_key, base_url))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn search_one(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        let request = SearchRequest {
            query: query.to_string(),
            max_results: limit,
        };

        let mut last_error = ProviderError::Network("no attempts made".into());
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1));
                debug!(provider = %self.id, attempt, delay_ms = delay.as_millis() as u64, "Retrying web search");
                tokio::time::sleep(delay).await;
            }

            match self.post_search(&request).await {
                Ok(response) => return Ok(response.results),
                Err(e) if e.is_retryable() => {
                    warn!(provider = %self.id, error = %e, "Web search failed, will retry");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }

    async fn post_search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(self.timeout)
            .json(request)
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
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => ProviderError::Unauthorized,
            429 => ProviderError::RateLimited,
            400 => ProviderError::BadRequest(body),
            500..=599 => ProviderError::ServerError(status.as_u16(), body),
            code => ProviderError::HttpError(code, body),
        })
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    url: String,
    content: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    published_date: Option<DateTime<Utc>>,
}

impl SearchHit {
    fn into_document(self) -> DocumentResult {
        let mut doc = DocumentResult::new(self.url.clone(), self.content)
            .with_title(self.title)
            .with_url(self.url);
        doc.score = self.score;
        doc.date = self.published_date;
        doc
    }
}

#[async_trait]
impl Provider for WebSearchProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::WebSearch
    }

    async fn search(&self, query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
        let subqueries: Vec<&str> = if query.subqueries.is_empty() {
            vec![query.original_question.as_str()]
        } else {
            query.subqueries.iter().map(String::as_str).collect()
        };

        let mut docs = Vec::new();
        for subquery in subqueries {
            let hits = self.search_one(subquery, query.limit).await?;
            debug!(provider = %self.id, subquery, count = hits.len(), "Web search returned hits");
            docs.extend(hits.into_iter().map(SearchHit::into_document));
        }
        Ok(docs)
    }
}
