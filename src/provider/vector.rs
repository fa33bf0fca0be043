//! Vector-database search provider.
//!
//! Issues one batched POST against a collection search endpoint carrying all
//! sub-queries; the service embeds the queries and returns payload-bearing
//! scored points.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::model::{DocumentResult, ProviderKind, ProviderQuery};
use crate::provider::Provider;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Similarity search against a vector-DB collection.
pub struct VectorSearchProvider {
    id: String,
    base_url: String,
    collection: String,
    client: Client,
    timeout: Duration,
}

impl VectorSearchProvider {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            collection: collection.into(),
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct VectorSearchRequest<'a> {
    queries: &'a [String],
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct VectorSearchResponse {
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: String,
    score: f64,
    payload: PointPayload,
}

#[derive(Debug, Deserialize)]
struct PointPayload {
    #[serde(default)]
    title: Option<String>,
    content: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    meeting: Option<String>,
}

impl ScoredPoint {
    fn into_document(self) -> DocumentResult {
        let mut doc = DocumentResult::new(self.id, self.payload.content).with_score(self.score);
        doc.title = self.payload.title;
        doc.url = self.payload.url;
        doc.author = self.payload.author;
        doc.date = self.payload.date;
        for (key, value) in [
            ("speaker", self.payload.speaker),
            ("party", self.payload.party),
            ("meeting", self.payload.meeting),
        ] {
            if let Some(v) = value {
                doc.extras.insert(key.to_string(), v.into());
            }
        }
        doc
    }
}

#[async_trait]
impl Provider for VectorSearchProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::VectorSearch
    }

    async fn search(&self, query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
        let queries = if query.subqueries.is_empty() {
            std::slice::from_ref(&query.original_question)
        } else {
            query.subqueries.as_slice()
        };
        let request = VectorSearchRequest {
            queries,
            limit: query.limit,
        };

        let response = self
            .client
            .post(format!(
                "{}/collections/{}/search",
                self.base_url, self.collection
            ))
            .timeout(self.timeout)
            .json(&request)
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
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 => ProviderError::BadRequest(body),
                500..=599 => ProviderError::ServerError(status.as_u16(), body),
                code => ProviderError::HttpError(code, body),
            });
        }

        let parsed: VectorSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        debug!(provider = %self.id, count = parsed.points.len(), "Vector search returned points");

        Ok(parsed.points.into_iter().map(ScoredPoint::into_document).collect())
    }
}
