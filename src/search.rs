//! Concurrent multi-provider search with per-provider failure isolation.
//!
//! One `search_across` call fans a single [`ProviderQuery`] out to every
//! provider at once and suspends until all of them settle. A provider that
//! fails (or panics) contributes an empty result set; it never cancels its
//! siblings and its error never reaches the caller. Timeouts and retries are
//! each provider's own responsibility.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{DocumentResult, DocumentSource, ProviderQuery};
use crate::provider::Provider;

/// Fans queries out to providers and merges their results.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSourceSearchService;

impl MultiSourceSearchService {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch `query` to every provider concurrently; wait for all of them,
    /// then merge, dedup by evidence key (first seen wins, provider order
    /// preserved) and sort by descending score.
    pub async fn search_across(
        &self,
        providers: &[Arc<dyn Provider>],
        query: &ProviderQuery,
    ) -> Vec<DocumentResult> {
        let mut handles = Vec::with_capacity(providers.len());
        for provider in providers {
            let provider = Arc::clone(provider);
            let query = query.clone();
            handles.push(tokio::spawn(async move {
                let id = provider.id().to_string();
                let kind = provider.kind();
                (id, kind, provider.search(&query).await)
            }));
        }

        // Wait-for-all join; results come back in provider order.
        let settled = futures::future::join_all(handles).await;

        let mut merged: Vec<DocumentResult> = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        for (i, outcome) in settled.into_iter().enumerate() {
            let docs = match outcome {
                Ok((id, kind, Ok(mut docs))) => {
                    for doc in &mut docs {
                        if doc.source.is_none() {
                            doc.source = Some(DocumentSource {
                                provider_id: id.clone(),
                                kind,
                            });
                        }
                    }
                    debug!(provider = %id, count = docs.len(), "Provider returned results");
                    docs
                }
                Ok((id, _, Err(err))) => {
                    warn!(provider = %id, error = %err, "Provider search failed; contributing no results");
                    Vec::new()
                }
                Err(join_err) => {
                    warn!(provider_index = i, error = %join_err, "Provider task panicked; contributing no results");
                    Vec::new()
                }
            };

            for doc in docs {
                let key = doc.evidence_key();
                if seen_keys.insert(key.as_str().to_string()) {
                    merged.push(doc);
                }
            }
        }

        // Stable sort: score ties keep first-seen order.
        merged.sort_by(|a, b| {
            b.score_or_zero()
                .partial_cmp(&a.score_or_zero())
                .unwrap_or(Ordering::Equal)
        });
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::ProviderKind;
    use async_trait::async_trait;

    struct StubProvider {
        id: String,
        docs: Vec<DocumentResult>,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::WebSearch
        }

        async fn search(&self, _query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
            Ok(self.docs.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn id(&self) -> &str {
            "broken"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::WebSearch
        }

        async fn search(&self, _query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
            Err(ProviderError::ServerError(500, "boom".into()))
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl Provider for PanickingProvider {
        fn id(&self) -> &str {
            "panics"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::WebSearch
        }

        async fn search(&self, _query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
            panic!("provider bug")
        }
    }

    fn query() -> ProviderQuery {
        ProviderQuery {
            original_question: "q".into(),
            subqueries: vec!["q".into()],
            limit: 5,
            seed_urls: vec![],
        }
    }

    fn provider(id: &str, docs: Vec<DocumentResult>) -> Arc<dyn Provider> {
        Arc::new(StubProvider { id: id.into(), docs })
    }

    #[tokio::test]
    async fn test_merge_dedup_first_seen_wins() {
        // Spec example: provider A {id:x, url:http://a} score 0.9 and provider
        // B {id:y, url:http://a} score 0.5 collapse to one doc, score 0.9.
        let a = provider(
            "a",
            vec![DocumentResult::new("x", "").with_url("http://a").with_score(0.9)],
        );
        let b = provider(
            "b",
            vec![DocumentResult::new("y", "").with_url("http://a").with_score(0.5)],
        );

        let docs = MultiSourceSearchService::new().search_across(&[a, b], &query()).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].url.as_deref(), Some("http://a"));
        assert_eq!(docs[0].score, Some(0.9));
        assert_eq!(docs[0].source.as_ref().unwrap().provider_id, "a");
    }

    #[tokio::test]
    async fn test_first_seen_wins_even_with_lower_score() {
        let a = provider(
            "a",
            vec![DocumentResult::new("x", "").with_url("http://a").with_score(0.1)],
        );
        let b = provider(
            "b",
            vec![DocumentResult::new("y", "").with_url("http://a").with_score(0.9)],
        );

        let docs = MultiSourceSearchService::new().search_across(&[a, b], &query()).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].score, Some(0.1)); // first seen, not highest score
    }

    #[tokio::test]
    async fn test_sorted_descending_missing_score_is_zero() {
        let a = provider(
            "a",
            vec![
                DocumentResult::new("1", "").with_url("http://1").with_score(0.2),
                DocumentResult::new("2", "").with_url("http://2"),
                DocumentResult::new("3", "").with_url("http://3").with_score(0.8),
            ],
        );

        let docs = MultiSourceSearchService::new().search_across(&[a], &query()).await;
        let urls: Vec<_> = docs.iter().map(|d| d.url.clone().unwrap()).collect();
        assert_eq!(urls, vec!["http://3", "http://1", "http://2"]);
    }

    #[tokio::test]
    async fn test_sort_is_stable_on_ties() {
        let a = provider(
            "a",
            vec![
                DocumentResult::new("1", "").with_url("http://1").with_score(0.5),
                DocumentResult::new("2", "").with_url("http://2").with_score(0.5),
            ],
        );
        let b = provider(
            "b",
            vec![DocumentResult::new("3", "").with_url("http://3").with_score(0.5)],
        );

        let docs = MultiSourceSearchService::new().search_across(&[a, b], &query()).await;
        let urls: Vec<_> = docs.iter().map(|d| d.url.clone().unwrap()).collect();
        assert_eq!(urls, vec!["http://1", "http://2", "http://3"]);
    }

    #[tokio::test]
    async fn test_failing_provider_is_isolated() {
        let good = provider(
            "good",
            vec![DocumentResult::new("1", "").with_url("http://1").with_score(0.5)],
        );
        let docs = MultiSourceSearchService::new()
            .search_across(&[Arc::new(FailingProvider), good], &query())
            .await;
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_provider_is_isolated() {
        let good = provider(
            "good",
            vec![DocumentResult::new("1", "").with_url("http://1")],
        );
        let docs = MultiSourceSearchService::new()
            .search_across(&[Arc::new(PanickingProvider), good], &query())
            .await;
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_source_stamped_when_missing() {
        let unstamped = provider("vdb", vec![DocumentResult::new("1", "body")]);
        let docs = MultiSourceSearchService::new().search_across(&[unstamped], &query()).await;
        let source = docs[0].source.as_ref().unwrap();
        assert_eq!(source.provider_id, "vdb");
        assert_eq!(source.kind, ProviderKind::WebSearch);
    }

    #[tokio::test]
    async fn test_provider_set_source_preserved() {
        let pre_stamped = provider(
            "outer",
            vec![DocumentResult::new("1", "").with_source("inner", ProviderKind::Seed)],
        );
        let docs = MultiSourceSearchService::new().search_across(&[pre_stamped], &query()).await;
        assert_eq!(docs[0].source.as_ref().unwrap().provider_id, "inner");
    }

    #[tokio::test]
    async fn test_no_providers_yields_empty() {
        let docs = MultiSourceSearchService::new().search_across(&[], &query()).await;
        assert!(docs.is_empty());
    }
}
