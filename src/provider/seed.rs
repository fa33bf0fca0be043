//! In-memory seed-document provider.
//!
//! Lets an operator inject evidence that is already in hand (earlier exports,
//! curated records) into the retrieval loop through the same trait as the
//! live providers.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::{DocumentResult, ProviderKind, ProviderQuery};
use crate::provider::Provider;

/// Serves a fixed set of documents, capped at the query limit.
pub struct SeedDocumentProvider {
    id: String,
    docs: Vec<DocumentResult>,
}

impl SeedDocumentProvider {
    pub fn new(id: impl Into<String>, docs: Vec<DocumentResult>) -> Self {
        Self { id: id.into(), docs }
    }
}

#[async_trait]
impl Provider for SeedDocumentProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Seed
    }

    async fn search(&self, query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError> {
        Ok(self.docs.iter().take(query.limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: usize) -> ProviderQuery {
        ProviderQuery {
            original_question: "q".into(),
            subqueries: vec![],
            limit,
            seed_urls: vec![],
        }
    }

    #[test]
    fn test_returns_docs_up_to_limit() {
        let docs = (0..5)
            .map(|i| DocumentResult::new(format!("seed-{i}"), "content"))
            .collect();
        let provider = SeedDocumentProvider::new("seed", docs);

        let returned = tokio_test::block_on(provider.search(&query(3))).unwrap();
        assert_eq!(returned.len(), 3);
        assert_eq!(returned[0].id, "seed-0");

        let all = tokio_test::block_on(provider.search(&query(10))).unwrap();
        assert_eq!(all.len(), 5);
    }
}
