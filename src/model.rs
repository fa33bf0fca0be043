//! Shared value types for documents, queries and report sections.
//!
//! These types carry no behavior beyond construction helpers and identity
//! derivation. A [`DocumentResult`] is immutable once a provider returns it:
//! the fan-out may stamp a missing `source`, nothing else is ever edited.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of provider a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Vector database similarity search
    VectorSearch,
    /// Web search API
    WebSearch,
    /// Raw URL fetch
    DirectFetch,
    /// Operator-supplied seed documents
    Seed,
}

/// Origin of a document: which provider produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub provider_id: String,
    pub kind: ProviderKind,
}

/// A single retrieved document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Provider-scoped document id
    pub id: String,

    /// Document title, when the provider has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Extracted text content
    pub content: String,

    /// Canonical URL, when the document has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Publication date, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    /// Author or speaker name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Provider relevance score (higher = more relevant)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Producing provider; stamped by the fan-out if the provider left it unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DocumentSource>,

    /// Provider-specific metadata (speaker, party, meeting name, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extras: HashMap<String, serde_json::Value>,
}

impl DocumentResult {
    /// Create a document with the required fields only.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            content: content.into(),
            url: None,
            date: None,
            author: None,
            score: None,
            source: None,
            extras: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_source(mut self, provider_id: impl Into<String>, kind: ProviderKind) -> Self {
        self.source = Some(DocumentSource {
            provider_id: provider_id.into(),
            kind,
        });
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Score with missing treated as 0 (used for result ordering).
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// Derive the canonical identity of this document.
    pub fn evidence_key(&self) -> EvidenceKey {
        EvidenceKey::of(self)
    }
}

/// Canonical identity of a retrieved document: its URL if present, else
/// `provider_id:document_id`. Two documents with the same key are the same
/// underlying fact, even across providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceKey(String);

impl EvidenceKey {
    pub fn of(doc: &DocumentResult) -> Self {
        if let Some(url) = &doc.url {
            Self(url.clone())
        } else {
            let provider = doc
                .source
                .as_ref()
                .map(|s| s.provider_id.as_str())
                .unwrap_or("unknown");
            Self(format!("{}:{}", provider, doc.id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvidenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One structured query fanned out to a set of providers.
///
/// Constructed per section per iteration and never reused across sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderQuery {
    /// The user's original research question
    pub original_question: String,

    /// Diversified sub-queries for this section/iteration
    pub subqueries: Vec<String>,

    /// Per-provider result count limit
    pub limit: usize,

    /// URLs the direct-fetch provider should pull
    #[serde(default)]
    pub seed_urls: Vec<String>,
}

/// A named retrieval target of the eventual report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section key, e.g. "timeline" or "background"
    pub name: String,

    /// Allow-list of provider ids this section may query
    pub providers: Vec<String>,

    /// Target unique-document count; 0 = already satisfiable from existing
    /// evidence, no retrieval needed
    pub target: usize,
}

impl Section {
    pub fn new(name: impl Into<String>, providers: Vec<String>, target: usize) -> Self {
        Self {
            name: name.into(),
            providers,
            target,
        }
    }

    pub fn allows(&self, provider_id: &str) -> bool {
        self.providers.iter().any(|p| p == provider_id)
    }
}
