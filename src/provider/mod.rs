//! Document providers.
//!
//! The orchestration core depends only on the [`Provider`] trait: one
//! capability, `search`, with tolerant-of-failure semantics (the fan-out
//! treats any error as an empty contribution). Timeouts and retries live in
//! each implementation, never in the fan-out.

pub mod fetch;
pub mod seed;
pub mod vector;
pub mod web;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::{DocumentResult, ProviderKind, ProviderQuery};

pub use fetch::DirectFetchProvider;
pub use seed::SeedDocumentProvider;
pub use vector::VectorSearchProvider;
pub use web::WebSearchProvider;

/// A searchable document source.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable id, referenced by section allow-lists.
    fn id(&self) -> &str;

    /// What kind of source this is (stamped onto unstamped results).
    fn kind(&self) -> ProviderKind;

    /// Execute one structured query against this source.
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<DocumentResult>, ProviderError>;
}
