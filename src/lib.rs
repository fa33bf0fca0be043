//! deep-research-core: multi-source retrieval orchestration.
//!
//! Answers a research question by iteratively querying heterogeneous document
//! sources (vector DB, web search, direct fetch) until each report section has
//! enough supporting evidence, then hands the collected evidence off to an
//! external synthesizer.
//!
//! The pieces, leaves first:
//! - [`model`] / [`state`]: shared value types and per-run mutable state
//! - [`search::MultiSourceSearchService`]: concurrent fan-out with per-provider
//!   failure isolation
//! - [`followup::FollowupGenerator`]: diversified, deduplicated, non-repeating
//!   follow-up queries per section per iteration
//! - [`dedup::DuplicationAnalyzer`]: duplicate statistics and strict dedup
//! - [`orchestrator::DeepResearchOrchestrator`]: the bounded iterative loop
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use deep_research_core::{
//!     DeepResearchOrchestrator, OrchestratorConfig, RunParams, Section,
//!     WebSearchProvider,
//! };
//!
//! let web = Arc::new(WebSearchProvider::from_env("web", "https://search.example.com")?);
//! let orchestrator = DeepResearchOrchestrator::new(OrchestratorConfig::from_env());
//! let outcome = orchestrator
//!     .run(RunParams {
//!         question: "カーボンプライシング".into(),
//!         base_subqueries: plan.subqueries,
//!         providers: vec![web],
//!         sections: vec![Section::new("overview", vec!["web".into()], 5)],
//!         limit: 10,
//!         seed_urls: vec![],
//!         seed_provider: None,
//!     })
//!     .await;
//! ```

pub mod config;
pub mod dedup;
pub mod entities;
pub mod error;
pub mod followup;
pub mod model;
pub mod orchestrator;
pub mod planner;
pub mod provider;
pub mod search;
pub mod similarity;
pub mod state;

// Re-exports for convenience
pub use config::OrchestratorConfig;
pub use dedup::{DuplicateSummary, DuplicationAnalyzer, DuplicationStatistics, SectionedDocument};
pub use entities::extract_entities;
pub use error::{OrchestratorError, ProviderError};
pub use followup::{FollowupContext, FollowupGenerator};
pub use model::{
    DocumentResult, DocumentSource, EvidenceKey, ProviderKind, ProviderQuery, Section,
};
pub use orchestrator::{DeepResearchOrchestrator, RunOutcome, RunParams};
pub use planner::{PlanComplexity, PlanError, Planner, ResearchPlan, StaticPlanner};
pub use provider::{
    DirectFetchProvider, Provider, SeedDocumentProvider, VectorSearchProvider, WebSearchProvider,
};
pub use search::MultiSourceSearchService;
pub use state::{CoverageReport, Entities, OrchestratorState, SectionHitMap};
