//! Query-planning seam.
//!
//! The planner is an external collaborator (an opaque text-generation call in
//! production); the core only consumes its structured output as seed strings
//! for follow-up generation. [`StaticPlanner`] covers wiring and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::Entities;

/// How involved the question is, as judged by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanComplexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

/// Structured output of a planning call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Seed sub-queries; treated as opaque strings downstream
    pub subqueries: Vec<String>,

    /// Entities the planner recognized up front
    #[serde(default)]
    pub entities: Entities,

    /// Retrieval strategies the planner enabled, by name
    #[serde(default)]
    pub enabled_strategies: Vec<String>,

    /// Planner self-reported confidence (0.0 to 1.0)
    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub complexity: PlanComplexity,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Planner backend error: {0}")]
    Backend(String),

    #[error("Planner returned malformed output: {0}")]
    Malformed(String),
}

/// Produces a research plan for a user question.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, question: &str) -> Result<ResearchPlan, PlanError>;
}

/// Fixed-plan implementation for tests and pre-planned runs.
pub struct StaticPlanner {
    plan: ResearchPlan,
}

impl StaticPlanner {
    pub fn new(plan: ResearchPlan) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl Planner for StaticPlanner {
    async fn plan(&self, _question: &str) -> Result<ResearchPlan, PlanError> {
        Ok(self.plan.clone())
    }
}
