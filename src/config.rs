//! Orchestrator configuration.
//!
//! Tunables with their documented defaults, loadable from a serde source or
//! overridden from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `RESEARCH_MAX_ITERATIONS` | Iteration cap of the retrieval loop |
//! | `RESEARCH_FOLLOWUP_LIMIT` | Max follow-up queries per section/iteration |

use serde::{Deserialize, Serialize};

/// Tunables for the retrieval orchestration loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound on retrieval iterations; the only built-in cap on total work
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Max follow-up queries generated per section per iteration (k)
    #[serde(default = "default_followup_limit")]
    pub followup_limit: usize,

    /// MMR relevance/diversity balance (λ)
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,

    /// Penalty weight for candidates restricted to an already-seen domain (α)
    #[serde(default = "default_domain_overlap_penalty")]
    pub domain_overlap_penalty: f64,

    /// Jaccard similarity at or above which a candidate is a near-duplicate
    #[serde(default = "default_near_duplicate_threshold")]
    pub near_duplicate_threshold: f64,

    /// How many seen domains get `-site:` exclusion hints
    #[serde(default = "default_negative_hint_domains")]
    pub negative_hint_domains: usize,

    /// Floor for the per-call result limit handed to providers
    #[serde(default = "default_min_section_limit")]
    pub min_section_limit: usize,
}

fn default_max_iterations() -> usize {
    3
}

fn default_followup_limit() -> usize {
    5
}

fn default_mmr_lambda() -> f64 {
    0.6
}

fn default_domain_overlap_penalty() -> f64 {
    0.2
}

fn default_near_duplicate_threshold() -> f64 {
    0.7
}

fn default_negative_hint_domains() -> usize {
    3
}

fn default_min_section_limit() -> usize {
    3
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            followup_limit: default_followup_limit(),
            mmr_lambda: default_mmr_lambda(),
            domain_overlap_penalty: default_domain_overlap_penalty(),
            near_duplicate_threshold: default_near_duplicate_threshold(),
            negative_hint_domains: default_negative_hint_domains(),
            min_section_limit: default_min_section_limit(),
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment-variable overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_usize("RESEARCH_MAX_ITERATIONS") {
            config.max_iterations = v;
        }
        if let Some(v) = env_usize("RESEARCH_FOLLOWUP_LIMIT") {
            config.followup_limit = v;
        }
        config
    }

    /// Per-provider result limit for one section call: `max(floor, limit/2)`.
    pub fn section_limit(&self, run_limit: usize) -> usize {
        (run_limit / 2).max(self.min_section_limit)
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.parse().ok()
}
