//! The bounded iterative retrieval loop.
//!
//! One [`DeepResearchOrchestrator::run`] call drives up to `max_iterations`
//! passes over the report sections, generating diversified follow-up queries
//! per section, fanning them out to that section's allow-listed providers and
//! tracking coverage against per-section targets. Sections inside one
//! iteration run sequentially, in declaration order, so a later section's
//! entity recomputation sees documents gathered by earlier sections in the
//! same pass.
//!
//! There are no fatal outcomes: exhausting the iteration cap with partial
//! coverage is a normal return.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::entities::extract_entities;
use crate::followup::{FollowupContext, FollowupGenerator};
use crate::model::{DocumentResult, ProviderQuery, Section};
use crate::provider::Provider;
use crate::search::MultiSourceSearchService;
use crate::state::{CoverageReport, OrchestratorState, SectionHitMap};

/// Everything one orchestration run needs.
pub struct RunParams {
    /// The user's research question
    pub question: String,
    /// Seed sub-queries from the external planner
    pub base_subqueries: Vec<String>,
    /// All available providers
    pub providers: Vec<Arc<dyn Provider>>,
    /// Report sections with their provider allow-lists and targets
    pub sections: Vec<Section>,
    /// Per-call result-count limit (halved with a floor per section call)
    pub limit: usize,
    /// URLs for the direct-fetch provider
    pub seed_urls: Vec<String>,
    /// Optional provider serving operator-supplied seed documents; joins the
    /// fan-out for sections that allow-list its id
    pub seed_provider: Option<Arc<dyn Provider>>,
}

/// What a run hands to the downstream synthesizer.
#[derive(Debug)]
pub struct RunOutcome {
    /// Every document retrieved, in retrieval order (may contain duplicates
    /// across sections/iterations; the hit map carries the set semantics)
    pub all_docs: Vec<DocumentResult>,
    /// Evidence key -> sections that retrieved it
    pub section_hits: SectionHitMap,
    /// Iterations actually executed
    pub iterations: usize,
}

/// Drives the iterative multi-source retrieval loop.
pub struct DeepResearchOrchestrator {
    config: OrchestratorConfig,
    search: MultiSourceSearchService,
    followups: FollowupGenerator,
}

impl DeepResearchOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            followups: FollowupGenerator::new(config.clone()),
            search: MultiSourceSearchService::new(),
            config,
        }
    }

    /// Run the retrieval loop to completion or to the iteration cap.
    pub async fn run(&self, params: RunParams) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let mut state = OrchestratorState::new();
        let mut hits = SectionHitMap::new();
        let mut all_docs: Vec<DocumentResult> = Vec::new();
        let mut used_entities: HashSet<String> = HashSet::new();
        let section_limit = self.config.section_limit(params.limit);

        info!(
            %run_id,
            sections = params.sections.len(),
            providers = params.providers.len(),
            "Starting research run"
        );

        for iteration in 1..=self.config.max_iterations {
            for section in &params.sections {
                if section.providers.is_empty() {
                    debug!(%run_id, section = %section.name, "No providers allow-listed; skipping section");
                    continue;
                }
                let selected = self.select_providers(&params, section);
                if selected.is_empty() {
                    debug!(%run_id, section = %section.name, "No allow-listed provider available; skipping section");
                    continue;
                }

                // Recomputed over everything gathered so far, across sections.
                let entities = extract_entities(&all_docs);
                let queries = self.followups.generate(FollowupContext {
                    section: &section.name,
                    question: &params.question,
                    base_subqueries: &params.base_subqueries,
                    iteration,
                    state: &state,
                    entities: &entities,
                    used_entities: &mut used_entities,
                });
                if queries.is_empty() {
                    debug!(%run_id, section = %section.name, iteration, "No fresh queries; skipping section");
                    continue;
                }
                for query in &queries {
                    state.record_query(query);
                }

                let provider_query = ProviderQuery {
                    original_question: params.question.clone(),
                    subqueries: queries,
                    limit: section_limit,
                    seed_urls: params.seed_urls.clone(),
                };
                let docs = self.search.search_across(&selected, &provider_query).await;
                debug!(
                    %run_id,
                    section = %section.name,
                    iteration,
                    count = docs.len(),
                    "Section retrieval finished"
                );

                for doc in docs {
                    hits.record(doc.evidence_key(), &section.name);
                    if let Some(url) = &doc.url {
                        state.record_url(url);
                    }
                    all_docs.push(doc);
                }
            }

            let coverage = CoverageReport::compute(&params.sections, &hits);
            info!(
                %run_id,
                iteration,
                unique_docs = hits.len(),
                complete = coverage.is_complete(),
                "Coverage recomputed"
            );
            if coverage.is_complete() {
                return RunOutcome {
                    all_docs,
                    section_hits: hits,
                    iterations: iteration,
                };
            }
        }

        // Partial coverage after the cap is a normal outcome.
        RunOutcome {
            all_docs,
            section_hits: hits,
            iterations: self.config.max_iterations,
        }
    }

    fn select_providers(&self, params: &RunParams, section: &Section) -> Vec<Arc<dyn Provider>> {
        let mut selected: Vec<Arc<dyn Provider>> = params
            .providers
            .iter()
            .filter(|p| section.allows(p.id()))
            .cloned()
            .collect();
        if let Some(seed) = &params.seed_provider {
            let already_in = selected.iter().any(|p| p.id() == seed.id());
            if section.allows(seed.id()) && !already_in {
                selected.push(Arc::clone(seed));
            }
        }
        selected
    }
}
