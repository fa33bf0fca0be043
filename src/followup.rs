//! Follow-up query generation.
//!
//! Produces a diversified, deduplicated, non-repeating set of search queries
//! for one section at one iteration. The pipeline runs in a fixed order, each
//! stage strictly narrowing the candidate set:
//!
//! 1. Section suffix templates (static lookup, bare question fallback)
//! 2. Base sub-queries from the external planner, verbatim
//! 3. Entity expansion (speakers/meetings, capped, used-entity filtering)
//! 4. Exact dedup
//! 5. Near-duplicate dedup (greedy Jaccard)
//! 6. Seen-query exclusion
//! 7. Greedy MMR selection
//! 8. `-site:` negative hints from already-seen domains
//!
//! The generator reads [`OrchestratorState`] but never writes it; recording
//! dispatched queries is the orchestrator's job.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::config::OrchestratorConfig;
use crate::similarity::{jaccard, tokenize};
use crate::state::{Entities, OrchestratorState};

/// Cap on speaker-only query expansions per call.
const MAX_SPEAKER_EXPANSIONS: usize = 5;
/// Cap on meeting-only query expansions per call.
const MAX_MEETING_EXPANSIONS: usize = 5;
/// Cross-product caps: speakers x meetings.
const CROSS_SPEAKERS: usize = 3;
const CROSS_MEETINGS: usize = 2;

/// Hand-authored Japanese suffixes per section key. Unknown keys fall back to
/// the bare question.
fn section_suffixes(section: &str) -> Option<&'static [&'static str]> {
    match section {
        "overview" => Some(&["概要", "目的", "趣旨"]),
        "background" => Some(&["背景", "経緯", "問題点"]),
        "timeline" => Some(&["年表", "タイムライン", "経緯"]),
        "points_of_contention" => Some(&["論点", "争点", "課題"]),
        "past_debates" => Some(&["過去の議論", "国会審議", "答弁"]),
        "stakeholders" => Some(&["関係者", "政党の主張", "賛否"]),
        _ => None,
    }
}

/// Sections biased toward institutional (meeting) queries over personal
/// (speaker) queries: speaker-only expansions are skipped for these.
fn prefers_meetings(section: &str) -> bool {
    matches!(section, "timeline" | "past_debates")
}

/// Everything the generator needs for one section at one iteration.
pub struct FollowupContext<'a> {
    /// Section key, e.g. "timeline"
    pub section: &'a str,
    /// The user's original research question
    pub question: &'a str,
    /// Sub-queries supplied by the external planner
    pub base_subqueries: &'a [String],
    /// 1-based iteration number (logging only)
    pub iteration: usize,
    /// Seen queries/urls/domains for this run, read-only
    pub state: &'a OrchestratorState,
    /// Entities extracted from documents collected so far
    pub entities: &'a Entities,
    /// Entity strings already woven into queries this run; newly used entities
    /// are added before `generate` returns
    pub used_entities: &'a mut HashSet<String>,
}

/// Generates diversified follow-up queries for one section/iteration.
#[derive(Debug, Clone, Default)]
pub struct FollowupGenerator {
    config: OrchestratorConfig,
}

impl FollowupGenerator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline; returns at most `followup_limit` query strings.
    pub fn generate(&self, ctx: FollowupContext<'_>) -> Vec<String> {
        let mut candidates = template_candidates(ctx.section, ctx.question);
        candidates.extend(ctx.base_subqueries.iter().cloned());
        candidates.extend(entity_candidates(
            ctx.section,
            ctx.question,
            ctx.entities,
            ctx.used_entities,
        ));

        let candidates = dedup_exact(candidates);
        let candidates = self.dedup_near(candidates);
        let candidates: Vec<String> = candidates
            .into_iter()
            .filter(|c| !ctx.state.has_query(c))
            .collect();

        let selected = self.select_mmr(candidates, ctx.question, ctx.state.seen_domains());
        let hinted = self.append_negative_hints(selected, ctx.state.seen_domains());

        // A template candidate can resurface in a later iteration with an
        // unchanged hint tail; dispatched strings must stay unique run-wide.
        let queries: Vec<String> = hinted
            .into_iter()
            .filter(|q| !ctx.state.has_query(q))
            .collect();

        debug!(
            section = ctx.section,
            iteration = ctx.iteration,
            count = queries.len(),
            "Generated follow-up queries"
        );
        queries
    }

    /// Greedy near-duplicate removal: a candidate whose Jaccard similarity to
    /// an already-kept candidate reaches the threshold is dropped.
    fn dedup_near(&self, candidates: Vec<String>) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        let mut kept_tokens: Vec<BTreeSet<String>> = Vec::new();

        for candidate in candidates {
            let tokens = tokenize(&candidate);
            let near = kept_tokens
                .iter()
                .any(|k| jaccard(&tokens, k) >= self.config.near_duplicate_threshold);
            if !near {
                kept.push(candidate);
                kept_tokens.push(tokens);
            }
        }
        kept
    }

    /// Greedy maximal-marginal-relevance selection over the candidate list.
    ///
    /// Score: `λ·relevance − (1−λ)·max(max_sim_to_selected, α·domain_flag)`,
    /// relevance = Jaccard against the original question, ties broken by the
    /// earliest candidate index.
    fn select_mmr(
        &self,
        candidates: Vec<String>,
        question: &str,
        seen_domains: &[String],
    ) -> Vec<String> {
        let lambda = self.config.mmr_lambda;
        let alpha = self.config.domain_overlap_penalty;
        let k = self.config.followup_limit;

        let question_tokens = tokenize(question);
        let tokens: Vec<BTreeSet<String>> = candidates.iter().map(|c| tokenize(c)).collect();
        let relevance: Vec<f64> = tokens.iter().map(|t| jaccard(t, &question_tokens)).collect();
        let domain_flagged: Vec<bool> = candidates
            .iter()
            .map(|c| {
                seen_domains
                    .iter()
                    .any(|d| c.contains(&format!("site:{d}")))
            })
            .collect();

        let mut selected: Vec<usize> = Vec::new();
        while selected.len() < k && selected.len() < candidates.len() {
            let mut best: Option<(usize, f64)> = None;
            for i in 0..candidates.len() {
                if selected.contains(&i) {
                    continue;
                }
                let max_sim = selected
                    .iter()
                    .map(|&j| jaccard(&tokens[i], &tokens[j]))
                    .fold(0.0_f64, f64::max);
                let domain_penalty = if domain_flagged[i] { alpha } else { 0.0 };
                let penalty = max_sim.max(domain_penalty);
                let score = lambda * relevance[i] - (1.0 - lambda) * penalty;
                // Strict comparison keeps the earliest index on ties.
                if best.map(|(_, s)| score > s).unwrap_or(true) {
                    best = Some((i, score));
                }
            }
            match best {
                Some((i, _)) => selected.push(i),
                None => break,
            }
        }

        selected.into_iter().map(|i| candidates[i].clone()).collect()
    }

    /// Append `-site:{domain}` exclusions for the first few seen domains to
    /// every selected query.
    fn append_negative_hints(&self, queries: Vec<String>, seen_domains: &[String]) -> Vec<String> {
        let hints: Vec<String> = seen_domains
            .iter()
            .take(self.config.negative_hint_domains)
            .map(|d| format!("-site:{d}"))
            .collect();
        if hints.is_empty() {
            return queries;
        }
        queries
            .into_iter()
            .map(|q| format!("{} {}", q, hints.join(" ")))
            .collect()
    }
}

/// Stage 1: static suffix templates for the section key.
fn template_candidates(section: &str, question: &str) -> Vec<String> {
    match section_suffixes(section) {
        Some(suffixes) => suffixes.iter().map(|s| format!("{question} {s}")).collect(),
        None => vec![question.to_string()],
    }
}

/// Stage 3: speaker/meeting expansions, capped and filtered against the
/// used-entities set. Entities woven into candidates are recorded as used even
/// if a later stage drops the query.
fn entity_candidates(
    section: &str,
    question: &str,
    entities: &Entities,
    used_entities: &mut HashSet<String>,
) -> Vec<String> {
    let speakers: Vec<String> = entities
        .speakers
        .iter()
        .filter(|s| !used_entities.contains(*s))
        .take(MAX_SPEAKER_EXPANSIONS)
        .cloned()
        .collect();
    let meetings: Vec<String> = entities
        .meetings
        .iter()
        .filter(|m| !used_entities.contains(*m))
        .take(MAX_MEETING_EXPANSIONS)
        .cloned()
        .collect();

    let mut candidates = Vec::new();

    if !prefers_meetings(section) {
        for speaker in &speakers {
            candidates.push(format!("{question} {speaker}"));
            used_entities.insert(speaker.clone());
        }
    }
    for meeting in &meetings {
        candidates.push(format!("{question} {meeting}"));
        used_entities.insert(meeting.clone());
    }
    for speaker in speakers.iter().take(CROSS_SPEAKERS) {
        for meeting in meetings.iter().take(CROSS_MEETINGS) {
            candidates.push(format!("{question} {speaker} {meeting}"));
            used_entities.insert(speaker.clone());
            used_entities.insert(meeting.clone());
        }
    }

    candidates
}

/// Stage 4: remove string-identical candidates, first occurrence wins.
fn dedup_exact(candidates: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
