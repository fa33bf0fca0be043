//! Mutable per-run orchestration state and derived views.
//!
//! [`OrchestratorState`] is created fresh for every orchestration run, mutated
//! only by the orchestrator, read by the follow-up generator, and dropped when
//! the run returns. It is an explicit value passed by reference, never a
//! process-wide singleton.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{EvidenceKey, Section};

/// Seen queries, URLs and domains for one orchestration run.
#[derive(Debug, Default, Clone)]
pub struct OrchestratorState {
    seen_queries: HashSet<String>,
    seen_urls: HashSet<String>,
    /// Insertion-ordered and deduplicated: negative hints take the first
    /// domains in the order they were first seen.
    seen_domains: Vec<String>,
}

impl OrchestratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(&mut self, query: impl Into<String>) {
        self.seen_queries.insert(query.into());
    }

    pub fn has_query(&self, query: &str) -> bool {
        self.seen_queries.contains(query)
    }

    pub fn query_count(&self) -> usize {
        self.seen_queries.len()
    }

    pub fn record_url(&mut self, url: &str) {
        self.seen_urls.insert(url.to_string());
        if let Some(domain) = domain_of(url) {
            if !self.seen_domains.iter().any(|d| d == &domain) {
                self.seen_domains.push(domain);
            }
        }
    }

    pub fn has_url(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Domains of all seen URLs, in first-seen order.
    pub fn seen_domains(&self) -> &[String] {
        &self.seen_domains
    }
}

/// Lower-cased host part of a URL, without scheme, port, path or fragment.
pub fn domain_of(url: &str) -> Option<String> {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("");
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Which sections each piece of evidence was retrieved for.
///
/// Values are sets: a document fetched twice within the same section across
/// iterations still counts once for that section.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SectionHitMap {
    hits: HashMap<EvidenceKey, BTreeSet<String>>,
}

impl SectionHitMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `section` retrieved the document identified by `key`.
    pub fn record(&mut self, key: EvidenceKey, section: &str) {
        self.hits.entry(key).or_default().insert(section.to_string());
    }

    pub fn sections_for(&self, key: &EvidenceKey) -> Option<&BTreeSet<String>> {
        self.hits.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EvidenceKey, &BTreeSet<String>)> {
        self.hits.iter()
    }

    /// Number of unique evidence keys recorded.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Entities extracted from the documents collected so far.
///
/// Recomputed each iteration from scratch; ordered sets keep downstream query
/// generation deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub speakers: BTreeSet<String>,
    pub parties: BTreeSet<String>,
    pub meetings: BTreeSet<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty() && self.parties.is_empty() && self.meetings.is_empty()
    }
}

/// Per-section evidence counts measured against targets.
///
/// Always a full recompute from the hit map, never stored incrementally, so a
/// revision of hits can never leave stale counts behind.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Unique documents retrieved per section
    pub current: HashMap<String, usize>,
    /// Remaining documents needed per section (only sections with target > 0)
    pub missing: HashMap<String, usize>,
}

impl CoverageReport {
    pub fn compute(sections: &[Section], hits: &SectionHitMap) -> Self {
        let mut current: HashMap<String, usize> = sections
            .iter()
            .map(|s| (s.name.clone(), 0))
            .collect();

        for (_key, hit_sections) in hits.iter() {
            for section in hit_sections {
                if let Some(count) = current.get_mut(section) {
                    *count += 1;
                }
            }
        }

        let missing = sections
            .iter()
            .filter(|s| s.target > 0)
            .map(|s| {
                let have = current.get(&s.name).copied().unwrap_or(0);
                (s.name.clone(), s.target.saturating_sub(have))
            })
            .collect();

        Self { current, missing }
    }

    /// True when no section still needs documents.
    pub fn is_complete(&self) -> bool {
        self.missing.values().all(|&m| m == 0)
    }
}
