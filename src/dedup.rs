//! Duplicate tracking across sections and providers.
//!
//! Two independent strategies live here:
//!
//! - a global statistics mode that accumulates per-evidence-key occurrence
//!   counts for reporting, and
//! - strict dedup helpers: section-scoped (the same document is allowed once
//!   per section) and search-context-sensitive (the same document in the same
//!   section under different search contexts is kept twice).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{DocumentResult, EvidenceKey};
use crate::state::SectionHitMap;

/// Display-only truncation width for evidence keys in reports.
const KEY_DISPLAY_WIDTH: usize = 50;
/// Context signatures keep this many leading normalized characters.
const CONTEXT_SIGNATURE_WIDTH: usize = 100;

/// Accumulated duplicate state for one evidence key.
#[derive(Debug, Default, Clone)]
struct DuplicateEntry {
    count: usize,
    sections: BTreeSet<String>,
    providers: BTreeSet<String>,
    provider_counts: BTreeMap<String, usize>,
}

/// A document tagged with the section that retrieved it and, optionally, the
/// search context (query text) it was retrieved under.
#[derive(Debug, Clone)]
pub struct SectionedDocument {
    pub section: String,
    pub doc: DocumentResult,
    pub search_context: Option<String>,
}

/// Derived duplicate statistics for one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationStatistics {
    pub total_documents: usize,
    pub unique_documents: usize,
    pub duplicates_removed: usize,
    /// Rounded percentage of total documents that were duplicates
    pub duplicate_percentage: u32,
    /// section -> provider -> occurrence count
    pub by_section: BTreeMap<String, BTreeMap<String, usize>>,
    pub top_duplicates: Vec<DuplicateSummary>,
}

/// One heavily-duplicated evidence key, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSummary {
    /// Display form of the key, truncated for readability
    pub key: String,
    pub count: usize,
    pub sections: Vec<String>,
    pub providers: Vec<String>,
}

/// Tracks cross-section/cross-provider duplicates.
#[derive(Debug, Default)]
pub struct DuplicationAnalyzer {
    entries: HashMap<EvidenceKey, DuplicateEntry>,
    section_seen: HashMap<String, HashSet<EvidenceKey>>,
}

impl DuplicationAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `doc` for statistics. The hit map supplies
    /// the sections this document has been retrieved for so far.
    pub fn collect_statistics(&mut self, doc: &DocumentResult, hits: &SectionHitMap) {
        let key = doc.evidence_key();
        let provider = doc
            .source
            .as_ref()
            .map(|s| s.provider_id.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let entry = self.entries.entry(key.clone()).or_default();
        entry.count += 1;
        if let Some(sections) = hits.sections_for(&key) {
            entry.sections.extend(sections.iter().cloned());
        }
        entry.providers.insert(provider.clone());
        *entry.provider_counts.entry(provider).or_insert(0) += 1;
    }

    /// Derive the statistics report from everything collected so far.
    pub fn generate_statistics(&self, total_documents: usize, top_n: usize) -> DuplicationStatistics {
        let unique_documents = self.entries.len();
        let duplicates_removed: usize = self
            .entries
            .values()
            .filter(|e| e.count > 1)
            .map(|e| e.count - 1)
            .sum();

        let duplicate_percentage = if total_documents == 0 {
            0
        } else {
            ((duplicates_removed as f64 * 100.0) / total_documents as f64).round() as u32
        };

        let mut by_section: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for entry in self.entries.values() {
            for section in &entry.sections {
                let per_provider = by_section.entry(section.clone()).or_default();
                for (provider, count) in &entry.provider_counts {
                    *per_provider.entry(provider.clone()).or_insert(0) += count;
                }
            }
        }

        let mut ranked: Vec<(&EvidenceKey, &DuplicateEntry)> = self.entries.iter().collect();
        ranked.sort_by(|(ka, ea), (kb, eb)| eb.count.cmp(&ea.count).then_with(|| ka.cmp(kb)));
        let top_duplicates = ranked
            .into_iter()
            .take(top_n)
            .map(|(key, entry)| DuplicateSummary {
                key: truncate_key(key.as_str()),
                count: entry.count,
                sections: entry.sections.iter().cloned().collect(),
                providers: entry.providers.iter().cloned().collect(),
            })
            .collect();

        DuplicationStatistics {
            total_documents,
            unique_documents,
            duplicates_removed,
            duplicate_percentage,
            by_section,
            top_duplicates,
        }
    }

    /// Section-scoped strict dedup: true iff the same evidence key was already
    /// seen within this section. Independent per section - a document that is
    /// a duplicate in section A is still fresh the first time section B sees it.
    pub fn check_section_duplicate(&mut self, section: &str, doc: &DocumentResult) -> bool {
        let key = doc.evidence_key();
        !self
            .section_seen
            .entry(section.to_string())
            .or_default()
            .insert(key)
    }

    /// Context-sensitive dedup: identical (document, section, context) triples
    /// collapse to the first occurrence; the same document in the same section
    /// under different search contexts is kept for both.
    pub fn deduplicate_within_sections(items: Vec<SectionedDocument>) -> Vec<SectionedDocument> {
        let mut seen: HashSet<String> = HashSet::new();
        items
            .into_iter()
            .filter(|item| {
                let mut key = format!("{}:{}", item.doc.evidence_key(), item.section);
                if let Some(ctx) = &item.search_context {
                    key.push(':');
                    key.push_str(&context_signature(ctx));
                }
                seen.insert(key)
            })
            .collect()
    }
}

/// Cheap non-cryptographic signature for a search context: the first 100
/// normalized characters plus the total normalized length.
fn context_signature(context: &str) -> String {
    let normalized = context
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let total_len = normalized.chars().count();
    let head: String = normalized.chars().take(CONTEXT_SIGNATURE_WIDTH).collect();
    format!("{head}#{total_len}")
}

/// Truncate long keys for display only; never used for dedup decisions.
pub fn truncate_key(key: &str) -> String {
    if key.chars().count() > KEY_DISPLAY_WIDTH {
        let head: String = key.chars().take(KEY_DISPLAY_WIDTH).collect();
        format!("{head}...")
    } else {
        key.to_string()
    }
}
