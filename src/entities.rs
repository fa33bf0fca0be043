//! Entity extraction from collected documents.
//!
//! Entities are recomputed from scratch every iteration over everything
//! gathered so far, so later sections in the same iteration see speakers and
//! meetings surfaced by earlier sections. Extraction reads the structured
//! metadata Diet-record providers attach (`speaker`, `party`, `meeting`) and
//! additionally scans titles for meeting-body names.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::DocumentResult;
use crate::state::Entities;

/// Meeting bodies as they appear in record titles, e.g. 予算委員会, 本会議.
static MEETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\p{Han}\p{Hiragana}\p{Katakana}ー]{2,14}(?:委員会|審査会|調査会|本会議))")
        .expect("hardcoded regex compiles")
});

const SPEAKER_KEYS: [&str; 2] = ["speaker", "speaker_name"];
const PARTY_KEYS: [&str; 2] = ["party", "party_name"];
const MEETING_KEYS: [&str; 2] = ["meeting", "meeting_name"];

/// Recompute the entity sets from all documents collected so far.
pub fn extract_entities(docs: &[DocumentResult]) -> Entities {
    let mut entities = Entities::default();

    for doc in docs {
        for key in SPEAKER_KEYS {
            if let Some(value) = extras_str(doc, key) {
                entities.speakers.insert(value);
            }
        }
        if let Some(author) = doc.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            entities.speakers.insert(author.to_string());
        }

        for key in PARTY_KEYS {
            if let Some(value) = extras_str(doc, key) {
                entities.parties.insert(value);
            }
        }

        for key in MEETING_KEYS {
            if let Some(value) = extras_str(doc, key) {
                entities.meetings.insert(value);
            }
        }
        if let Some(title) = &doc.title {
            for capture in MEETING_RE.captures_iter(title) {
                entities.meetings.insert(capture[1].to_string());
            }
        }
    }

    entities
}

fn extras_str(doc: &DocumentResult, key: &str) -> Option<String> {
    doc.extras
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
