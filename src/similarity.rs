//! Token-set similarity helpers for near-duplicate detection and relevance.

use std::collections::BTreeSet;

/// Tokenize a query string for set-based similarity.
///
/// Lower-cases, splits on non-alphanumeric boundaries and drops tokens shorter
/// than 2 characters. Kana/kanji count as alphanumeric, so Japanese phrases
/// between punctuation or whitespace become single tokens.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard similarity of two token sets: |A ∩ B| / |A ∪ B|.
///
/// Two empty sets are defined as similarity 0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}
