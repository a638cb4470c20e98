//! Fuzzy matching over the candidate catalog.
//!
//! Scores are normalized distances in `[0, 1]`: `0.0` is an exact match and
//! anything above [`SCORE_THRESHOLD`] is discarded as noise. Exact matches
//! beat prefixes, prefixes beat interior substrings, and everything else
//! falls through to a bounded Levenshtein distance.

use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::catalog::Candidate;

/// Queries shorter than this (after trimming) are not considered signal.
pub const MIN_QUERY_LEN: usize = 2;

/// Default cap on the number of results returned per query.
pub const DEFAULT_LIMIT: usize = 10;

/// Normalized-distance cutoff; candidates scoring above it are dropped.
pub const SCORE_THRESHOLD: f64 = 0.3;

/// A scored catalog entry. Lower scores are better matches.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub item: Candidate,
    pub score: f64,
}

/// Case-folded view of one catalog, tied to the exact candidate list it was
/// built from.
struct SearchIndex {
    source: Arc<Vec<Candidate>>,
    names: Vec<String>,
}

/// Fuzzy matcher with a cached per-catalog index.
///
/// The index is built on first use and reused for every query against the
/// same candidate list. Handing in a different list (by `Arc` identity)
/// discards the old index and builds a fresh one, so a replaced catalog can
/// never be served through stale entries.
pub struct FuzzyMatcher {
    index: RwLock<Option<Arc<SearchIndex>>>,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(None),
        }
    }

    /// Returns the best-matching candidates for `query`, ranked ascending by
    /// score, capped at `limit`. Degenerate input (empty, whitespace-only,
    /// under [`MIN_QUERY_LEN`] characters) yields an empty list.
    pub fn search(
        &self,
        query: &str,
        candidates: &Arc<Vec<Candidate>>,
        limit: usize,
    ) -> Vec<MatchResult> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let query = query.to_lowercase();

        let index = self.index_for(candidates);

        let mut matches: Vec<MatchResult> = index
            .names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                score(&query, name).map(|score| MatchResult {
                    item: index.source[i].clone(),
                    score,
                })
            })
            .collect();

        // Stable sort: equal scores keep catalog order.
        matches.sort_by(|a, b| a.score.total_cmp(&b.score));
        matches.truncate(limit);
        matches
    }

    fn index_for(&self, candidates: &Arc<Vec<Candidate>>) -> Arc<SearchIndex> {
        {
            let guard = self.index.read().unwrap_or_else(|e| e.into_inner());
            if let Some(index) = guard.as_ref() {
                if Arc::ptr_eq(&index.source, candidates) {
                    return Arc::clone(index);
                }
            }
        }

        // Two requests racing here both build equivalent indexes; the
        // later write simply replaces the earlier one.
        let index = Arc::new(SearchIndex {
            source: Arc::clone(candidates),
            names: candidates.iter().map(|c| c.name.to_lowercase()).collect(),
        });

        let mut guard = self.index.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::clone(&index));
        index
    }
}

/// Scores `query` against `name` (both already lowercased). `None` means the
/// pair has no plausible relationship.
fn score(query: &str, name: &str) -> Option<f64> {
    if query == name {
        return Some(0.0);
    }

    let query_len = query.chars().count();
    let name_len = name.chars().count();

    if let Some(pos) = name.find(query) {
        // The query accounts for part of the name; penalize the uncovered
        // remainder, and interior hits more than prefixes.
        let coverage_penalty = 0.1 * (1.0 - query_len as f64 / name_len as f64);
        let offset_penalty = if pos == 0 { 0.0 } else { 0.1 };
        return Some(offset_penalty + coverage_penalty);
    }

    let max_len = query_len.max(name_len);
    // Length gap alone can rule the pair out before running the DP.
    if query_len.abs_diff(name_len) as f64 > SCORE_THRESHOLD * max_len as f64 {
        return None;
    }

    let normalized = levenshtein(query, name) as f64 / max_len as f64;
    (normalized <= SCORE_THRESHOLD).then_some(normalized)
}

/// Two-row Levenshtein distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }
    prev[b.len()]
}
