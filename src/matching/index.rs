//! In-memory listing index for repeated lookups against one listing batch.
//!
//! Listings are indexed by normalized title tokens so that titles mentioning
//! both teams are scored first. "Man Utd" still reaches "Manchester United
//! vs Liverpool" through the abbreviation expansion and substring matching
//! on tokens. A misspelt name shares no token with its listing, so when the
//! candidates yield no accepted match, or a team has no indexable token,
//! every listing is scored.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::{normalize, pick_best, Listing, ListingMatch, TeamPair};

/// Common English words that carry no team identity. Indexing them creates
/// false candidates ("Will" in "Will the Jets cover?").
const STOP_WORDS: &[&str] = &[
    "will", "shall", "would", "could", "should", "might", "must", "have",
    "been", "were", "was", "has", "had", "did", "does", "are", "not",
    "the", "this", "that", "which", "who", "what", "all", "both", "each",
    "any", "more", "most", "other", "than", "then", "they", "their",
    "and", "but", "for", "from", "into", "with", "about", "after", "before",
    "win", "winner", "beat", "game", "match", "total", "points", "goals",
    "spread", "moneyline", "over", "under",
];

#[derive(Debug, Clone, Default)]
pub struct ListingIndex {
    /// Insertion order is the tie-break order
    listings: Vec<Listing>,
    /// normalized token → positions of listings whose title mentions it
    token_index: HashMap<String, BTreeSet<usize>>,
}

impl ListingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the indexed listings.
    pub fn load(&mut self, listings: Vec<Listing>) {
        self.listings.clear();
        self.token_index.clear();
        self.insert_many(listings);
        debug!(
            "ListingIndex: {} listings, {} index tokens",
            self.listings.len(),
            self.token_index.len()
        );
    }

    /// Append listings without clearing existing entries.
    pub fn insert_many(&mut self, listings: Vec<Listing>) {
        for listing in listings {
            let position = self.listings.len();
            for token in extract_tokens(&listing.title) {
                self.token_index.entry(token).or_default().insert(position);
            }
            self.listings.push(listing);
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Positions of listings that mention at least one token of each team,
    /// in insertion order. `None` when a team has no indexable token.
    fn candidates(&self, pair: &TeamPair) -> Option<BTreeSet<usize>> {
        let home_tokens = extract_tokens(&pair.home);
        let away_tokens = extract_tokens(&pair.away);
        if home_tokens.is_empty() || away_tokens.is_empty() {
            return None;
        }
        let home = self.token_candidates(&home_tokens);
        let away = self.token_candidates(&away_tokens);
        Some(home.intersection(&away).copied().collect())
    }

    fn token_candidates(&self, tokens: &[String]) -> BTreeSet<usize> {
        let mut candidates = BTreeSet::new();
        for token in tokens {
            if let Some(ids) = self.token_index.get(token) {
                candidates.extend(ids);
            }
            for (idx_token, ids) in &self.token_index {
                if idx_token.contains(token.as_str()) || token.contains(idx_token.as_str()) {
                    candidates.extend(ids);
                }
            }
        }
        candidates
    }

    /// Highest-confidence accepted listing, candidates first. Ties keep the
    /// earliest listing.
    pub fn best_match(&self, pair: &TeamPair) -> Option<ListingMatch<'_>> {
        if let Some(positions) = self.candidates(pair) {
            debug!(
                "ListingIndex: {} candidate(s) for {} / {}",
                positions.len(),
                pair.home,
                pair.away
            );
            let found = pick_best(pair, positions.into_iter().filter_map(|i| self.listings.get(i)));
            if found.is_some() {
                return found;
            }
            debug!(
                "ListingIndex: no accepted candidate for {} / {}, scanning all",
                pair.home, pair.away
            );
        }
        pick_best(pair, self.listings.iter())
    }
}

/// Normalized tokens of at least three characters, minus stop words.
fn extract_tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|s| s.len() >= 3)
        .filter(|s| !STOP_WORDS.contains(s))
        .map(|s| s.to_string())
        .collect()
}
