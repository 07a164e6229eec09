//! Fuzzy resolution of a predicted game's two team names against loosely
//! formatted listing titles ("NBA: Boston Celtics vs Los Angeles Lakers",
//! "Lakers @ Celtics (Jan 12)").
//!
//! Names are canonicalised, then each slot is scored as the mean of
//! normalized Levenshtein similarity and token Jaccard overlap. Both the
//! direct and the swapped home/away orientation are tried because sources
//! disagree on which team is listed first.

pub mod index;

pub use index::ListingIndex;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strsim::normalized_levenshtein;

/// A match is accepted strictly above this confidence.
pub const MATCH_THRESHOLD: f64 = 0.7;

/// Token-level abbreviation expansions.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("st", "saint"),
    ("ft", "fort"),
    ("mt", "mount"),
    ("utd", "united"),
    ("la", "los angeles"),
    ("ny", "new york"),
    ("univ", "university"),
];

/// Tokens that carry no identity: club boilerplate and college mascots that
/// no professional team uses as its nickname.
const FILLER_TOKENS: &[&str] = &[
    "the", "fc", "cf", "sc", "afc", "ac", "club", "team",
    "wildcats", "bulldogs", "huskies", "cougars", "wolverines", "buckeyes",
    "jayhawks", "spartans", "hawkeyes", "gators", "seminoles", "longhorns",
    "sooners", "aggies", "trojans", "beavers", "badgers", "volunteers",
    "razorbacks", "gamecocks", "boilermakers", "hoosiers", "cornhuskers",
    "mountaineers", "cyclones",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPair {
    pub home: String,
    pub away: String,
}

impl TeamPair {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        TeamPair {
            home: home.into(),
            away: away.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// home matched home
    Direct,
    /// home matched the other side's away team
    Swapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_match: bool,
    /// In [0, 1]
    pub confidence: f64,
    pub orientation: Orientation,
}

impl MatchResult {
    fn none() -> Self {
        MatchResult {
            is_match: false,
            confidence: 0.0,
            orientation: Orientation::Direct,
        }
    }
}

/// Canonical form of a team name. Idempotent.
///
/// "St. Mary's" → "saint marys", "LA Lakers" → "los angeles lakers",
/// "Arsenal FC" → "arsenal".
pub fn normalize(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            '\'' | '\u{2019}' => {}
            '&' => cleaned.push_str(" and "),
            c if c.is_alphanumeric() => cleaned.push(c),
            _ => cleaned.push(' '),
        }
    }

    let expanded: Vec<&str> = cleaned
        .split_whitespace()
        .flat_map(|token| {
            let replacement = ABBREVIATIONS
                .iter()
                .find(|(short, _)| *short == token)
                .map(|(_, long)| *long)
                .unwrap_or(token);
            replacement.split(' ')
        })
        .collect();

    let kept: Vec<&str> = expanded
        .iter()
        .copied()
        .filter(|t| !FILLER_TOKENS.contains(t))
        .collect();

    // A name made only of filler ("The Club") keeps its tokens
    if kept.is_empty() {
        expanded.join(" ")
    } else {
        kept.join(" ")
    }
}

/// Pull a (home, away) pair out of a listing title.
///
/// "A vs B" lists the home team first; "A @ B" and "A at B" list it second.
/// A leading "League:" label and trailing qualifiers after " - ", "(", "?",
/// "," or ":" are dropped.
pub fn extract_pair(text: &str) -> Option<TeamPair> {
    const SEPARATORS: &[(&str, bool)] = &[
        (" vs. ", false),
        (" vs ", false),
        (" v ", false),
        (" @ ", true),
        (" at ", true),
    ];
    const TAIL_CUTS: &[&str] = &[" - ", "(", "?", ",", ":"];

    let lowered = text.to_ascii_lowercase();
    let (pos, sep, home_second) = SEPARATORS
        .iter()
        .find_map(|(sep, home_second)| lowered.find(sep).map(|pos| (pos, *sep, *home_second)))?;

    let first = &text[..pos];
    let first = match first.rfind(':') {
        Some(i) => &first[i + 1..],
        None => first,
    };

    let mut second = &text[pos + sep.len()..];
    for cut in TAIL_CUTS {
        if let Some(i) = second.find(cut) {
            second = &second[..i];
        }
    }

    let first = first.trim();
    let second = second.trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }

    Some(if home_second {
        TeamPair::new(second, first)
    } else {
        TeamPair::new(first, second)
    })
}

/// Similarity of two team names in [0, 1].
///
/// When one name's tokens are a subset of the other's ("lakers" vs
/// "los angeles lakers") the longer name is cut down to the shared tokens
/// before scoring, so a bare nickname can match a full name.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    normalized_similarity(&a, &b)
}

fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a_tokens: Vec<&str> = a.split(' ').collect();
    let b_tokens: Vec<&str> = b.split(' ').collect();
    let a_set: HashSet<&str> = a_tokens.iter().copied().collect();
    let b_set: HashSet<&str> = b_tokens.iter().copied().collect();

    let (a, b, a_set, b_set) = if a_set.is_subset(&b_set) {
        let aligned = keep_tokens(&b_tokens, &a_set);
        (a.to_string(), aligned, a_set.clone(), a_set)
    } else if b_set.is_subset(&a_set) {
        let aligned = keep_tokens(&a_tokens, &b_set);
        (aligned, b.to_string(), b_set.clone(), b_set)
    } else {
        (a.to_string(), b.to_string(), a_set, b_set)
    };

    let edit = normalized_levenshtein(&a, &b);
    let union = a_set.union(&b_set).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        a_set.intersection(&b_set).count() as f64 / union as f64
    };
    (edit + jaccard) / 2.0
}

fn keep_tokens(tokens: &[&str], keep: &HashSet<&str>) -> String {
    tokens
        .iter()
        .copied()
        .filter(|t| keep.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compare two team pairs in both orientations and keep the better one.
pub fn match_pair(a: &TeamPair, b: &TeamPair) -> MatchResult {
    let a_home = normalize(&a.home);
    let a_away = normalize(&a.away);
    let b_home = normalize(&b.home);
    let b_away = normalize(&b.away);

    let direct =
        (normalized_similarity(&a_home, &b_home) + normalized_similarity(&a_away, &b_away)) / 2.0;
    let swapped =
        (normalized_similarity(&a_home, &b_away) + normalized_similarity(&a_away, &b_home)) / 2.0;

    let (confidence, orientation) = if swapped > direct {
        (swapped, Orientation::Swapped)
    } else {
        (direct, Orientation::Direct)
    };
    MatchResult {
        is_match: confidence > MATCH_THRESHOLD,
        confidence,
        orientation,
    }
}

/// Match a pair against a free-text listing title. Titles with no
/// recognisable separator never match.
pub fn match_listing(pair: &TeamPair, text: &str) -> MatchResult {
    match extract_pair(text) {
        Some(listed) => match_pair(pair, &listed),
        None => MatchResult::none(),
    }
}

/// A market listing that a prediction may be reconciled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingMatch<'a> {
    pub listing: &'a Listing,
    pub result: MatchResult,
}

/// Highest-confidence accepted listing. Ties keep the earliest listing.
pub fn best_match<'a>(pair: &TeamPair, listings: &'a [Listing]) -> Option<ListingMatch<'a>> {
    pick_best(pair, listings.iter())
}

pub(crate) fn pick_best<'a>(
    pair: &TeamPair,
    listings: impl Iterator<Item = &'a Listing>,
) -> Option<ListingMatch<'a>> {
    let mut best: Option<ListingMatch<'a>> = None;
    for listing in listings {
        let result = match_listing(pair, &listing.title);
        if !result.is_match {
            continue;
        }
        let better = best
            .as_ref()
            .map_or(true, |b| result.confidence > b.result.confidence);
        if better {
            best = Some(ListingMatch { listing, result });
        }
    }
    best
}
