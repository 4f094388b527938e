//! Merging of global search results from several sources.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::core::GameRecord;

/// Drop later records whose name equals (case-insensitively) an earlier one.
/// First occurrence wins, so input order decides which source is kept.
pub fn dedupe_by_name(games: Vec<GameRecord>) -> Vec<GameRecord> {
    let mut seen = HashSet::new();
    games
        .into_iter()
        .filter(|game| seen.insert(game.name.trim().to_lowercase()))
        .collect()
}

/// Exact name matches first, then rating descending. Stable.
pub fn rank_by_exact_name(term: &str, games: &mut [GameRecord]) {
    let term = term.trim().to_lowercase();
    games.sort_by(|a, b| {
        let a_exact = a.name.trim().to_lowercase() == term;
        let b_exact = b.name.trim().to_lowercase() == term;
        b_exact
            .cmp(&a_exact)
            .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
    });
}

/// Prefix ids per source, dedupe, then rank
pub fn merge_results(term: &str, games: Vec<GameRecord>) -> Vec<GameRecord> {
    let prefixed = games.into_iter().map(GameRecord::with_source_prefix).collect();
    let mut merged = dedupe_by_name(prefixed);
    rank_by_exact_name(term, &mut merged);
    merged
}
