use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::GameRecord;

/// Sort applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Source order
    #[default]
    Relevance,
    NameAsc,
    NameDesc,
    /// Rating, highest first
    Rating,
    /// Release date, newest first
    Released,
    PriceLow,
    PriceHigh,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::Rating => "rating",
            SortKey::Released => "released",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" | "" => Ok(SortKey::Relevance),
            "name-asc" | "name" => Ok(SortKey::NameAsc),
            "name-desc" => Ok(SortKey::NameDesc),
            "rating" => Ok(SortKey::Rating),
            "released" => Ok(SortKey::Released),
            "price-low" => Ok(SortKey::PriceLow),
            "price-high" => Ok(SortKey::PriceHigh),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

/// Inclusive price bounds; an open side is `None`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Client-side filter state. Recomputed in full on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterState {
    pub search: String,
    pub genres: BTreeSet<String>,
    pub platforms: BTreeSet<String>,
    pub sort: SortKey,
    pub price_range: PriceRange,
}

impl FilterState {
    pub fn is_default(&self) -> bool {
        self == &FilterState::default()
    }

    /// Trimmed search text, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }
}

fn matches_search(game: &GameRecord, needle: &str) -> bool {
    game.name.to_lowercase().contains(needle)
        || game.description.to_lowercase().contains(needle)
        || game.genres.iter().any(|g| g.to_lowercase().contains(needle))
}

fn compare_price(a: &GameRecord, b: &GameRecord) -> Ordering {
    a.effective_price()
        .partial_cmp(&b.effective_price())
        .unwrap_or(Ordering::Equal)
}

/// Sort in place with a stable sort so ties keep source order
pub fn sort_games(games: &mut [GameRecord], sort: SortKey) {
    match sort {
        SortKey::Relevance => {}
        SortKey::NameAsc => games.sort_by_key(|g| g.name.to_lowercase()),
        SortKey::NameDesc => games.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase())),
        SortKey::Rating => {
            games.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
        }
        // Undated games go last
        SortKey::Released => games.sort_by(|a, b| match (a.released, b.released) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortKey::PriceLow => games.sort_by(compare_price),
        SortKey::PriceHigh => games.sort_by(|a, b| compare_price(b, a)),
    }
}

/// Derive the visible list from the raw list.
///
/// Steps run in a fixed order, each on the previous step's output:
/// search text, genres, platforms, price range, sort.
pub fn apply_filters(games: &[GameRecord], filters: &FilterState) -> Vec<GameRecord> {
    let needle = filters.search_term().map(str::to_lowercase);

    let mut view: Vec<GameRecord> = games
        .iter()
        .filter(|game| needle.as_deref().map_or(true, |n| matches_search(game, n)))
        .filter(|game| filters.genres.is_empty() || filters.genres.iter().any(|g| game.has_genre(g)))
        .filter(|game| {
            filters.platforms.is_empty() || filters.platforms.iter().any(|p| game.has_platform(p))
        })
        .filter(|game| filters.price_range.contains(game.effective_price()))
        .cloned()
        .collect();

    sort_games(&mut view, filters.sort);
    view
}
