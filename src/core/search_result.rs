use serde::{Deserialize, Serialize};

use crate::core::{GameRecord, SourceKind};

/// One page of results from a catalog source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPage {
    pub games: Vec<GameRecord>,

    /// Total matching results upstream (not just this page)
    pub total: u64,
}

impl CatalogPage {
    pub fn new(games: Vec<GameRecord>, total: u64) -> Self {
        Self { games, total }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Pagination metadata derived from the last fetch. Not authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_results: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// First page, nothing known about totals yet
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total_results: 0,
            total_pages: 0,
        }
    }

    /// Recompute totals after a fetch
    pub fn with_total(self, total_results: u64) -> Self {
        let page_size = u64::from(self.page_size.max(1));
        let total_pages = total_results.div_ceil(page_size);
        Self {
            total_results,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            ..self
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Zero-based offset of the first item on the current page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }
}

/// A source that failed during a global search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub message: String,
}

/// Merged, deduplicated and ranked results across all sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSearchResult {
    pub games: Vec<GameRecord>,
    pub count: usize,

    /// Sources that failed; the rest still contributed
    #[serde(default)]
    pub failures: Vec<SourceFailure>,
}

impl GlobalSearchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(games: Vec<GameRecord>, failures: Vec<SourceFailure>) -> Self {
        Self {
            count: games.len(),
            games,
            failures,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// Which path a catalog fetch took
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Requested source answered; state replaced
    Loaded { source: SourceKind, count: usize },

    /// Network source failed; static set substituted and error recorded
    FallbackApplied { failed: SourceKind, error: String },

    /// Fetch failed; previous list left untouched and error recorded
    Failed { error: String },
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FetchOutcome::FallbackApplied { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchOutcome::Loaded { .. } => None,
            FetchOutcome::FallbackApplied { error, .. } | FetchOutcome::Failed { error } => Some(error),
        }
    }
}
