use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::core::{
    apply_filters, FetchOutcome, FilterState, GameRecord, GlobalSearchResult, Pagination,
    PriceRange, SortKey, SourceFailure, SourceKind,
};
use crate::error::Result;
use crate::ranking::merge_results;
use crate::sources::{CatalogSource, CheapSharkSource, RawgSource, StaticSource};

/// The three interchangeable catalog sources
#[derive(Clone)]
pub struct SourceSet {
    pub primary: Arc<dyn CatalogSource>,
    pub comparison: Arc<dyn CatalogSource>,
    pub fallback: Arc<dyn CatalogSource>,
}

impl SourceSet {
    /// Network sources from configuration plus the embedded static set
    pub fn from_config(config: &StorefrontConfig) -> Result<Self> {
        Ok(Self {
            primary: Arc::new(RawgSource::new(config)?),
            comparison: Arc::new(CheapSharkSource::new(config)?),
            fallback: Arc::new(StaticSource::embedded()),
        })
    }

    pub fn get(&self, kind: SourceKind) -> &Arc<dyn CatalogSource> {
        match kind {
            SourceKind::Primary => &self.primary,
            SourceKind::Comparison => &self.comparison,
            SourceKind::Static => &self.fallback,
        }
    }
}

/// Catalog orchestrator: active source, raw results, filtered view and
/// pagination.
///
/// Fetches are not fenced: if two fetches overlap, whichever finishes last
/// wins.
pub struct CatalogStore {
    sources: SourceSet,
    network_enabled: bool,
    fallback_on_error: bool,
    page_size: u32,
    active: SourceKind,
    loaded_from: Option<SourceKind>,
    games: Vec<GameRecord>,
    filtered: Vec<GameRecord>,
    filters: FilterState,
    pagination: Pagination,
    error: Option<String>,
}

impl CatalogStore {
    /// Create a store with the configured network sources
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        Ok(Self::with_sources(config, SourceSet::from_config(config)?))
    }

    /// Create a store over explicit sources
    pub fn with_sources(config: &StorefrontConfig, sources: SourceSet) -> Self {
        Self {
            sources,
            network_enabled: config.network_enabled,
            fallback_on_error: config.fallback_on_error,
            page_size: config.page_size.max(1),
            active: config.initial_source,
            loaded_from: None,
            games: Vec::new(),
            filtered: Vec::new(),
            filters: FilterState::default(),
            pagination: Pagination::first(config.page_size),
            error: None,
        }
    }

    /// Source a fetch for `kind` actually goes to
    fn resolve(&self, kind: SourceKind) -> SourceKind {
        if kind.is_network() && !self.network_enabled {
            SourceKind::Static
        } else {
            kind
        }
    }

    fn replace(&mut self, kind: SourceKind, games: Vec<GameRecord>, total: u64) {
        self.games = games;
        self.pagination = self.pagination.with_total(total);
        self.loaded_from = Some(kind);
        self.error = None;
        self.apply_filters();
    }

    /// Fetch the current page from the active source.
    ///
    /// On failure the error is recorded; network failures are replaced by
    /// the static set when fallback is enabled, otherwise the previous list
    /// stays as it was.
    pub async fn fetch_games(&mut self) -> FetchOutcome {
        let source = Arc::clone(self.sources.get(self.resolve(self.active)));
        // A slot may be filled by any source; report what actually answered
        let kind = source.kind();

        tracing::debug!(
            "Fetching page {} from {} ({})",
            self.pagination.page,
            source.name(),
            kind
        );

        let result = source.fetch_page(&self.filters, &self.pagination).await;
        let error = match result {
            Ok(page) => {
                let count = page.games.len();
                self.replace(kind, page.games, page.total);
                return FetchOutcome::Loaded { source: kind, count };
            }
            Err(e) => e.to_string(),
        };

        tracing::warn!("⚠️ Catalog fetch from {} failed: {}", source.name(), error);

        if !(kind.is_network() && self.fallback_on_error) {
            self.error = Some(error.clone());
            return FetchOutcome::Failed { error };
        }

        let fallback = Arc::clone(&self.sources.fallback);
        let result = fallback.fetch_page(&self.filters, &self.pagination).await;
        match result {
            Ok(page) => {
                tracing::info!("Serving {} fallback game(s) instead", page.games.len());
                self.replace(SourceKind::Static, page.games, page.total);
                self.error = Some(error.clone());
                FetchOutcome::FallbackApplied { failed: kind, error }
            }
            Err(e) => {
                tracing::error!("❌ Fallback catalog failed too: {}", e);
                self.error = Some(error.clone());
                FetchOutcome::Failed { error }
            }
        }
    }

    /// Switch source: filters and pagination reset, then refetch
    pub async fn set_active_source(&mut self, kind: SourceKind) -> FetchOutcome {
        tracing::info!("Switching catalog source {} -> {}", self.active, kind);
        self.active = kind;
        self.filters = FilterState::default();
        self.pagination = Pagination::first(self.page_size);
        self.fetch_games().await
    }

    /// Switch source with the given filters and page in a single fetch.
    /// A page past the end of the filtered results is clamped and refetched.
    pub async fn browse(&mut self, kind: SourceKind, filters: FilterState, page: u32) -> FetchOutcome {
        tracing::info!("Browsing {} page {}", kind, page);
        self.active = kind;
        self.filters = filters;
        self.pagination = Pagination {
            page: page.max(1),
            ..Pagination::first(self.page_size)
        };

        let outcome = self.fetch_games().await;
        let last = self.pagination.total_pages;
        if last > 0 && self.pagination.page > last {
            return self.set_page(last).await;
        }
        outcome
    }

    /// Recompute the visible list from the raw list and current filters
    pub fn apply_filters(&mut self) -> &[GameRecord] {
        self.filtered = apply_filters(&self.games, &self.filters);
        &self.filtered
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> &[GameRecord] {
        self.filters.search = search.into();
        self.apply_filters()
    }

    /// Add the genre if absent, remove it if present
    pub fn toggle_genre(&mut self, genre: &str) -> &[GameRecord] {
        if !self.filters.genres.remove(genre) {
            self.filters.genres.insert(genre.to_string());
        }
        self.apply_filters()
    }

    /// Add the platform if absent, remove it if present
    pub fn toggle_platform(&mut self, platform: &str) -> &[GameRecord] {
        if !self.filters.platforms.remove(platform) {
            self.filters.platforms.insert(platform.to_string());
        }
        self.apply_filters()
    }

    pub fn set_sort(&mut self, sort: SortKey) -> &[GameRecord] {
        self.filters.sort = sort;
        self.apply_filters()
    }

    pub fn set_price_range(&mut self, range: PriceRange) -> &[GameRecord] {
        self.filters.price_range = range;
        self.apply_filters()
    }

    pub fn set_filters(&mut self, filters: FilterState) -> &[GameRecord] {
        self.filters = filters;
        self.apply_filters()
    }

    pub fn reset_filters(&mut self) -> &[GameRecord] {
        self.filters = FilterState::default();
        self.apply_filters()
    }

    /// Jump to a page (clamped to the known range) and refetch
    pub async fn set_page(&mut self, page: u32) -> FetchOutcome {
        let mut page = page.max(1);
        if self.pagination.total_pages > 0 {
            page = page.min(self.pagination.total_pages);
        }
        self.pagination.page = page;
        self.fetch_games().await
    }

    /// Fetch the next page; `None` when already on the last known page
    pub async fn next_page(&mut self) -> Option<FetchOutcome> {
        if !self.pagination.has_next() {
            return None;
        }
        let page = self.pagination.page + 1;
        Some(self.set_page(page).await)
    }

    /// Fetch the previous page; `None` when on the first page
    pub async fn prev_page(&mut self) -> Option<FetchOutcome> {
        if !self.pagination.has_prev() {
            return None;
        }
        let page = self.pagination.page - 1;
        Some(self.set_page(page).await)
    }

    /// Search every source concurrently and merge the results.
    ///
    /// A blank term returns an empty result without touching any source.
    /// One source failing does not affect the others.
    pub async fn global_search(&self, term: &str) -> GlobalSearchResult {
        let term = term.trim();
        if term.is_empty() {
            return GlobalSearchResult::empty();
        }

        let (primary, comparison, fallback) = tokio::join!(
            self.search_source(SourceKind::Primary, term),
            self.search_source(SourceKind::Comparison, term),
            self.search_source(SourceKind::Static, term),
        );

        let mut games = Vec::new();
        let mut failures = Vec::new();
        for (kind, result) in [
            (SourceKind::Primary, primary),
            (SourceKind::Comparison, comparison),
            (SourceKind::Static, fallback),
        ] {
            match result {
                Ok(mut results) => {
                    tracing::debug!("Source {} returned {} results", kind, results.len());
                    games.append(&mut results);
                }
                Err(e) => {
                    tracing::warn!("Global search on {} failed: {}", kind, e);
                    failures.push(SourceFailure {
                        source: kind,
                        message: e.to_string(),
                    });
                }
            }
        }

        GlobalSearchResult::new(merge_results(term, games), failures)
    }

    async fn search_source(&self, kind: SourceKind, term: &str) -> Result<Vec<GameRecord>> {
        if kind.is_network() && !self.network_enabled {
            return Ok(Vec::new());
        }
        self.sources.get(kind).search(term).await
    }

    /// Look up a game in the current raw list
    pub fn find_game(&self, id: &str) -> Option<&GameRecord> {
        self.games.iter().find(|game| game.id == id)
    }

    /// Distinct genres in the current raw list
    pub fn available_genres(&self) -> Vec<String> {
        self.games
            .iter()
            .flat_map(|game| game.genres.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct platform names in the current raw list
    pub fn available_platforms(&self) -> Vec<String> {
        self.games
            .iter()
            .flat_map(|game| game.platforms.iter().map(|p| p.name().to_string()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn active_source(&self) -> SourceKind {
        self.active
    }

    /// Source that supplied the current raw list, if anything was loaded
    pub fn loaded_from(&self) -> Option<SourceKind> {
        self.loaded_from
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn filtered_games(&self) -> &[GameRecord] {
        &self.filtered
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CatalogPage, SourceKind};
    use crate::error::StorefrontError;
    use async_trait::async_trait;

    struct FailingSource(SourceKind);

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch_page(&self, _: &FilterState, _: &Pagination) -> Result<CatalogPage> {
            Err(StorefrontError::source_failure(self.name(), "HTTP 503 Service Unavailable"))
        }

        async fn search(&self, _: &str) -> Result<Vec<GameRecord>> {
            Err(StorefrontError::source_failure(self.name(), "timed out"))
        }

        fn kind(&self) -> SourceKind {
            self.0
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn store(config: StorefrontConfig) -> CatalogStore {
        let sources = SourceSet {
            primary: Arc::new(FailingSource(SourceKind::Primary)),
            comparison: Arc::new(FailingSource(SourceKind::Comparison)),
            fallback: Arc::new(StaticSource::embedded()),
        };
        CatalogStore::with_sources(&config, sources)
    }

    #[tokio::test]
    async fn test_network_failure_falls_back_to_static() {
        let mut store = store(StorefrontConfig::default());

        let outcome = store.fetch_games().await;
        assert!(outcome.is_fallback());
        assert_eq!(store.loaded_from(), Some(SourceKind::Static));
        assert!(!store.games().is_empty());
        assert!(store.error().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_failure_without_fallback_keeps_previous_list() {
        let config = StorefrontConfig {
            fallback_on_error: false,
            initial_source: SourceKind::Static,
            ..Default::default()
        };
        let mut store = store(config);
        assert!(store.fetch_games().await.is_loaded());
        let before = store.games().len();

        store.active = SourceKind::Primary;
        let outcome = store.fetch_games().await;
        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert_eq!(store.games().len(), before);
        assert!(store.error().is_some());
    }

    #[tokio::test]
    async fn test_network_disabled_serves_static() {
        let config = StorefrontConfig {
            network_enabled: false,
            ..Default::default()
        };
        let mut store = store(config);

        let outcome = store.fetch_games().await;
        assert_eq!(
            outcome,
            FetchOutcome::Loaded {
                source: SourceKind::Static,
                count: 12
            }
        );
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_toggle_filters_rederive_view() {
        let config = StorefrontConfig {
            initial_source: SourceKind::Static,
            page_size: 50,
            ..Default::default()
        };
        let mut store = store(config);
        store.fetch_games().await;
        let all = store.filtered_games().len();

        let switch_only = store.toggle_platform("Nintendo Switch").len();
        assert!(switch_only < all);
        assert_eq!(store.toggle_platform("Nintendo Switch").len(), all);

        store.toggle_genre("Indie");
        assert!(store.filtered_games().iter().all(|g| g.has_genre("indie")));
        store.reset_filters();
        assert!(store.filters().is_default());
    }

    #[tokio::test]
    async fn test_vocabulary_from_raw_list() {
        let config = StorefrontConfig {
            initial_source: SourceKind::Static,
            page_size: 50,
            ..Default::default()
        };
        let mut store = store(config);
        store.fetch_games().await;

        let genres = store.available_genres();
        assert!(genres.contains(&"RPG".to_string()));
        assert!(genres.windows(2).all(|w| w[0] < w[1]));
        assert!(store.available_platforms().contains(&"PC".to_string()));
    }

    #[tokio::test]
    async fn test_pagination_moves_and_clamps() {
        let config = StorefrontConfig {
            initial_source: SourceKind::Static,
            page_size: 5,
            ..Default::default()
        };
        let mut store = store(config);
        store.fetch_games().await;
        assert_eq!(store.pagination().total_pages, 3);

        assert!(store.prev_page().await.is_none());
        store.next_page().await.unwrap();
        assert_eq!(store.pagination().page, 2);

        store.set_page(99).await;
        assert_eq!(store.pagination().page, 3);
        assert_eq!(store.games().len(), 2);
        assert!(store.next_page().await.is_none());
    }

    #[tokio::test]
    async fn test_global_search_collects_failures() {
        let store = store(StorefrontConfig::default());

        let result = store.global_search("hades").await;
        assert_eq!(result.count, 1);
        assert_eq!(result.games[0].id, "static-4");
        assert_eq!(result.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_outcome_reports_answering_source() {
        let config = StorefrontConfig {
            initial_source: SourceKind::Primary,
            ..Default::default()
        };
        let fallback: Arc<dyn CatalogSource> = Arc::new(StaticSource::embedded());
        let sources = SourceSet {
            primary: fallback.clone(),
            comparison: Arc::new(FailingSource(SourceKind::Comparison)),
            fallback,
        };
        let mut store = CatalogStore::with_sources(&config, sources);

        let outcome = store.fetch_games().await;
        assert_eq!(
            outcome,
            FetchOutcome::Loaded {
                source: SourceKind::Static,
                count: 12
            }
        );
        assert_eq!(store.loaded_from(), Some(SourceKind::Static));
        assert_eq!(store.active_source(), SourceKind::Primary);
    }

    #[tokio::test]
    async fn test_browse_applies_filters_before_fetching() {
        let config = StorefrontConfig {
            page_size: 5,
            ..Default::default()
        };
        let mut store = store(config);
        let filters = FilterState {
            search: "the".to_string(),
            sort: SortKey::NameAsc,
            ..Default::default()
        };

        let outcome = store.browse(SourceKind::Static, filters.clone(), 1).await;
        assert!(outcome.is_loaded());
        assert_eq!(store.filters(), &filters);
        let total = store.pagination().total_results;
        assert!(total > 0 && total < 12);

        // Past the filtered range: clamped to the last page
        store.browse(SourceKind::Static, filters, 9).await;
        assert_eq!(store.pagination().page, store.pagination().total_pages);
        assert!(!store.filtered_games().is_empty());
    }
}
