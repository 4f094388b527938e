use async_trait::async_trait;

use crate::core::{apply_filters, CatalogPage, FilterState, GameRecord, Pagination, SourceKind};
use crate::error::Result;
use crate::sources::CatalogSource;

const SOURCE_NAME: &str = "static";

const EMBEDDED_CATALOG: &str = include_str!("../../data/fallback_catalog.json");

/// Embedded fixed catalog, served when network sources are disabled or fail
pub struct StaticSource {
    games: Vec<GameRecord>,
}

impl StaticSource {
    /// Source backed by the catalog compiled into the crate
    pub fn embedded() -> Self {
        match serde_json::from_str::<Vec<GameRecord>>(EMBEDDED_CATALOG) {
            Ok(games) => Self::new(games),
            Err(e) => {
                tracing::error!("Embedded fallback catalog is invalid: {}", e);
                Self::new(Vec::new())
            }
        }
    }

    /// Source backed by the given records
    pub fn new(games: Vec<GameRecord>) -> Self {
        let games = games
            .into_iter()
            .map(|mut game| {
                game.source = SourceKind::Static;
                game
            })
            .collect();
        Self { games }
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::embedded()
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch_page(&self, filters: &FilterState, pagination: &Pagination) -> Result<CatalogPage> {
        let matching = apply_filters(&self.games, filters);
        let total = matching.len() as u64;

        let page = matching
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.page_size.max(1) as usize)
            .collect();

        Ok(CatalogPage::new(page, total))
    }

    async fn search(&self, term: &str) -> Result<Vec<GameRecord>> {
        let filters = FilterState {
            search: term.to_string(),
            ..Default::default()
        };
        Ok(apply_filters(&self.games, &filters))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Static
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SortKey;

    #[test]
    fn test_embedded_catalog_parses() {
        let source = StaticSource::embedded();
        assert!(source.games().len() >= 10);
        assert!(source.games().iter().all(|g| !g.id.is_empty()));
        assert!(source.games().iter().all(|g| g.source == SourceKind::Static));
    }

    #[tokio::test]
    async fn test_fetch_page_paginates_filtered_view() {
        let source = StaticSource::embedded();
        let filters = FilterState {
            sort: SortKey::PriceLow,
            ..Default::default()
        };
        let pagination = Pagination {
            page: 2,
            ..Pagination::first(5)
        };

        let page = source.fetch_page(&filters, &pagination).await.unwrap();
        assert_eq!(page.total, source.games().len() as u64);
        assert_eq!(page.games.len(), 5);

        let first = source
            .fetch_page(&filters, &Pagination::first(5))
            .await
            .unwrap();
        assert!(first.games[4].effective_price() <= page.games[0].effective_price());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let source = StaticSource::embedded();
        let results = source.search("WITCHER").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "The Witcher 3: Wild Hunt");
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let source = StaticSource::new(vec![GameRecord::new(SourceKind::Primary, "1", "Only")]);
        let pagination = Pagination {
            page: 4,
            ..Pagination::first(10)
        };
        let page = source.fetch_page(&FilterState::default(), &pagination).await.unwrap();
        assert!(page.games.is_empty());
        assert_eq!(page.total, 1);
    }
}
