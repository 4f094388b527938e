use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::StorefrontConfig;
use crate::core::{CatalogPage, FilterState, GameRecord, Pagination, SourceKind};
use crate::error::Result;
use crate::sources::{build_client, get_json, query_string, CatalogSource};

const SOURCE_NAME: &str = "cheapshark";

/// Price-comparison source (CheapShark-style title lookup)
pub struct CheapSharkSource {
    client: Client,
    base_url: String,
    limit: u32,
}

/// Row from the title lookup endpoint
#[derive(Debug, Deserialize)]
struct CheapSharkGame {
    #[serde(rename = "gameID")]
    game_id: String,
    #[serde(default)]
    external: String,
    #[serde(default)]
    thumb: String,
    /// Sent as a decimal string
    #[serde(default)]
    cheapest: Option<String>,
}

impl CheapSharkSource {
    /// Create new comparison source
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.request_timeout())?,
            base_url: config.comparison_base_url.trim_end_matches('/').to_string(),
            limit: config.comparison_limit,
        })
    }

    fn games_url(&self, title: &str, limit: u32) -> String {
        let query = query_string(&[
            ("title", title.trim().to_string()),
            ("limit", limit.max(1).to_string()),
        ]);
        format!("{}/games?{}", self.base_url, query)
    }

    /// Title lookup; a blank title makes no request
    async fn lookup(&self, title: &str, limit: u32) -> Result<Vec<GameRecord>> {
        if title.trim().is_empty() {
            tracing::debug!("[{}] blank title, skipping lookup", SOURCE_NAME);
            return Ok(Vec::new());
        }

        let url = self.games_url(title, limit);
        let rows: Vec<CheapSharkGame> = get_json(&self.client, SOURCE_NAME, &url).await?;
        Ok(rows.into_iter().map(to_game_record).collect())
    }
}

/// Rows to request for a page: everything up to its end plus one, so a
/// following page can be detected.
fn rows_wanted(pagination: &Pagination) -> u32 {
    pagination
        .page
        .max(1)
        .saturating_mul(pagination.page_size.max(1))
        .saturating_add(1)
}

/// Cut the current page out of the rows returned for `rows_wanted`.
/// The total is a lower bound: it only exceeds the page end when the
/// extra row came back.
fn slice_page(games: Vec<GameRecord>, pagination: &Pagination) -> CatalogPage {
    let total = games.len() as u64;
    let page = games
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.page_size as usize)
        .collect();
    CatalogPage::new(page, total)
}

/// Convert an upstream row to a GameRecord. The comparison API has no
/// genre, platform or rating data.
fn to_game_record(row: CheapSharkGame) -> GameRecord {
    let mut record = GameRecord::new(SourceKind::Comparison, row.game_id, row.external);
    let cheapest = row
        .cheapest
        .and_then(|price| price.trim().parse::<f64>().ok())
        .filter(|price| price.is_finite() && *price >= 0.0);

    record.image = row.thumb;
    record.price = cheapest;
    record.original_price = cheapest;
    record
}

#[async_trait]
impl CatalogSource for CheapSharkSource {
    /// The upstream has no paging: rows up to the end of the page (plus one)
    /// are requested and the current page is cut out locally.
    async fn fetch_page(&self, filters: &FilterState, pagination: &Pagination) -> Result<CatalogPage> {
        let title = filters.search_term().unwrap_or_default();
        let games = self.lookup(title, rows_wanted(pagination)).await?;
        Ok(slice_page(games, pagination))
    }

    async fn search(&self, term: &str) -> Result<Vec<GameRecord>> {
        self.lookup(term, self.limit).await
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Comparison
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
