pub mod cheapshark;
pub mod fallback;
pub mod rawg;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::{CatalogPage, FilterState, GameRecord, Pagination, SourceKind};
use crate::error::{Result, StorefrontError};

pub use cheapshark::CheapSharkSource;
pub use fallback::StaticSource;
pub use rawg::RawgSource;

/// Trait for catalog data sources (primary API, price comparison, static set)
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of games matching the filters
    async fn fetch_page(&self, filters: &FilterState, pagination: &Pagination) -> Result<CatalogPage>;

    /// Free-text search used by the cross-source global search
    async fn search(&self, term: &str) -> Result<Vec<GameRecord>>;

    /// Which source this is
    fn kind(&self) -> SourceKind;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Shared HTTP client construction for network sources
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("storefront-engine/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(StorefrontError::HttpRequest)
}

/// GET a URL and decode its JSON body, mapping failures to source errors
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    source: &str,
    url: &str,
) -> Result<T> {
    tracing::debug!("[{}] GET {}", source, url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| StorefrontError::source_failure(source, format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(StorefrontError::source_failure(
            source,
            format!("HTTP {}", response.status()),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| StorefrontError::source_failure(source, format!("Invalid JSON: {}", e)))
}

/// Build a query string from key/value pairs, skipping empty values
pub(crate) fn query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
