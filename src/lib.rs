//! # Storefront Engine
//!
//! Catalog, cart and profile state for a gaming storefront:
//! - Three interchangeable catalog sources (primary API, price comparison, static fallback)
//! - Client-side search/filter/sort over a normalized game record
//! - Persisted shopping cart with quantity semantics
//! - Session/profile collections and theme preference
//! - SQLite or in-memory key-value persistence
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use storefront_engine::{AppContext, SourceKind, StorefrontConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut app = AppContext::new(StorefrontConfig::from_env())?;
//!
//!     app.catalog_mut().set_active_source(SourceKind::Static).await;
//!     app.add_to_cart_by_id("1");
//!
//!     println!("Cart total: {:.2}", app.cart().cart_total());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod profile;
pub mod ranking;
pub mod sources;
pub mod storage;
pub mod theme;

// Re-export primary types
pub use app::AppContext;
pub use cart::{CartLine, CartState, CartStore};
pub use catalog::{CatalogStore, SourceSet};
pub use config::StorefrontConfig;
pub use crate::core::{
    FetchOutcome, FilterState, GameRecord, GlobalSearchResult, Pagination, Platform, PriceRange,
    SortKey, SourceKind,
};
pub use error::{Result, StorefrontError};
pub use profile::{Address, Order, OrderStatus, PaymentMethod, ProfileStore, User};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use theme::{ThemePreference, ThemeStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
