pub mod filters;
pub mod game_record;
pub mod search_result;

pub use filters::{apply_filters, sort_games, FilterState, PriceRange, SortKey};
pub use game_record::{clamp_rating, GameRecord, Platform, PlatformRef, SourceKind};
pub use search_result::{CatalogPage, FetchOutcome, GlobalSearchResult, Pagination, SourceFailure};
