//! Hotel geosearch - location-based hotel search and autocomplete
//!
//! This library provides radius and anchor searches over a hotel catalog,
//! price and popularity statistics, cross-entity autocomplete, and a TTL
//! cache that runs on Redis or in process.

pub mod cache;
pub mod config;
pub mod datastore;
pub mod error;
pub mod geo;
pub mod logging;
pub mod models;
pub mod search;
pub mod suggest;

// Re-export core types for public API
pub use cache::{Cache, CacheBackend, MemoryBackend, RedisBackend};
pub use config::GeoSearchConfig;
pub use datastore::{CatalogSnapshot, HotelDatastore, HotelQuery, MemoryDatastore};
pub use error::GeoSearchError;
pub use models::{GeoPoint, HotelResult, PriceCategory, PriceTable};
pub use search::{LocationFilter, Lookup, NearFilter, SearchEngine, SearchSettings};
pub use suggest::{SuggestSettings, Suggestion, SuggestionAggregator, SuggestionKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, GeoSearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
