//! Search engine
//!
//! Answers "hotels near X" queries by coordinate, by transit stop and by
//! point of interest, plus the aggregate price and popularity statistics.
//! Every public operation is infallible from the caller's side: datastore
//! failures and invalid input are logged and degrade to an empty result or
//! an [`Lookup::Unavailable`] outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::info;

use crate::cache::Cache;
use crate::config::GeoSearchConfig;
use crate::datastore::HotelDatastore;
use crate::models::{GeoPoint, HotelResult, PointOfInterest, PriceCategory, PriceTable, TransitStop};
use crate::{GeoSearchError, Result};

mod engine;
mod stats;

pub use stats::{PopularArea, PriceBucket};

/// Prefix shared by every cache key the search components write
pub const CACHE_NAMESPACE: &str = "search:";

/// Radius restriction around a center point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl NearFilter {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            center: GeoPoint::new(latitude, longitude),
            radius_km,
        }
    }

    /// Finite center within range and a positive finite radius
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.center.is_valid() && self.radius_km.is_finite() && self.radius_km > 0.0
    }
}

/// Filters for [`SearchEngine::search_by_location`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub region_id: Option<i64>,
    pub locality_id: Option<i64>,
    pub area_id: Option<i64>,
    pub price_bracket: Option<PriceCategory>,
    pub near: Option<NearFilter>,
    /// Page size; the configured default applies when absent or zero
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Parameters an anchor search actually ran with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorParams {
    pub max_distance_km: f64,
    pub price_bracket: Option<PriceCategory>,
    pub limit: usize,
}

/// Hotels found around a resolved anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorResults<A> {
    pub anchor: A,
    pub hotels: Vec<HotelResult>,
    pub params: AnchorParams,
}

/// A point of interest with its distance from the hotel it was looked up for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyLandmark {
    pub landmark: PointOfInterest,
    pub distance_km: f64,
}

/// Landmarks around a hotel, closest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyLandmarks {
    pub hotel_id: i64,
    pub radius_km: f64,
    pub landmarks: Vec<NearbyLandmark>,
}

/// Outcome of a lookup keyed by an entity id.
///
/// Callers must be able to tell "no such station" apart from "station
/// exists but nothing is nearby", so a missing id is a value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound { id: i64 },
    /// The datastore failed or timed out while resolving `id`
    Unavailable { id: i64 },
}

impl<T> Lookup<T> {
    #[must_use]
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StationSearch = Lookup<AnchorResults<TransitStop>>;
pub type LandmarkSearch = Lookup<AnchorResults<PointOfInterest>>;

/// Tunables of the search engine, usually taken from [`GeoSearchConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub walkable_radius_km: f64,
    pub accessible_radius_km: f64,
    pub datastore_timeout: Duration,
    pub location_ttl: Duration,
    pub statistics_ttl: Duration,
    pub popular_areas_ttl: Duration,
}

impl From<&GeoSearchConfig> for SearchSettings {
    fn from(config: &GeoSearchConfig) -> Self {
        Self {
            default_limit: config.search.default_limit,
            max_limit: config.search.max_limit,
            walkable_radius_km: config.search.walkable_radius_km,
            accessible_radius_km: config.search.accessible_radius_km,
            datastore_timeout: Duration::from_millis(config.search.datastore_timeout_ms),
            location_ttl: Duration::from_secs(config.cache.location_ttl_seconds),
            statistics_ttl: Duration::from_secs(config.cache.statistics_ttl_seconds),
            popular_areas_ttl: Duration::from_secs(config.cache.popular_areas_ttl_seconds),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&GeoSearchConfig::default())
    }
}

/// Stateless search front end; all mutable state lives in the cache
#[derive(Clone)]
pub struct SearchEngine {
    datastore: Arc<dyn HotelDatastore>,
    cache: Cache,
    prices: PriceTable,
    settings: SearchSettings,
}

impl SearchEngine {
    #[must_use]
    pub fn new(
        datastore: Arc<dyn HotelDatastore>,
        cache: Cache,
        prices: PriceTable,
        settings: SearchSettings,
    ) -> Self {
        Self {
            datastore,
            cache,
            prices,
            settings,
        }
    }

    /// Engine configured from the `search` and `cache` sections
    #[must_use]
    pub fn from_config(
        datastore: Arc<dyn HotelDatastore>,
        cache: Cache,
        config: &GeoSearchConfig,
    ) -> Self {
        Self::new(
            datastore,
            cache,
            config.search.price_brackets.clone(),
            SearchSettings::from(config),
        )
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    #[must_use]
    pub fn price_table(&self) -> &PriceTable {
        &self.prices
    }

    /// Drop every cached search, statistics and suggestion entry
    pub async fn invalidate(&self) {
        info!("Invalidating cached search results");
        self.cache
            .delete_by_prefix(&format!("{CACHE_NAMESPACE}*"))
            .await;
    }

    /// Effective page size for a requested limit
    fn page_limit(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.settings.default_limit)
            .min(self.settings.max_limit)
    }

    /// Run a datastore call under the configured timeout
    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout(self.settings.datastore_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GeoSearchError::unavailable(
                "datastore",
                format!(
                    "{operation} timed out after {:?}",
                    self.settings.datastore_timeout
                ),
            )),
        }
    }
}

/// `-` for an absent key component
fn key_part<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
