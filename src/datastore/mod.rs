//! Datastore access
//!
//! The search components never talk to a database directly. They receive a
//! [`HotelDatastore`] at construction, so a relational client, a fixture
//! snapshot or a test double can sit behind the same interface. All queries
//! are read-only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::geo::BoundingBox;
use crate::models::{
    HotelLocation, HotelRow, LocalityMatch, PointOfInterest, PointOfInterestMatch, PriceBracket,
    RegionMatch, TransitStop, TransitStopMatch,
};

pub mod memory;

pub use memory::{Area, CatalogSnapshot, MemoryDatastore};

/// Inclusive range on `current_average_price`; `max == None` is open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: Option<u64>,
}

impl PriceRange {
    #[must_use]
    pub fn contains(&self, price: u64) -> bool {
        price >= self.min && self.max.is_none_or(|max| price <= max)
    }
}

impl From<&PriceBracket> for PriceRange {
    fn from(bracket: &PriceBracket) -> Self {
        Self {
            min: bracket.min,
            max: bracket.max,
        }
    }
}

/// Filters pushed down to the datastore for a hotel query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelQuery {
    pub region_id: Option<i64>,
    pub locality_id: Option<i64>,
    pub area_id: Option<i64>,
    /// Hotels without a price, or priced at zero, never match a price range
    pub price_range: Option<PriceRange>,
    pub bounds: Option<BoundingBox>,
}

impl HotelQuery {
    /// Whether `row` satisfies every filter of this query
    #[must_use]
    pub fn matches(&self, row: &HotelRow) -> bool {
        let location = &row.location;
        self.region_id.is_none_or(|id| location.region_id == id)
            && self.locality_id.is_none_or(|id| location.locality_id == id)
            && self.area_id.is_none_or(|id| location.area_id == Some(id))
            && self.price_range.is_none_or(|range| {
                row.average_price()
                    .is_some_and(|price| price > 0 && range.contains(price))
            })
            && self
                .bounds
                .is_none_or(|bbox| bbox.contains(location.latitude, location.longitude))
    }
}

/// Read-only access to the hotel catalog
#[async_trait]
pub trait HotelDatastore: Send + Sync {
    /// Hotel locations joined with price analysis and ancestry
    async fn query_hotels(&self, query: &HotelQuery) -> Result<Vec<HotelRow>>;

    async fn transit_stop(&self, id: i64) -> Result<Option<TransitStop>>;

    async fn point_of_interest(&self, id: i64) -> Result<Option<PointOfInterest>>;

    async fn hotel_location(&self, hotel_id: i64) -> Result<Option<HotelLocation>>;

    /// Points of interest inside the rectangle
    async fn points_of_interest_within(&self, bounds: &BoundingBox) -> Result<Vec<PointOfInterest>>;

    /// Regions whose name contains `pattern`, case-insensitively
    async fn match_regions(&self, pattern: &str, limit: usize) -> Result<Vec<RegionMatch>>;

    async fn match_localities(&self, pattern: &str, limit: usize) -> Result<Vec<LocalityMatch>>;

    async fn match_transit_stops(&self, pattern: &str, limit: usize)
    -> Result<Vec<TransitStopMatch>>;

    async fn match_points_of_interest(
        &self,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<PointOfInterestMatch>>;
}
