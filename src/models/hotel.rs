//! Hotel location records and annotated search results

use serde::{Deserialize, Serialize};

use super::{GeoPoint, PriceCategory};
use crate::geo;

/// Normalized 0-100 convenience ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessScores {
    pub tourist: u8,
    pub business: u8,
    pub transport: u8,
}

impl AccessScores {
    /// Create scores, clamping each component to 100
    #[must_use]
    pub fn new(tourist: u8, business: u8, transport: u8) -> Self {
        Self {
            tourist: tourist.min(100),
            business: business.min(100),
            transport: transport.min(100),
        }
    }

    #[must_use]
    pub fn overall(&self) -> u8 {
        geo::overall_access_score(self.tourist, self.business, self.transport)
    }
}

/// Where a hotel is and how it connects to transit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelLocation {
    pub hotel_id: i64,
    pub region_id: i64,
    pub locality_id: i64,
    pub area_id: Option<i64>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub nearest_stop_id: Option<i64>,
    pub distance_to_stop_meters: Option<u32>,
    pub walk_minutes_to_stop: Option<u32>,
    pub access: AccessScores,
}

impl HotelLocation {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Price summary, 1:1 with a hotel location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub hotel_id: i64,
    pub current_average_price: u64,
    pub min_price: u64,
    pub max_price: u64,
    pub price_category_id: Option<i64>,
}

/// Hotel location joined with its price analysis and ancestry
#[derive(Debug, Clone, PartialEq)]
pub struct HotelRow {
    pub location: HotelLocation,
    pub price: Option<PriceAnalysis>,
    pub region_name: Option<String>,
    pub locality_name: Option<String>,
    pub locality_is_major: bool,
    pub area_name: Option<String>,
    pub station_name: Option<String>,
    pub station_line: Option<String>,
}

impl HotelRow {
    #[must_use]
    pub fn average_price(&self) -> Option<u64> {
        self.price.as_ref().map(|p| p.current_average_price)
    }
}

/// Search hit annotated with distance, price bracket and overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelResult {
    pub hotel_id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub region_id: i64,
    pub region_name: Option<String>,
    pub locality_id: i64,
    pub locality_name: Option<String>,
    pub area_id: Option<i64>,
    pub area_name: Option<String>,
    pub nearest_station: Option<String>,
    pub station_line: Option<String>,
    pub walk_minutes_to_station: Option<u32>,
    /// Great-circle distance from the search center, when one was given
    pub distance_km: Option<f64>,
    pub average_price: Option<u64>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub price_category: Option<PriceCategory>,
    pub price_label: String,
    pub access: AccessScores,
    pub overall_access_score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_scores_clamped() {
        let scores = AccessScores::new(150, 20, 100);
        assert_eq!(scores.tourist, 100);
        assert_eq!(scores.business, 20);
    }

    #[test]
    fn test_overall_access_score() {
        assert_eq!(AccessScores::new(80, 60, 70).overall(), 70);
        assert_eq!(AccessScores::new(100, 100, 99).overall(), 100);
        assert_eq!(AccessScores::default().overall(), 0);
    }
}
