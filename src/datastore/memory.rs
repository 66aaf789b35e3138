//! In-memory datastore over a JSON catalog snapshot

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{HotelDatastore, HotelQuery};
use crate::geo::BoundingBox;
use crate::models::{
    AccessScores, HotelLocation, HotelRow, Locality, LocalityMatch, PointOfInterest,
    PointOfInterestMatch, PriceAnalysis, Region, RegionMatch, TransitStop, TransitStopMatch,
};
use crate::{GeoSearchError, Result};

/// Named neighbourhood inside a locality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub locality_id: i64,
}

/// Serialized form of the whole catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub localities: Vec<Locality>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub transit_stops: Vec<TransitStop>,
    #[serde(default)]
    pub points_of_interest: Vec<PointOfInterest>,
    #[serde(default)]
    pub hotels: Vec<HotelLocation>,
    #[serde(default)]
    pub price_analyses: Vec<PriceAnalysis>,
}

/// Datastore answering every query from memory
pub struct MemoryDatastore {
    snapshot: CatalogSnapshot,
    regions: HashMap<i64, usize>,
    localities: HashMap<i64, usize>,
    areas: HashMap<i64, usize>,
    stops: HashMap<i64, usize>,
    pois: HashMap<i64, usize>,
    hotels: HashMap<i64, usize>,
    prices: HashMap<i64, PriceAnalysis>,
}

fn index_by<T>(items: &[T], id: impl Fn(&T) -> i64, entity: &str) -> Result<HashMap<i64, usize>> {
    let mut index = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        if index.insert(id(item), position).is_some() {
            return Err(GeoSearchError::invalid_input(format!(
                "duplicate {entity} id {}",
                id(item)
            )));
        }
    }
    Ok(index)
}

fn text_matches(needle: &str, name: &str, localized: Option<&str>) -> bool {
    name.to_lowercase().contains(needle)
        || localized.is_some_and(|l| l.to_lowercase().contains(needle))
}

impl MemoryDatastore {
    /// Index a snapshot. Duplicate ids and a second price analysis for the
    /// same hotel are rejected; access scores are clamped to 100.
    pub fn new(mut snapshot: CatalogSnapshot) -> Result<Self> {
        for hotel in &mut snapshot.hotels {
            let a = hotel.access;
            hotel.access = AccessScores::new(a.tourist, a.business, a.transport);
        }

        let regions = index_by(&snapshot.regions, |r| r.id, "region")?;
        let localities = index_by(&snapshot.localities, |l| l.id, "locality")?;
        let areas = index_by(&snapshot.areas, |a| a.id, "area")?;
        let stops = index_by(&snapshot.transit_stops, |s| s.id, "transit stop")?;
        let pois = index_by(&snapshot.points_of_interest, |p| p.id, "point of interest")?;
        let hotels = index_by(&snapshot.hotels, |h| h.hotel_id, "hotel")?;

        let mut prices = HashMap::with_capacity(snapshot.price_analyses.len());
        for analysis in &snapshot.price_analyses {
            if prices.insert(analysis.hotel_id, analysis.clone()).is_some() {
                return Err(GeoSearchError::invalid_input(format!(
                    "hotel {} has more than one price analysis",
                    analysis.hotel_id
                )));
            }
        }

        info!(
            "Loaded catalog with {} hotels, {} stations and {} landmarks",
            snapshot.hotels.len(),
            snapshot.transit_stops.len(),
            snapshot.points_of_interest.len()
        );

        Ok(Self {
            snapshot,
            regions,
            localities,
            areas,
            stops,
            pois,
            hotels,
            prices,
        })
    }

    /// Parse a JSON snapshot
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Load a JSON snapshot from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading catalog snapshot from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn region(&self, id: i64) -> Option<&Region> {
        self.regions.get(&id).map(|i| &self.snapshot.regions[*i])
    }

    fn locality(&self, id: i64) -> Option<&Locality> {
        self.localities.get(&id).map(|i| &self.snapshot.localities[*i])
    }

    fn stop(&self, id: i64) -> Option<&TransitStop> {
        self.stops.get(&id).map(|i| &self.snapshot.transit_stops[*i])
    }

    fn join(&self, location: &HotelLocation) -> HotelRow {
        let locality = self.locality(location.locality_id);
        let stop = location.nearest_stop_id.and_then(|id| self.stop(id));
        HotelRow {
            location: location.clone(),
            price: self.prices.get(&location.hotel_id).cloned(),
            region_name: self.region(location.region_id).map(|r| r.name.clone()),
            locality_name: locality.map(|l| l.name.clone()),
            locality_is_major: locality.is_some_and(|l| l.is_major),
            area_name: location
                .area_id
                .and_then(|id| self.areas.get(&id))
                .map(|i| self.snapshot.areas[*i].name.clone()),
            station_name: stop.map(|s| s.name.clone()),
            station_line: stop.and_then(|s| s.line_name.clone()),
        }
    }
}

#[async_trait]
impl HotelDatastore for MemoryDatastore {
    async fn query_hotels(&self, query: &HotelQuery) -> Result<Vec<HotelRow>> {
        Ok(self
            .snapshot
            .hotels
            .iter()
            .map(|location| self.join(location))
            .filter(|row| query.matches(row))
            .collect())
    }

    async fn transit_stop(&self, id: i64) -> Result<Option<TransitStop>> {
        Ok(self.stop(id).cloned())
    }

    async fn point_of_interest(&self, id: i64) -> Result<Option<PointOfInterest>> {
        Ok(self
            .pois
            .get(&id)
            .map(|i| self.snapshot.points_of_interest[*i].clone()))
    }

    async fn hotel_location(&self, hotel_id: i64) -> Result<Option<HotelLocation>> {
        Ok(self
            .hotels
            .get(&hotel_id)
            .map(|i| self.snapshot.hotels[*i].clone()))
    }

    async fn points_of_interest_within(&self, bounds: &BoundingBox) -> Result<Vec<PointOfInterest>> {
        Ok(self
            .snapshot
            .points_of_interest
            .iter()
            .filter(|p| bounds.contains(p.latitude, p.longitude))
            .cloned()
            .collect())
    }

    async fn match_regions(&self, pattern: &str, limit: usize) -> Result<Vec<RegionMatch>> {
        let needle = pattern.to_lowercase();
        Ok(self
            .snapshot
            .regions
            .iter()
            .filter(|r| text_matches(&needle, &r.name, r.localized_name.as_deref()))
            .take(limit)
            .map(|r| RegionMatch {
                region: r.clone(),
                parent_name: r
                    .parent_region_id
                    .and_then(|id| self.region(id))
                    .map(|p| p.name.clone()),
            })
            .collect())
    }

    async fn match_localities(&self, pattern: &str, limit: usize) -> Result<Vec<LocalityMatch>> {
        let needle = pattern.to_lowercase();
        Ok(self
            .snapshot
            .localities
            .iter()
            .filter(|l| text_matches(&needle, &l.name, l.localized_name.as_deref()))
            .take(limit)
            .map(|l| LocalityMatch {
                locality: l.clone(),
                region_name: self.region(l.region_id).map(|r| r.name.clone()),
            })
            .collect())
    }

    async fn match_transit_stops(
        &self,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<TransitStopMatch>> {
        let needle = pattern.to_lowercase();
        Ok(self
            .snapshot
            .transit_stops
            .iter()
            .filter(|s| text_matches(&needle, &s.name, s.localized_name.as_deref()))
            .take(limit)
            .map(|s| TransitStopMatch {
                stop: s.clone(),
                locality_name: self.locality(s.locality_id).map(|l| l.name.clone()),
            })
            .collect())
    }

    async fn match_points_of_interest(
        &self,
        pattern: &str,
        limit: usize,
    ) -> Result<Vec<PointOfInterestMatch>> {
        let needle = pattern.to_lowercase();
        Ok(self
            .snapshot
            .points_of_interest
            .iter()
            .filter(|p| text_matches(&needle, &p.name, p.localized_name.as_deref()))
            .take(limit)
            .map(|p| PointOfInterestMatch {
                poi: p.clone(),
                locality_name: self.locality(p.locality_id).map(|l| l.name.clone()),
            })
            .collect())
    }
}

/// Small Tokyo/Osaka catalog shared by unit tests
#[cfg(test)]
pub(crate) fn sample_snapshot() -> CatalogSnapshot {
    fn region(id: i64, name: &str, localized: &str, parent: Option<i64>) -> Region {
        Region {
            id,
            name: name.to_string(),
            localized_name: Some(localized.to_string()),
            parent_region_id: parent,
        }
    }

    fn locality(id: i64, name: &str, lat: f64, lon: f64, is_major: bool, region_id: i64) -> Locality {
        Locality {
            id,
            name: name.to_string(),
            localized_name: None,
            latitude: lat,
            longitude: lon,
            is_major,
            region_id,
        }
    }

    fn stop(id: i64, name: &str, lat: f64, lon: f64, locality_id: i64, line: &str) -> TransitStop {
        TransitStop {
            id,
            name: name.to_string(),
            localized_name: None,
            latitude: lat,
            longitude: lon,
            locality_id,
            line_name: Some(line.to_string()),
        }
    }

    fn poi(id: i64, name: &str, category: &str, lat: f64, lon: f64, locality_id: i64) -> PointOfInterest {
        PointOfInterest {
            id,
            name: name.to_string(),
            localized_name: None,
            category: category.to_string(),
            latitude: lat,
            longitude: lon,
            rating: Some(4.5),
            locality_id,
        }
    }

    fn hotel(
        hotel_id: i64,
        region_id: i64,
        locality_id: i64,
        lat: f64,
        lon: f64,
        stop: Option<i64>,
        access: (u8, u8, u8),
    ) -> HotelLocation {
        HotelLocation {
            hotel_id,
            region_id,
            locality_id,
            area_id: None,
            address: format!("{hotel_id} Sample Street"),
            latitude: lat,
            longitude: lon,
            nearest_stop_id: stop,
            distance_to_stop_meters: stop.map(|_| 400),
            walk_minutes_to_stop: stop.map(|_| 5),
            access: AccessScores::new(access.0, access.1, access.2),
        }
    }

    fn price(hotel_id: i64, average: u64) -> PriceAnalysis {
        PriceAnalysis {
            hotel_id,
            current_average_price: average,
            min_price: average * 8 / 10,
            max_price: average * 12 / 10,
            price_category_id: None,
        }
    }

    let mut shinjuku_hotel = hotel(1, 13, 101, 35.6920, 139.6950, Some(1001), (80, 90, 95));
    shinjuku_hotel.area_id = Some(501);

    CatalogSnapshot {
        regions: vec![
            region(1, "Kanto", "関東", None),
            region(13, "Tokyo", "東京都", Some(1)),
            region(27, "Osaka", "大阪府", None),
        ],
        localities: vec![
            locality(101, "Shinjuku", 35.6938, 139.7034, true, 13),
            locality(102, "Chiyoda", 35.6940, 139.7536, true, 13),
            locality(103, "Taito", 35.7126, 139.7800, false, 13),
            locality(201, "Osaka City", 34.6937, 135.5023, true, 27),
        ],
        areas: vec![Area {
            id: 501,
            name: "Nishi-Shinjuku".to_string(),
            locality_id: 101,
        }],
        transit_stops: vec![
            stop(1001, "Shinjuku Station", 35.6896, 139.7006, 101, "JR Yamanote"),
            stop(1002, "Tokyo Station", 35.6812, 139.7671, 102, "JR Yamanote"),
            stop(1003, "Asakusa Station", 35.7115, 139.7967, 103, "Ginza Line"),
            stop(2001, "Umeda Station", 34.7025, 135.4959, 201, "Midosuji Line"),
        ],
        points_of_interest: vec![
            poi(3001, "Senso-ji", "temple", 35.7148, 139.7967, 103),
            poi(3002, "Imperial Palace", "palace", 35.6852, 139.7528, 102),
            poi(3003, "Shinjuku Gyoen", "park", 35.6852, 139.7100, 101),
            poi(4001, "Osaka Castle", "castle", 34.6873, 135.5262, 201),
        ],
        hotels: vec![
            shinjuku_hotel,
            hotel(2, 13, 101, 35.6900, 139.7000, Some(1001), (85, 70, 90)),
            hotel(3, 13, 102, 35.6800, 139.7660, Some(1002), (90, 95, 100)),
            hotel(4, 13, 102, 35.6850, 139.7600, Some(1002), (95, 80, 85)),
            hotel(5, 13, 103, 35.7120, 139.7950, Some(1003), (88, 40, 70)),
            hotel(6, 13, 103, 35.7130, 139.7900, None, (60, 30, 50)),
            hotel(7, 27, 201, 34.6950, 135.5000, Some(2001), (70, 75, 80)),
        ],
        price_analyses: vec![
            price(1, 12_000),
            price(2, 28_000),
            price(3, 45_000),
            price(4, 75_000),
            price(5, 9_000),
            price(7, 14_000),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::PriceRange;
    use crate::models::GeoPoint;

    fn store() -> MemoryDatastore {
        MemoryDatastore::new(sample_snapshot()).unwrap()
    }

    #[tokio::test]
    async fn test_query_joins_ancestry() {
        let rows = store()
            .query_hotels(&HotelQuery {
                area_id: Some(501),
                ..HotelQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.region_name.as_deref(), Some("Tokyo"));
        assert_eq!(row.locality_name.as_deref(), Some("Shinjuku"));
        assert_eq!(row.area_name.as_deref(), Some("Nishi-Shinjuku"));
        assert_eq!(row.station_name.as_deref(), Some("Shinjuku Station"));
        assert_eq!(row.average_price(), Some(12_000));
        assert!(row.locality_is_major);
    }

    #[tokio::test]
    async fn test_price_range_excludes_unpriced_hotels() {
        let rows = store()
            .query_hotels(&HotelQuery {
                locality_id: Some(103),
                price_range: Some(PriceRange { min: 0, max: None }),
                ..HotelQuery::default()
            })
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.location.hotel_id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[tokio::test]
    async fn test_bounding_box_filter() {
        let bounds = BoundingBox::around(GeoPoint::new(35.6812, 139.7671), 1.0);
        let rows = store()
            .query_hotels(&HotelQuery {
                bounds: Some(bounds),
                ..HotelQuery::default()
            })
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.location.hotel_id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_text_match_is_case_insensitive_and_localized() {
        let store = store();
        let regions = store.match_regions("東京", 3).await.unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].parent_name.as_deref(), Some("Kanto"));

        let stops = store.match_transit_stops("STATION", 2).await.unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].locality_name.as_deref(), Some("Shinjuku"));
    }

    #[test]
    fn test_rejects_second_price_analysis() {
        let mut snapshot = sample_snapshot();
        snapshot.price_analyses.push(snapshot.price_analyses[0].clone());
        assert!(MemoryDatastore::new(snapshot).is_err());
    }

    #[test]
    fn test_clamps_access_scores() {
        let mut snapshot = sample_snapshot();
        snapshot.hotels[0].access.tourist = 250;
        let store = MemoryDatastore::new(snapshot).unwrap();
        assert_eq!(store.snapshot.hotels[0].access.tourist, 100);
    }

    #[test]
    fn test_from_json_str() {
        let json = serde_json::to_string(&sample_snapshot()).unwrap();
        let store = MemoryDatastore::from_json_str(&json).unwrap();
        assert_eq!(store.hotels.len(), 7);
    }
}
