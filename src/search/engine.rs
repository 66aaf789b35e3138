//! Radius and anchor searches

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use super::{
    AnchorParams, AnchorResults, CACHE_NAMESPACE, LandmarkSearch, LocationFilter, Lookup,
    NearFilter, NearbyLandmark, NearbyLandmarks, SearchEngine, StationSearch, key_part,
};
use crate::datastore::{HotelQuery, PriceRange};
use crate::geo::{self, BoundingBox, DISTANCE_PRECISION};
use crate::models::{GeoPoint, HotelResult, HotelRow, PriceCategory, PriceTable};
use crate::{GeoSearchError, Result};

impl SearchEngine {
    /// Hotels matching `filter`, best tourist access first.
    ///
    /// Returns an empty list on invalid input or any datastore failure.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search_by_location(&self, filter: &LocationFilter) -> Vec<HotelResult> {
        let key = self.location_cache_key(filter);
        if let Some(hotels) = self.cache.get::<Vec<HotelResult>>(&key).await {
            return hotels;
        }

        match self.run_location_search(filter).await {
            Ok(hotels) => {
                debug!("Found {} hotels", hotels.len());
                self.cache.put(&key, &hotels, self.settings.location_ttl).await;
                hotels
            }
            Err(e) => {
                warn!("Location search failed, returning no hotels: {}", e);
                Vec::new()
            }
        }
    }

    /// Hotels around a transit stop; the radius defaults to walking distance
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search_by_station(
        &self,
        station_id: i64,
        max_distance_km: Option<f64>,
        price_bracket: Option<PriceCategory>,
        limit: Option<usize>,
    ) -> StationSearch {
        let stop = self
            .timed("transit stop lookup", self.datastore.transit_stop(station_id))
            .await;
        let stop = match stop {
            Ok(Some(stop)) => stop,
            Ok(None) => {
                info!("{}", GeoSearchError::not_found("transit stop", station_id));
                return Lookup::NotFound { id: station_id };
            }
            Err(e) => {
                warn!("Could not resolve transit stop {}: {}", station_id, e);
                return Lookup::Unavailable { id: station_id };
            }
        };

        let radius = max_distance_km.unwrap_or(self.settings.walkable_radius_km);
        let (hotels, params) = self
            .search_around(stop.point(), radius, price_bracket, limit)
            .await;
        Lookup::Found(AnchorResults {
            anchor: stop,
            hotels,
            params,
        })
    }

    /// Hotels around a point of interest; the radius defaults to the wider
    /// accessible distance
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search_by_landmark(
        &self,
        landmark_id: i64,
        max_distance_km: Option<f64>,
        price_bracket: Option<PriceCategory>,
        limit: Option<usize>,
    ) -> LandmarkSearch {
        let landmark = self
            .timed(
                "point of interest lookup",
                self.datastore.point_of_interest(landmark_id),
            )
            .await;
        let landmark = match landmark {
            Ok(Some(landmark)) => landmark,
            Ok(None) => {
                info!("{}", GeoSearchError::not_found("point of interest", landmark_id));
                return Lookup::NotFound { id: landmark_id };
            }
            Err(e) => {
                warn!("Could not resolve point of interest {}: {}", landmark_id, e);
                return Lookup::Unavailable { id: landmark_id };
            }
        };

        let radius = max_distance_km.unwrap_or(self.settings.accessible_radius_km);
        let (hotels, params) = self
            .search_around(landmark.point(), radius, price_bracket, limit)
            .await;
        Lookup::Found(AnchorResults {
            anchor: landmark,
            hotels,
            params,
        })
    }

    /// Points of interest within `radius_km` of a hotel, closest first
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn nearby_landmarks(
        &self,
        hotel_id: i64,
        radius_km: Option<f64>,
        limit: usize,
    ) -> Lookup<NearbyLandmarks> {
        let radius_km = radius_km.unwrap_or(self.settings.accessible_radius_km);
        let limit = limit.min(self.settings.max_limit);
        let hotel = match self
            .timed("hotel lookup", self.datastore.hotel_location(hotel_id))
            .await
        {
            Ok(Some(hotel)) => hotel,
            Ok(None) => {
                info!("{}", GeoSearchError::not_found("hotel", hotel_id));
                return Lookup::NotFound { id: hotel_id };
            }
            Err(e) => {
                warn!("Could not resolve hotel {}: {}", hotel_id, e);
                return Lookup::Unavailable { id: hotel_id };
            }
        };

        let near = NearFilter {
            center: hotel.point(),
            radius_km,
        };
        if !near.is_valid() {
            warn!("Invalid landmark search around hotel {}", hotel_id);
            return Lookup::Found(NearbyLandmarks {
                hotel_id,
                radius_km,
                landmarks: Vec::new(),
            });
        }

        let bounds = BoundingBox::around(near.center, radius_km);
        let candidates = match self
            .timed(
                "points of interest query",
                self.datastore.points_of_interest_within(&bounds),
            )
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Landmark query around hotel {} failed: {}", hotel_id, e);
                return Lookup::Unavailable { id: hotel_id };
            }
        };

        let mut landmarks: Vec<NearbyLandmark> = candidates
            .into_iter()
            .map(|landmark| NearbyLandmark {
                distance_km: geo::haversine_distance_km(near.center, landmark.point()),
                landmark,
            })
            .filter(|nearby| nearby.distance_km <= radius_km)
            .collect();
        landmarks.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.landmark.id.cmp(&b.landmark.id))
        });
        landmarks.truncate(limit);

        Lookup::Found(NearbyLandmarks {
            hotel_id,
            radius_km,
            landmarks,
        })
    }

    async fn search_around(
        &self,
        center: GeoPoint,
        radius_km: f64,
        price_bracket: Option<PriceCategory>,
        limit: Option<usize>,
    ) -> (Vec<HotelResult>, AnchorParams) {
        let limit = self.page_limit(limit);
        let filter = LocationFilter {
            price_bracket,
            near: Some(NearFilter { center, radius_km }),
            limit: Some(limit),
            ..LocationFilter::default()
        };
        let hotels = self.search_by_location(&filter).await;
        let params = AnchorParams {
            max_distance_km: radius_km,
            price_bracket,
            limit,
        };
        (hotels, params)
    }

    async fn run_location_search(&self, filter: &LocationFilter) -> Result<Vec<HotelResult>> {
        if let Some(near) = &filter.near
            && !near.is_valid()
        {
            return Err(GeoSearchError::invalid_input(format!(
                "invalid search center {} with radius {} km",
                near.center.format_coordinates(),
                near.radius_km
            )));
        }

        let price_range = filter
            .price_bracket
            .map(|category| {
                self.prices
                    .bracket(category)
                    .map(PriceRange::from)
                    .ok_or_else(|| {
                        GeoSearchError::invalid_input(format!(
                            "price bracket '{category}' is not configured"
                        ))
                    })
            })
            .transpose()?;

        let query = HotelQuery {
            region_id: filter.region_id,
            locality_id: filter.locality_id,
            area_id: filter.area_id,
            price_range,
            bounds: filter
                .near
                .map(|near| BoundingBox::around(near.center, near.radius_km)),
        };
        let rows = self
            .timed("hotel query", self.datastore.query_hotels(&query))
            .await?;

        let mut hotels: Vec<HotelResult> = rows
            .into_iter()
            .filter_map(|row| {
                let distance = filter
                    .near
                    .map(|near| geo::haversine_distance_km(near.center, row.location.point()));
                let within = match (filter.near, distance) {
                    (Some(near), Some(distance)) => distance <= near.radius_km,
                    _ => true,
                };
                within.then(|| annotate(row, distance, &self.prices))
            })
            .collect();
        hotels.sort_by(rank);

        Ok(hotels
            .into_iter()
            .skip(filter.offset)
            .take(self.page_limit(filter.limit))
            .collect())
    }

    /// Cache key over the whole normalized filter. The center is rounded to
    /// the distance precision; the query itself uses the exact center.
    fn location_cache_key(&self, filter: &LocationFilter) -> String {
        let near = filter.near.map(|near| {
            format!(
                "{}:{:.2}",
                near.center.cache_key(DISTANCE_PRECISION),
                near.radius_km
            )
        });
        format!(
            "{CACHE_NAMESPACE}location:r={}:l={}:a={}:p={}:near={}:lim={}:off={}",
            key_part(filter.region_id),
            key_part(filter.locality_id),
            key_part(filter.area_id),
            key_part(filter.price_bracket),
            key_part(near),
            self.page_limit(filter.limit),
            filter.offset
        )
    }
}

/// Descending tourist access, then closest, then lowest id
fn rank(a: &HotelResult, b: &HotelResult) -> Ordering {
    b.access
        .tourist
        .cmp(&a.access.tourist)
        .then_with(|| {
            let a = a.distance_km.unwrap_or(0.0);
            let b = b.distance_km.unwrap_or(0.0);
            a.total_cmp(&b)
        })
        .then_with(|| a.hotel_id.cmp(&b.hotel_id))
}

fn annotate(row: HotelRow, distance_km: Option<f64>, prices: &PriceTable) -> HotelResult {
    let average_price = row.average_price();
    let HotelRow {
        location,
        price,
        region_name,
        locality_name,
        area_name,
        station_name,
        station_line,
        ..
    } = row;

    HotelResult {
        hotel_id: location.hotel_id,
        latitude: location.latitude,
        longitude: location.longitude,
        region_id: location.region_id,
        region_name,
        locality_id: location.locality_id,
        locality_name,
        area_id: location.area_id,
        area_name,
        nearest_station: station_name,
        station_line,
        walk_minutes_to_station: location.walk_minutes_to_stop,
        distance_km,
        average_price,
        min_price: price.as_ref().map(|p| p.min_price),
        max_price: price.as_ref().map(|p| p.max_price),
        price_category: geo::classify_price(prices, average_price),
        price_label: prices.label(average_price).to_string(),
        overall_access_score: location.access.overall(),
        access: location.access,
        address: location.address,
    }
}
