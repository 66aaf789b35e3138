//! Geo filter
//!
//! Pure functions used by the search engine: a cheap bounding-box pre-filter,
//! exact great-circle distance, and score helpers.

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, PriceCategory, PriceTable};

/// Kilometers per degree of latitude used for the bounding-box approximation
pub const KM_PER_DEGREE: f64 = 111.0;

/// Decimal places kept on distances
pub const DISTANCE_PRECISION: u32 = 2;

/// Axis-aligned latitude/longitude rectangle.
///
/// When the box crosses the antimeridian, `lon_min` is greater than
/// `lon_max` and the longitude range wraps through 180.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Approximate the circle of `radius_km` around `center`.
    ///
    /// Over-includes near the poles and for large radii; membership is
    /// decided by [`haversine_distance_km`], never by the box.
    #[must_use]
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lon_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos()).abs();
        let (lon_min, lon_max) = if lon_delta >= 180.0 {
            (-180.0, 180.0)
        } else {
            (
                wrap_longitude(center.longitude - lon_delta),
                wrap_longitude(center.longitude + lon_delta),
            )
        };
        Self {
            lat_min: center.latitude - lat_delta,
            lat_max: center.latitude + lat_delta,
            lon_min,
            lon_max,
        }
    }

    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.lon_min > self.lon_max
    }

    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        if !(self.lat_min..=self.lat_max).contains(&latitude) {
            return false;
        }
        if self.crosses_antimeridian() {
            longitude >= self.lon_min || longitude <= self.lon_max
        } else {
            (self.lon_min..=self.lon_max).contains(&longitude)
        }
    }
}

/// Bring a longitude back into -180..=180
fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// Great-circle distance in kilometers, rounded to two decimals
#[must_use]
pub fn haversine_distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    if from == to {
        return 0.0;
    }
    let distance = haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Kilometers,
    );
    round_to(distance, DISTANCE_PRECISION)
}

/// Classify a price against the bracket table; `None` means unset
#[must_use]
pub fn classify_price(table: &PriceTable, price: Option<u64>) -> Option<PriceCategory> {
    table.classify(price)
}

/// Mean of the three access scores, rounded half-up
#[must_use]
pub fn overall_access_score(tourist: u8, business: u8, transport: u8) -> u8 {
    let sum = u32::from(tourist) + u32::from(business) + u32::from(transport);
    // sum / 3, half-up, in integer arithmetic
    ((sum * 2 + 3) / 6) as u8
}

fn round_to(value: f64, precision: u32) -> f64 {
    let multiplier = 10_f64.powi(precision as i32);
    (value * multiplier).round() / multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(35.681_236, 139.767_125)]
    #[case(0.0, 0.0)]
    #[case(-33.868_8, 151.209_3)]
    #[case(89.999, -179.5)]
    fn test_distance_to_self_is_zero(#[case] lat: f64, #[case] lon: f64) {
        let point = GeoPoint::new(lat, lon);
        let distance = haversine_distance_km(point, point);
        assert_eq!(distance, 0.0);
        assert!(!distance.is_nan());
    }

    #[rstest]
    #[case(GeoPoint::new(35.681_236, 139.767_125), GeoPoint::new(34.702_485, 135.495_951))]
    #[case(GeoPoint::new(51.5074, -0.1278), GeoPoint::new(48.8566, 2.3522))]
    #[case(GeoPoint::new(-1.0, 179.9), GeoPoint::new(1.0, -179.9))]
    fn test_distance_is_symmetric(#[case] a: GeoPoint, #[case] b: GeoPoint) {
        assert_eq!(haversine_distance_km(a, b), haversine_distance_km(b, a));
    }

    #[test]
    fn test_known_distance() {
        // Tokyo Station to Shin-Osaka Station, roughly 403 km
        let tokyo = GeoPoint::new(35.681_236, 139.767_125);
        let osaka = GeoPoint::new(34.733_48, 135.500_109);
        let distance = haversine_distance_km(tokyo, osaka);
        assert!((395.0..410.0).contains(&distance), "got {distance}");
        assert_eq!(distance, (distance * 100.0).round() / 100.0);
    }

    #[rstest]
    #[case(35.0, 0.5)]
    #[case(-60.0, 3.0)]
    #[case(0.0, 50.0)]
    #[case(89.0, 10.0)]
    fn test_bounding_box_contains_center(#[case] lat: f64, #[case] radius: f64) {
        let bbox = BoundingBox::around(GeoPoint::new(lat, 10.0), radius);
        assert!(bbox.contains(lat, 10.0));
    }

    #[rstest]
    #[case(-17.0, 179.95, -179.95)]
    #[case(-17.0, -179.95, 179.95)]
    #[case(64.0, 179.9, -179.8)]
    fn test_bounding_box_wraps_antimeridian(
        #[case] lat: f64,
        #[case] center_lon: f64,
        #[case] other_lon: f64,
    ) {
        let center = GeoPoint::new(lat, center_lon);
        let other = GeoPoint::new(lat, other_lon);
        let distance = haversine_distance_km(center, other);
        assert!(distance < 20.0, "got {distance}");

        let bbox = BoundingBox::around(center, 20.0);
        assert!(bbox.crosses_antimeridian());
        assert!(bbox.contains(lat, center_lon));
        assert!(bbox.contains(lat, other_lon));
        assert!(!bbox.contains(lat, 0.0));
    }

    #[test]
    fn test_bounding_box_huge_radius_covers_every_longitude() {
        let bbox = BoundingBox::around(GeoPoint::new(89.9, 10.0), 100.0);
        assert!(!bbox.crosses_antimeridian());
        assert!(bbox.contains(89.9, -170.0));
        assert!(bbox.contains(89.9, 180.0));
    }

    #[test]
    fn test_bounding_box_grows_with_radius() {
        let center = GeoPoint::new(35.68, 139.76);
        let mut previous = BoundingBox::around(center, 0.0);
        for step in 1..50 {
            let bbox = BoundingBox::around(center, f64::from(step) * 0.5);
            assert!(bbox.lat_min <= previous.lat_min && bbox.lat_max >= previous.lat_max);
            assert!(bbox.lon_min <= previous.lon_min && bbox.lon_max >= previous.lon_max);
            previous = bbox;
        }
    }

    #[test]
    fn test_bounding_box_latitude_delta() {
        let bbox = BoundingBox::around(GeoPoint::new(0.0, 0.0), 111.0);
        assert!((bbox.lat_max - 1.0).abs() < 1e-12);
        assert!((bbox.lon_max - 1.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(80, 60, 70, 70)]
    #[case(100, 100, 99, 100)]
    #[case(1, 0, 0, 0)]
    #[case(1, 1, 0, 1)]
    #[case(0, 0, 0, 0)]
    fn test_overall_access_score(
        #[case] tourist: u8,
        #[case] business: u8,
        #[case] transport: u8,
        #[case] expected: u8,
    ) {
        assert_eq!(overall_access_score(tourist, business, transport), expected);
    }

    #[test]
    fn test_classify_price_delegates_to_table() {
        let table = PriceTable::default();
        assert_eq!(classify_price(&table, Some(20_000)), Some(PriceCategory::Standard));
        assert_eq!(classify_price(&table, None), None);
    }
}
