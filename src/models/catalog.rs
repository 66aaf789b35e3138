//! Catalog entities owned by the datastore
//!
//! Regions, localities, transit stops and points of interest are read-only
//! reference data. They anchor searches and feed autocomplete.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// Administrative hierarchy node (country subdivision)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub localized_name: Option<String>,
    pub parent_region_id: Option<i64>,
}

/// A city or town within a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    pub id: i64,
    pub name: String,
    pub localized_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_major: bool,
    pub region_id: i64,
}

/// A rail or metro station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitStop {
    pub id: i64,
    pub name: String,
    pub localized_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub locality_id: i64,
    pub line_name: Option<String>,
}

impl TransitStop {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A tourist landmark such as a temple, museum or park
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: i64,
    pub name: String,
    pub localized_name: Option<String>,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub locality_id: i64,
}

impl PointOfInterest {
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Region hit from a text match, with its parent's name
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMatch {
    pub region: Region,
    pub parent_name: Option<String>,
}

/// Locality hit from a text match, with its region's name
#[derive(Debug, Clone, PartialEq)]
pub struct LocalityMatch {
    pub locality: Locality,
    pub region_name: Option<String>,
}

/// Transit stop hit from a text match, with its locality's name
#[derive(Debug, Clone, PartialEq)]
pub struct TransitStopMatch {
    pub stop: TransitStop,
    pub locality_name: Option<String>,
}

/// Landmark hit from a text match, with its locality's name
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterestMatch {
    pub poi: PointOfInterest,
    pub locality_name: Option<String>,
}
