//! Data models for the hotel geosearch library
//!
//! This module contains the domain models organized by concern:
//! - Location: Geographic points and cache-key rounding
//! - Catalog: Regions, localities, stations and landmarks
//! - Hotel: Hotel locations, price analysis and annotated results
//! - Price: The ordered price-bracket table

pub mod catalog;
pub mod hotel;
pub mod location;
pub mod price;

// Re-export all public types for convenient access
pub use catalog::{
    Locality, LocalityMatch, PointOfInterest, PointOfInterestMatch, Region, RegionMatch,
    TransitStop, TransitStopMatch,
};
pub use hotel::{AccessScores, HotelLocation, HotelResult, HotelRow, PriceAnalysis};
pub use location::GeoPoint;
pub use price::{PriceBracket, PriceCategory, PriceTable, UNSET_PRICE_LABEL};
