//! hotel-geosearch - command-line front end
//!
//! Loads the configuration and a JSON catalog snapshot, runs one query and
//! prints the result as JSON on stdout. Logs go to stderr.
//!
//! Usage examples
//! --------------
//!
//! - Budget hotels within 2 km of Tokyo Station
//!   $ hotel-geosearch near --lat 35.6812 --lon 139.7671 --radius 2 --price budget
//!
//! - Hotels around a station or a landmark
//!   $ hotel-geosearch station 1002 --max-distance 1
//!   $ hotel-geosearch landmark 3001
//!
//! - Autocomplete
//!   $ hotel-geosearch suggest shin
//!
//! - Statistics
//!   $ hotel-geosearch prices --region 13
//!   $ hotel-geosearch areas --region 13 --limit 5
mod args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use crate::args::{CliArgs, Commands};
use hotel_geosearch::search::NearFilter;
use hotel_geosearch::{
    Cache, GeoSearchConfig, LocationFilter, MemoryDatastore, SearchEngine, SuggestSettings,
    SuggestionAggregator, logging,
};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode result")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config = GeoSearchConfig::load_from_path(args.config.clone())?;
    logging::init(&config.logging);

    let catalog = args
        .catalog
        .clone()
        .unwrap_or_else(|| config.datastore.snapshot_path.clone().into());
    let datastore = MemoryDatastore::from_json_file(&catalog)
        .with_context(|| format!("Failed to load catalog from {}", catalog.display()))?;
    let datastore = Arc::new(datastore);

    let cache = Cache::connect(&config.cache).await;
    info!("Cache backend: {}", cache.backend_name());

    let engine = SearchEngine::from_config(datastore.clone(), cache.clone(), &config);
    debug!(
        "Search limits {}/{}, {} price brackets",
        engine.settings().default_limit,
        engine.settings().max_limit,
        engine.price_table().brackets().len()
    );

    match args.command {
        Commands::Near {
            region,
            locality,
            area,
            price,
            lat,
            lon,
            radius,
            limit,
            offset,
        } => {
            let near = match (lat, lon, radius) {
                (Some(lat), Some(lon), Some(radius)) => Some(NearFilter::new(lat, lon, radius)),
                _ => None,
            };
            let filter = LocationFilter {
                region_id: region,
                locality_id: locality,
                area_id: area,
                price_bracket: price,
                near,
                limit,
                offset,
            };
            print_json(&engine.search_by_location(&filter).await)?;
        }

        Commands::Station {
            id,
            max_distance,
            price,
            limit,
        } => {
            print_json(&engine.search_by_station(id, max_distance, price, limit).await)?;
        }

        Commands::Landmark {
            id,
            max_distance,
            price,
            limit,
        } => {
            print_json(&engine.search_by_landmark(id, max_distance, price, limit).await)?;
        }

        Commands::Landmarks {
            hotel_id,
            radius,
            limit,
        } => {
            print_json(&engine.nearby_landmarks(hotel_id, radius, limit).await)?;
        }

        Commands::Suggest { query, limit } => {
            let aggregator =
                SuggestionAggregator::new(datastore, cache, SuggestSettings::from(&config));
            debug!(
                "Suggestion sub-query timeout {:?}",
                aggregator.settings().subquery_timeout
            );
            print_json(&aggregator.suggest(&query, limit).await)?;
        }

        Commands::Prices { region, locality } => {
            print_json(&engine.price_statistics(region, locality).await)?;
        }

        Commands::Areas { region, limit } => {
            print_json(&engine.popular_areas(region, limit).await)?;
        }
    }

    Ok(())
}
