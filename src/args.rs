use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hotel_geosearch::PriceCategory;

/// CLI arguments for hotel-geosearch
#[derive(Debug, Parser)]
#[command(
    name = "hotel-geosearch",
    version,
    about = "Search hotels by location, station or landmark and inspect catalog statistics"
)]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON catalog snapshot (overrides the configured one)
    #[arg(long = "catalog", global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hotels filtered by region, locality, area, price and radius
    Near {
        #[arg(long)]
        region: Option<i64>,
        #[arg(long)]
        locality: Option<i64>,
        #[arg(long)]
        area: Option<i64>,
        /// Price bracket (budget, standard, premium, luxury, ultra)
        #[arg(long)]
        price: Option<PriceCategory>,
        /// Center latitude; requires --lon and --radius
        #[arg(long, requires = "lon", requires = "radius", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Radius around the center in kilometers
        #[arg(long, requires = "lat")]
        radius: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Hotels around a transit stop
    Station {
        id: i64,
        /// Maximum distance in kilometers (default: walkable radius)
        #[arg(long)]
        max_distance: Option<f64>,
        #[arg(long)]
        price: Option<PriceCategory>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Hotels around a point of interest
    Landmark {
        id: i64,
        /// Maximum distance in kilometers (default: accessible radius)
        #[arg(long)]
        max_distance: Option<f64>,
        #[arg(long)]
        price: Option<PriceCategory>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Points of interest around a hotel
    Landmarks {
        hotel_id: i64,
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Autocomplete suggestions for a partial name
    Suggest {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Hotel counts per price bracket
    Prices {
        #[arg(long)]
        region: Option<i64>,
        #[arg(long)]
        locality: Option<i64>,
    },

    /// Localities with the most hotels
    Areas {
        #[arg(long)]
        region: Option<i64>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}
