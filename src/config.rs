//! Configuration management for the hotel geosearch library
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::GeoSearchError;
use crate::models::PriceTable;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoSearchConfig {
    /// Cache backend and TTL configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Search engine configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Autocomplete configuration
    #[serde(default)]
    pub suggest: SuggestConfig,
    /// Catalog datastore configuration
    #[serde(default)]
    pub datastore: DatastoreConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; the in-process store is used when absent or unreachable
    pub redis_url: Option<String>,
    /// Prefix applied to every Redis key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Capacity of the in-process store
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Timeout for each Redis command in milliseconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
    /// TTL of location search results in seconds
    #[serde(default = "default_location_ttl")]
    pub location_ttl_seconds: u64,
    /// TTL of price statistics in seconds
    #[serde(default = "default_statistics_ttl")]
    pub statistics_ttl_seconds: u64,
    /// TTL of popular-area rankings in seconds
    #[serde(default = "default_statistics_ttl")]
    pub popular_areas_ttl_seconds: u64,
    /// TTL of autocomplete suggestions in seconds
    #[serde(default = "default_suggestion_ttl")]
    pub suggestion_ttl_seconds: u64,
}

/// Search engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size when the caller does not give one
    #[serde(default = "default_page_limit")]
    pub default_limit: usize,
    /// Largest page size accepted
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Default radius around a station in kilometers
    #[serde(default = "default_walkable_radius")]
    pub walkable_radius_km: f64,
    /// Default radius around a landmark in kilometers
    #[serde(default = "default_accessible_radius")]
    pub accessible_radius_km: f64,
    /// Timeout for each datastore query in milliseconds
    #[serde(default = "default_datastore_timeout")]
    pub datastore_timeout_ms: u64,
    /// Ordered price brackets, contiguous over `[0, ∞)`
    #[serde(default)]
    pub price_brackets: PriceTable,
}

/// Autocomplete settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// Shortest query that reaches the datastore
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
    /// Overall number of suggestions when the caller does not give one
    #[serde(default = "default_suggest_limit")]
    pub default_limit: usize,
    #[serde(default = "default_region_limit")]
    pub region_limit: usize,
    #[serde(default = "default_locality_limit")]
    pub locality_limit: usize,
    #[serde(default = "default_station_limit")]
    pub station_limit: usize,
    #[serde(default = "default_landmark_limit")]
    pub landmark_limit: usize,
    /// Timeout for each entity sub-query in milliseconds
    #[serde(default = "default_subquery_timeout")]
    pub subquery_timeout_ms: u64,
}

/// Catalog datastore settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// JSON catalog snapshot loaded by the command-line front end
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_key_prefix() -> String {
    "geosearch:".to_string()
}

fn default_max_entries() -> usize {
    1_000
}

fn default_operation_timeout() -> u64 {
    250
}

fn default_location_ttl() -> u64 {
    5 * 60
}

fn default_statistics_ttl() -> u64 {
    60 * 60
}

fn default_suggestion_ttl() -> u64 {
    10 * 60
}

fn default_page_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

fn default_walkable_radius() -> f64 {
    3.0
}

fn default_accessible_radius() -> f64 {
    10.0
}

fn default_datastore_timeout() -> u64 {
    2_000
}

fn default_min_query_length() -> usize {
    2
}

fn default_suggest_limit() -> usize {
    10
}

fn default_region_limit() -> usize {
    3
}

fn default_locality_limit() -> usize {
    4
}

fn default_station_limit() -> usize {
    3
}

fn default_landmark_limit() -> usize {
    3
}

fn default_subquery_timeout() -> u64 {
    500
}

fn default_snapshot_path() -> String {
    "data/catalog.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_key_prefix(),
            max_entries: default_max_entries(),
            operation_timeout_ms: default_operation_timeout(),
            location_ttl_seconds: default_location_ttl(),
            statistics_ttl_seconds: default_statistics_ttl(),
            popular_areas_ttl_seconds: default_statistics_ttl(),
            suggestion_ttl_seconds: default_suggestion_ttl(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
            walkable_radius_km: default_walkable_radius(),
            accessible_radius_km: default_accessible_radius(),
            datastore_timeout_ms: default_datastore_timeout(),
            price_brackets: PriceTable::default(),
        }
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            min_query_length: default_min_query_length(),
            default_limit: default_suggest_limit(),
            region_limit: default_region_limit(),
            locality_limit: default_locality_limit(),
            station_limit: default_station_limit(),
            landmark_limit: default_landmark_limit(),
            subquery_timeout_ms: default_subquery_timeout(),
        }
    }
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GeoSearchConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. GEOSEARCH_CACHE__REDIS_URL
        builder = builder.add_source(
            Environment::with_prefix("GEOSEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GeoSearchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hotel-geosearch").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.cache.key_prefix.is_empty() {
            self.cache.key_prefix = default_key_prefix();
        }
        if self.cache.max_entries == 0 {
            self.cache.max_entries = default_max_entries();
        }
        if self.cache.operation_timeout_ms == 0 {
            self.cache.operation_timeout_ms = default_operation_timeout();
        }
        if self.search.default_limit == 0 {
            self.search.default_limit = default_page_limit();
        }
        if self.search.max_limit == 0 {
            self.search.max_limit = default_max_limit();
        }
        if self.search.datastore_timeout_ms == 0 {
            self.search.datastore_timeout_ms = default_datastore_timeout();
        }
        if self.suggest.default_limit == 0 {
            self.suggest.default_limit = default_suggest_limit();
        }
        if self.suggest.subquery_timeout_ms == 0 {
            self.suggest.subquery_timeout_ms = default_subquery_timeout();
        }
        if self.datastore.snapshot_path.is_empty() {
            self.datastore.snapshot_path = default_snapshot_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings.
    ///
    /// Price brackets are already checked for gaps and overlaps when they
    /// are deserialized into a [`PriceTable`].
    pub fn validate(&self) -> Result<()> {
        self.validate_cache()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate cache backend settings
    fn validate_cache(&self) -> Result<()> {
        if let Some(url) = &self.cache.redis_url {
            let known_scheme = ["redis://", "rediss://", "unix://", "redis+unix://"]
                .iter()
                .any(|scheme| url.starts_with(scheme));
            if !url.is_empty() && !known_scheme {
                return Err(GeoSearchError::config(
                    "Redis URL must start with redis://, rediss:// or unix://",
                )
                .into());
            }
        }

        if self.cache.max_entries > 1_000_000 {
            return Err(
                GeoSearchError::config("In-process cache cannot exceed 1000000 entries").into(),
            );
        }

        let week = 7 * 24 * 60 * 60;
        let ttls = [
            self.cache.location_ttl_seconds,
            self.cache.statistics_ttl_seconds,
            self.cache.popular_areas_ttl_seconds,
            self.cache.suggestion_ttl_seconds,
        ];
        if ttls.iter().any(|ttl| *ttl == 0 || *ttl > week) {
            return Err(GeoSearchError::config(
                "Cache TTLs must be between 1 second and 1 week",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.cache.operation_timeout_ms > 60_000
            || self.search.datastore_timeout_ms > 60_000
            || self.suggest.subquery_timeout_ms > 60_000
        {
            return Err(GeoSearchError::config("Timeouts cannot exceed 60000 ms").into());
        }

        for (name, radius) in [
            ("walkable", self.search.walkable_radius_km),
            ("accessible", self.search.accessible_radius_km),
        ] {
            if !(radius > 0.0 && radius <= 500.0) {
                return Err(GeoSearchError::config(format!(
                    "The {name} radius must be between 0 and 500 km"
                ))
                .into());
            }
        }

        if self.search.default_limit > self.search.max_limit {
            return Err(GeoSearchError::config(
                "Default search limit cannot exceed the maximum search limit",
            )
            .into());
        }

        if self.suggest.min_query_length == 0 {
            return Err(
                GeoSearchError::config("Minimum suggestion query length must be positive").into(),
            );
        }

        let per_type = [
            self.suggest.region_limit,
            self.suggest.locality_limit,
            self.suggest.station_limit,
            self.suggest.landmark_limit,
        ];
        if per_type.iter().any(|limit| *limit > 50) {
            return Err(
                GeoSearchError::config("Per-type suggestion limits cannot exceed 50").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GeoSearchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GeoSearchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceCategory;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GeoSearchConfig::default();
        assert!(config.cache.redis_url.is_none());
        assert_eq!(config.cache.location_ttl_seconds, 300);
        assert_eq!(config.search.walkable_radius_km, 3.0);
        assert_eq!(config.search.accessible_radius_km, 10.0);
        assert_eq!(config.suggest.locality_limit, 4);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = GeoSearchConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_redis_scheme() {
        let mut config = GeoSearchConfig::default();
        config.cache.redis_url = Some("http://localhost:6379".to_string());
        assert!(config.validate().is_err());

        config.cache.redis_url = Some("redis://localhost:6379/0".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = GeoSearchConfig::default();
        config.search.walkable_radius_km = 0.0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("walkable radius"));
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = GeoSearchConfig::default();
        config.cache.max_entries = 0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.cache.max_entries, 1_000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[cache]
max_entries = 50
location_ttl_seconds = 120

[search]
walkable_radius_km = 1.5

[[search.price_brackets]]
category = "budget"
label = "Cheap"
min = 0
max = 99

[[search.price_brackets]]
category = "standard"
label = "Everything else"
min = 100
"#
        )
        .unwrap();

        let config = GeoSearchConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.cache.max_entries, 50);
        assert_eq!(config.cache.location_ttl_seconds, 120);
        assert_eq!(config.search.walkable_radius_km, 1.5);
        assert_eq!(
            config.search.price_brackets.classify(Some(150)),
            Some(PriceCategory::Standard)
        );
        // untouched sections keep defaults
        assert_eq!(config.suggest.region_limit, 3);
    }

    #[test]
    fn test_load_rejects_gapped_price_table() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[[search.price_brackets]]
category = "budget"
label = "Cheap"
min = 0
max = 99

[[search.price_brackets]]
category = "standard"
label = "Gap"
min = 150
"#
        )
        .unwrap();

        assert!(GeoSearchConfig::load_from_path(Some(file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = GeoSearchConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("hotel-geosearch"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
