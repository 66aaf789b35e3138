//! Autocomplete across regions, localities, stations and landmarks
//!
//! A query fans out to four independent text matches, each capped at its
//! own small limit so no entity type crowds out the others. The results are
//! concatenated in a fixed type order and truncated; they are not re-ranked.
//! A sub-query that fails or exceeds its timeout contributes nothing.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::Result;
use crate::cache::Cache;
use crate::config::GeoSearchConfig;
use crate::datastore::HotelDatastore;
use crate::models::{LocalityMatch, PointOfInterestMatch, RegionMatch, TransitStopMatch};
use crate::search::CACHE_NAMESPACE;

/// Entity type behind a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Region,
    Locality,
    Station,
    Landmark,
}

impl SuggestionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Locality => "locality",
            Self::Station => "station",
            Self::Landmark => "landmark",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One autocomplete entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub id: i64,
    pub name: String,
    pub localized_name: Option<String>,
    /// Name with parent context, e.g. "Shinjuku, Tokyo"
    pub display_name: String,
}

fn with_parent(name: &str, parent: Option<&str>) -> String {
    match parent {
        Some(parent) => format!("{name}, {parent}"),
        None => name.to_string(),
    }
}

impl From<RegionMatch> for Suggestion {
    fn from(hit: RegionMatch) -> Self {
        Self {
            kind: SuggestionKind::Region,
            id: hit.region.id,
            display_name: with_parent(&hit.region.name, hit.parent_name.as_deref()),
            name: hit.region.name,
            localized_name: hit.region.localized_name,
        }
    }
}

impl From<LocalityMatch> for Suggestion {
    fn from(hit: LocalityMatch) -> Self {
        Self {
            kind: SuggestionKind::Locality,
            id: hit.locality.id,
            display_name: with_parent(&hit.locality.name, hit.region_name.as_deref()),
            name: hit.locality.name,
            localized_name: hit.locality.localized_name,
        }
    }
}

impl From<TransitStopMatch> for Suggestion {
    fn from(hit: TransitStopMatch) -> Self {
        let name = match &hit.stop.line_name {
            Some(line) => format!("{} ({line})", hit.stop.name),
            None => hit.stop.name.clone(),
        };
        Self {
            kind: SuggestionKind::Station,
            id: hit.stop.id,
            display_name: with_parent(&name, hit.locality_name.as_deref()),
            name: hit.stop.name,
            localized_name: hit.stop.localized_name,
        }
    }
}

impl From<PointOfInterestMatch> for Suggestion {
    fn from(hit: PointOfInterestMatch) -> Self {
        Self {
            kind: SuggestionKind::Landmark,
            id: hit.poi.id,
            display_name: with_parent(&hit.poi.name, hit.locality_name.as_deref()),
            name: hit.poi.name,
            localized_name: hit.poi.localized_name,
        }
    }
}

/// Limits and timeouts for [`SuggestionAggregator`]
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestSettings {
    pub min_query_length: usize,
    pub default_limit: usize,
    pub region_limit: usize,
    pub locality_limit: usize,
    pub station_limit: usize,
    pub landmark_limit: usize,
    pub subquery_timeout: Duration,
    pub ttl: Duration,
}

impl From<&GeoSearchConfig> for SuggestSettings {
    fn from(config: &GeoSearchConfig) -> Self {
        Self {
            min_query_length: config.suggest.min_query_length,
            default_limit: config.suggest.default_limit,
            region_limit: config.suggest.region_limit,
            locality_limit: config.suggest.locality_limit,
            station_limit: config.suggest.station_limit,
            landmark_limit: config.suggest.landmark_limit,
            subquery_timeout: Duration::from_millis(config.suggest.subquery_timeout_ms),
            ttl: Duration::from_secs(config.cache.suggestion_ttl_seconds),
        }
    }
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self::from(&GeoSearchConfig::default())
    }
}

/// Fan-out autocomplete over the catalog
#[derive(Clone)]
pub struct SuggestionAggregator {
    datastore: Arc<dyn HotelDatastore>,
    cache: Cache,
    settings: SuggestSettings,
}

impl SuggestionAggregator {
    #[must_use]
    pub fn new(datastore: Arc<dyn HotelDatastore>, cache: Cache, settings: SuggestSettings) -> Self {
        Self {
            datastore,
            cache,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SuggestSettings {
        &self.settings
    }

    /// Suggestions for a partial name, at most `limit` of them.
    ///
    /// Queries shorter than the minimum length return nothing without
    /// touching the cache or the datastore.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn suggest(&self, query: &str, limit: Option<usize>) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < self.settings.min_query_length {
            return Vec::new();
        }
        let limit = limit
            .filter(|limit| *limit > 0)
            .unwrap_or(self.settings.default_limit);

        let key = format!("{CACHE_NAMESPACE}suggest:{}:{limit}", query.to_lowercase());
        if let Some(suggestions) = self.cache.get::<Vec<Suggestion>>(&key).await {
            return suggestions;
        }

        let store = &self.datastore;
        let settings = &self.settings;
        let (regions, localities, stations, landmarks) = futures::join!(
            self.bounded(
                SuggestionKind::Region,
                store.match_regions(query, settings.region_limit)
            ),
            self.bounded(
                SuggestionKind::Locality,
                store.match_localities(query, settings.locality_limit)
            ),
            self.bounded(
                SuggestionKind::Station,
                store.match_transit_stops(query, settings.station_limit)
            ),
            self.bounded(
                SuggestionKind::Landmark,
                store.match_points_of_interest(query, settings.landmark_limit)
            ),
        );
        let complete =
            regions.is_some() && localities.is_some() && stations.is_some() && landmarks.is_some();

        let mut suggestions: Vec<Suggestion> = regions
            .unwrap_or_default()
            .into_iter()
            .chain(localities.unwrap_or_default())
            .chain(stations.unwrap_or_default())
            .chain(landmarks.unwrap_or_default())
            .collect();
        suggestions.truncate(limit);

        // partial answers are served but not cached
        if complete {
            self.cache.put(&key, &suggestions, settings.ttl).await;
        }
        debug!("Returning {} suggestions", suggestions.len());
        suggestions
    }

    /// Await one sub-query under the configured timeout; `None` on failure
    async fn bounded<M, F>(&self, kind: SuggestionKind, fut: F) -> Option<Vec<Suggestion>>
    where
        M: Into<Suggestion>,
        F: Future<Output = Result<Vec<M>>>,
    {
        match timeout(self.settings.subquery_timeout, fut).await {
            Ok(Ok(hits)) => Some(hits.into_iter().map(Into::into).collect()),
            Ok(Err(e)) => {
                warn!(%kind, "Suggestion sub-query failed: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    %kind,
                    "Suggestion sub-query timed out after {:?}", self.settings.subquery_timeout
                );
                None
            }
        }
    }
}
