//! Aggregate statistics over the hotel catalog

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CACHE_NAMESPACE, SearchEngine, key_part};
use crate::Result;
use crate::datastore::HotelQuery;
use crate::geo;
use crate::models::{HotelRow, PriceCategory};

/// Number of hotels falling into one price bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBucket {
    pub category: PriceCategory,
    pub label: String,
    pub min: u64,
    pub max: Option<u64>,
    pub count: usize,
}

/// Locality ranked by how many hotels it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularArea {
    pub locality_id: i64,
    pub name: String,
    pub is_major: bool,
    pub hotel_count: usize,
    /// Rounded mean over hotels that have a price analysis
    pub average_price: Option<u64>,
}

impl SearchEngine {
    /// Hotel counts per price bracket in table order. Empty brackets and
    /// hotels without a price are left out.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn price_statistics(
        &self,
        region_id: Option<i64>,
        locality_id: Option<i64>,
    ) -> Vec<PriceBucket> {
        let key = format!(
            "{CACHE_NAMESPACE}stats:prices:r={}:l={}",
            key_part(region_id),
            key_part(locality_id)
        );
        if let Some(buckets) = self.cache.get::<Vec<PriceBucket>>(&key).await {
            return buckets;
        }

        let query = HotelQuery {
            region_id,
            locality_id,
            ..HotelQuery::default()
        };
        let rows = match self.query_rows(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Price statistics unavailable: {}", e);
                return Vec::new();
            }
        };

        let mut counts: HashMap<PriceCategory, usize> = HashMap::new();
        for row in &rows {
            if let Some(category) = geo::classify_price(&self.prices, row.average_price()) {
                *counts.entry(category).or_default() += 1;
            }
        }

        let buckets: Vec<PriceBucket> = self
            .prices
            .brackets()
            .iter()
            .filter_map(|bracket| {
                let count = counts.get(&bracket.category).copied()?;
                Some(PriceBucket {
                    category: bracket.category,
                    label: bracket.label.clone(),
                    min: bracket.min,
                    max: bracket.max,
                    count,
                })
            })
            .collect();

        debug!("Classified {} hotels into {} brackets", rows.len(), buckets.len());
        self.cache.put(&key, &buckets, self.settings.statistics_ttl).await;
        buckets
    }

    /// Localities with the most hotels, optionally inside one region
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn popular_areas(&self, region_id: Option<i64>, limit: usize) -> Vec<PopularArea> {
        let limit = limit.min(self.settings.max_limit);
        let key = format!(
            "{CACHE_NAMESPACE}stats:areas:r={}:n={limit}",
            key_part(region_id)
        );
        if let Some(areas) = self.cache.get::<Vec<PopularArea>>(&key).await {
            return areas;
        }

        let query = HotelQuery {
            region_id,
            ..HotelQuery::default()
        };
        let rows = match self.query_rows(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Popular areas unavailable: {}", e);
                return Vec::new();
            }
        };

        let areas = rank_localities(&rows, limit);
        self.cache
            .put(&key, &areas, self.settings.popular_areas_ttl)
            .await;
        areas
    }

    async fn query_rows(&self, query: &HotelQuery) -> Result<Vec<HotelRow>> {
        self.timed("hotel query", self.datastore.query_hotels(query))
            .await
    }
}

#[derive(Default)]
struct LocalityTally<'a> {
    name: Option<&'a str>,
    is_major: bool,
    hotels: usize,
    priced: u64,
    price_sum: u64,
}

/// Group rows by locality; most hotels first, ties by locality id
fn rank_localities(rows: &[HotelRow], limit: usize) -> Vec<PopularArea> {
    let mut tallies: HashMap<i64, LocalityTally<'_>> = HashMap::new();
    for row in rows {
        let tally = tallies.entry(row.location.locality_id).or_default();
        tally.name = row.locality_name.as_deref();
        tally.is_major = row.locality_is_major;
        tally.hotels += 1;
        if let Some(price) = row.average_price().filter(|p| *p > 0) {
            tally.priced += 1;
            tally.price_sum = tally.price_sum.saturating_add(price);
        }
    }

    let mut areas: Vec<PopularArea> = tallies
        .into_iter()
        .map(|(locality_id, tally)| PopularArea {
            locality_id,
            name: tally.name.unwrap_or_default().to_string(),
            is_major: tally.is_major,
            hotel_count: tally.hotels,
            average_price: (tally.priced > 0)
                .then(|| (tally.price_sum + tally.priced / 2) / tally.priced),
        })
        .collect();
    areas.sort_by(|a, b| {
        b.hotel_count
            .cmp(&a.hotel_count)
            .then_with(|| a.locality_id.cmp(&b.locality_id))
    });
    areas.truncate(limit);
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::datastore::{HotelDatastore, MemoryDatastore};
    use crate::datastore::memory::sample_snapshot;
    use crate::models::PriceTable;
    use crate::search::SearchSettings;
    use std::sync::Arc;

    fn engine() -> SearchEngine {
        let store = MemoryDatastore::new(sample_snapshot()).unwrap();
        SearchEngine::new(
            Arc::new(store),
            Cache::in_memory(64),
            PriceTable::default(),
            SearchSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_price_statistics_skips_empty_brackets() {
        let buckets = engine().price_statistics(None, None).await;
        let summary: Vec<(PriceCategory, usize)> =
            buckets.iter().map(|b| (b.category, b.count)).collect();
        assert_eq!(
            summary,
            vec![
                (PriceCategory::Budget, 3),
                (PriceCategory::Standard, 1),
                (PriceCategory::Premium, 1),
                (PriceCategory::Luxury, 1),
            ]
        );
        assert_eq!(buckets[0].max, Some(15_000));
    }

    #[tokio::test]
    async fn test_price_statistics_by_locality() {
        let buckets = engine().price_statistics(Some(13), Some(102)).await;
        let categories: Vec<PriceCategory> = buckets.iter().map(|b| b.category).collect();
        assert_eq!(categories, vec![PriceCategory::Premium, PriceCategory::Luxury]);
    }

    #[tokio::test]
    async fn test_popular_areas_average_ignores_unpriced() {
        let areas = engine().popular_areas(Some(13), 10).await;
        assert_eq!(areas.len(), 3);
        // equal counts fall back to locality id order
        let ids: Vec<i64> = areas.iter().map(|a| a.locality_id).collect();
        assert_eq!(ids, vec![101, 102, 103]);
        assert_eq!(areas[0].average_price, Some(20_000));
        assert_eq!(areas[2].name, "Taito");
        assert_eq!(areas[2].hotel_count, 2);
        assert_eq!(areas[2].average_price, Some(9_000));
        assert!(!areas[2].is_major);
    }

    #[tokio::test]
    async fn test_popular_areas_limit() {
        let areas = engine().popular_areas(None, 1).await;
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].locality_id, 101);
    }

    #[tokio::test]
    async fn test_average_rounds_half_up() {
        let mut snapshot = sample_snapshot();
        snapshot.price_analyses[1].current_average_price = 12_001;
        let store = MemoryDatastore::new(snapshot).unwrap();
        let rows = store
            .query_hotels(&HotelQuery {
                locality_id: Some(101),
                ..HotelQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(rank_localities(&rows, 5)[0].average_price, Some(12_001));
    }
}
