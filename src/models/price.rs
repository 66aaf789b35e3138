//! Price brackets
//!
//! Brackets form an ordered, closed set over integer prices in the currency's
//! minor unit. The table is configurable so boundaries are not tied to one
//! currency, but it must always stay contiguous and exhaustive over `[0, ∞)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GeoSearchError, Result};

/// Label used when a hotel has no usable price
pub const UNSET_PRICE_LABEL: &str = "Price not set";

/// Named price bracket, ordered from cheapest to most expensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceCategory {
    Budget,
    Standard,
    Premium,
    Luxury,
    Ultra,
}

impl PriceCategory {
    pub const ALL: [PriceCategory; 5] = [
        PriceCategory::Budget,
        PriceCategory::Standard,
        PriceCategory::Premium,
        PriceCategory::Luxury,
        PriceCategory::Ultra,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCategory::Budget => "budget",
            PriceCategory::Standard => "standard",
            PriceCategory::Premium => "premium",
            PriceCategory::Luxury => "luxury",
            PriceCategory::Ultra => "ultra",
        }
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceCategory {
    type Err = GeoSearchError;

    fn from_str(s: &str) -> Result<Self> {
        PriceCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GeoSearchError::invalid_input(format!("unknown price bracket '{s}'")))
    }
}

/// Inclusive price range for one category. `max == None` is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBracket {
    pub category: PriceCategory,
    pub label: String,
    pub min: u64,
    pub max: Option<u64>,
}

impl PriceBracket {
    pub fn new<S: Into<String>>(category: PriceCategory, label: S, min: u64, max: Option<u64>) -> Self {
        Self {
            category,
            label: label.into(),
            min,
            max,
        }
    }

    #[must_use]
    pub fn contains(&self, price: u64) -> bool {
        price >= self.min && self.max.is_none_or(|max| price <= max)
    }
}

/// Ordered set of price brackets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceBracket>", into = "Vec<PriceBracket>")]
pub struct PriceTable {
    brackets: Vec<PriceBracket>,
}

impl PriceTable {
    /// Build a table, rejecting gaps, overlaps and a bounded top bracket
    pub fn new(brackets: Vec<PriceBracket>) -> Result<Self> {
        let Some(first) = brackets.first() else {
            return Err(GeoSearchError::config("price table must contain at least one bracket"));
        };
        if first.min != 0 {
            return Err(GeoSearchError::config("first price bracket must start at 0"));
        }

        for (index, bracket) in brackets.iter().enumerate() {
            let is_last = index + 1 == brackets.len();
            match (bracket.max, is_last) {
                (None, true) => {}
                (None, false) => {
                    return Err(GeoSearchError::config(format!(
                        "only the last price bracket may be open-ended, '{}' is not last",
                        bracket.category
                    )));
                }
                (Some(_), true) => {
                    return Err(GeoSearchError::config("last price bracket must be open-ended"));
                }
                (Some(max), false) => {
                    if max < bracket.min {
                        return Err(GeoSearchError::config(format!(
                            "price bracket '{}' has max below min",
                            bracket.category
                        )));
                    }
                    let next = &brackets[index + 1];
                    let Some(next_min) = max.checked_add(1) else {
                        return Err(GeoSearchError::config(format!(
                            "price bracket '{}' leaves no room for '{}'",
                            bracket.category, next.category
                        )));
                    };
                    if next.min != next_min {
                        return Err(GeoSearchError::config(format!(
                            "price brackets '{}' and '{}' are not contiguous",
                            bracket.category, next.category
                        )));
                    }
                }
            }
            if brackets[..index].iter().any(|b| b.category == bracket.category) {
                return Err(GeoSearchError::config(format!(
                    "price bracket '{}' is defined twice",
                    bracket.category
                )));
            }
        }

        Ok(Self { brackets })
    }

    #[must_use]
    pub fn brackets(&self) -> &[PriceBracket] {
        &self.brackets
    }

    #[must_use]
    pub fn bracket(&self, category: PriceCategory) -> Option<&PriceBracket> {
        self.brackets.iter().find(|b| b.category == category)
    }

    /// Bracket containing `price`. Absent or zero prices are unset.
    #[must_use]
    pub fn classify(&self, price: Option<u64>) -> Option<PriceCategory> {
        let price = price.filter(|p| *p > 0)?;
        self.brackets
            .iter()
            .find(|b| b.contains(price))
            .map(|b| b.category)
    }

    /// Human-readable label for `price`
    #[must_use]
    pub fn label(&self, price: Option<u64>) -> &str {
        self.classify(price)
            .and_then(|c| self.bracket(c))
            .map_or(UNSET_PRICE_LABEL, |b| b.label.as_str())
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            brackets: vec![
                PriceBracket::new(PriceCategory::Budget, "Budget", 0, Some(15_000)),
                PriceBracket::new(PriceCategory::Standard, "Standard", 15_001, Some(30_000)),
                PriceBracket::new(PriceCategory::Premium, "Premium", 30_001, Some(50_000)),
                PriceBracket::new(PriceCategory::Luxury, "Luxury", 50_001, Some(100_000)),
                PriceBracket::new(PriceCategory::Ultra, "Ultra luxury", 100_001, None),
            ],
        }
    }
}

impl TryFrom<Vec<PriceBracket>> for PriceTable {
    type Error = GeoSearchError;

    fn try_from(brackets: Vec<PriceBracket>) -> Result<Self> {
        PriceTable::new(brackets)
    }
}

impl From<PriceTable> for Vec<PriceBracket> {
    fn from(table: PriceTable) -> Self {
        table.brackets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, PriceCategory::Budget)]
    #[case(15_000, PriceCategory::Budget)]
    #[case(15_001, PriceCategory::Standard)]
    #[case(30_000, PriceCategory::Standard)]
    #[case(30_001, PriceCategory::Premium)]
    #[case(50_001, PriceCategory::Luxury)]
    #[case(100_000, PriceCategory::Luxury)]
    #[case(100_001, PriceCategory::Ultra)]
    #[case(u64::MAX, PriceCategory::Ultra)]
    fn test_classify_boundaries(#[case] price: u64, #[case] expected: PriceCategory) {
        assert_eq!(PriceTable::default().classify(Some(price)), Some(expected));
    }

    #[test]
    fn test_classify_unset() {
        let table = PriceTable::default();
        assert_eq!(table.classify(None), None);
        assert_eq!(table.classify(Some(0)), None);
        assert_eq!(table.label(None), UNSET_PRICE_LABEL);
    }

    #[test]
    fn test_every_price_has_exactly_one_bracket() {
        let table = PriceTable::default();
        for price in (0..=120_000).step_by(7) {
            let hits = table.brackets().iter().filter(|b| b.contains(price)).count();
            assert_eq!(hits, 1, "price {price} matched {hits} brackets");
        }
    }

    #[test]
    fn test_classification_is_monotonic() {
        let table = PriceTable::default();
        let mut previous = PriceCategory::Budget;
        for price in (1..=200_000).step_by(13) {
            let category = table.classify(Some(price)).unwrap();
            assert!(category >= previous);
            previous = category;
        }
    }

    #[test]
    fn test_rejects_gap() {
        let result = PriceTable::new(vec![
            PriceBracket::new(PriceCategory::Budget, "Budget", 0, Some(100)),
            PriceBracket::new(PriceCategory::Standard, "Standard", 102, None),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_saturated_inner_bracket() {
        let result = PriceTable::new(vec![
            PriceBracket::new(PriceCategory::Budget, "Budget", 0, Some(u64::MAX)),
            PriceBracket::new(PriceCategory::Standard, "Standard", u64::MAX, None),
        ]);
        assert!(matches!(result, Err(GeoSearchError::Config { .. })));
    }

    #[test]
    fn test_rejects_bounded_top_bracket() {
        let result = PriceTable::new(vec![PriceBracket::new(
            PriceCategory::Budget,
            "Budget",
            0,
            Some(100),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_currency_table() {
        let table = PriceTable::new(vec![
            PriceBracket::new(PriceCategory::Budget, "Budget", 0, Some(9_999)),
            PriceBracket::new(PriceCategory::Standard, "Standard", 10_000, None),
        ])
        .unwrap();
        assert_eq!(table.classify(Some(12_000)), Some(PriceCategory::Standard));
        assert!(table.bracket(PriceCategory::Ultra).is_none());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!("Budget".parse::<PriceCategory>().unwrap(), PriceCategory::Budget);
        assert!("cheap".parse::<PriceCategory>().is_err());
    }
}
