#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types, category weight tables and per-point summaries.
//!
//! Crime data providers report free-form category strings (the UK Police
//! API uses slugs such as `violent-crime` or `anti-social-behaviour`).
//! Rather than forcing them into a closed taxonomy, categories are kept
//! verbatim and weighted through a [`CategoryWeights`] table, so that the
//! scoring policy can change without touching aggregation.

use std::collections::{BTreeMap, HashMap};

use saferoute_geo::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Weight assigned to categories missing from a table unless overridden.
pub const DEFAULT_CATEGORY_WEIGHT: u32 = 2;

/// Number of entries kept in [`IncidentSummary::top_categories`].
pub const TOP_CATEGORY_LIMIT: usize = 3;

/// A single incident as reported by a crime data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Provider category slug. `None` when the provider omitted it.
    pub category: Option<String>,
    /// Where the incident was recorded (usually snapped to a street).
    pub coordinate: Coordinate,
    /// Street description, if provided (e.g. "On or near Park Road").
    pub street: Option<String>,
    /// Reporting month as `YYYY-MM`, if provided.
    pub month: Option<String>,
}

impl IncidentRecord {
    /// Creates a record with only a category and location.
    #[must_use]
    pub fn new(category: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            category: Some(category.into()),
            coordinate,
            street: None,
            month: None,
        }
    }
}

/// Built-in category weighting schemes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeightScheme {
    /// Every incident weighs 1 (plain counting).
    Counts,
    /// Severity-weighted: violent/robbery 9, burglary/weapons 7,
    /// vehicle/pickpocketing 5, minor theft 3, anti-social 2.
    Severity,
    /// Softer severity weighting: violent/robbery 9, burglary/weapons 5,
    /// everything theft-like 3.
    Moderated,
}

impl WeightScheme {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Counts, Self::Severity, Self::Moderated]
    }

    /// Builds the weight table for this scheme.
    #[must_use]
    pub fn weights(self) -> CategoryWeights {
        match self {
            Self::Counts => CategoryWeights::new(1),
            Self::Severity => CategoryWeights::new(DEFAULT_CATEGORY_WEIGHT)
                .with("violent-crime", 9)
                .with("robbery", 9)
                .with("burglary", 7)
                .with("possession-of-weapons", 7)
                .with("vehicle-crime", 5)
                .with("theft-from-the-person", 5)
                .with("bicycle-theft", 3)
                .with("shoplifting", 3)
                .with("other-theft", 3)
                .with("anti-social-behaviour", 2),
            Self::Moderated => CategoryWeights::new(DEFAULT_CATEGORY_WEIGHT)
                .with("violent-crime", 9)
                .with("robbery", 9)
                .with("burglary", 5)
                .with("possession-of-weapons", 5)
                .with("vehicle-crime", 3)
                .with("theft-from-the-person", 3)
                .with("bicycle-theft", 3)
                .with("shoplifting", 3)
                .with("other-theft", 3)
                .with("anti-social-behaviour", 2),
        }
    }
}

/// Category → weight table with a fallback for unknown categories.
///
/// Lookups are exact and case-sensitive. A category not present in the
/// table always resolves to `default_weight`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWeights {
    /// Weight used for categories not listed in `weights`.
    #[serde(default = "default_weight")]
    pub default_weight: u32,
    /// Per-category weights.
    #[serde(default)]
    pub weights: BTreeMap<String, u32>,
}

const fn default_weight() -> u32 {
    DEFAULT_CATEGORY_WEIGHT
}

impl Default for CategoryWeights {
    fn default() -> Self {
        WeightScheme::Severity.weights()
    }
}

impl CategoryWeights {
    /// Creates an empty table where every category weighs `default_weight`.
    #[must_use]
    pub const fn new(default_weight: u32) -> Self {
        Self {
            default_weight,
            weights: BTreeMap::new(),
        }
    }

    /// Adds or replaces the weight for `category`.
    #[must_use]
    pub fn with(mut self, category: impl Into<String>, weight: u32) -> Self {
        self.weights.insert(category.into(), weight);
        self
    }

    /// Weight for `category`, falling back to the default.
    #[must_use]
    pub fn weight(&self, category: &str) -> u32 {
        self.weights
            .get(category)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

/// Count of incidents in a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category slug as reported by the provider.
    pub category: String,
    /// Number of incidents.
    pub count: u64,
    /// `count × weight(category)`.
    pub weighted_score: u64,
}

/// Aggregated incidents around one point.
///
/// Derived on every request; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSummary {
    /// Number of raw records returned by the provider.
    pub total_count: u64,
    /// Incidents per category (records without a category are excluded).
    pub counts_by_category: BTreeMap<String, u64>,
    /// Up to three categories with the highest weighted score.
    pub top_categories: Vec<CategoryCount>,
    /// `Σ count(c) × weight(c)`.
    pub risk_contribution: f64,
}

impl IncidentSummary {
    /// Summary of a point with no incidents.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total_count: 0,
            counts_by_category: BTreeMap::new(),
            top_categories: Vec::new(),
            risk_contribution: 0.0,
        }
    }

    /// Reduces raw records into a summary using `weights`.
    ///
    /// `total_count` is the record count, independent of how many records
    /// carried a category. Top categories are ordered by weighted score
    /// descending; equal scores keep the order in which the categories
    /// first appeared in `records`.
    #[must_use]
    pub fn from_records(records: &[IncidentRecord], weights: &CategoryWeights) -> Self {
        let mut first_seen: Vec<(&str, u64)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let Some(category) = record.category.as_deref() else {
                continue;
            };
            if let Some(&pos) = positions.get(category) {
                first_seen[pos].1 += 1;
            } else {
                positions.insert(category, first_seen.len());
                first_seen.push((category, 1));
            }
        }

        let mut scored: Vec<CategoryCount> = first_seen
            .iter()
            .map(|&(category, count)| CategoryCount {
                category: category.to_string(),
                count,
                weighted_score: count * u64::from(weights.weight(category)),
            })
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let risk_contribution = scored.iter().map(|c| c.weighted_score).sum::<u64>() as f64;

        let counts_by_category = scored
            .iter()
            .map(|c| (c.category.clone(), c.count))
            .collect();

        // `sort_by` is stable, so ties stay in first-seen order.
        scored.sort_by(|a, b| b.weighted_score.cmp(&a.weighted_score));
        scored.truncate(TOP_CATEGORY_LIMIT);

        Self {
            total_count: records.len() as u64,
            counts_by_category,
            top_categories: scored,
            risk_contribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Coordinate {
        Coordinate::new(51.5, -0.1).unwrap()
    }

    fn records(categories: &[&str]) -> Vec<IncidentRecord> {
        categories
            .iter()
            .map(|c| IncidentRecord::new(*c, point()))
            .collect()
    }

    #[test]
    fn unknown_category_uses_default_weight() {
        let weights = CategoryWeights::new(2).with("violent-crime", 9);
        assert_eq!(weights.weight("violent-crime"), 9);
        assert_eq!(weights.weight("Violent-Crime"), 2);
        assert_eq!(weights.weight("made-up-category"), 2);
    }

    #[test]
    fn violent_and_burglary_scenario() {
        let weights = CategoryWeights::new(2)
            .with("violent-crime", 9)
            .with("burglary", 5);
        let mut input = records(&["violent-crime"; 5]);
        input.extend(records(&["burglary"; 3]));

        let summary = IncidentSummary::from_records(&input, &weights);
        assert_eq!(summary.total_count, 8);
        assert!((summary.risk_contribution - 60.0).abs() < f64::EPSILON);
        let top: Vec<(&str, u64)> = summary
            .top_categories
            .iter()
            .map(|c| (c.category.as_str(), c.count))
            .collect();
        assert_eq!(top, vec![("violent-crime", 5), ("burglary", 3)]);
    }

    #[test]
    fn top_categories_capped_and_stable() {
        let weights = CategoryWeights::new(1);
        let input = records(&["d", "a", "b", "c", "a", "b", "c", "d"]);
        let summary = IncidentSummary::from_records(&input, &weights);

        assert_eq!(summary.top_categories.len(), TOP_CATEGORY_LIMIT);
        let names: Vec<&str> = summary
            .top_categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        // All tie at 2; first-seen order is d, a, b, c.
        assert_eq!(names, vec!["d", "a", "b"]);
    }

    #[test]
    fn weighted_score_orders_before_count() {
        let weights = CategoryWeights::new(1).with("robbery", 9);
        let input = records(&["shoplifting", "shoplifting", "shoplifting", "robbery"]);
        let summary = IncidentSummary::from_records(&input, &weights);
        assert_eq!(summary.top_categories[0].category, "robbery");
        assert_eq!(summary.top_categories[0].weighted_score, 9);
        assert_eq!(summary.top_categories[1].count, 3);
    }

    #[test]
    fn total_count_includes_uncategorized_records() {
        let mut input = records(&["burglary", "burglary"]);
        input.push(IncidentRecord {
            category: None,
            coordinate: point(),
            street: None,
            month: None,
        });

        let summary = IncidentSummary::from_records(&input, &CategoryWeights::new(2));
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.counts_by_category.values().sum::<u64>(), 2);
    }

    #[test]
    fn categories_are_case_sensitive() {
        let input = records(&["Burglary", "burglary"]);
        let summary = IncidentSummary::from_records(&input, &CategoryWeights::new(2));
        assert_eq!(summary.counts_by_category.len(), 2);
    }

    #[test]
    fn empty_records_empty_summary() {
        let summary = IncidentSummary::from_records(&[], &CategoryWeights::default());
        assert_eq!(summary, IncidentSummary::empty());
    }

    #[test]
    fn schemes_parse_from_names() {
        for scheme in WeightScheme::all() {
            let parsed: WeightScheme = scheme.as_ref().parse().unwrap();
            assert_eq!(parsed, *scheme);
        }
        assert_eq!(WeightScheme::Severity.weights().weight("burglary"), 7);
        assert_eq!(WeightScheme::Moderated.weights().weight("burglary"), 5);
        assert_eq!(WeightScheme::Counts.weights().weight("burglary"), 1);
    }
}
