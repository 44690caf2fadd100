//! Single-point incident queries.
//!
//! Each query fetches the incidents around a point through the
//! [`IncidentAggregator`] and reduces them without touching the route
//! cache. The reductions are plain functions over records so they can be
//! reused on records fetched elsewhere.

use std::collections::HashMap;

use saferoute_analysis_models::{
    AverageComparison, CategoryDetail, Hotspot, HotspotReport, RelativeLevel, SampleLocation,
};
use saferoute_geo::{Coordinate, distance};
use saferoute_incident_models::IncidentRecord;

use crate::AnalysisError;
use crate::aggregator::IncidentAggregator;

/// Incidents a street needs to count as a hotspot.
pub const HOTSPOT_MIN_INCIDENTS: u64 = 3;

/// Hotspots returned by [`find_hotspots`].
pub const HOTSPOT_LIMIT: usize = 5;

/// Typical monthly incident count around a point in a UK city.
pub const DEFAULT_BASELINE: u64 = 32;

/// Sample locations kept per category.
pub const SAMPLE_LOCATION_LIMIT: usize = 10;

const UNKNOWN_STREET: &str = "Unknown";
const UNKNOWN_CATEGORY: &str = "unknown";

struct StreetGroup<'a> {
    street: &'a str,
    coordinate: Coordinate,
    categories: Vec<&'a str>,
}

/// Groups `records` by street and keeps the busiest streets.
///
/// A street with at least [`HOTSPOT_MIN_INCIDENTS`] incidents is a
/// hotspot. Hotspots are sorted by incident count (equal counts keep the
/// order the streets first appeared in) and truncated to
/// [`HOTSPOT_LIMIT`].
#[must_use]
pub fn find_hotspots(point: Coordinate, records: &[IncidentRecord]) -> HotspotReport {
    let mut groups: Vec<StreetGroup<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let street = record.street.as_deref().unwrap_or(UNKNOWN_STREET);
        let category = record.category.as_deref().unwrap_or(UNKNOWN_CATEGORY);
        let pos = *positions.entry(street).or_insert_with(|| {
            groups.push(StreetGroup {
                street,
                coordinate: record.coordinate,
                categories: Vec::new(),
            });
            groups.len() - 1
        });
        groups[pos].categories.push(category);
    }

    let mut hotspots: Vec<Hotspot> = groups
        .iter()
        .filter(|g| (g.categories.len() as u64) >= HOTSPOT_MIN_INCIDENTS)
        .map(|g| Hotspot {
            street: g.street.to_string(),
            coordinate: g.coordinate,
            count: g.categories.len() as u64,
            dominant_category: dominant(&g.categories).to_string(),
            distance_miles: (distance(point, g.coordinate) * 100.0).round() / 100.0,
        })
        .collect();

    hotspots.sort_by(|a, b| b.count.cmp(&a.count));
    let total_found = hotspots.len();
    hotspots.truncate(HOTSPOT_LIMIT);

    HotspotReport {
        hotspots,
        total_found,
    }
}

/// Most frequent category; the first to reach the top count wins ties.
fn dominant<'a>(categories: &[&'a str]) -> &'a str {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &category in categories {
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (category, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((category, n));
        }
    }
    best.map_or(UNKNOWN_CATEGORY, |(category, _)| category)
}

/// Compares an area's incident count with `baseline`.
///
/// The percentage difference is rounded to one decimal place and is 0
/// when the baseline is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_comparison(area_total: u64, baseline: u64) -> AverageComparison {
    let percentage_difference = if baseline == 0 {
        0.0
    } else {
        let raw = (area_total as f64 - baseline as f64) / baseline as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    };

    let context = if percentage_difference > 0.0 {
        format!("This area has {percentage_difference:.0}% more crimes than average")
    } else if percentage_difference < 0.0 {
        format!(
            "This area has {:.0}% fewer crimes than average",
            percentage_difference.abs()
        )
    } else {
        "This area is in line with the average".to_string()
    };

    AverageComparison {
        area_total,
        baseline,
        percentage_difference,
        relative_level: if area_total > baseline {
            RelativeLevel::Higher
        } else {
            RelativeLevel::Lower
        },
        context,
    }
}

/// Counts and sample locations for each requested category, in request
/// order. Category matching is exact.
#[must_use]
pub fn category_details(records: &[IncidentRecord], categories: &[String]) -> Vec<CategoryDetail> {
    categories
        .iter()
        .map(|category| {
            let matching: Vec<&IncidentRecord> = records
                .iter()
                .filter(|r| r.category.as_deref() == Some(category.as_str()))
                .collect();
            CategoryDetail {
                category: category.clone(),
                count: matching.len() as u64,
                sample_locations: matching
                    .iter()
                    .take(SAMPLE_LOCATION_LIMIT)
                    .map(|r| SampleLocation {
                        coordinate: r.coordinate,
                        street: r.street.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Streets with clusters of incidents around `point`.
///
/// # Errors
///
/// * If the crime data provider is unavailable
pub async fn hotspots(
    aggregator: &IncidentAggregator,
    point: Coordinate,
) -> Result<HotspotReport, AnalysisError> {
    let records = aggregator.records(point).await?;
    Ok(find_hotspots(point, &records))
}

/// Incident count around `point` versus `baseline`.
///
/// # Errors
///
/// * If the crime data provider is unavailable
pub async fn compare_to_average(
    aggregator: &IncidentAggregator,
    point: Coordinate,
    baseline: u64,
) -> Result<AverageComparison, AnalysisError> {
    let records = aggregator.records(point).await?;
    Ok(average_comparison(records.len() as u64, baseline))
}

/// Per-category counts and sample locations around `point`.
///
/// # Errors
///
/// * If the crime data provider is unavailable
pub async fn incidents_by_category(
    aggregator: &IncidentAggregator,
    point: Coordinate,
    categories: &[String],
) -> Result<Vec<CategoryDetail>, AnalysisError> {
    let records = aggregator.records(point).await?;
    Ok(category_details(&records, categories))
}
