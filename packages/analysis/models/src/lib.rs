#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route analysis result types.
//!
//! Defines the route handle and waypoint set stored by the route cache,
//! the per-segment and per-route analyses, and the ranked comparison
//! returned to the embedding service. Also holds the result types of the
//! single-point queries (hotspots, baseline comparison, category detail).

use std::str::FromStr;

use saferoute_geo::Coordinate;
use saferoute_incident_models::IncidentSummary;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Prefix of the textual form of a [`RouteHandle`].
const HANDLE_PREFIX: &str = "route-";

/// Errors constructing route model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteModelError {
    /// A waypoint set needs an origin and a destination.
    #[error("A route needs at least 2 waypoints, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },

    /// Text is not a route handle.
    #[error("Invalid route handle '{input}'")]
    InvalidHandle {
        /// The rejected input.
        input: String,
    },
}

/// Opaque reference to a cached route, rendered as `route-<n>`.
///
/// Handles are issued by the route cache in strictly increasing order and
/// never reused; callers only receive and replay them. Ordering follows
/// issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteHandle(u64);

impl RouteHandle {
    /// Wraps an issue sequence number. Reserved for the route cache;
    /// everyone else parses handles they were given.
    #[doc(hidden)]
    #[must_use]
    pub const fn from_sequence(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Issue sequence number.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RouteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{HANDLE_PREFIX}{}", self.0)
    }
}

impl FromStr for RouteHandle {
    type Err = RouteModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(HANDLE_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| RouteModelError::InvalidHandle {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for RouteHandle {
    type Error = RouteModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RouteHandle> for String {
    fn from(handle: RouteHandle) -> Self {
        handle.to_string()
    }
}

/// Ordered waypoints of a route: at least two, origin first, destination
/// last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct RouteWaypointSet(Vec<Coordinate>);

impl RouteWaypointSet {
    /// Wraps an explicit waypoint list.
    ///
    /// # Errors
    ///
    /// Returns [`RouteModelError::TooFewWaypoints`] for fewer than two
    /// points.
    pub fn new(points: Vec<Coordinate>) -> Result<Self, RouteModelError> {
        if points.len() < 2 {
            return Err(RouteModelError::TooFewWaypoints {
                count: points.len(),
            });
        }
        Ok(Self(points))
    }

    /// Builds a set from sampled points, forcing the true endpoints.
    ///
    /// `origin` is inserted first unless `sampled` already starts with
    /// exactly that coordinate; `destination` is appended unless `sampled`
    /// already ends with it. The result always has at least two points.
    #[must_use]
    pub fn anchored(
        origin: Coordinate,
        destination: Coordinate,
        mut sampled: Vec<Coordinate>,
    ) -> Self {
        if sampled.first() != Some(&origin) {
            sampled.insert(0, origin);
        }
        if sampled.last() != Some(&destination) || sampled.len() < 2 {
            sampled.push(destination);
        }
        Self(sampled)
    }

    /// Waypoints in route order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.0
    }

    /// First waypoint.
    #[must_use]
    pub fn origin(&self) -> Coordinate {
        self.0[0]
    }

    /// Last waypoint.
    #[must_use]
    pub fn destination(&self) -> Coordinate {
        self.0[self.0.len() - 1]
    }

    /// Number of waypoints (always at least 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Coordinate>> for RouteWaypointSet {
    type Error = RouteModelError;

    fn try_from(points: Vec<Coordinate>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<RouteWaypointSet> for Vec<Coordinate> {
    fn from(set: RouteWaypointSet) -> Self {
        set.0
    }
}

/// A cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRoute {
    /// Handle the route is stored under.
    pub handle: RouteHandle,
    /// The route's waypoints.
    pub waypoints: RouteWaypointSet,
}

/// Where a route option came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteSource {
    /// Returned by the routing provider.
    Provider,
    /// Direct line estimate; no routing provider configured.
    Estimated,
    /// Direct line estimate after the routing provider failed.
    Fallback,
}

/// A candidate route registered in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOption {
    /// Handle for later analysis.
    pub handle: RouteHandle,
    /// Total distance in metres.
    pub distance_meters: u64,
    /// Estimated duration in minutes.
    pub duration_minutes: u64,
    /// Human-readable label.
    pub description: String,
    /// Where the route came from.
    pub source: RouteSource,
    /// Number of cached waypoints.
    pub waypoint_count: usize,
}

/// Incident summary for one waypoint of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentAnalysis {
    /// 1-based position along the route.
    pub segment_index: usize,
    /// The waypoint queried.
    pub coordinate: Coordinate,
    /// Incidents around the waypoint (zero-valued if unavailable).
    pub summary: IncidentSummary,
    /// `false` when the crime provider failed for this waypoint.
    pub data_available: bool,
}

/// Aggregate incident metrics for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysis {
    /// The analyzed route.
    pub handle: RouteHandle,
    /// Sum of segment incident counts.
    pub total_incidents: u64,
    /// `total_incidents / segments.len()`, or 0 without segments.
    pub average_per_segment: f64,
    /// Per-waypoint results in route order.
    pub segments: Vec<SegmentAnalysis>,
    /// Segment with the most incidents (lowest index on ties).
    pub worst_segment: Option<SegmentAnalysis>,
    /// Segments whose data could not be fetched.
    pub unavailable_segments: usize,
}

impl RouteAnalysis {
    /// Computes the route-level metrics from segments in route order.
    #[must_use]
    pub fn from_segments(handle: RouteHandle, segments: Vec<SegmentAnalysis>) -> Self {
        let total_incidents: u64 = segments.iter().map(|s| s.summary.total_count).sum();

        #[allow(clippy::cast_precision_loss)]
        let average_per_segment = if segments.is_empty() {
            0.0
        } else {
            total_incidents as f64 / segments.len() as f64
        };

        let mut worst: Option<&SegmentAnalysis> = None;
        for segment in &segments {
            if worst.is_none_or(|w| segment.summary.total_count > w.summary.total_count) {
                worst = Some(segment);
            }
        }
        let worst_segment = worst.cloned();
        let unavailable_segments = segments.iter().filter(|s| !s.data_available).count();

        Self {
            handle,
            total_incidents,
            average_per_segment,
            segments,
            worst_segment,
            unavailable_segments,
        }
    }
}

/// Risk tier derived from a safety score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskTier {
    /// Score ≥ 80.
    Low,
    /// Score 60–79.
    Moderate,
    /// Score 40–59.
    Elevated,
    /// Score < 40.
    High,
}

impl RiskTier {
    /// Fixed partition of the 0–100 safety score.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Low,
            60..=79 => Self::Moderate,
            40..=59 => Self::Elevated,
            _ => Self::High,
        }
    }
}

/// One ranked route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComparison {
    /// The route.
    pub handle: RouteHandle,
    /// 1-based rank, 1 being the recommendation.
    pub rank: usize,
    /// Relative safety within the compared set, 0–100.
    pub safety_score: u8,
    /// Tier of `safety_score`.
    pub risk_tier: RiskTier,
    /// Incidents along the route.
    pub total_incidents: u64,
    /// Mean incidents per segment.
    pub average_per_segment: f64,
}

/// A route that could not be analyzed during a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRoute {
    /// The route.
    pub handle: RouteHandle,
    /// Why analysis failed.
    pub reason: String,
}

/// Result of comparing several routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// Rank 1 route.
    pub recommended: RouteHandle,
    /// Ranked routes, best first.
    pub rankings: Vec<RouteComparison>,
    /// Routes excluded from ranking.
    pub failed: Vec<FailedRoute>,
    /// Human-readable reasoning for the recommendation.
    pub justification: String,
}

/// A street with a cluster of incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Street description from the provider.
    pub street: String,
    /// Location of the first incident on the street.
    pub coordinate: Coordinate,
    /// Incidents on the street.
    pub count: u64,
    /// Most frequent category on the street.
    pub dominant_category: String,
    /// Distance from the query point in miles.
    pub distance_miles: f64,
}

/// Hotspots around a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotReport {
    /// Busiest hotspots, most incidents first.
    pub hotspots: Vec<Hotspot>,
    /// Number of hotspots found before truncation.
    pub total_found: usize,
}

/// Whether an area is above or below the baseline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelativeLevel {
    /// More incidents than the baseline.
    Higher,
    /// At or below the baseline.
    Lower,
}

/// Area incident count versus a baseline average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageComparison {
    /// Incidents around the point.
    pub area_total: u64,
    /// Baseline monthly incidents per area.
    pub baseline: u64,
    /// Signed percentage difference from the baseline.
    pub percentage_difference: f64,
    /// Above or below the baseline.
    pub relative_level: RelativeLevel,
    /// Human-readable summary.
    pub context: String,
}

/// An example location for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleLocation {
    /// Incident location.
    pub coordinate: Coordinate,
    /// Street description, if known.
    pub street: Option<String>,
}

/// Incidents of one requested category around a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    /// Requested category.
    pub category: String,
    /// Matching incidents.
    pub count: u64,
    /// Up to ten example locations.
    pub sample_locations: Vec<SampleLocation>,
}
