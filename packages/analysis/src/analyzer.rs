//! Per-route incident analysis.

use std::sync::Arc;

use futures::stream::{self, StreamExt as _};
use saferoute_analysis_models::{RouteAnalysis, RouteHandle, SegmentAnalysis};
use saferoute_geo::Coordinate;
use saferoute_incident_models::IncidentSummary;

use crate::aggregator::IncidentAggregator;
use crate::cache::RouteCache;
use crate::{AnalysisError, DEFAULT_CONCURRENCY};

/// Summarizes the incidents along a cached route, one segment per
/// waypoint.
pub struct RouteSafetyAnalyzer {
    aggregator: Arc<IncidentAggregator>,
    cache: Arc<RouteCache>,
    concurrency: usize,
}

impl RouteSafetyAnalyzer {
    #[must_use]
    pub fn new(aggregator: Arc<IncidentAggregator>, cache: Arc<RouteCache>) -> Self {
        Self {
            aggregator,
            cache,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets how many waypoints are queried at once (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Analyzes the route stored under `handle`.
    ///
    /// Waypoints are queried concurrently but segments are returned in
    /// route order. A waypoint whose crime data cannot be fetched becomes
    /// an empty segment with `data_available` cleared; it never fails the
    /// route.
    ///
    /// # Errors
    ///
    /// * If `handle` is not in the cache
    pub async fn analyze(&self, handle: RouteHandle) -> Result<RouteAnalysis, AnalysisError> {
        let waypoints = self.cache.get(handle)?;
        log::debug!("Analyzing {handle} ({} waypoints)", waypoints.len());

        let segments: Vec<SegmentAnalysis> = stream::iter(
            waypoints
                .points()
                .iter()
                .enumerate()
                .map(|(idx, &point)| self.segment(idx + 1, point)),
        )
        .buffered(self.concurrency)
        .collect()
        .await;

        let analysis = RouteAnalysis::from_segments(handle, segments);
        if analysis.unavailable_segments > 0 {
            log::warn!(
                "{handle}: {} of {} segments had no crime data",
                analysis.unavailable_segments,
                analysis.segments.len()
            );
        }
        Ok(analysis)
    }

    async fn segment(&self, segment_index: usize, coordinate: Coordinate) -> SegmentAnalysis {
        match self.aggregator.summarize(coordinate).await {
            Ok(summary) => SegmentAnalysis {
                segment_index,
                coordinate,
                summary,
                data_available: true,
            },
            Err(e) => {
                log::warn!("Segment {segment_index} at {coordinate} counted as zero: {e}");
                SegmentAnalysis {
                    segment_index,
                    coordinate,
                    summary: IncidentSummary::empty(),
                    data_available: false,
                }
            }
        }
    }
}
