//! Engine facade owned by an embedding service.

use std::sync::Arc;

use saferoute_analysis_models::{
    AverageComparison, CategoryDetail, ComparisonReport, HotspotReport, RouteAnalysis, RouteHandle,
    RouteOption, RouteWaypointSet,
};
use saferoute_geo::Coordinate;
use saferoute_incident_models::{CategoryWeights, IncidentSummary};
use saferoute_provider::{CrimeDataProvider, RoutingProvider, TravelMode};

use crate::aggregator::IncidentAggregator;
use crate::analyzer::RouteSafetyAnalyzer;
use crate::builder::RouteBuilder;
use crate::cache::RouteCache;
use crate::ranker::RouteRanker;
use crate::{AnalysisError, DEFAULT_CONCURRENCY, point_queries};

/// One route cache plus the components that read and write it.
///
/// Every engine owns its own cache, so handles from one engine are
/// unknown to another.
pub struct SafetyEngine {
    cache: Arc<RouteCache>,
    aggregator: Arc<IncidentAggregator>,
    builder: RouteBuilder,
    analyzer: Arc<RouteSafetyAnalyzer>,
    ranker: RouteRanker,
}

impl SafetyEngine {
    /// Creates an engine. `routing` is `None` when no routing credential
    /// is configured.
    #[must_use]
    pub fn new(
        crime: Arc<dyn CrimeDataProvider>,
        routing: Option<Arc<dyn RoutingProvider>>,
        weights: CategoryWeights,
    ) -> Self {
        Self::with_concurrency(crime, routing, weights, DEFAULT_CONCURRENCY)
    }

    /// Creates an engine that keeps at most `concurrency` crime-data
    /// requests in flight per route and analyzes that many routes at once
    /// during a comparison.
    #[must_use]
    pub fn with_concurrency(
        crime: Arc<dyn CrimeDataProvider>,
        routing: Option<Arc<dyn RoutingProvider>>,
        weights: CategoryWeights,
        concurrency: usize,
    ) -> Self {
        let cache = Arc::new(RouteCache::new());
        let aggregator = Arc::new(IncidentAggregator::new(crime, weights));
        let builder = RouteBuilder::new(routing, Arc::clone(&cache));
        let analyzer = Arc::new(
            RouteSafetyAnalyzer::new(Arc::clone(&aggregator), Arc::clone(&cache))
                .with_concurrency(concurrency),
        );
        let ranker = RouteRanker::new(Arc::clone(&analyzer)).with_concurrency(concurrency);

        Self {
            cache,
            aggregator,
            builder,
            analyzer,
            ranker,
        }
    }

    #[must_use]
    pub const fn aggregator(&self) -> &Arc<IncidentAggregator> {
        &self.aggregator
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<RouteCache> {
        &self.cache
    }

    /// See [`IncidentAggregator::summarize`].
    ///
    /// # Errors
    ///
    /// * If the crime data provider is unavailable
    pub async fn summarize(&self, point: Coordinate) -> Result<IncidentSummary, AnalysisError> {
        self.aggregator.summarize(point).await
    }

    /// See [`RouteBuilder::build_routes`].
    pub async fn build_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Vec<RouteOption> {
        self.builder.build_routes(origin, destination, mode).await
    }

    /// Caches a caller-supplied waypoint list as a route.
    ///
    /// # Errors
    ///
    /// * If fewer than two waypoints are given
    pub fn register_route(&self, waypoints: Vec<Coordinate>) -> Result<RouteHandle, AnalysisError> {
        Ok(self.cache.put(RouteWaypointSet::new(waypoints)?))
    }

    /// Waypoints cached under `handle`.
    ///
    /// # Errors
    ///
    /// * If `handle` is not in the cache
    pub fn waypoints(&self, handle: RouteHandle) -> Result<RouteWaypointSet, AnalysisError> {
        self.cache.get(handle)
    }

    /// See [`RouteSafetyAnalyzer::analyze`].
    ///
    /// # Errors
    ///
    /// * If `handle` is not in the cache
    pub async fn analyze(&self, handle: RouteHandle) -> Result<RouteAnalysis, AnalysisError> {
        self.analyzer.analyze(handle).await
    }

    /// See [`RouteRanker::compare`].
    ///
    /// # Errors
    ///
    /// * If no route could be analyzed
    pub async fn compare(
        &self,
        handles: &[RouteHandle],
    ) -> Result<ComparisonReport, AnalysisError> {
        self.ranker.compare(handles).await
    }

    /// Handles currently cached.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteHandle> {
        self.cache.list()
    }

    pub fn evict(&self, handle: RouteHandle) -> bool {
        self.cache.evict(handle)
    }

    pub fn evict_all(&self) -> usize {
        self.cache.evict_all()
    }

    /// See [`point_queries::hotspots`].
    ///
    /// # Errors
    ///
    /// * If the crime data provider is unavailable
    pub async fn hotspots(&self, point: Coordinate) -> Result<HotspotReport, AnalysisError> {
        point_queries::hotspots(&self.aggregator, point).await
    }

    /// See [`point_queries::compare_to_average`].
    ///
    /// # Errors
    ///
    /// * If the crime data provider is unavailable
    pub async fn compare_to_average(
        &self,
        point: Coordinate,
        baseline: u64,
    ) -> Result<AverageComparison, AnalysisError> {
        point_queries::compare_to_average(&self.aggregator, point, baseline).await
    }

    /// See [`point_queries::incidents_by_category`].
    ///
    /// # Errors
    ///
    /// * If the crime data provider is unavailable
    pub async fn incidents_by_category(
        &self,
        point: Coordinate,
        categories: &[String],
    ) -> Result<Vec<CategoryDetail>, AnalysisError> {
        point_queries::incidents_by_category(&self.aggregator, point, categories).await
    }
}

#[cfg(test)]
mod tests {
    use saferoute_incident_models::WeightScheme;
    use saferoute_provider::ProviderRoute;
    use saferoute_provider::memory::{InMemoryCrimeProvider, StaticRoutingProvider};

    use super::*;
    use crate::test_support::coord;

    #[tokio::test]
    async fn build_analyze_compare_without_routing() {
        let origin = coord(51.50, -0.10);
        let destination = coord(51.52, -0.14);
        let crime = InMemoryCrimeProvider::new().with_category(origin, "violent-crime", 2);
        let engine = SafetyEngine::new(Arc::new(crime), None, WeightScheme::Severity.weights());

        let routes = engine

            .build_routes(origin, destination, TravelMode::Walking)

            .await;
        assert_eq!(routes.len(), 1);
        assert_eq!(engine.routes(), vec![routes[0].handle]);

        let analysis = engine.analyze(routes[0].handle).await.unwrap();
        assert_eq!(analysis.segments.len(), 3);
        assert_eq!(analysis.total_incidents, 2);

        let report = engine.compare(&[routes[0].handle]).await.unwrap();
        assert_eq!(report.recommended, routes[0].handle);
        assert_eq!(report.rankings[0].safety_score, 0);
    }

    #[tokio::test]
    async fn compares_provider_alternatives() {
        let origin = coord(38.5, -120.2);
        let destination = coord(43.252, -126.453);
        let routing = StaticRoutingProvider::new(vec![
            ProviderRoute {
                encoded_path: "_p~iF~ps|U_ulLnnqC_mqNvxq`@".to_string(),
                distance_meters: 900_000.0,
                duration_seconds: 36_000.0,
            },
            ProviderRoute {
                encoded_path: "_p~iF~ps|U_mqNvxq`@".to_string(),
                distance_meters: 850_000.0,
                duration_seconds: 34_000.0,
            },
        ]);
        let crime = InMemoryCrimeProvider::new().with_category(coord(40.7, -120.95), "robbery", 4);
        let engine = SafetyEngine::new(
            Arc::new(crime),
            Some(Arc::new(routing)),
            WeightScheme::Severity.weights(),
        );

        let routes = engine

            .build_routes(origin, destination, TravelMode::Walking)

            .await;
        assert_eq!(routes.len(), 2);
        let handles: Vec<_> = routes.iter().map(|r| r.handle).collect();

        let report = engine.compare(&handles).await.unwrap();
        assert_eq!(report.recommended, handles[1]);
        assert_eq!(report.rankings[0].safety_score, 100);
        assert_eq!(report.rankings[1].total_incidents, 4);
    }

    #[tokio::test]
    async fn evicted_routes_are_gone() {
        let engine = SafetyEngine::new(
            Arc::new(InMemoryCrimeProvider::new()),
            None,
            CategoryWeights::default(),
        );
        let first = engine
            .register_route(vec![coord(51.50, -0.10), coord(51.52, -0.14)])
            .unwrap();
        let second = engine
            .register_route(vec![coord(51.50, -0.10), coord(51.53, -0.15)])
            .unwrap();

        assert!(engine.evict(first));
        assert!(matches!(
            engine.analyze(first).await,
            Err(AnalysisError::HandleNotFound { .. })
        ));
        assert_eq!(engine.evict_all(), 1);
        assert!(engine.waypoints(second).is_err());
        assert!(engine.routes().is_empty());
    }

    #[test]
    fn single_waypoint_is_invalid() {
        let engine = SafetyEngine::new(
            Arc::new(InMemoryCrimeProvider::new()),
            None,
            CategoryWeights::default(),
        );
        let err = engine
            .register_route(vec![coord(51.50, -0.10)])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRoute { .. }));
    }
}
