//! Candidate route construction.
//!
//! The routing provider is asked for alternatives between two points.
//! Each returned geometry is decoded, thinned to a handful of waypoints
//! (every waypoint later costs one crime-data request) and registered in
//! the route cache. When no routing provider is configured, or it fails,
//! a single direct route is synthesized instead. Building routes never
//! fails.

use std::sync::Arc;

use saferoute_analysis_models::{RouteOption, RouteSource, RouteWaypointSet};
use saferoute_geo::{Coordinate, GeoError, METERS_PER_MILE, distance, midpoint, polyline};
use saferoute_provider::{ProviderError, ProviderRoute, RoutingProvider, TravelMode, openroute};
use thiserror::Error;

use crate::cache::RouteCache;

/// Most alternatives kept from a single provider answer.
pub const MAX_ALTERNATIVES: usize = 3;

/// Target number of sampled waypoints per route, before the endpoints are
/// forced in.
pub const SAMPLE_TARGET: usize = 5;

const ESTIMATED_DESCRIPTION: &str = "Direct route (estimated)";
const FALLBACK_DESCRIPTION: &str = "Direct route (fallback)";

#[derive(Debug, Error)]
enum RouteFetchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("route {index}: {source}")]
    Decode { index: usize, source: GeoError },
    #[error("provider returned no routes")]
    Empty,
}

/// Direct-route travel time estimate per mode.
///
/// Walking uses 20 minutes per mile (3 mph). Cycling assumes 10 mph and
/// driving 25 mph of urban traffic.
#[must_use]
pub const fn minutes_per_mile(mode: TravelMode) -> f64 {
    match mode {
        TravelMode::Walking => 20.0,
        TravelMode::Cycling => 6.0,
        TravelMode::Driving => 2.4,
    }
}

/// Short mode label used in route descriptions: the routing profile up to
/// its first `-` (`foot`, `cycling`, `driving`).
#[must_use]
pub fn mode_label(mode: TravelMode) -> &'static str {
    let profile = openroute::profile(mode);
    profile
        .split_once('-')
        .map_or(profile, |(prefix, _)| prefix)
}

/// Keeps every `max(1, n / 5)`th point of a decoded path, starting with the
/// first.
#[must_use]
pub fn sample_path(points: &[Coordinate]) -> Vec<Coordinate> {
    let stride = (points.len() / SAMPLE_TARGET).max(1);
    points.iter().step_by(stride).copied().collect()
}

/// Builds candidate routes and registers them in a [`RouteCache`].
pub struct RouteBuilder {
    routing: Option<Arc<dyn RoutingProvider>>,
    cache: Arc<RouteCache>,
}

impl RouteBuilder {
    /// `routing` is `None` when no routing credential is configured.
    #[must_use]
    pub fn new(routing: Option<Arc<dyn RoutingProvider>>, cache: Arc<RouteCache>) -> Self {
        Self { routing, cache }
    }

    /// Builds and caches the candidate routes between two points, in
    /// provider order.
    ///
    /// Provider failures are logged and replaced by a single direct route;
    /// the result always holds at least one route.
    pub async fn build_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Vec<RouteOption> {
        let Some(routing) = &self.routing else {
            log::debug!("No routing provider configured; estimating direct {mode} route");
            let waypoints = RouteWaypointSet::anchored(
                origin,
                destination,
                vec![midpoint(origin, destination)],
            );
            return vec![self.direct(waypoints, mode, RouteSource::Estimated)];
        };

        match fetch_waypoints(routing.as_ref(), origin, destination, mode).await {
            Ok(routes) => routes
                .into_iter()
                .enumerate()
                .map(|(idx, (route, waypoints))| {
                    self.register_provider_route(idx, &route, waypoints, mode)
                })
                .collect(),
            Err(e) => {
                log::warn!("Routing {origin} -> {destination} failed, using direct fallback: {e}");
                let waypoints = RouteWaypointSet::anchored(origin, destination, Vec::new());
                vec![self.direct(waypoints, mode, RouteSource::Fallback)]
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn register_provider_route(
        &self,
        idx: usize,
        route: &ProviderRoute,
        waypoints: RouteWaypointSet,
        mode: TravelMode,
    ) -> RouteOption {
        let waypoint_count = waypoints.len();
        let handle = self.cache.put(waypoints);
        RouteOption {
            handle,
            distance_meters: route.distance_meters.max(0.0) as u64,
            duration_minutes: (route.duration_seconds.max(0.0) / 60.0) as u64,
            description: format!("Route {} ({})", idx + 1, mode_label(mode)),
            source: RouteSource::Provider,
            waypoint_count,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn direct(
        &self,
        waypoints: RouteWaypointSet,
        mode: TravelMode,
        source: RouteSource,
    ) -> RouteOption {
        let miles = distance(waypoints.origin(), waypoints.destination());
        let waypoint_count = waypoints.len();
        let handle = self.cache.put(waypoints);
        RouteOption {
            handle,
            distance_meters: (miles * METERS_PER_MILE) as u64,
            duration_minutes: (miles * minutes_per_mile(mode)) as u64,
            description: match source {
                RouteSource::Fallback => FALLBACK_DESCRIPTION,
                RouteSource::Estimated | RouteSource::Provider => ESTIMATED_DESCRIPTION,
            }
            .to_string(),
            source,
            waypoint_count,
        }
    }
}

/// Requests routes and decodes every geometry before anything is cached,
/// so a bad geometry leaves no partial set of routes behind.
async fn fetch_waypoints(
    routing: &dyn RoutingProvider,
    origin: Coordinate,
    destination: Coordinate,
    mode: TravelMode,
) -> Result<Vec<(ProviderRoute, RouteWaypointSet)>, RouteFetchError> {
    let routes = routing.routes(origin, destination, mode).await?;
    if routes.is_empty() {
        return Err(RouteFetchError::Empty);
    }

    routes
        .into_iter()
        .take(MAX_ALTERNATIVES)
        .enumerate()
        .map(|(index, route)| {
            let path = polyline::decode(&route.encoded_path, polyline::DEFAULT_PRECISION)
                .map_err(|source| RouteFetchError::Decode {
                    index: index + 1,
                    source,
                })?;
            let waypoints = RouteWaypointSet::anchored(origin, destination, sample_path(&path));
            Ok((route, waypoints))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use saferoute_provider::memory::StaticRoutingProvider;

    use super::*;
    use crate::test_support::coord;

    const REFERENCE_PATH: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn provider_route(encoded: &str) -> ProviderRoute {
        ProviderRoute {
            encoded_path: encoded.to_string(),
            distance_meters: 1523.7,
            duration_seconds: 1150.0,
        }
    }

    fn builder(routing: Option<Arc<dyn RoutingProvider>>) -> (RouteBuilder, Arc<RouteCache>) {
        let cache = Arc::new(RouteCache::new());
        (RouteBuilder::new(routing, Arc::clone(&cache)), cache)
    }

    #[test]
    fn sampling_stride() {
        let points: Vec<_> = (0..12).map(|i| coord(f64::from(i), 0.0)).collect();
        let sampled = sample_path(&points);
        assert_eq!(sampled.len(), 6);
        assert_eq!(sampled[1], points[2]);

        let short: Vec<_> = (0..3).map(|i| coord(f64::from(i), 0.0)).collect();
        assert_eq!(sample_path(&short), short);
        assert!(sample_path(&[]).is_empty());
    }

    #[tokio::test]
    async fn no_provider_estimates_three_point_route() {
        let (builder, cache) = builder(None);
        let origin = coord(51.5074, -0.1278);
        let destination = coord(51.5155, -0.1419);

        let routes = builder

            .build_routes(origin, destination, TravelMode::Walking)

            .await;
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.source, RouteSource::Estimated);
        assert_eq!(route.description, "Direct route (estimated)");
        assert_eq!(route.waypoint_count, 3);

        let waypoints = cache.get(route.handle).unwrap();
        assert_eq!(waypoints.origin(), origin);
        assert_eq!(waypoints.destination(), destination);
        assert_eq!(waypoints.points()[1], midpoint(origin, destination));

        let miles = distance(origin, destination);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let expected = (miles * METERS_PER_MILE) as u64;
        assert_eq!(route.distance_meters, expected);
    }

    #[tokio::test]
    async fn failing_provider_falls_back_to_two_points() {
        let routing: Arc<dyn RoutingProvider> = Arc::new(StaticRoutingProvider::failing("401"));
        let (builder, cache) = builder(Some(routing));

        let routes = builder
            .build_routes(
                coord(51.50, -0.10),
                coord(51.52, -0.14),
                TravelMode::Walking,
            )
            .await;
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].source, RouteSource::Fallback);
        assert_eq!(routes[0].description, "Direct route (fallback)");
        assert_eq!(cache.get(routes[0].handle).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn provider_routes_are_anchored_to_endpoints() {
        let routing: Arc<dyn RoutingProvider> = Arc::new(StaticRoutingProvider::new(vec![
            provider_route(REFERENCE_PATH),
            provider_route(REFERENCE_PATH),
        ]));
        let (builder, cache) = builder(Some(routing));
        let origin = coord(38.0, -120.0);
        let destination = coord(44.0, -127.0);

        let routes = builder

            .build_routes(origin, destination, TravelMode::Cycling)

            .await;
        assert_eq!(routes.len(), 2);
        assert_ne!(routes[0].handle, routes[1].handle);

        for route in &routes {
            assert_eq!(route.source, RouteSource::Provider);
            assert_eq!(route.distance_meters, 1523);
            assert_eq!(route.duration_minutes, 19);
            let waypoints = cache.get(route.handle).unwrap();
            assert_eq!(waypoints.len(), 5);
            assert_eq!(waypoints.origin(), origin);
            assert_eq!(waypoints.destination(), destination);
        }
        assert_eq!(routes[0].description, "Route 1 (cycling)");
    }

    #[tokio::test]
    async fn matching_endpoints_are_not_duplicated() {
        let routing: Arc<dyn RoutingProvider> = Arc::new(StaticRoutingProvider::new(vec![
            provider_route(REFERENCE_PATH),
        ]));
        let (builder, cache) = builder(Some(routing));

        let routes = builder
            .build_routes(
                coord(38.5, -120.2),
                coord(43.252, -126.453),
                TravelMode::Walking,
            )
            .await;
        assert_eq!(cache.get(routes[0].handle).unwrap().len(), 3);
        assert_eq!(routes[0].description, "Route 1 (foot)");
    }

    #[test]
    fn mode_labels_follow_profiles() {
        assert_eq!(mode_label(TravelMode::Walking), "foot");
        assert_eq!(mode_label(TravelMode::Cycling), "cycling");
        assert_eq!(mode_label(TravelMode::Driving), "driving");
    }

    #[tokio::test]
    async fn keeps_at_most_three_alternatives() {
        let routing: Arc<dyn RoutingProvider> = Arc::new(StaticRoutingProvider::new(vec![
            provider_route(REFERENCE_PATH);
            4
        ]));
        let (builder, _) = builder(Some(routing));

        let routes = builder
            .build_routes(
                coord(38.0, -120.0),
                coord(44.0, -127.0),
                TravelMode::Walking,
            )
            .await;
        assert_eq!(routes.len(), MAX_ALTERNATIVES);
    }

    #[tokio::test]
    async fn empty_or_undecodable_answers_fall_back() {
        let empty: Arc<dyn RoutingProvider> = Arc::new(StaticRoutingProvider::new(Vec::new()));
        let (builder_a, _) = builder(Some(empty));
        let routes = builder_a
            .build_routes(
                coord(51.50, -0.10),
                coord(51.52, -0.14),
                TravelMode::Walking,
            )
            .await;
        assert_eq!(routes[0].source, RouteSource::Fallback);

        let broken: Arc<dyn RoutingProvider> = Arc::new(StaticRoutingProvider::new(vec![
            provider_route(REFERENCE_PATH),
            provider_route("_p~iF~ps|"),
        ]));
        let (builder_b, cache) = builder(Some(broken));
        let routes = builder_b
            .build_routes(
                coord(51.50, -0.10),
                coord(51.52, -0.14),
                TravelMode::Walking,
            )
            .await;
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].source, RouteSource::Fallback);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn fallback_duration_depends_on_mode() {
        let (builder, _) = builder(None);
        let origin = coord(51.50, -0.10);
        let destination = coord(51.60, -0.20);

        let walking = builder

            .build_routes(origin, destination, TravelMode::Walking)

            .await;
        let driving = builder
            .build_routes(origin, destination, TravelMode::Driving)
            .await;
        assert!(walking[0].duration_minutes > driving[0].duration_minutes);
        assert_eq!(walking[0].distance_meters, driving[0].distance_meters);
    }
}
