#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route safety aggregation and scoring engine.
//!
//! The pipeline runs in one direction:
//!
//! 1. [`builder::RouteBuilder`] asks the routing provider for candidate
//!    routes (or synthesizes a direct one), samples their waypoints and
//!    registers them in the [`cache::RouteCache`].
//! 2. [`analyzer::RouteSafetyAnalyzer`] reads a cached route and
//!    summarizes the incidents around every waypoint through the
//!    [`aggregator::IncidentAggregator`].
//! 3. [`ranker::RouteRanker`] scores a set of analyzed routes relative to
//!    each other and picks a recommendation.
//!
//! [`engine::SafetyEngine`] wires the four together for an embedding
//! service. The [`point_queries`] module holds single-point helpers that
//! reuse the aggregator's provider.

pub mod aggregator;
pub mod analyzer;
pub mod builder;
pub mod cache;
pub mod engine;
pub mod point_queries;
pub mod ranker;

use saferoute_analysis_models::{FailedRoute, RouteHandle, RouteModelError};
use saferoute_provider::ProviderError;
use thiserror::Error;

pub use engine::SafetyEngine;

/// Number of provider requests in flight per route or comparison.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Errors from the analysis engine.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The crime data provider could not answer for a point.
    #[error("Crime data provider unavailable: {message}")]
    ProviderUnavailable {
        /// Provider failure description.
        message: String,
    },

    /// No cached route under this handle.
    #[error("Route {handle} not found")]
    HandleNotFound {
        /// The unknown handle.
        handle: RouteHandle,
    },

    /// Every route in a comparison failed (or none were given).
    #[error("No valid routes to compare ({} failed)", .failed.len())]
    NoValidRoutes {
        /// Why each route failed.
        failed: Vec<FailedRoute>,
    },

    /// Waypoints supplied by the caller do not form a route.
    #[error("Invalid route: {message}")]
    InvalidRoute {
        /// Description.
        message: String,
    },
}

impl From<ProviderError> for AnalysisError {
    fn from(e: ProviderError) -> Self {
        Self::ProviderUnavailable {
            message: e.to_string(),
        }
    }
}

impl From<RouteModelError> for AnalysisError {
    fn from(e: RouteModelError) -> Self {
        Self::InvalidRoute {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use saferoute_geo::Coordinate;

    pub fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }
}
