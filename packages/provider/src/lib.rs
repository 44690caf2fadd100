#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! External data providers consumed by the saferoute engine.
//!
//! Three collaborators sit behind async traits so the engine never
//! depends on a concrete service:
//!
//! 1. [`CrimeDataProvider`]: raw incident records around a point
//!    ([`police`]: UK Police street-level crime API).
//! 2. [`RoutingProvider`]: up to three alternative routes between two
//!    points ([`openroute`]: `OpenRouteService` directions, requires an
//!    API key).
//! 3. [`WeatherProvider`]: current conditions at a point
//!    ([`open_meteo`]: Open-Meteo, no key required).
//!
//! Endpoints, timeouts and retry counts come from the TOML service
//! definitions in `services/` (see [`registry`]). The [`memory`] module
//! provides fixed-response implementations for offline use and tests.

pub mod memory;
pub mod open_meteo;
pub mod openroute;
pub mod police;
pub mod registry;
pub mod retry;

use std::time::Duration;

use saferoute_geo::Coordinate;
use saferoute_incident_models::IncidentRecord;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

pub use open_meteo::WeatherConditions;

/// Errors from provider requests.
///
/// Every variant means the provider is unavailable for this request; the
/// engine does not distinguish between them beyond logging.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("HTTP status {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Error detail extracted from the body, if any.
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("Malformed response: {message}")]
    Malformed {
        /// Description of what was wrong.
        message: String,
    },

    /// Provider could not be reached for a reason other than HTTP.
    #[error("Provider unavailable: {message}")]
    Unavailable {
        /// Description.
        message: String,
    },

    /// Missing or invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Travel mode requested from the routing provider.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TravelMode {
    /// On foot.
    #[default]
    Walking,
    /// Bicycle.
    Cycling,
    /// Car.
    Driving,
}

impl TravelMode {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Walking, Self::Cycling, Self::Driving]
    }
}

/// One route as returned by a routing provider, before decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRoute {
    /// Encoded polyline (precision 5) of the full route geometry.
    pub encoded_path: String,
    /// Total distance in metres.
    pub distance_meters: f64,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

/// Source of raw incident records.
#[async_trait::async_trait]
pub trait CrimeDataProvider: Send + Sync {
    /// Fetches the incidents recorded around `point`.
    ///
    /// Records keep the provider's response order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the provider cannot be reached, times
    /// out, or returns something other than a list of records.
    async fn incidents_near(&self, point: Coordinate) -> Result<Vec<IncidentRecord>, ProviderError>;
}

/// Source of candidate routes.
#[async_trait::async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Requests alternative routes from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the request fails or the response
    /// cannot be parsed.
    async fn routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Vec<ProviderRoute>, ProviderError>;
}

/// Source of current weather conditions.
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches the current conditions at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the request fails or the response
    /// cannot be parsed.
    async fn current(&self, point: Coordinate) -> Result<WeatherConditions, ProviderError>;
}

/// Builds an HTTP client with the given per-request timeout.
///
/// Timeouts surface as [`ProviderError::Http`].
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the TLS backend cannot be
/// initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Reads a non-empty environment variable.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_mode_parses_case_insensitively() {
        assert_eq!(
            "walking".parse::<TravelMode>().unwrap(),
            TravelMode::Walking
        );
        assert_eq!(
            "Driving".parse::<TravelMode>().unwrap(),
            TravelMode::Driving
        );
        assert!("teleport".parse::<TravelMode>().is_err());
        assert_eq!(TravelMode::Cycling.to_string(), "cycling");
    }
}
