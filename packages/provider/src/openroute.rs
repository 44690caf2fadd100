//! `OpenRouteService` directions client.
//!
//! `POST {base}/v2/directions/{profile}` with the two endpoints as
//! `[lon, lat]` pairs and `alternative_routes.target_count` set. Each
//! returned route carries its geometry as an encoded polyline and a
//! `summary` with distance (metres) and duration (seconds). The API
//! requires a key in the `Authorization` header.
//!
//! See <https://openrouteservice.org/dev/#/api-docs/v2/directions>

use saferoute_geo::Coordinate;

use crate::registry::{self, ProviderConfig, ProviderService};
use crate::retry::{self, RetryPolicy};
use crate::{ProviderError, ProviderRoute, RoutingProvider, TravelMode, env_non_empty, http_client};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENROUTE_API_KEY";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "SAFEROUTE_ROUTING_URL";

/// `OpenRouteService` profile name for a travel mode.
#[must_use]
pub const fn profile(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walking => "foot-walking",
        TravelMode::Cycling => "cycling-regular",
        TravelMode::Driving => "driving-car",
    }
}

/// `OpenRouteService` routing provider.
pub struct OpenRouteServiceProvider {
    api_key: String,
    base_url: String,
    max_alternatives: usize,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenRouteServiceProvider {
    /// Creates a provider from a registry service definition and key.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if `service` is not an
    /// `OpenRouteService` definition, or [`ProviderError::Http`] if the
    /// client cannot be built.
    pub fn from_service(service: &ProviderService, api_key: String) -> Result<Self, ProviderError> {
        let ProviderConfig::OpenRouteService {
            base_url,
            max_alternatives,
        } = &service.provider
        else {
            return Err(ProviderError::Config {
                message: format!("service '{}' is not an OpenRouteService service", service.id),
            });
        };

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_alternatives: *max_alternatives,
            client: http_client(service.timeout())?,
            retry: service.retry_policy(),
        })
    }

    /// Creates a provider when [`API_KEY_ENV`] is set.
    ///
    /// Returns `Ok(None)` when no key is configured: running without a
    /// routing provider is a supported configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the service definition is missing or
    /// the client cannot be built.
    pub fn from_env() -> Result<Option<Self>, ProviderError> {
        let Some(api_key) = env_non_empty(API_KEY_ENV) else {
            log::info!("{API_KEY_ENV} not set; routes will be estimated");
            return Ok(None);
        };
        let service = registry::service(registry::OPEN_ROUTE_SERVICE).ok_or_else(|| {
            ProviderError::Config {
                message: "openrouteservice service definition missing".to_string(),
            }
        })?;
        let mut provider = Self::from_service(&service, api_key)?;
        if let Some(url) = env_non_empty(BASE_URL_ENV) {
            log::info!("Using routing endpoint override {url}");
            provider.base_url = url.trim_end_matches('/').to_string();
        }
        Ok(Some(provider))
    }
}

#[async_trait::async_trait]
impl RoutingProvider for OpenRouteServiceProvider {
    async fn routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Vec<ProviderRoute>, ProviderError> {
        let url = format!("{}/v2/directions/{}", self.base_url, profile(mode));
        let payload = serde_json::json!({
            "coordinates": [
                [origin.longitude(), origin.latitude()],
                [destination.longitude(), destination.latitude()],
            ],
            "alternative_routes": { "target_count": self.max_alternatives },
            "instructions": false,
        });

        log::debug!("Requesting {mode} routes {origin} -> {destination}");
        let body = retry::send_json(
            || {
                self.client
                    .post(&url)
                    .header(reqwest::header::AUTHORIZATION, &self.api_key)
                    .json(&payload)
            },
            self.retry,
        )
        .await?;

        parse_routes(&body, self.max_alternatives)
    }
}

/// Parses a directions response, keeping at most `limit` routes.
///
/// # Errors
///
/// Returns [`ProviderError::Malformed`] if `routes` is missing or a route
/// has no geometry.
pub fn parse_routes(
    body: &serde_json::Value,
    limit: usize,
) -> Result<Vec<ProviderRoute>, ProviderError> {
    let routes = body["routes"]
        .as_array()
        .ok_or_else(|| ProviderError::Malformed {
            message: "directions response has no routes array".to_string(),
        })?;

    routes
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, route)| {
            let encoded_path = route["geometry"]
                .as_str()
                .ok_or_else(|| ProviderError::Malformed {
                    message: format!("route {} has no encoded geometry", idx + 1),
                })?
                .to_string();
            // ORS omits zero-valued summary fields.
            let summary = &route["summary"];
            Ok(ProviderRoute {
                encoded_path,
                distance_meters: summary["distance"].as_f64().unwrap_or(0.0),
                duration_seconds: summary["duration"].as_f64().unwrap_or(0.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_per_mode() {
        assert_eq!(profile(TravelMode::Walking), "foot-walking");
        assert_eq!(profile(TravelMode::Cycling), "cycling-regular");
        assert_eq!(profile(TravelMode::Driving), "driving-car");
    }

    #[test]
    fn parses_alternatives_up_to_limit() {
        let route = serde_json::json!({
            "geometry": "_p~iF~ps|U_ulLnnqC",
            "summary": { "distance": 1234.5, "duration": 900.0 }
        });
        let body = serde_json::json!({
            "routes": [route.clone(), route.clone(), route.clone(), route]
        });

        let routes = parse_routes(&body, 3).unwrap();
        assert_eq!(routes.len(), 3);
        assert!((routes[0].distance_meters - 1234.5).abs() < 1e-9);
        assert!((routes[0].duration_seconds - 900.0).abs() < 1e-9);
    }

    #[test]
    fn missing_summary_defaults_to_zero() {
        let body = serde_json::json!({ "routes": [{ "geometry": "", "summary": {} }] });
        let routes = parse_routes(&body, 3).unwrap();
        assert!(routes[0].distance_meters.abs() < f64::EPSILON);
    }

    #[test]
    fn error_payload_is_malformed() {
        let body = serde_json::json!({ "error": { "code": 2010, "message": "no route" } });
        assert!(matches!(
            parse_routes(&body, 3),
            Err(ProviderError::Malformed { .. })
        ));
        let body = serde_json::json!({ "routes": [{ "summary": {} }] });
        assert!(parse_routes(&body, 3).is_err());
    }
}
