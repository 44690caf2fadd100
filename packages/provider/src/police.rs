//! UK Police street-level crime client.
//!
//! `GET {base}/crimes-street/all-crime?lat=..&lng=..` returns every crime
//! recorded within a one-mile radius of the point for the most recent
//! month the API has published. The response is a JSON array; anything
//! else (the API returns an object on errors) is treated as malformed.
//!
//! See <https://data.police.uk/docs/method/crime-street/>

use saferoute_geo::Coordinate;
use saferoute_incident_models::IncidentRecord;

use crate::registry::{self, ProviderConfig, ProviderService};
use crate::retry::{self, RetryPolicy};
use crate::{CrimeDataProvider, ProviderError, env_non_empty, http_client};

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "SAFEROUTE_POLICE_URL";

/// UK Police street-level crime provider.
pub struct UkPoliceProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl UkPoliceProvider {
    /// Creates a provider against `base_url`.
    #[must_use]
    pub fn new(base_url: String, client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry,
        }
    }

    /// Creates a provider from a registry service definition.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if `service` is not a UK Police
    /// definition, or [`ProviderError::Http`] if the client cannot be
    /// built.
    pub fn from_service(service: &ProviderService) -> Result<Self, ProviderError> {
        let ProviderConfig::UkPolice { base_url } = &service.provider else {
            return Err(ProviderError::Config {
                message: format!("service '{}' is not a UK Police service", service.id),
            });
        };
        let client = http_client(service.timeout())?;
        Ok(Self::new(base_url.clone(), client, service.retry_policy()))
    }

    /// Creates a provider from the embedded service definition, honouring
    /// [`BASE_URL_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the service definition is missing or
    /// the client cannot be built.
    pub fn from_env() -> Result<Self, ProviderError> {
        let service = registry::service(registry::UK_POLICE).ok_or_else(|| {
            ProviderError::Config {
                message: "uk_police service definition missing".to_string(),
            }
        })?;
        let mut provider = Self::from_service(&service)?;
        if let Some(url) = env_non_empty(BASE_URL_ENV) {
            log::info!("Using crime data endpoint override {url}");
            provider.base_url = url.trim_end_matches('/').to_string();
        }
        Ok(provider)
    }
}

#[async_trait::async_trait]
impl CrimeDataProvider for UkPoliceProvider {
    async fn incidents_near(
        &self,
        point: Coordinate,
    ) -> Result<Vec<IncidentRecord>, ProviderError> {
        let url = format!("{}/crimes-street/all-crime", self.base_url);
        let lat = point.latitude().to_string();
        let lng = point.longitude().to_string();

        log::debug!("Fetching crimes near {point}");
        let body = retry::send_json(
            || {
                self.client
                    .get(&url)
                    .query(&[("lat", lat.as_str()), ("lng", lng.as_str())])
            },
            self.retry,
        )
        .await?;

        parse_crimes(&body, point)
    }
}

/// Parses the crime list. Records whose location cannot be read are
/// placed at `query_point`.
///
/// # Errors
///
/// Returns [`ProviderError::Malformed`] if `body` is not an array.
pub fn parse_crimes(
    body: &serde_json::Value,
    query_point: Coordinate,
) -> Result<Vec<IncidentRecord>, ProviderError> {
    let items = body.as_array().ok_or_else(|| ProviderError::Malformed {
        message: "crime response is not a list".to_string(),
    })?;

    Ok(items
        .iter()
        .map(|item| {
            let location = &item["location"];
            let coordinate = match (number(&location["latitude"]), number(&location["longitude"])) {
                (Some(lat), Some(lon)) => Coordinate::new(lat, lon).unwrap_or(query_point),
                _ => query_point,
            };

            IncidentRecord {
                category: item["category"].as_str().map(String::from),
                coordinate,
                street: location["street"]["name"].as_str().map(String::from),
                month: item["month"].as_str().map(String::from),
            }
        })
        .collect())
}

/// The API encodes coordinates as strings; accept plain numbers too.
fn number(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
