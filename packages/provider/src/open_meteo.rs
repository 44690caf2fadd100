//! Open-Meteo current-conditions client and weather helpers.
//!
//! Free API, no key required. Weather codes follow the WMO
//! interpretation table used by Open-Meteo.
//!
//! See <https://open-meteo.com/en/docs>

use saferoute_geo::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::registry::{self, ProviderConfig, ProviderService};
use crate::retry::{self, RetryPolicy};
use crate::{ProviderError, WeatherProvider, env_non_empty, http_client};

/// Environment variable overriding the forecast endpoint.
pub const BASE_URL_ENV: &str = "SAFEROUTE_WEATHER_URL";

/// Current variables requested from the forecast endpoint.
const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,precipitation,weather_code,\
                              cloud_cover,wind_speed_10m,relative_humidity_2m,visibility";

/// Visibility below this many metres counts as severe weather.
pub const SEVERE_VISIBILITY_METERS: f64 = 1000.0;

/// WMO codes that report drizzle, rain or rain showers.
const RAIN_CODES: &[u16] = &[51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 80, 81, 82];

/// WMO codes for fog, heavy rain, snow and thunderstorms.
const SEVERE_CODES: &[u16] = &[
    45, 48, 65, 67, 71, 73, 75, 77, 82, 85, 86, 95, 96, 99,
];

/// Current weather at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConditions {
    /// Air temperature at 2 m (°C).
    pub temperature: f64,
    /// Apparent ("feels like") temperature (°C).
    pub feels_like: f64,
    /// Precipitation in the preceding hour (mm).
    pub precipitation: f64,
    /// WMO weather interpretation code.
    pub weather_code: u16,
    /// Cloud cover (%).
    pub cloud_cover: u8,
    /// Wind speed at 10 m (m/s).
    pub wind_speed_ms: f64,
    /// Relative humidity at 2 m (%).
    pub humidity: u8,
    /// Visibility in metres, when the model provides it.
    pub visibility_meters: Option<f64>,
}

/// Coarse visibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisibilityLevel {
    /// Under 1 km.
    VeryPoor,
    /// 1–5 km.
    Poor,
    /// 5–8 km.
    Moderate,
    /// 8 km or more.
    Good,
}

impl VisibilityLevel {
    /// Classifies a visibility distance in metres.
    #[must_use]
    pub fn from_meters(meters: f64) -> Self {
        if meters < 1000.0 {
            Self::VeryPoor
        } else if meters < 5000.0 {
            Self::Poor
        } else if meters < 8000.0 {
            Self::Moderate
        } else {
            Self::Good
        }
    }
}

impl WeatherConditions {
    /// Human-readable description of the weather code.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        describe_weather_code(self.weather_code)
    }

    /// Whether it is currently raining or drizzling.
    #[must_use]
    pub fn is_raining(&self) -> bool {
        self.precipitation > 0.0 || RAIN_CODES.contains(&self.weather_code)
    }

    /// Visibility classification, if visibility is known.
    #[must_use]
    pub fn visibility_level(&self) -> Option<VisibilityLevel> {
        self.visibility_meters.map(VisibilityLevel::from_meters)
    }

    /// Fog, heavy rain, snow, thunderstorm, or visibility under 1 km.
    #[must_use]
    pub fn is_severe(&self) -> bool {
        SEVERE_CODES.contains(&self.weather_code)
            || self
                .visibility_meters
                .is_some_and(|v| v < SEVERE_VISIBILITY_METERS)
    }
}

/// Description of a WMO weather interpretation code.
#[must_use]
pub const fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Open-Meteo weather provider.
pub struct OpenMeteoProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenMeteoProvider {
    /// Creates a provider from a registry service definition.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] if `service` is not an Open-Meteo
    /// definition, or [`ProviderError::Http`] if the client cannot be
    /// built.
    pub fn from_service(service: &ProviderService) -> Result<Self, ProviderError> {
        let ProviderConfig::OpenMeteo { base_url } = &service.provider else {
            return Err(ProviderError::Config {
                message: format!("service '{}' is not an Open-Meteo service", service.id),
            });
        };
        Ok(Self {
            base_url: base_url.clone(),
            client: http_client(service.timeout())?,
            retry: service.retry_policy(),
        })
    }

    /// Creates a provider from the embedded service definition, honouring
    /// [`BASE_URL_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the service definition is missing or
    /// the client cannot be built.
    pub fn from_env() -> Result<Self, ProviderError> {
        let service =
            registry::service(registry::OPEN_METEO).ok_or_else(|| ProviderError::Config {
                message: "open_meteo service definition missing".to_string(),
            })?;
        let mut provider = Self::from_service(&service)?;
        if let Some(url) = env_non_empty(BASE_URL_ENV) {
            log::info!("Using weather endpoint override {url}");
            provider.base_url = url;
        }
        Ok(provider)
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current(&self, point: Coordinate) -> Result<WeatherConditions, ProviderError> {
        let lat = point.latitude().to_string();
        let lon = point.longitude().to_string();

        log::debug!("Fetching weather at {point}");
        let body = retry::send_json(
            || {
                self.client.get(&self.base_url).query(&[
                    ("latitude", lat.as_str()),
                    ("longitude", lon.as_str()),
                    ("current", CURRENT_FIELDS),
                    ("wind_speed_unit", "ms"),
                    ("timezone", "auto"),
                ])
            },
            self.retry,
        )
        .await?;

        parse_current(&body)
    }
}

/// Parses the `current` block of a forecast response.
///
/// # Errors
///
/// Returns [`ProviderError::Malformed`] if there is no `current` object.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_current(body: &serde_json::Value) -> Result<WeatherConditions, ProviderError> {
    let current = body["current"]
        .as_object()
        .ok_or_else(|| ProviderError::Malformed {
            message: "forecast response has no current block".to_string(),
        })?;

    let field = |name: &str| current.get(name).and_then(serde_json::Value::as_f64);
    let temperature = field("temperature_2m").unwrap_or(0.0);

    Ok(WeatherConditions {
        temperature,
        feels_like: field("apparent_temperature").unwrap_or(temperature),
        precipitation: field("precipitation").unwrap_or(0.0),
        weather_code: field("weather_code").map_or(0, |c| c.clamp(0.0, 99.0) as u16),
        cloud_cover: field("cloud_cover").map_or(0, |c| c.clamp(0.0, 100.0) as u8),
        wind_speed_ms: field("wind_speed_10m").unwrap_or(0.0),
        humidity: field("relative_humidity_2m").map_or(0, |h| h.clamp(0.0, 100.0) as u8),
        visibility_meters: field("visibility"),
    })
}
