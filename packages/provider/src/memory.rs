//! Fixed-response providers.
//!
//! Used for offline runs and throughout the test suites of the crates
//! above this one. Responses are configured up front and never change,
//! so every provider here is `Sync` without locking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use saferoute_geo::Coordinate;
use saferoute_incident_models::IncidentRecord;

use crate::{
    CrimeDataProvider, ProviderError, ProviderRoute, RoutingProvider, TravelMode, WeatherConditions,
    WeatherProvider,
};

type PointKey = (u64, u64);

fn key(point: Coordinate) -> PointKey {
    (point.latitude().to_bits(), point.longitude().to_bits())
}

enum CrimeResponse {
    Records(Vec<IncidentRecord>),
    Failure(String),
}

/// Crime provider answering from a per-point table.
///
/// Points without an entry answer with an empty list.
#[derive(Default)]
pub struct InMemoryCrimeProvider {
    responses: HashMap<PointKey, CrimeResponse>,
    calls: AtomicUsize,
}

impl InMemoryCrimeProvider {
    /// Creates a provider with no configured points.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `point` with `records`.
    #[must_use]
    pub fn with_incidents(mut self, point: Coordinate, records: Vec<IncidentRecord>) -> Self {
        self.responses
            .insert(key(point), CrimeResponse::Records(records));
        self
    }

    /// Answers `point` with `count` records of `category` located at
    /// `point`, appended to records already configured there (a
    /// configured failure is replaced).
    #[must_use]
    pub fn with_category(mut self, point: Coordinate, category: &str, count: usize) -> Self {
        let entry = self
            .responses
            .entry(key(point))
            .or_insert_with(|| CrimeResponse::Records(Vec::new()));
        if matches!(entry, CrimeResponse::Failure(_)) {
            *entry = CrimeResponse::Records(Vec::new());
        }
        if let CrimeResponse::Records(records) = entry {
            records.extend((0..count).map(|_| IncidentRecord::new(category, point)));
        }
        self
    }

    /// Makes requests for `point` fail.
    #[must_use]
    pub fn with_failure(mut self, point: Coordinate, message: impl Into<String>) -> Self {
        self.responses
            .insert(key(point), CrimeResponse::Failure(message.into()));
        self
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CrimeDataProvider for InMemoryCrimeProvider {
    async fn incidents_near(
        &self,
        point: Coordinate,
    ) -> Result<Vec<IncidentRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(&key(point)) {
            Some(CrimeResponse::Records(records)) => Ok(records.clone()),
            Some(CrimeResponse::Failure(message)) => Err(ProviderError::Unavailable {
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Routing provider that always returns the same answer.
pub struct StaticRoutingProvider {
    response: Result<Vec<ProviderRoute>, String>,
}

impl StaticRoutingProvider {
    /// Always returns `routes`.
    #[must_use]
    pub const fn new(routes: Vec<ProviderRoute>) -> Self {
        Self {
            response: Ok(routes),
        }
    }

    /// Always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }
}

#[async_trait::async_trait]
impl RoutingProvider for StaticRoutingProvider {
    async fn routes(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
        _mode: TravelMode,
    ) -> Result<Vec<ProviderRoute>, ProviderError> {
        self.response
            .clone()
            .map_err(|message| ProviderError::Unavailable { message })
    }
}

/// Weather provider that always returns the same answer.
pub struct StaticWeatherProvider {
    response: Result<WeatherConditions, String>,
}

impl StaticWeatherProvider {
    /// Always returns `conditions`.
    #[must_use]
    pub const fn new(conditions: WeatherConditions) -> Self {
        Self {
            response: Ok(conditions),
        }
    }

    /// Always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }
}

#[async_trait::async_trait]
impl WeatherProvider for StaticWeatherProvider {
    async fn current(&self, _point: Coordinate) -> Result<WeatherConditions, ProviderError> {
        self.response
            .clone()
            .map_err(|message| ProviderError::Unavailable { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_per_point() {
        let a = Coordinate::new(51.50, -0.10).unwrap();
        let b = Coordinate::new(51.52, -0.14).unwrap();
        let c = Coordinate::new(51.53, -0.15).unwrap();
        let provider = InMemoryCrimeProvider::new()
            .with_category(a, "burglary", 2)
            .with_category(a, "robbery", 1)
            .with_failure(b, "down");

        assert_eq!(provider.incidents_near(a).await.unwrap().len(), 3);
        assert!(provider.incidents_near(b).await.is_err());
        assert!(provider.incidents_near(c).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn explicit_records_replace_earlier_answers() {
        let point = Coordinate::new(51.50, -0.10).unwrap();
        let record = IncidentRecord {
            street: Some("On or near Mill Lane".to_string()),
            month: Some("2024-05".to_string()),
            ..IncidentRecord::new("drugs", point)
        };
        let provider = InMemoryCrimeProvider::new()
            .with_failure(point, "down")
            .with_incidents(point, vec![record.clone()]);

        assert_eq!(provider.incidents_near(point).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn static_routing_failure() {
        let origin = Coordinate::new(0.0, 0.0).unwrap();
        let provider = StaticRoutingProvider::failing("no key");
        let err = provider
            .routes(origin, origin, TravelMode::Walking)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }
}
