#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location-level risk assessment.
//!
//! Folds the incidents around a point, how recent they are, the current
//! weather and the local time into a 1–5 risk level. See [`index`] for the
//! formula, [`period`] for the time-of-day helpers and [`daylight`] for
//! sunrise, sunset and calendar context.

pub mod daylight;
pub mod index;
pub mod period;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike as _};
use saferoute_analysis::AnalysisError;
use saferoute_analysis::aggregator::IncidentAggregator;
use saferoute_geo::Coordinate;
use saferoute_provider::{WeatherConditions, WeatherProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use daylight::TimeContext;
pub use index::{AssessmentContext, LocationAssessment, RiskLevel, YearMonth, assess};
pub use period::{PeriodEstimate, TimeOfDay, estimate_period};

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Assessment of a point at a given local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointAssessment {
    pub point: Coordinate,
    pub local_time: NaiveDateTime,
    pub time_of_day: TimeOfDay,
    /// `None` when no weather provider is configured or it failed.
    pub weather: Option<WeatherConditions>,
    pub time_context: TimeContext,
    pub assessment: LocationAssessment,
}

/// Assesses points using live crime and weather data.
pub struct LocationAssessor {
    aggregator: Arc<IncidentAggregator>,
    weather: Option<Arc<dyn WeatherProvider>>,
}

impl LocationAssessor {
    #[must_use]
    pub fn new(
        aggregator: Arc<IncidentAggregator>,
        weather: Option<Arc<dyn WeatherProvider>>,
    ) -> Self {
        Self {
            aggregator,
            weather,
        }
    }

    /// Assesses `point` at local time `at` (with its UTC offset).
    ///
    /// Crime data and weather are fetched concurrently. Weather is
    /// optional: if it cannot be fetched the assessment assumes good
    /// weather.
    ///
    /// # Errors
    ///
    /// * If the crime data provider is unavailable
    pub async fn assess_point(
        &self,
        point: Coordinate,
        at: DateTime<FixedOffset>,
    ) -> Result<PointAssessment, AssessmentError> {
        let (records, weather) =
            tokio::join!(self.aggregator.records(point), self.current_weather(point));
        let records = records?;
        let local = at.naive_local();

        let context = AssessmentContext {
            night: period::is_night_hour(local.hour()),
            severe_weather: weather.as_ref().is_some_and(WeatherConditions::is_severe),
            reference_month: None,
        };
        let assessment = assess(&records, self.aggregator.weights(), context);
        log::info!(
            "{point} at {local}: index {:.2}, level {}",
            assessment.risk_index,
            assessment.level_value
        );

        Ok(PointAssessment {
            point,
            local_time: local,
            time_of_day: TimeOfDay::at(local),
            weather,
            time_context: Self::time_context(point, at),
            assessment,
        })
    }

    /// Sunrise, sunset and calendar context of `at` at `point`.
    #[must_use]
    pub fn time_context(point: Coordinate, at: DateTime<FixedOffset>) -> TimeContext {
        TimeContext::at(point, at)
    }

    /// Conditions at `point`, or `None` if they are unavailable.
    pub async fn current_weather(&self, point: Coordinate) -> Option<WeatherConditions> {
        let provider = self.weather.as_ref()?;
        match provider.current(point).await {
            Ok(conditions) => Some(conditions),
            Err(e) => {
                log::warn!("Weather at {point} unavailable, assuming good conditions: {e}");
                None
            }
        }
    }

    /// Expected incidents around `point` during `period`.
    ///
    /// # Errors
    ///
    /// * If the crime data provider is unavailable
    pub async fn estimate_period(
        &self,
        point: Coordinate,
        period: TimeOfDay,
    ) -> Result<PeriodEstimate, AssessmentError> {
        let records = self.aggregator.records(point).await?;
        Ok(estimate_period(&records, period))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use saferoute_incident_models::WeightScheme;
    use saferoute_provider::memory::{InMemoryCrimeProvider, StaticWeatherProvider};

    use super::*;

    fn point() -> Coordinate {
        Coordinate::new(51.5074, -0.1278).unwrap()
    }

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, hour, 15, 0)
            .unwrap()
    }

    fn weather(code: u16) -> WeatherConditions {
        WeatherConditions {
            temperature: 12.0,
            feels_like: 10.5,
            precipitation: 0.0,
            weather_code: code,
            cloud_cover: 20,
            wind_speed_ms: 2.5,
            humidity: 60,
            visibility_meters: Some(20_000.0),
        }
    }

    fn assessor(weather: Option<Arc<dyn WeatherProvider>>) -> LocationAssessor {
        let crime = InMemoryCrimeProvider::new().with_category(point(), "violent-crime", 3);
        let aggregator = Arc::new(IncidentAggregator::new(
            Arc::new(crime),
            WeightScheme::Severity.weights(),
        ));
        LocationAssessor::new(aggregator, weather)
    }

    #[tokio::test]
    async fn night_in_good_weather() {
        let assessor = assessor(Some(Arc::new(StaticWeatherProvider::new(weather(1)))));

        let result = assessor.assess_point(point(), at(23)).await.unwrap();
        assert_eq!(result.time_of_day, TimeOfDay::Night);
        assert!(result.assessment.context.night);
        assert!(!result.assessment.context.severe_weather);
        assert!((result.assessment.risk_index - 10.8).abs() < 1e-9);
        assert_eq!(result.assessment.level_value, 5);
        assert!(result.weather.is_some());
        assert!(!result.time_context.is_daylight);
        assert!(result.time_context.is_weekend);
        assert!(result.time_context.hours_after_sunset > 1.5);
    }

    #[tokio::test]
    async fn daytime_fog_is_severe() {
        let assessor = assessor(Some(Arc::new(StaticWeatherProvider::new(weather(45)))));

        let result = assessor.assess_point(point(), at(14)).await.unwrap();
        assert!(result.assessment.context.severe_weather);
        assert!(
            (result.assessment.environment_modifier - 1.15).abs() < f64::EPSILON
        );
        assert_eq!(result.assessment.level, RiskLevel::High);
        assert!(result.time_context.is_daylight);
    }

    #[tokio::test]
    async fn weather_failure_assumes_good_weather() {
        let assessor = assessor(Some(Arc::new(StaticWeatherProvider::failing("timeout"))));

        let result = assessor.assess_point(point(), at(10)).await.unwrap();
        assert!(result.weather.is_none());
        assert!(
            (result.assessment.environment_modifier - 1.0).abs() < f64::EPSILON
        );
        assert_eq!(result.assessment.level, RiskLevel::Higher);
    }

    #[tokio::test]
    async fn crime_failure_propagates() {
        let crime = InMemoryCrimeProvider::new().with_failure(point(), "503");
        let aggregator = Arc::new(IncidentAggregator::new(
            Arc::new(crime),
            WeightScheme::Severity.weights(),
        ));
        let assessor = LocationAssessor::new(aggregator, None);

        let err = assessor.assess_point(point(), at(10)).await.unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::Analysis(AnalysisError::ProviderUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn period_estimate_uses_live_records() {
        let assessor = assessor(None);
        let estimate = assessor
            .estimate_period(point(), TimeOfDay::Evening)
            .await
            .unwrap();
        assert_eq!(estimate.total_incidents, 3);
        assert_eq!(estimate.estimated_count, 1);
    }
}
