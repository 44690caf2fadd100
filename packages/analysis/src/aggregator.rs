//! Per-point incident aggregation.

use std::sync::Arc;

use saferoute_geo::Coordinate;
use saferoute_incident_models::{CategoryWeights, IncidentRecord, IncidentSummary};
use saferoute_provider::CrimeDataProvider;

use crate::AnalysisError;

/// Fetches the incidents around a point and reduces them to an
/// [`IncidentSummary`] under a category weight table.
///
/// Holds no state between calls; every summary is recomputed from a
/// fresh provider response.
pub struct IncidentAggregator {
    provider: Arc<dyn CrimeDataProvider>,
    weights: CategoryWeights,
}

impl IncidentAggregator {
    #[must_use]
    pub fn new(provider: Arc<dyn CrimeDataProvider>, weights: CategoryWeights) -> Self {
        Self { provider, weights }
    }

    /// Weight table used for risk contributions.
    #[must_use]
    pub const fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Raw records around `point`, in provider order.
    ///
    /// # Errors
    ///
    /// * If the provider cannot be reached or returns a malformed payload
    pub async fn records(&self, point: Coordinate) -> Result<Vec<IncidentRecord>, AnalysisError> {
        Ok(self.provider.incidents_near(point).await?)
    }

    /// Summarizes the incidents around `point`.
    ///
    /// Not retried here; the provider applies its own retry policy.
    ///
    /// # Errors
    ///
    /// * If the provider cannot be reached or returns a malformed payload
    pub async fn summarize(&self, point: Coordinate) -> Result<IncidentSummary, AnalysisError> {
        let records = self.records(point).await?;
        let summary = IncidentSummary::from_records(&records, &self.weights);
        log::debug!(
            "{point}: {} incidents, risk {}",
            summary.total_count,
            summary.risk_contribution
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use saferoute_incident_models::WeightScheme;
    use saferoute_provider::memory::InMemoryCrimeProvider;

    use super::*;
    use crate::test_support::coord;

    #[tokio::test]
    async fn summarizes_weighted_categories() {
        let point = coord(51.5, -0.1);
        let provider = InMemoryCrimeProvider::new()
            .with_category(point, "violent-crime", 5)
            .with_category(point, "burglary", 3);
        let aggregator =
            IncidentAggregator::new(Arc::new(provider), WeightScheme::Severity.weights());

        let summary = aggregator.summarize(point).await.unwrap();
        assert_eq!(summary.total_count, 8);
        assert!((summary.risk_contribution - 66.0).abs() < f64::EPSILON);
        assert_eq!(summary.top_categories[0].category, "violent-crime");
        assert_eq!(summary.top_categories[0].weighted_score, 45);
    }

    #[tokio::test]
    async fn unknown_categories_use_default_weight() {
        let point = coord(51.5, -0.1);
        let provider = InMemoryCrimeProvider::new().with_category(point, "something-new", 4);
        let aggregator =
            IncidentAggregator::new(Arc::new(provider), CategoryWeights::new(2));

        let summary = aggregator.summarize(point).await.unwrap();
        assert!((summary.risk_contribution - 8.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn provider_failure_is_unavailable() {
        let point = coord(51.5, -0.1);
        let provider = InMemoryCrimeProvider::new().with_failure(point, "timed out");
        let aggregator =
            IncidentAggregator::new(Arc::new(provider), WeightScheme::Severity.weights());

        let err = aggregator.summarize(point).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ProviderUnavailable { .. }));
        assert!(err.to_string().contains("timed out"));
    }
}
