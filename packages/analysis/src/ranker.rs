//! Relative safety ranking of analyzed routes.
//!
//! Scores are relative to the compared set: the route with the most
//! incidents scores 0, an incident-free route scores 100, and everything
//! else falls linearly in between. When no route has any incidents all of
//! them score 100.

use std::fmt::Write as _;
use std::sync::Arc;

use futures::stream::{self, StreamExt as _};
use saferoute_analysis_models::{
    ComparisonReport, FailedRoute, RiskTier, RouteAnalysis, RouteComparison, RouteHandle,
};

use crate::analyzer::RouteSafetyAnalyzer;
use crate::{AnalysisError, DEFAULT_CONCURRENCY};

/// Safety score of a route with `total` incidents when the worst route in
/// the set has `max_total`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn safety_score(total: u64, max_total: u64) -> u8 {
    if max_total == 0 {
        return 100;
    }
    let ratio = total.min(max_total) as f64 / max_total as f64;
    (100.0 * (1.0 - ratio)).round() as u8
}

/// Scores and orders analyses best-first.
///
/// Equal scores keep handle issue order, which is the provider's route
/// order.
#[must_use]
pub fn rank(analyses: &[RouteAnalysis]) -> Vec<RouteComparison> {
    let max_total = analyses
        .iter()
        .map(|a| a.total_incidents)
        .max()
        .unwrap_or(0);

    let mut rankings: Vec<RouteComparison> = analyses
        .iter()
        .map(|analysis| {
            let safety_score = safety_score(analysis.total_incidents, max_total);
            RouteComparison {
                handle: analysis.handle,
                rank: 0,
                safety_score,
                risk_tier: RiskTier::from_score(safety_score),
                total_incidents: analysis.total_incidents,
                average_per_segment: analysis.average_per_segment,
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.safety_score
            .cmp(&a.safety_score)
            .then_with(|| a.handle.cmp(&b.handle))
    });
    for (idx, comparison) in rankings.iter_mut().enumerate() {
        comparison.rank = idx + 1;
    }
    rankings
}

/// Explains why the first ranked route is recommended.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn justification(rankings: &[RouteComparison], analyses: &[RouteAnalysis]) -> String {
    let Some(best) = rankings.first() else {
        return String::new();
    };

    let mut text = format!(
        "{} is recommended with {} incident{} along the route ({} risk).",
        best.handle,
        best.total_incidents,
        if best.total_incidents == 1 { "" } else { "s" },
        best.risk_tier
    );

    if rankings.len() < 2 {
        return text;
    }

    let Some(worst) = rankings
        .iter()
        .max_by(|a, b| {
            a.total_incidents
                .cmp(&b.total_incidents)
                .then_with(|| b.handle.cmp(&a.handle))
        })
    else {
        return text;
    };

    if worst.total_incidents == 0 {
        text.push_str(" None of the compared routes had any recorded incidents.");
    } else {
        let reduction = (worst.total_incidents - best.total_incidents.min(worst.total_incidents))
            as f64
            / worst.total_incidents as f64
            * 100.0;
        let _ = write!(
            text,
            " That is {reduction:.0}% fewer incidents than {} ({} incidents).",
            worst.handle, worst.total_incidents
        );
    }

    let busiest = analyses
        .iter()
        .find(|a| a.handle == best.handle)
        .and_then(|a| a.worst_segment.as_ref())
        .filter(|s| s.summary.total_count > 0);
    if let Some(segment) = busiest {
        let _ = write!(
            text,
            " Its busiest point (segment {}) has {} incidents.",
            segment.segment_index, segment.summary.total_count
        );
    }

    text
}

/// Analyzes and ranks a set of cached routes.
pub struct RouteRanker {
    analyzer: Arc<RouteSafetyAnalyzer>,
    concurrency: usize,
}

impl RouteRanker {
    #[must_use]
    pub fn new(analyzer: Arc<RouteSafetyAnalyzer>) -> Self {
        Self {
            analyzer,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets how many routes are analyzed at once (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Analyzes every handle and ranks the ones that succeeded.
    ///
    /// Routes whose analysis fails are listed in
    /// [`ComparisonReport::failed`] and left out of the ranking.
    ///
    /// # Errors
    ///
    /// * If no route could be analyzed, including when `handles` is empty
    pub async fn compare(
        &self,
        handles: &[RouteHandle],
    ) -> Result<ComparisonReport, AnalysisError> {
        let results: Vec<(RouteHandle, Result<RouteAnalysis, AnalysisError>)> =
            stream::iter(handles.iter().map(|&handle| async move {
                (handle, self.analyzer.analyze(handle).await)
            }))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut analyses = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (handle, result) in results {
            match result {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => {
                    log::warn!("Excluding {handle} from comparison: {e}");
                    failed.push(FailedRoute {
                        handle,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let rankings = rank(&analyses);
        let Some(best) = rankings.first() else {
            return Err(AnalysisError::NoValidRoutes { failed });
        };

        let recommended = best.handle;
        let justification = justification(&rankings, &analyses);
        log::info!("Recommended {recommended} out of {} routes", rankings.len());

        Ok(ComparisonReport {
            recommended,
            rankings,
            failed,
            justification,
        })
    }
}
