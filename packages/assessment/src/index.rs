//! Location risk index.
//!
//! ```text
//! incident score = weight(category) × decay(age in months)
//! average        = Σ incident score / incident count
//! index          = average × density(incident count) × environment
//! ```
//!
//! The index is bucketed into five levels at 2.5, 5.0, 7.5 and 10.0.

use chrono::{Datelike as _, NaiveDate};
use saferoute_incident_models::{CategoryWeights, IncidentRecord};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Multiplier when it is night.
pub const NIGHT_MODIFIER: f64 = 1.2;

/// Multiplier when the weather is severe.
pub const SEVERE_WEATHER_MODIFIER: f64 = 1.15;

/// Multiplier when it is night and the weather is severe.
pub const NIGHT_AND_SEVERE_MODIFIER: f64 = 1.38;

/// A calendar month, as reported by crime data providers (`YYYY-MM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl YearMonth {
    /// Parses `YYYY-MM`. Returns `None` for anything else.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d")
            .ok()
            .map(Self::from)
    }

    /// Whole months from `earlier` to `self`, or 0 if `earlier` is later.
    #[must_use]
    pub fn months_since(self, earlier: Self) -> u32 {
        let months = (i64::from(self.year) * 12 + i64::from(self.month))
            - (i64::from(earlier.year) * 12 + i64::from(earlier.month));
        u32::try_from(months.max(0)).unwrap_or(u32::MAX)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Recency multiplier for an incident `age` months old.
#[must_use]
pub const fn time_decay(age: u32) -> f64 {
    match age {
        0..=1 => 1.0,
        2..=3 => 0.75,
        4..=6 => 0.5,
        _ => 0.25,
    }
}

/// Multiplier for the number of incidents around a point.
#[must_use]
pub const fn density_coefficient(total: u64) -> f64 {
    match total {
        0..=5 => 1.0,
        6..=15 => 1.2,
        16..=30 => 1.4,
        _ => 1.6,
    }
}

/// Multiplier for night time and severe weather.
#[must_use]
pub const fn environment_modifier(night: bool, severe_weather: bool) -> f64 {
    match (night, severe_weather) {
        (false, false) => 1.0,
        (true, false) => NIGHT_MODIFIER,
        (false, true) => SEVERE_WEATHER_MODIFIER,
        (true, true) => NIGHT_AND_SEVERE_MODIFIER,
    }
}

/// Five-step risk level.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    /// Index below 2.5.
    Low,
    /// 2.5 to 5.0.
    Lower,
    /// 5.0 to 7.5.
    Moderate,
    /// 7.5 to 10.0.
    Higher,
    /// 10.0 and above.
    High,
}

impl RiskLevel {
    #[must_use]
    pub fn from_index(index: f64) -> Self {
        if index < 2.5 {
            Self::Low
        } else if index < 5.0 {
            Self::Lower
        } else if index < 7.5 {
            Self::Moderate
        } else if index < 10.0 {
            Self::Higher
        } else {
            Self::High
        }
    }

    /// Level number, 1 (low) to 5 (high).
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Lower => 2,
            Self::Moderate => 3,
            Self::Higher => 4,
            Self::High => 5,
        }
    }
}

/// Conditions an assessment is made under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentContext {
    /// Local time is between 20:00 and 06:00.
    pub night: bool,
    /// Fog, heavy rain, snow, thunderstorm or visibility under 1 km.
    pub severe_weather: bool,
    /// Month incident ages are measured from. Defaults to the most recent
    /// month among the records, since crime data is published with a lag.
    pub reference_month: Option<YearMonth>,
}

/// Result of [`assess`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAssessment {
    pub total_incidents: u64,
    /// Mean decayed incident weight.
    pub average_score: f64,
    pub density_coefficient: f64,
    pub environment_modifier: f64,
    /// `average_score × density_coefficient × environment_modifier`.
    pub risk_index: f64,
    pub level: RiskLevel,
    /// [`RiskLevel::value`] of `level`.
    pub level_value: u8,
    pub context: AssessmentContext,
}

/// Computes the risk index of a location from its incidents.
///
/// Records without a month, or with an unreadable one, are treated as
/// current. Records without a category use the default weight.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn assess(
    records: &[IncidentRecord],
    weights: &CategoryWeights,
    context: AssessmentContext,
) -> LocationAssessment {
    let months: Vec<Option<YearMonth>> = records
        .iter()
        .map(|r| r.month.as_deref().and_then(YearMonth::parse))
        .collect();
    let reference = context
        .reference_month
        .or_else(|| months.iter().flatten().max().copied());

    let weighted: f64 = records
        .iter()
        .zip(&months)
        .map(|(record, month)| {
            let weight = record
                .category
                .as_deref()
                .map_or(weights.default_weight, |c| weights.weight(c));
            let decay = match (reference, month) {
                (Some(reference), Some(month)) => time_decay(reference.months_since(*month)),
                _ => 1.0,
            };
            f64::from(weight) * decay
        })
        .sum();

    let total_incidents = records.len() as u64;
    let average_score = if records.is_empty() {
        0.0
    } else {
        weighted / records.len() as f64
    };
    let density = density_coefficient(total_incidents);
    let environment = environment_modifier(context.night, context.severe_weather);
    let risk_index = average_score * density * environment;
    let level = RiskLevel::from_index(risk_index);

    LocationAssessment {
        total_incidents,
        average_score,
        density_coefficient: density,
        environment_modifier: environment,
        risk_index,
        level,
        level_value: level.value(),
        context: AssessmentContext {
            reference_month: reference,
            ..context
        },
    }
}
