//! Time-of-day periods.

use chrono::{NaiveDateTime, Timelike as _};
use saferoute_incident_models::IncidentRecord;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// First hour of the night window used by the risk index.
pub const NIGHT_START_HOUR: u32 = 20;

/// First hour after the night window.
pub const NIGHT_END_HOUR: u32 = 6;

/// Categories that concentrate in the evening and at night.
const NIGHT_CATEGORIES: &[&str] = &["burglary", "vehicle-crime", "robbery"];

/// Categories that concentrate during the day.
const DAY_CATEGORIES: &[&str] = &["shoplifting", "theft-from-the-person", "anti-social-behaviour"];

/// Whether `hour` (0–23) falls in the 20:00–06:00 night window.
#[must_use]
pub const fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Part of the day.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum TimeOfDay {
    /// 06:00–12:00.
    Morning,
    /// 12:00–17:00.
    Afternoon,
    /// 17:00–21:00.
    Evening,
    /// 21:00–06:00.
    Night,
}

impl TimeOfDay {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Morning, Self::Afternoon, Self::Evening, Self::Night]
    }

    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    #[must_use]
    pub fn at(time: NaiveDateTime) -> Self {
        Self::from_hour(time.hour())
    }

    /// Typical share of a month's incidents that happen in this period.
    #[must_use]
    pub const fn incident_share(self) -> f64 {
        match self {
            Self::Morning => 0.15,
            Self::Afternoon | Self::Night => 0.25,
            Self::Evening => 0.35,
        }
    }

    /// Categories that are more common in this period.
    #[must_use]
    pub const fn typical_categories(self) -> &'static [&'static str] {
        match self {
            Self::Evening | Self::Night => NIGHT_CATEGORIES,
            Self::Morning | Self::Afternoon => DAY_CATEGORIES,
        }
    }
}

/// Expected incidents around a point during one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEstimate {
    pub period: TimeOfDay,
    /// `total_incidents × incident_share`, rounded down.
    pub estimated_count: u64,
    pub total_incidents: u64,
    /// Typical categories of the period that occur in the records, in
    /// order of first appearance.
    pub relevant_categories: Vec<String>,
}

/// Estimates how many of `records` fall in `period`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn estimate_period(records: &[IncidentRecord], period: TimeOfDay) -> PeriodEstimate {
    let typical = period.typical_categories();
    let mut relevant_categories: Vec<String> = Vec::new();
    for category in records.iter().filter_map(|r| r.category.as_deref()) {
        if typical.contains(&category) && !relevant_categories.iter().any(|c| c == category) {
            relevant_categories.push(category.to_string());
        }
    }

    let total_incidents = records.len() as u64;
    PeriodEstimate {
        period,
        estimated_count: (total_incidents as f64 * period.incident_share()) as u64,
        total_incidents,
        relevant_categories,
    }
}
