//! Daylight and calendar context for a point at a given time.

use chrono::{
    DateTime, Datelike as _, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike as _,
    Weekday,
};
use saferoute_geo::Coordinate;
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::period::TimeOfDay;

/// Sunrise assumed when the solar calculation has no answer.
pub const FALLBACK_SUNRISE_HOUR: u32 = 7;

/// Sunset assumed when the solar calculation has no answer.
pub const FALLBACK_SUNSET_HOUR: u32 = 17;

/// Lighting and calendar details of a local time at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeContext {
    pub local_time: DateTime<FixedOffset>,
    pub day_of_week: Weekday,
    pub is_weekend: bool,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
    pub is_daylight: bool,
    /// Rounded to one decimal place; 0 before sunset.
    pub hours_after_sunset: f64,
    pub time_of_day: TimeOfDay,
    /// `true` when sunrise and sunset are the fixed 07:00/17:00 fallback.
    pub sun_times_estimated: bool,
}

impl TimeContext {
    /// Context of `at` (a local time with its UTC offset) at `point`.
    ///
    /// Sunrise and sunset are computed for the local calendar date. When
    /// the sun does not rise or set that day the fixed fallback times are
    /// used instead.
    #[must_use]
    pub fn at(point: Coordinate, at: DateTime<FixedOffset>) -> Self {
        let local = at.naive_local();
        let sun = sun_times(point, local.date(), *at.offset());
        if sun.is_none() {
            log::debug!(
                "No sunrise/sunset at {point} on {}, using fallback",
                local.date()
            );
        }
        Self::from_sun_times(at, sun)
    }

    fn from_sun_times(
        at: DateTime<FixedOffset>,
        sun: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Self {
        let local = at.naive_local();

        let (sunrise, sunset, is_daylight, hours_after_sunset) = match sun {
            Some((sunrise, sunset)) => {
                let after = if local > sunset {
                    #[allow(clippy::cast_precision_loss)]
                    let hours = (local - sunset).num_seconds() as f64 / 3600.0;
                    (hours * 10.0).round() / 10.0
                } else {
                    0.0
                };
                (
                    sunrise.time(),
                    sunset.time(),
                    sunrise < local && local < sunset,
                    after,
                )
            }
            None => {
                let hour = local.hour();
                let daylight = FALLBACK_SUNRISE_HOUR..FALLBACK_SUNSET_HOUR;
                (
                    fallback_time(FALLBACK_SUNRISE_HOUR),
                    fallback_time(FALLBACK_SUNSET_HOUR),
                    daylight.contains(&hour),
                    f64::from(hour.saturating_sub(FALLBACK_SUNSET_HOUR)),
                )
            }
        };

        let day_of_week = local.weekday();
        Self {
            local_time: at,
            day_of_week,
            is_weekend: matches!(day_of_week, Weekday::Sat | Weekday::Sun),
            sunrise,
            sunset,
            is_daylight,
            hours_after_sunset,
            time_of_day: TimeOfDay::at(local),
            sun_times_estimated: sun.is_none(),
        }
    }
}

fn fallback_time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Local sunrise and sunset on `date`, or `None` during polar day or night.
fn sun_times(
    point: Coordinate,
    date: NaiveDate,
    offset: FixedOffset,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let coordinates = Coordinates::new(point.latitude(), point.longitude())?;
    let day = SolarDay::new(coordinates, date);
    let sunrise = day
        .event_time(SolarEvent::Sunrise)
        .with_timezone(&offset)
        .naive_local();
    let sunset = day
        .event_time(SolarEvent::Sunset)
        .with_timezone(&offset)
        .naive_local();

    if sunrise < sunset && sunrise.date() == date {
        Some((sunrise, sunset))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn london() -> Coordinate {
        Coordinate::new(51.5074, -0.1278).unwrap()
    }

    fn local(offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    #[test]
    fn summer_evening_is_still_light() {
        let context = TimeContext::at(london(), local(1, 2024, 6, 21, 20, 30));

        assert!(!context.sun_times_estimated);
        assert!(context.is_daylight);
        assert!(context.hours_after_sunset.abs() < f64::EPSILON);
        assert!(context.sunset > NaiveTime::from_hms_opt(21, 0, 0).unwrap());
        assert!(context.sunrise < NaiveTime::from_hms_opt(5, 0, 0).unwrap());
        assert_eq!(context.day_of_week, Weekday::Fri);
        assert!(!context.is_weekend);
        assert_eq!(context.time_of_day, TimeOfDay::Evening);
    }

    #[test]
    fn winter_half_past_five_is_dark() {
        let context = TimeContext::at(london(), local(0, 2024, 12, 15, 17, 30));

        assert!(!context.sun_times_estimated);
        assert!(!context.is_daylight);
        assert!(context.sunset < NaiveTime::from_hms_opt(16, 15, 0).unwrap());
        assert!(
            context.hours_after_sunset > 1.2 && context.hours_after_sunset < 2.0
        );
        assert_eq!(context.day_of_week, Weekday::Sun);
        assert!(context.is_weekend);
    }

    #[test]
    fn midnight_sun_uses_fallback_times() {
        let tromso = Coordinate::new(69.65, 18.96).unwrap();
        let context = TimeContext::at(tromso, local(2, 2024, 6, 21, 18, 40));

        assert!(context.sun_times_estimated);
        assert_eq!(context.sunrise, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(context.sunset, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert!(!context.is_daylight);
        assert!((context.hours_after_sunset - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_daylight_window() {
        let morning = TimeContext::from_sun_times(local(0, 2024, 3, 9, 7, 0), None);
        assert!(morning.is_daylight);
        assert!(morning.hours_after_sunset.abs() < f64::EPSILON);
        assert!(morning.is_weekend);

        let late = TimeContext::from_sun_times(local(0, 2024, 3, 9, 23, 59), None);
        assert!(!late.is_daylight);
        assert!((late.hours_after_sunset - 6.0).abs() < f64::EPSILON);
        assert_eq!(late.time_of_day, TimeOfDay::Night);
    }
}
