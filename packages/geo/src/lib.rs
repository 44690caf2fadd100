#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic primitives shared by every saferoute crate.
//!
//! Provides the validated [`Coordinate`] value type, haversine
//! [`distance`] in miles, the arithmetic [`midpoint`] used by the
//! direct-route fallback, and decoding of encoded polylines returned by
//! routing providers (see [`polyline`]).

pub mod polyline;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in miles used by [`distance`].
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Metres per statute mile.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Errors from coordinate construction and polyline decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude or longitude outside the valid WGS84 range.
    #[error("Invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// The rejected latitude.
        latitude: f64,
        /// The rejected longitude.
        longitude: f64,
    },

    /// Text could not be parsed as `"lat,lon"`.
    #[error("Cannot parse coordinate '{input}': expected \"lat,lon\"")]
    Parse {
        /// The rejected input.
        input: String,
    },

    /// Encoded polyline was truncated or contained invalid characters.
    #[error("Invalid polyline at byte {position}: {message}")]
    InvalidPolyline {
        /// Byte offset where decoding failed.
        position: usize,
        /// Description of the failure.
        message: String,
    },
}

/// A WGS84 point. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Creates a coordinate, validating both components.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] if latitude is outside
    /// `[-90, 90]`, longitude is outside `[-180, 180]`, or either is not
    /// finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
        {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || GeoError::Parse {
            input: s.to_string(),
        };
        let (lat, lon) = s.split_once(',').ok_or_else(parse_err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| parse_err())?;
        let lon: f64 = lon.trim().parse().map_err(|_| parse_err())?;
        Self::new(lat, lon)
    }
}

/// Great-circle distance between two coordinates in miles (haversine).
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Arithmetic mean of two coordinates.
///
/// Not the geodesic midpoint; adequate for the short spans a direct-route
/// estimate covers.
#[must_use]
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate {
        latitude: f64::midpoint(a.latitude, b.latitude),
        longitude: f64::midpoint(a.longitude, b.longitude),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn distance_london_paris() {
        let london = coord(51.5074, -0.1278);
        let paris = coord(48.8566, 2.3522);
        let miles = distance(london, paris);
        assert!((210.0..217.0).contains(&miles), "got {miles}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(51.50, -0.10);
        let b = coord(51.52, -0.14);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-12);
        assert!(distance(a, a).abs() < 1e-12);
    }

    #[test]
    fn midpoint_is_mean() {
        let m = midpoint(coord(10.0, 20.0), coord(20.0, 40.0));
        assert!((m.latitude() - 15.0).abs() < 1e-12);
        assert!((m.longitude() - 30.0).abs() < 1e-12);
    }

    #[test]
    fn parses_lat_lon_text() {
        let c: Coordinate = " 51.5 , -0.12 ".parse().unwrap();
        assert!((c.latitude() - 51.5).abs() < 1e-12);
        assert!((c.longitude() + 0.12).abs() < 1e-12);
        assert!("51.5".parse::<Coordinate>().is_err());
        assert!("abc,1".parse::<Coordinate>().is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude":1.0,"longitude":2.0}"#).unwrap();
        assert!((ok.longitude() - 2.0).abs() < 1e-12);
        assert!(
            serde_json::from_str::<Coordinate>(r#"{"latitude":91.0,"longitude":2.0}"#).is_err()
        );
    }
}
