//! Encoded polyline decoding.
//!
//! Routing providers (OpenRouteService, Google, OSRM) return route
//! geometry in the encoded polyline format: each coordinate is a pair of
//! zig-zag encoded deltas, latitude first, packed into 5-bit chunks
//! offset by 63 so every byte is printable ASCII.
//!
//! See <https://developers.google.com/maps/documentation/utilities/polylinealgorithm>

use crate::{Coordinate, GeoError};

/// Precision used by OpenRouteService and Google (1e-5 degrees).
pub const DEFAULT_PRECISION: u32 = 5;

/// Decodes an encoded polyline into coordinates.
///
/// # Errors
///
/// Returns [`GeoError::InvalidPolyline`] if the string ends in the middle
/// of a value, contains a byte outside the encoding alphabet, or holds a
/// value too large to represent. Returns [`GeoError::InvalidCoordinate`]
/// if a decoded point falls outside the valid coordinate range.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, GeoError> {
    let bytes = encoded.as_bytes();
    let factor = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));

    let mut coordinates = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat += next_value(bytes, &mut index)?;
        lon += next_value(bytes, &mut index)?;

        #[allow(clippy::cast_precision_loss)]
        coordinates.push(Coordinate::new(lat as f64 / factor, lon as f64 / factor)?);
    }

    Ok(coordinates)
}

/// Reads one zig-zag encoded delta starting at `*index`.
fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, GeoError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(GeoError::InvalidPolyline {
                position: *index,
                message: "unexpected end of input".to_string(),
            });
        };
        if !(63..=126).contains(&byte) {
            return Err(GeoError::InvalidPolyline {
                position: *index,
                message: format!("byte {byte:#04x} outside encoding alphabet"),
            });
        }
        if shift > 55 {
            return Err(GeoError::InvalidPolyline {
                position: *index,
                message: "value overflows 64 bits".to_string(),
            });
        }

        let chunk = i64::from(byte - 63);
        *index += 1;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(c: Coordinate, lat: f64, lon: f64) {
        assert!(
            (c.latitude() - lat).abs() < 1e-9,
            "lat {} != {lat}",
            c.latitude()
        );
        assert!(
            (c.longitude() - lon).abs() < 1e-9,
            "lon {} != {lon}",
            c.longitude()
        );
    }

    #[test]
    fn decodes_reference_polyline() {
        let coords = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@", DEFAULT_PRECISION).unwrap();
        assert_eq!(coords.len(), 3);
        assert_close(coords[0], 38.5, -120.2);
        assert_close(coords[1], 40.7, -120.95);
        assert_close(coords[2], 43.252, -126.453);
    }

    #[test]
    fn empty_string_is_empty_path() {
        assert!(decode("", DEFAULT_PRECISION).unwrap().is_empty());
    }

    #[test]
    fn truncated_input_is_rejected() {
        // Latitude present, longitude missing.
        let err = decode("_p~iF", DEFAULT_PRECISION).unwrap_err();
        assert!(matches!(err, GeoError::InvalidPolyline { .. }));
    }

    #[test]
    fn invalid_byte_is_rejected() {
        let err = decode("_p~iF ps|U", DEFAULT_PRECISION).unwrap_err();
        assert!(matches!(err, GeoError::InvalidPolyline { position: 5, .. }));
    }
}
