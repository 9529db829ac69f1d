//! Encoded-polyline decoding (precision factor 1e5), the geometry format
//! used by the routing backend's non-GeoJSON responses.

use crate::coords::Coordinate;

const PRECISION: f64 = 1e5;

/// Decode an encoded polyline into coordinates.
///
/// Returns `None` when the string is malformed (truncated chunk or a byte
/// outside the encoding alphabet).
pub fn decode(encoded: &str) -> Option<Vec<Coordinate>> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::new();
    let mut index = 0usize;
    let mut lat = 0i64;
    let mut lon = 0i64;
    while index < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, index)?;
        let (delta_lon, after) = decode_value(bytes, next)?;
        lat += delta_lat;
        lon += delta_lon;
        index = after;
        coordinates.push(Coordinate {
            lon: lon as f64 / PRECISION,
            lat: lat as f64 / PRECISION,
        });
    }
    Some(coordinates)
}

fn decode_value(bytes: &[u8], mut index: usize) -> Option<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = i64::from(*bytes.get(index)?) - 63;
        if !(0..=63).contains(&byte) || shift > 60 {
            return None;
        }
        result |= (byte & 0x1f) << shift;
        shift += 5;
        index += 1;
        if byte < 0x20 {
            break;
        }
    }
    let value = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Some((value, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Canonical polyline reference vector.
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn test_decode_reference_vector() {
        let line = decode(REFERENCE).unwrap();
        assert_eq!(line.len(), 3);
        assert!((line[0].lat - 38.5).abs() < 1e-9);
        assert!((line[0].lon - (-120.2)).abs() < 1e-9);
        assert!((line[1].lat - 40.7).abs() < 1e-9);
        assert!((line[1].lon - (-120.95)).abs() < 1e-9);
        assert!((line[2].lat - 43.252).abs() < 1e-9);
        assert!((line[2].lon - (-126.453)).abs() < 1e-9);
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode("").unwrap().len(), 0);
    }

    #[test]
    fn test_decode_truncated_chunk() {
        // Drop the final byte so the last value never terminates.
        let truncated = &REFERENCE[..REFERENCE.len() - 1];
        assert!(decode(truncated).is_none());
    }

    #[test]
    fn test_decode_rejects_bytes_below_alphabet() {
        assert!(decode("_p~iF\u{1}").is_none());
    }

    #[test]
    fn test_decode_single_point() {
        // A one-point line decodes to exactly one coordinate.
        let line = decode("_p~iF~ps|U").unwrap();
        assert_eq!(line.len(), 1);
        assert!((line[0].lat - 38.5).abs() < 1e-9);
        assert!((line[0].lon - (-120.2)).abs() < 1e-9);
    }
}
