use serde::{Deserialize, Serialize};

/// A WGS84 position. Longitude first to match the wire format of the
/// routing backend (`[[lon, lat], ...]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Both components within WGS84 bounds.
    pub fn in_bounds(&self) -> bool {
        self.lon.abs() <= 180.0 && self.lat.abs() <= 90.0
    }
}

/// Interpret free text as a coordinate pair (`"a, b"`).
///
/// Ordering is decided by range: a first value within ±90 paired with a
/// second within ±180 reads as lat,lon; otherwise lon,lat. When both
/// orderings are plausible the first value is taken as latitude. Text that
/// fits neither ordering is not a coordinate.
pub fn parse_coordinate_text(text: &str) -> Option<Coordinate> {
    let mut parts = text.trim().split(',');
    let a: f64 = parts.next()?.trim().parse().ok()?;
    let b: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !a.is_finite() || !b.is_finite() {
        return None;
    }
    if a.abs() <= 90.0 && b.abs() <= 180.0 {
        return Some(Coordinate { lon: b, lat: a });
    }
    if b.abs() <= 90.0 && a.abs() <= 180.0 {
        return Some(Coordinate { lon: a, lat: b });
    }
    None
}

/// Format a distance in meters as kilometers, e.g. `5234.0` -> `"5.23 km"`.
pub fn format_distance_km(meters: f64) -> String {
    format!("{:.2} km", meters / 1000.0)
}

/// Format a duration in seconds as whole minutes, e.g. `930.0` -> `"16 min"`.
pub fn format_duration_min(seconds: f64) -> String {
    format!("{} min", (seconds / 60.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lat_lon_order() {
        let c = parse_coordinate_text("-23.55,-46.63").unwrap();
        assert!((c.lat - (-23.55)).abs() < 1e-9);
        assert!((c.lon - (-46.63)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_lon_lat_order_by_range() {
        // First value exceeds the latitude range, so it must be longitude.
        let c = parse_coordinate_text("120.5, 45.0").unwrap();
        assert!((c.lon - 120.5).abs() < 1e-9);
        assert!((c.lat - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ambiguous_prefers_latitude_first() {
        // Both orderings are in range; the first value wins as latitude.
        let c = parse_coordinate_text("10, 20").unwrap();
        assert!((c.lat - 10.0).abs() < 1e-9);
        assert!((c.lon - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_with_whitespace() {
        let c = parse_coordinate_text("  -23.4750 , -47.4415 ").unwrap();
        assert!((c.lat - (-23.4750)).abs() < 1e-9);
        assert!((c.lon - (-47.4415)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(parse_coordinate_text("200, 200").is_none());
        assert!(parse_coordinate_text("95, 181").is_none());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(parse_coordinate_text("Avenida Paulista, 1000").is_none());
        assert!(parse_coordinate_text("not a coordinate").is_none());
        assert!(parse_coordinate_text("").is_none());
    }

    #[test]
    fn test_parse_rejects_extra_components() {
        assert!(parse_coordinate_text("10, 20, 30").is_none());
    }

    #[test]
    fn test_parse_rejects_nan_inf() {
        assert!(parse_coordinate_text("NaN, 20").is_none());
        assert!(parse_coordinate_text("inf, 20").is_none());
    }

    #[test]
    fn test_format_distance_km() {
        assert_eq!(format_distance_km(5234.0), "5.23 km");
        assert_eq!(format_distance_km(850.0), "0.85 km");
    }

    #[test]
    fn test_format_duration_min() {
        assert_eq!(format_duration_min(930.0), "16 min");
        assert_eq!(format_duration_min(600.0), "10 min");
        assert_eq!(format_duration_min(29.0), "0 min");
    }

    #[test]
    fn test_in_bounds() {
        assert!(Coordinate::new(-46.63, -23.55).in_bounds());
        assert!(!Coordinate::new(181.0, 0.0).in_bounds());
        assert!(!Coordinate::new(0.0, 91.0).in_bounds());
    }
}
