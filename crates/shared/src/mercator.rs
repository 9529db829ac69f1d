//! Web Mercator (EPSG:3857) math in tile-pixel space.
//!
//! World coordinates are pixels at a given integer zoom level, with the
//! origin at the top-left of the projection (lon -180, lat ~85.05).

use crate::coords::Coordinate;

pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 19;

const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// World size in pixels at `zoom`.
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * (1u64 << zoom.min(MAX_ZOOM)) as f64
}

/// Project lon/lat to world-pixel coordinates at `zoom`.
pub fn project(coordinate: Coordinate, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = coordinate.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = (coordinate.lon + 180.0) / 360.0 * size;
    let sin = lat.to_radians().sin();
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)) * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: u8) -> Coordinate {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    Coordinate { lon, lat }
}

/// Ground resolution in meters per pixel at a latitude and zoom.
pub fn meters_per_pixel(lat: f64, zoom: u8) -> f64 {
    EARTH_CIRCUMFERENCE_M * lat.to_radians().cos() / world_size(zoom)
}

/// Top-left world-pixel corner of a viewport centered at `center`.
pub fn viewport_origin(center: Coordinate, zoom: u8, width: f64, height: f64) -> (f64, f64) {
    let (cx, cy) = project(center, zoom);
    (cx - width / 2.0, cy - height / 2.0)
}

/// Geographic bounding box of a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Extent {
    pub fn from_coordinates(coordinates: &[Coordinate]) -> Option<Self> {
        let first = coordinates.first()?;
        let mut extent = Extent {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for c in &coordinates[1..] {
            extent.min_lon = extent.min_lon.min(c.lon);
            extent.min_lat = extent.min_lat.min(c.lat);
            extent.max_lon = extent.max_lon.max(c.lon);
            extent.max_lat = extent.max_lat.max(c.lat);
        }
        Some(extent)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }
}

/// Largest integer zoom at which `extent` fits a `width` x `height` viewport
/// with `padding` pixels on every side.
pub fn fit_zoom(extent: &Extent, width: f64, height: f64, padding: f64) -> u8 {
    let usable_w = (width - 2.0 * padding).max(1.0);
    let usable_h = (height - 2.0 * padding).max(1.0);
    let mut best = MIN_ZOOM;
    for zoom in MIN_ZOOM..=MAX_ZOOM {
        let (x0, y0) = project(Coordinate::new(extent.min_lon, extent.max_lat), zoom);
        let (x1, y1) = project(Coordinate::new(extent.max_lon, extent.min_lat), zoom);
        if (x1 - x0) <= usable_w && (y1 - y0) <= usable_h {
            best = zoom;
        } else {
            break;
        }
    }
    best
}
