//! The thin map surface: OSM raster tiles positioned from Web Mercator
//! math, with an SVG overlay for the GPS marker, accuracy circle, endpoint
//! markers, and route line. Pan/zoom/click handling lives here; everything
//! that can be computed without the DOM is a pure function below.

use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::logger::tracing::info;
use dioxus::prelude::*;

use wayfinder_shared::coords::Coordinate;
use wayfinder_shared::mercator::{self, MAX_ZOOM, MIN_ZOOM, TILE_SIZE};

use crate::geolocation::GpsMarker;
use crate::state::SharedState;

pub const MAP_CONTAINER_ID: &str = "wayfinder-map";

/// Drag threshold in pixels — movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Touch drag threshold — larger than mouse because touch is less precise.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

/// Fallback dimensions used before the container has been measured.
pub const REFERENCE_WIDTH: f64 = 960.0;
pub const REFERENCE_HEIGHT: f64 = 600.0;

/// Zoom floor applied when recentering on a position.
pub const RECENTER_ZOOM: u8 = 16;

const DEFAULT_CENTER: Coordinate = Coordinate {
    lon: -46.633_309,
    lat: -23.550_52,
};
const DEFAULT_ZOOM: u8 = 10;

const TILE_URL_BASE: &str = "https://tile.openstreetmap.org";

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The visible map window: a center coordinate and an integer zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
    /// Whether the next offset change should use the eased CSS transition.
    pub eased: bool,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            eased: false,
        }
    }

    /// Center on a position, never zooming out below street level.
    pub fn recenter(&mut self, center: Coordinate) {
        self.center = center;
        self.zoom = self.zoom.max(RECENTER_ZOOM);
        self.eased = true;
    }

    /// Jump to a fitted center/zoom pair (route display).
    pub fn fit(&mut self, center: Coordinate, zoom: u8) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.eased = true;
    }

    /// Place the center at an absolute world-pixel position (drag-to-pan).
    pub fn move_to_world_px(&mut self, x: f64, y: f64) {
        self.center = mercator::unproject(x, y, self.zoom);
        self.eased = false;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
        self.eased = true;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
        self.eased = true;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Pure tile / projection helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub z: u8,
    pub x: i64,
    pub y: i64,
    pub left: f64,
    pub top: f64,
}

/// Tiles covering a `width` x `height` viewport, with their screen offsets.
/// Columns wrap around the antimeridian; rows outside the world are
/// skipped.
pub fn visible_tiles(viewport: &Viewport, width: f64, height: f64) -> Vec<TilePlacement> {
    let (origin_x, origin_y) = mercator::viewport_origin(viewport.center, viewport.zoom, width, height);
    let tiles_per_axis = 1i64 << viewport.zoom;
    let x0 = (origin_x / TILE_SIZE).floor() as i64;
    let y0 = (origin_y / TILE_SIZE).floor() as i64;
    let x1 = ((origin_x + width) / TILE_SIZE).floor() as i64;
    let y1 = ((origin_y + height) / TILE_SIZE).floor() as i64;
    let mut tiles = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)).max(0) as usize);
    for ty in y0..=y1 {
        if ty < 0 || ty >= tiles_per_axis {
            continue;
        }
        for tx in x0..=x1 {
            tiles.push(TilePlacement {
                z: viewport.zoom,
                x: tx.rem_euclid(tiles_per_axis),
                y: ty,
                left: tx as f64 * TILE_SIZE - origin_x,
                top: ty as f64 * TILE_SIZE - origin_y,
            });
        }
    }
    tiles
}

pub fn tile_url(tile: &TilePlacement) -> String {
    format!("{}/{}/{}/{}.png", TILE_URL_BASE, tile.z, tile.x, tile.y)
}

/// Screen position of a coordinate within the viewport.
pub fn to_screen(coordinate: Coordinate, viewport: &Viewport, width: f64, height: f64) -> (f64, f64) {
    let (origin_x, origin_y) = mercator::viewport_origin(viewport.center, viewport.zoom, width, height);
    let (x, y) = mercator::project(coordinate, viewport.zoom);
    (x - origin_x, y - origin_y)
}

/// Inverse of [`to_screen`] for click handling.
pub fn screen_to_coordinate(x: f64, y: f64, viewport: &Viewport, width: f64, height: f64) -> Coordinate {
    let (origin_x, origin_y) = mercator::viewport_origin(viewport.center, viewport.zoom, width, height);
    mercator::unproject(origin_x + x, origin_y + y, viewport.zoom)
}

// ---------------------------------------------------------------------------
// SVG overlay builders
// ---------------------------------------------------------------------------

fn build_route_path(svg: &mut String, line: &[Coordinate], viewport: &Viewport, width: f64, height: f64) {
    if line.len() < 2 {
        return;
    }
    let mut points = String::with_capacity(line.len() * 16);
    for coordinate in line {
        let (x, y) = to_screen(*coordinate, viewport, width, height);
        points.push_str(&format!("{x:.1},{y:.1} "));
    }
    svg.push_str(&format!(
        r##"<polyline points="{}" fill="none" stroke="#1a73e8" stroke-width="5" stroke-opacity="0.85" stroke-linecap="round" stroke-linejoin="round"/>"##,
        points.trim_end()
    ));
}

fn build_endpoint_markers(
    svg: &mut String,
    origin: Coordinate,
    destination: Coordinate,
    viewport: &Viewport,
    width: f64,
    height: f64,
) {
    for (coordinate, label, color) in [(origin, "A", "#2e9e4f"), (destination, "B", "#c43030")] {
        let (x, y) = to_screen(coordinate, viewport, width, height);
        svg.push_str(&format!(
            r##"<g role="img"><title>{label}</title><circle cx="{x:.1}" cy="{y:.1}" r="11" fill="{color}" stroke="white" stroke-width="3"/><text x="{x:.1}" y="{:.1}" fill="white" font-size="13" font-family="sans-serif" font-weight="700" text-anchor="middle">{label}</text></g>"##,
            y + 4.5
        ));
    }
}

fn build_gps_marker(svg: &mut String, marker: GpsMarker, viewport: &Viewport, width: f64, height: f64) {
    let (x, y) = to_screen(marker.coordinate, viewport, width, height);
    let meters_per_px = mercator::meters_per_pixel(marker.coordinate.lat, viewport.zoom);
    let radius = if meters_per_px > 0.0 {
        marker.accuracy_m / meters_per_px
    } else {
        0.0
    };
    svg.push_str(&format!(
        r#"<circle cx="{x:.1}" cy="{y:.1}" r="{radius:.1}" fill="rgba(74,143,212,0.15)" stroke="rgba(74,143,212,0.5)" stroke-width="1.5"/>"#
    ));
    svg.push_str(&format!(
        r##"<circle cx="{x:.1}" cy="{y:.1}" r="7" fill="#4a8fd4" stroke="white" stroke-width="2.5"/>"##
    ));
}

/// Full overlay content as one SVG string, in draw order: route under
/// markers, GPS marker on top.
pub fn build_overlay_svg(
    route: Option<&[Coordinate]>,
    endpoints: Option<(Coordinate, Coordinate)>,
    gps: Option<GpsMarker>,
    viewport: &Viewport,
    width: f64,
    height: f64,
) -> String {
    let mut svg = String::with_capacity(4096);
    if let Some(line) = route {
        build_route_path(&mut svg, line, viewport, width, height);
    }
    if let Some((origin, destination)) = endpoints {
        build_endpoint_markers(&mut svg, origin, destination, viewport, width, height);
    }
    if let Some(marker) = gps {
        build_gps_marker(&mut svg, marker, viewport, width, height);
    }
    svg
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

pub fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

pub fn container_size() -> Option<(f64, f64)> {
    let rect = container_rect()?;
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    Some((rect.width(), rect.height()))
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like
/// value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
#[allow(clippy::too_many_arguments)]
pub fn MapView(
    viewport: Signal<Viewport>,
    state: Signal<SharedState>,
    route_line: ReadSignal<Option<Vec<Coordinate>>>,
    endpoint_markers: ReadSignal<Option<(Coordinate, Coordinate)>>,
    gps_marker: ReadSignal<Option<GpsMarker>>,
    interactions_enabled: ReadSignal<bool>,
    on_manual_drag: EventHandler<()>,
    on_map_click: EventHandler<Coordinate>,
) -> Element {
    // Drag state (mouse and single-finger touch share it).
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start = use_signal(|| (0.0_f64, 0.0_f64));
    let mut drag_start_center_px = use_signal(|| (0.0_f64, 0.0_f64));

    let mut begin_drag = move |x: f64, y: f64| {
        let vp = *viewport.peek();
        is_dragging.set(true);
        did_drag.set(false);
        drag_start.set((x, y));
        drag_start_center_px.set(mercator::project(vp.center, vp.zoom));
    };

    let mut continue_drag = move |x: f64, y: f64, threshold: f64| {
        if !*is_dragging.peek() {
            return;
        }
        let (sx, sy) = *drag_start.peek();
        let dx = x - sx;
        let dy = y - sy;
        if !*did_drag.peek() && (dx.abs() > threshold || dy.abs() > threshold) {
            did_drag.set(true);
            on_manual_drag.call(());
        }
        if *did_drag.peek() {
            let (cx, cy) = *drag_start_center_px.peek();
            viewport.write().move_to_world_px(cx - dx, cy - dy);
        }
    };

    let mut finish_drag = move |x: f64, y: f64| {
        let was_dragging = *is_dragging.peek();
        let was_drag = *did_drag.peek();
        is_dragging.set(false);
        // A release without drag movement is a click: route to that point.
        if was_dragging && !was_drag {
            if let Some(rect) = container_rect() {
                let vp = *viewport.peek();
                let coordinate = screen_to_coordinate(
                    x - rect.left(),
                    y - rect.top(),
                    &vp,
                    rect.width(),
                    rect.height(),
                );
                on_map_click.call(coordinate);
            }
        }
    };

    let (width, height) = container_size().unwrap_or((REFERENCE_WIDTH, REFERENCE_HEIGHT));
    let vp = *viewport.read();
    let tiles = visible_tiles(&vp, width, height);

    let overlay = {
        let route = route_line.read();
        let endpoints = *endpoint_markers.read();
        let gps = *gps_marker.read();
        let content = build_overlay_svg(route.as_deref(), endpoints, gps, &vp, width, height);
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%" style="position:absolute;inset:0;pointer-events:none;z-index:5;">{content}</svg>"#
        )
    };

    let dragging = *is_dragging.read();
    let enabled = *interactions_enabled.read();
    let container_class = if dragging {
        "map-container dragging"
    } else if !enabled {
        "map-container interactions-off"
    } else {
        "map-container"
    };
    let layer_class = if vp.eased { "tile-layer eased" } else { "tile-layer" };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onmounted: move |_| {
                if !state.peek().is_map_ready() {
                    state.write().mark_map_ready();
                    info!("map surface ready");
                }
            },

            onmousedown: move |evt: Event<MouseData>| {
                if !*interactions_enabled.peek() {
                    return;
                }
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                begin_drag(client.x, client.y);
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                continue_drag(client.x, client.y, DRAG_THRESHOLD);
            },

            onmouseup: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                finish_drag(client.x, client.y);
            },

            onmouseleave: move |_| {
                is_dragging.set(false);
            },

            onwheel: move |evt: Event<WheelData>| {
                if !*interactions_enabled.peek() {
                    return;
                }
                evt.prevent_default();
                if wheel_delta_y(evt.data().delta()) < 0.0 {
                    viewport.write().zoom_in();
                } else {
                    viewport.write().zoom_out();
                }
            },

            ontouchstart: move |evt: Event<TouchData>| {
                if !*interactions_enabled.peek() {
                    return;
                }
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let point = touches[0].client_coordinates();
                    begin_drag(point.x, point.y);
                } else {
                    // A second finger cancels the gesture.
                    is_dragging.set(false);
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let point = touches[0].client_coordinates();
                    continue_drag(point.x, point.y, TOUCH_DRAG_THRESHOLD);
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                if evt.data().touches().is_empty() {
                    let (x, y) = *drag_start.peek();
                    finish_drag(x, y);
                }
            },

            ontouchcancel: move |_| {
                is_dragging.set(false);
                did_drag.set(false);
            },

            div { class: "{layer_class}",
                for tile in tiles {
                    img {
                        key: "{tile.z}/{tile.x}/{tile.y}",
                        class: "map-tile",
                        style: "left:{tile.left}px; top:{tile.top}px;",
                        src: tile_url(&tile),
                        draggable: "false",
                    }
                }
            }

            div {
                dangerous_inner_html: "{overlay}",
                style: "position:absolute;inset:0;pointer-events:none;",
            }

            div { class: "zoom-buttons",
                button {
                    class: "zoom-in-btn",
                    title: "Zoom in",
                    onclick: move |_| viewport.write().zoom_in(),
                    "+"
                }
                button {
                    class: "zoom-out-btn",
                    title: "Zoom out",
                    onclick: move |_| viewport.write().zoom_out(),
                    "\u{2212}"
                }
            }
        }
    }
}
