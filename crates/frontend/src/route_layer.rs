//! Route rendering through the map-surface signals: exactly one route
//! overlay at a time, A/B endpoint markers, and viewport fitting.

use dioxus::logger::tracing::{debug, info, warn};
use dioxus::prelude::*;
use serde_json::Value;

use wayfinder_shared::coords::Coordinate;
use wayfinder_shared::mercator::{self, Extent};
use wayfinder_shared::route::{renderer_fallback_summary, RouteGeometry, SummaryExtract};

use crate::components::map_view::{self, Viewport, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::state::SharedState;

/// Padding around a fitted route, in screen pixels.
const FIT_PADDING_PX: f64 = 100.0;

/// Draws and clears route overlays. Marker positions derive from the
/// shared endpoint pair; the line is owned here.
#[derive(Clone, Copy)]
pub struct RouteLayer {
    state: Signal<SharedState>,
    route_line: Signal<Option<Vec<Coordinate>>>,
    endpoint_markers: Signal<Option<(Coordinate, Coordinate)>>,
    viewport: Signal<Viewport>,
}

impl RouteLayer {
    pub fn new(
        state: Signal<SharedState>,
        route_line: Signal<Option<Vec<Coordinate>>>,
        endpoint_markers: Signal<Option<(Coordinate, Coordinate)>>,
        viewport: Signal<Viewport>,
    ) -> Self {
        Self {
            state,
            route_line,
            endpoint_markers,
            viewport,
        }
    }

    /// Removes the route line, both endpoint markers, and the stored
    /// endpoint pair. Safe to call whether or not anything is drawn.
    pub fn clear_route(&mut self) {
        self.route_line.set(None);
        self.endpoint_markers.set(None);
        self.state.write().clear_route_endpoints();
        debug!("route and endpoint markers cleared");
    }

    /// Places the A/B markers for the stored endpoints. Without both
    /// endpoints this is a warning no-op.
    pub fn draw_route_markers(&mut self) -> bool {
        let endpoints = self.state.peek().route_endpoints();
        match endpoints {
            Some((origin, destination)) => {
                self.endpoint_markers.set(Some((origin, destination)));
                debug!("origin and destination markers drawn");
                true
            }
            None => {
                warn!("origin/destination coordinates missing; skipping marker draw");
                false
            }
        }
    }

    /// Draws the route geometry, replacing any previous overlay, and fits
    /// the viewport around it. Returns the summary data the drawing pass
    /// could pull from the payload, or `None` when the geometry is
    /// undecodable.
    pub fn draw_route(&mut self, geometry: &RouteGeometry, payload: &Value) -> Option<SummaryExtract> {
        let line = geometry.coordinates()?;
        let extent = Extent::from_coordinates(&line)?;
        self.route_line.set(Some(line));
        let (width, height) =
            map_view::container_size().unwrap_or((REFERENCE_WIDTH, REFERENCE_HEIGHT));
        let zoom = mercator::fit_zoom(&extent, width, height, FIT_PADDING_PX);
        self.viewport.write().fit(extent.center(), zoom);
        info!(zoom, "route drawn and viewport fitted");
        Some(renderer_fallback_summary(payload))
    }
}
