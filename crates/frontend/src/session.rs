//! The route session: resolves endpoints, persists them, waits for the map
//! surface, fetches the route, and turns the response into overlay state
//! and a panel-display event.
//!
//! Overlapping invocations are not serialized. Every session bumps a
//! monotonic generation counter, and every commit point after a suspension
//! re-checks it, so a slow response can neither draw over nor report over a
//! newer session.

use dioxus::logger::tracing::{debug, error, info, warn};
use dioxus::prelude::*;
use serde_json::Value;

use wayfinder_shared::coords::{self, Coordinate};
use wayfinder_shared::route::{self, RouteConstraints};
use wayfinder_shared::sheet::SheetState;

use crate::api::{self, GeocodeError, RouteFetchError};
use crate::bus::{wait_for_map_ready, Pulse, RouteDetailsRequest};
use crate::components::status_message::{StatusKind, StatusSink};
use crate::geolocation::GPS_RELIABLE_THRESHOLD_M;
use crate::route_layer::RouteLayer;
use crate::state::SharedState;

/// Origin text that routes from the device position instead of an address.
pub const GPS_SENTINEL: &str = "GPS";

pub fn is_gps_sentinel(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(GPS_SENTINEL)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndpointError {
    EmptyInput,
    GpsUnavailable,
    GpsImprecise { accuracy_m: f64 },
    AddressNotFound { address: String, detail: String },
    Network(String),
}

impl std::fmt::Display for EndpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointError::EmptyInput => write!(f, "Enter an address or coordinates."),
            EndpointError::GpsUnavailable => write!(
                f,
                "GPS position not available. Try again or enter an origin address."
            ),
            EndpointError::GpsImprecise { accuracy_m } => write!(
                f,
                "GPS position available but imprecise ({accuracy_m:.0} m). Wait for better readings or enter an address."
            ),
            EndpointError::AddressNotFound { address, detail } => {
                write!(f, "Geocoding failed for \"{address}\". Detail: {detail}")
            }
            EndpointError::Network(detail) => {
                write!(f, "Connection error while geocoding the address: {detail}")
            }
        }
    }
}

/// Distance/duration labels from the structured summary, folding in what
/// the renderer extracted and finally the N/A placeholder.
pub fn summary_labels(
    summary: route::SummaryExtract,
    fallback: route::SummaryExtract,
) -> (String, String) {
    let distance = summary
        .distance_m
        .or(fallback.distance_m)
        .map(coords::format_distance_km)
        .unwrap_or_else(|| "N/A".to_string());
    let duration = summary
        .duration_s
        .or(fallback.duration_s)
        .map(coords::format_duration_min)
        .unwrap_or_else(|| "N/A".to_string());
    (distance, duration)
}

#[derive(Clone, Copy)]
pub struct RouteSession {
    state: Signal<SharedState>,
    layer: RouteLayer,
    status: StatusSink,
    details: Signal<Pulse<RouteDetailsRequest>>,
    constraints: Signal<RouteConstraints>,
    generation: Signal<u64>,
}

impl RouteSession {
    pub fn new(
        state: Signal<SharedState>,
        layer: RouteLayer,
        status: StatusSink,
        details: Signal<Pulse<RouteDetailsRequest>>,
        constraints: Signal<RouteConstraints>,
        generation: Signal<u64>,
    ) -> Self {
        Self {
            state,
            layer,
            status,
            details,
            constraints,
            generation,
        }
    }

    /// Resolve text to a coordinate: the GPS sentinel, literal coordinate
    /// text, or a geocoding lookup, in that order.
    pub async fn resolve_endpoint(&self, text: &str) -> Result<Coordinate, EndpointError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EndpointError::EmptyInput);
        }
        if is_gps_sentinel(text) {
            let fix = self
                .state
                .peek()
                .latest_fix()
                .ok_or(EndpointError::GpsUnavailable)?;
            if fix.accuracy_m > GPS_RELIABLE_THRESHOLD_M {
                return Err(EndpointError::GpsImprecise {
                    accuracy_m: fix.accuracy_m,
                });
            }
            return Ok(fix.coordinate);
        }
        if let Some(coordinate) = coords::parse_coordinate_text(text) {
            debug!(
                lon = coordinate.lon,
                lat = coordinate.lat,
                "input recognized as literal coordinates"
            );
            return Ok(coordinate);
        }
        match api::geocode(text).await {
            Ok(coordinate) => Ok(coordinate),
            Err(GeocodeError::NotFound(detail)) => Err(EndpointError::AddressNotFound {
                address: text.to_string(),
                detail,
            }),
            Err(GeocodeError::Network(detail)) => Err(EndpointError::Network(detail)),
        }
    }

    /// Text-input flow: resolve both endpoints, then run the route. Any
    /// resolution failure aborts before endpoints are committed.
    pub async fn start_route(&mut self, origin_text: String, destination_text: String) {
        let generation = self.next_generation();
        if destination_text.trim().is_empty() {
            self.status
                .show("Enter a destination.".to_string(), StatusKind::Error);
            return;
        }
        if is_gps_sentinel(&destination_text) {
            self.status.show(
                "The destination must be an address or coordinates.".to_string(),
                StatusKind::Error,
            );
            return;
        }
        self.layer.clear_route();
        self.status
            .show("Calculating route...".to_string(), StatusKind::Info);

        let origin_input = if origin_text.trim().is_empty() {
            GPS_SENTINEL.to_string()
        } else {
            origin_text
        };
        let origin = match self.resolve_endpoint(&origin_input).await {
            Ok(coordinate) => coordinate,
            Err(err) => {
                self.report_endpoint_failure(generation, err);
                return;
            }
        };
        let destination = match self.resolve_endpoint(&destination_text).await {
            Ok(coordinate) => coordinate,
            Err(err) => {
                self.report_endpoint_failure(generation, err);
                return;
            }
        };
        if !self.is_current(generation) {
            return;
        }
        self.run_route(origin, destination, generation).await;
    }

    /// Direct-coordinates flow (map click with a known origin).
    pub async fn start_route_from_coordinates(&mut self, origin: Coordinate, destination: Coordinate) {
        let generation = self.next_generation();
        self.layer.clear_route();
        self.status.show(
            "Calculating route from coordinates...".to_string(),
            StatusKind::Info,
        );
        self.run_route(origin, destination, generation).await;
    }

    /// Map-click flow: route from the typed origin (or the device position
    /// when the input is blank) to the clicked point.
    pub async fn start_route_to_point(&mut self, origin_text: String, destination: Coordinate) {
        let generation = self.next_generation();
        self.layer.clear_route();
        self.status
            .show("Calculating route...".to_string(), StatusKind::Info);
        let origin_input = if origin_text.trim().is_empty() {
            GPS_SENTINEL.to_string()
        } else {
            origin_text
        };
        let origin = match self.resolve_endpoint(&origin_input).await {
            Ok(coordinate) => coordinate,
            Err(err) => {
                self.report_endpoint_failure(generation, err);
                return;
            }
        };
        if !self.is_current(generation) {
            return;
        }
        self.run_route(origin, destination, generation).await;
    }

    /// Clears overlays and endpoints unconditionally. An in-flight fetch
    /// cannot be cancelled, but the generation bump turns its late result
    /// into a no-op.
    pub fn clear_route(&mut self) {
        self.next_generation();
        self.layer.clear_route();
        self.status
            .show("Route cleared.".to_string(), StatusKind::Info);
    }

    async fn run_route(&mut self, origin: Coordinate, destination: Coordinate, generation: u64) {
        self.state.write().set_route_endpoints(origin, destination);
        wait_for_map_ready(self.state).await;
        if !self.is_current(generation) {
            return;
        }
        if !self.layer.draw_route_markers() {
            self.status.show(
                "Invalid coordinates for drawing markers.".to_string(),
                StatusKind::Error,
            );
            return;
        }
        let constraints = self.selected_constraints();
        if constraints.is_some() {
            self.status.show(
                "Optimizing the route with your preferences...".to_string(),
                StatusKind::Info,
            );
        }
        let result = api::fetch_route(origin, destination, constraints.as_ref()).await;
        if !self.is_current(generation) {
            debug!(generation, "discarding stale route response");
            return;
        }
        match result {
            Ok(payload) => self.render_route(&payload),
            Err(err) => {
                error!(%err, "route fetch failed");
                // Leave the map in its cleared pre-request state.
                self.layer.clear_route();
                self.status.show(err.to_string(), StatusKind::Error);
            }
        }
    }

    fn render_route(&mut self, payload: &Value) {
        let shape = route::classify(payload);
        debug!(?shape, "interpreting route payload");
        let Some(geometry) = route::extract_geometry(payload) else {
            warn!("route geometry missing from the response");
            self.layer.clear_route();
            self.status.show(
                "The route service response had no drawable geometry.".to_string(),
                StatusKind::Error,
            );
            return;
        };
        let Some(render_extract) = self.layer.draw_route(&geometry, payload) else {
            warn!("route geometry could not be decoded");
            self.layer.clear_route();
            self.status.show(
                "The route geometry could not be decoded.".to_string(),
                StatusKind::Error,
            );
            return;
        };

        let (distance, duration) = summary_labels(route::extract_summary(payload), render_extract);
        let steps = route::extract_steps(payload);
        let optimization = route::extract_optimization(payload);
        let info_text = format!("Distance: {distance} \u{2022} Duration: {duration}");

        self.details.write().emit(RouteDetailsRequest {
            distance: Some(distance.clone()),
            duration: Some(duration.clone()),
            info_text: Some(info_text),
            steps,
            optimization,
            state: Some(SheetState::Medium),
        });
        info!(%distance, %duration, "route rendered");
        self.status.show(
            format!("Route calculated! Distance: {distance}, Duration: {duration}"),
            StatusKind::Success,
        );
    }

    fn next_generation(&mut self) -> u64 {
        let mut generation = self.generation.write();
        *generation += 1;
        *generation
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.generation.peek() == generation
    }

    /// The live constraint selection, or `None` when nothing is selected —
    /// the request body must omit the key entirely in that case.
    fn selected_constraints(&self) -> Option<RouteConstraints> {
        let constraints = self.constraints.peek().clone();
        if constraints.is_empty() {
            None
        } else {
            Some(constraints)
        }
    }

    fn report_endpoint_failure(&mut self, generation: u64, err: EndpointError) {
        if !self.is_current(generation) {
            return;
        }
        warn!(%err, "endpoint resolution failed");
        self.status.show(err.to_string(), StatusKind::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_shared::route::SummaryExtract;

    #[test]
    fn test_gps_sentinel_matching() {
        assert!(is_gps_sentinel("GPS"));
        assert!(is_gps_sentinel("gps"));
        assert!(is_gps_sentinel("  Gps  "));
        assert!(!is_gps_sentinel("GPS, please"));
        assert!(!is_gps_sentinel(""));
    }

    #[test]
    fn test_summary_labels_structured() {
        let (distance, duration) = summary_labels(
            SummaryExtract {
                distance_m: Some(5234.0),
                duration_s: Some(930.0),
            },
            SummaryExtract::default(),
        );
        assert_eq!(distance, "5.23 km");
        assert_eq!(duration, "16 min");
    }

    #[test]
    fn test_summary_labels_fall_back_to_renderer() {
        let (distance, duration) = summary_labels(
            SummaryExtract::default(),
            SummaryExtract {
                distance_m: Some(850.0),
                duration_s: Some(120.0),
            },
        );
        assert_eq!(distance, "0.85 km");
        assert_eq!(duration, "2 min");
    }

    #[test]
    fn test_summary_labels_na_placeholder() {
        let (distance, duration) =
            summary_labels(SummaryExtract::default(), SummaryExtract::default());
        assert_eq!(distance, "N/A");
        assert_eq!(duration, "N/A");
    }

    #[test]
    fn test_summary_labels_mix_sources_per_field() {
        let (distance, duration) = summary_labels(
            SummaryExtract {
                distance_m: Some(1000.0),
                duration_s: None,
            },
            SummaryExtract {
                distance_m: Some(9999.0),
                duration_s: Some(60.0),
            },
        );
        assert_eq!(distance, "1.00 km");
        assert_eq!(duration, "1 min");
    }

    #[test]
    fn test_endpoint_error_messages() {
        let imprecise = EndpointError::GpsImprecise { accuracy_m: 230.4 };
        assert!(imprecise.to_string().contains("230 m"));
        let unavailable = EndpointError::GpsUnavailable;
        assert!(unavailable.to_string().contains("not available"));
        let not_found = EndpointError::AddressNotFound {
            address: "nowhere".to_string(),
            detail: "no match".to_string(),
        };
        let text = not_found.to_string();
        assert!(text.contains("nowhere"));
        assert!(text.contains("no match"));
    }
}
