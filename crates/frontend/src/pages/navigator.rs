//! The single page: owns every signal, wires the tracker, session, route
//! layer, map surface, bottom sheet, and status line together.

use dioxus::prelude::*;

use wayfinder_shared::coords::Coordinate;
use wayfinder_shared::route::RouteConstraints;
use wayfinder_shared::sheet::SheetController;

use crate::bus::{Pulse, RouteDetailsRequest};
use crate::components::bottom_sheet::{self, BottomSheet};
use crate::components::map_view::{MapView, Viewport};
use crate::components::route_panel::RoutePanel;
use crate::components::status_message::{StatusLine, StatusMessage, StatusSink};
use crate::geolocation::{GeolocationTracker, GpsMarker};
use crate::route_layer::RouteLayer;
use crate::session::RouteSession;
use crate::state::SharedState;

#[component]
pub fn Navigator() -> Element {
    // Shared state and map-surface signals.
    let state = use_signal(SharedState::new);
    let viewport = use_signal(Viewport::default);
    let gps_marker = use_signal(|| None::<GpsMarker>);
    let route_line = use_signal(|| None::<Vec<Coordinate>>);
    let endpoint_markers = use_signal(|| None::<(Coordinate, Coordinate)>);

    // Status line, typed events, constraint selection, session generation.
    let status_message = use_signal(|| None::<StatusMessage>);
    let status_seq = use_signal(|| 0_u64);
    let details = use_signal(Pulse::<RouteDetailsRequest>::default);
    let constraints = use_signal(RouteConstraints::default);
    let generation = use_signal(|| 0_u64);
    let controller: Signal<SheetController> = use_signal(bottom_sheet::initial_controller);

    let status = StatusSink::new(status_message, status_seq);
    let layer = RouteLayer::new(state, route_line, endpoint_markers, viewport);
    let tracker = GeolocationTracker::new(state, viewport, gps_marker, status);
    let session = RouteSession::new(state, layer, status, details, constraints, generation);

    // Start GPS tracking once the map surface is up.
    let mut tracking_started = use_signal(|| false);
    use_effect(move || {
        if state.read().is_map_ready() && !*tracking_started.peek() {
            tracking_started.set(true);
            let mut tracker = tracker;
            tracker.start_tracking(true);
        }
    });

    let interactions_enabled = use_memo(move || controller.read().map_interactions_enabled());

    let origin_text = use_signal(String::new);
    let destination_text = use_signal(String::new);

    let following = state.read().follow_enabled();
    let tracking = state.read().is_tracking();

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Wayfinder" }
                div { class: "header-buttons",
                    button {
                        onclick: move |_| {
                            let mut tracker = tracker;
                            if state.peek().is_tracking() {
                                tracker.stop_tracking();
                            } else {
                                tracker.start_tracking(false);
                            }
                        },
                        if tracking { "GPS: ON" } else { "GPS: OFF" }
                    }
                    button {
                        onclick: move |_| {
                            let mut tracker = tracker;
                            tracker.toggle_follow();
                        },
                        if following { "Follow: ON" } else { "Follow: OFF" }
                    }
                    button {
                        onclick: move |_| {
                            let mut tracker = tracker;
                            tracker.center_on_current_position();
                        },
                        "Center"
                    }
                }
            }

            RoutePanel {
                origin_text,
                destination_text,
                on_route: move |_| {
                    let mut session = session;
                    let origin = origin_text.peek().clone();
                    let destination = destination_text.peek().clone();
                    spawn(async move {
                        session.start_route(origin, destination).await;
                    });
                },
                on_clear: move |_| {
                    let mut session = session;
                    session.clear_route();
                },
            }

            MapView {
                viewport,
                state,
                route_line,
                endpoint_markers,
                gps_marker,
                interactions_enabled,
                on_manual_drag: move |_| {
                    let mut tracker = tracker;
                    tracker.on_manual_viewport_drag();
                },
                on_map_click: move |coordinate: Coordinate| {
                    let mut session = session;
                    let origin = origin_text.peek().clone();
                    spawn(async move {
                        session.start_route_to_point(origin, coordinate).await;
                    });
                },
            }

            BottomSheet { controller, details, constraints }

            StatusLine { message: status_message }
        }
    }
}
