//! Device-location watch lifecycle: one initial high-accuracy reading,
//! then a continuous watch whose fixes feed the shared state, the GPS
//! marker, and (when they qualify) the viewport.

use dioxus::logger::tracing::{debug, info, warn};
use dioxus::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use wayfinder_shared::coords::Coordinate;

use crate::components::map_view::Viewport;
use crate::components::status_message::{StatusKind, StatusSink};
use crate::state::{GpsFix, SharedState};

/// Accuracy (meters) under which a reading is trusted for recentering and
/// routing.
pub const GPS_RELIABLE_THRESHOLD_M: f64 = 150.0;

const INITIAL_FIX_TIMEOUT_MS: u32 = 12_000;
const WATCH_TIMEOUT_MS: u32 = 10_000;
const WATCH_MAX_AGE_MS: u32 = 1_000;

/// The GPS marker drawn by the map overlay: position plus accuracy radius.
/// `None` until the first fix arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsMarker {
    pub coordinate: Coordinate,
    pub accuracy_m: f64,
}

/// User-facing categories for device location errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl GpsErrorKind {
    /// Device error codes: 1 = permission, 2 = unavailable, 3 = timeout.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => GpsErrorKind::PermissionDenied,
            2 => GpsErrorKind::PositionUnavailable,
            _ => GpsErrorKind::Timeout,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GpsErrorKind::PermissionDenied => "GPS error: permission denied by the user.",
            GpsErrorKind::PositionUnavailable => "GPS error: signal unavailable.",
            GpsErrorKind::Timeout => "GPS error: timed out waiting for a reading.",
        }
    }
}

/// Whether a fix should move the viewport. A fix worse than the threshold
/// never recenters, follow mode included.
pub fn should_recenter(first_fix: bool, forced: bool, following: bool, accuracy_m: f64) -> bool {
    (first_fix || forced || following) && accuracy_m <= GPS_RELIABLE_THRESHOLD_M
}

/// Status line for a fix, flagging low-precision readings.
pub fn fix_status_line(accuracy_m: f64, following: bool) -> String {
    if accuracy_m > GPS_RELIABLE_THRESHOLD_M {
        format!("GPS active, low precision: {accuracy_m:.1} m. Waiting for better readings.")
    } else if following {
        format!("GPS active. Accuracy: {accuracy_m:.1} m. (Following)")
    } else {
        format!("GPS active. Accuracy: {accuracy_m:.1} m.")
    }
}

/// Owns the watch lifecycle. Copyable so the browser callbacks can carry
/// their own handle.
#[derive(Clone, Copy)]
pub struct GeolocationTracker {
    state: Signal<SharedState>,
    viewport: Signal<Viewport>,
    marker: Signal<Option<GpsMarker>>,
    status: StatusSink,
}

impl GeolocationTracker {
    pub fn new(
        state: Signal<SharedState>,
        viewport: Signal<Viewport>,
        marker: Signal<Option<GpsMarker>>,
        status: StatusSink,
    ) -> Self {
        Self {
            state,
            viewport,
            marker,
            status,
        }
    }

    /// Request one eager high-accuracy reading, then start the continuous
    /// watch whatever that reading does. A second call while a watch is
    /// active only reports that tracking is already on.
    pub fn start_tracking(&mut self, force_center: bool) {
        if self.state.peek().is_tracking() {
            self.status
                .show("GPS tracking is already active.".to_string(), StatusKind::Info);
            return;
        }
        let Some(geolocation) = geolocation_handle() else {
            // Terminal for this session; there is no capability to retry.
            self.status.show(
                "Geolocation is not supported by this browser.".to_string(),
                StatusKind::Error,
            );
            return;
        };

        let mut on_fix_tracker = *self;
        let on_initial = Closure::<dyn FnMut(web_sys::Position)>::new(move |pos: web_sys::Position| {
            on_fix_tracker.apply_position(&pos, force_center);
            on_fix_tracker.start_watch();
        });
        let mut on_err_tracker = *self;
        let on_initial_error =
            Closure::<dyn FnMut(web_sys::PositionError)>::new(move |err: web_sys::PositionError| {
                warn!("initial gps reading failed: {}", err.message());
                on_err_tracker.start_watch();
            });

        let options = web_sys::PositionOptions::new();
        options.set_enable_high_accuracy(true);
        options.set_timeout(INITIAL_FIX_TIMEOUT_MS);
        options.set_maximum_age(0);

        if geolocation
            .get_current_position_with_error_callback_and_options(
                on_initial.as_ref().unchecked_ref(),
                Some(on_initial_error.as_ref().unchecked_ref()),
                &options,
            )
            .is_err()
        {
            warn!("failed to request the initial position");
            self.start_watch();
        }
        // The callbacks must outlive this call; the watch id is the only
        // cancellation handle we keep.
        on_initial.forget();
        on_initial_error.forget();
    }

    fn start_watch(&mut self) {
        if self.state.peek().is_tracking() {
            return;
        }
        let Some(geolocation) = geolocation_handle() else {
            return;
        };

        let mut on_fix_tracker = *self;
        let on_fix = Closure::<dyn FnMut(web_sys::Position)>::new(move |pos: web_sys::Position| {
            on_fix_tracker.apply_position(&pos, false);
        });
        let mut on_err_tracker = *self;
        let on_error =
            Closure::<dyn FnMut(web_sys::PositionError)>::new(move |err: web_sys::PositionError| {
                on_err_tracker.handle_error(err.code(), &err.message());
            });

        let options = web_sys::PositionOptions::new();
        options.set_enable_high_accuracy(true);
        options.set_timeout(WATCH_TIMEOUT_MS);
        options.set_maximum_age(WATCH_MAX_AGE_MS);

        match geolocation.watch_position_with_error_callback_and_options(
            on_fix.as_ref().unchecked_ref(),
            Some(on_error.as_ref().unchecked_ref()),
            &options,
        ) {
            Ok(id) => {
                let mut state = self.state.write();
                state.set_watch_id(id);
                state.set_follow_enabled(true);
                drop(state);
                info!(id, "gps watch started");
            }
            Err(_) => {
                self.status
                    .show("Could not start GPS tracking.".to_string(), StatusKind::Error);
            }
        }
        on_fix.forget();
        on_error.forget();
    }

    fn apply_position(&mut self, pos: &web_sys::Position, forced: bool) {
        let coords = pos.coords();
        self.handle_fix(
            coords.longitude(),
            coords.latitude(),
            coords.accuracy(),
            pos.timestamp(),
            forced,
        );
    }

    /// Applies one reading: stores the fix atomically, creates or relocates
    /// the marker and accuracy circle, and recenters when the fix
    /// qualifies.
    pub fn handle_fix(&mut self, lon: f64, lat: f64, accuracy_m: f64, timestamp_ms: f64, forced: bool) {
        let coordinate = Coordinate { lon, lat };
        self.state.write().record_fix(GpsFix {
            coordinate,
            accuracy_m,
            timestamp_ms,
        });
        let first_fix = self.marker.peek().is_none();
        self.marker.set(Some(GpsMarker {
            coordinate,
            accuracy_m,
        }));
        let following = self.state.peek().follow_enabled();
        if should_recenter(first_fix, forced, following, accuracy_m) {
            self.viewport.write().recenter(coordinate);
        }
        debug!(lon, lat, accuracy_m, "gps fix");
        self.status
            .show(fix_status_line(accuracy_m, following), StatusKind::Info);
    }

    /// Mid-watch errors are reported but never stop the watch; a later fix
    /// may still arrive.
    pub fn handle_error(&mut self, code: u16, message: &str) {
        let kind = GpsErrorKind::from_code(code);
        warn!(code, detail = message, "gps error");
        self.status
            .show(kind.user_message().to_string(), StatusKind::Error);
    }

    /// Cancels the subscription, drops the handle, and disables follow.
    pub fn stop_tracking(&mut self) {
        let Some(id) = self.state.peek().watch_id() else {
            return;
        };
        if let Some(geolocation) = geolocation_handle() {
            geolocation.clear_watch(id);
        }
        let mut state = self.state.write();
        state.clear_watch_id();
        state.set_follow_enabled(false);
        drop(state);
        info!(id, "gps watch stopped");
        self.status
            .show("GPS tracking disabled.".to_string(), StatusKind::Info);
    }

    /// Flips follow mode without moving the viewport.
    pub fn toggle_follow(&mut self) {
        let enabled = !self.state.peek().follow_enabled();
        self.state.write().set_follow_enabled(enabled);
        let text = if enabled {
            "Follow mode enabled."
        } else {
            "Follow mode disabled."
        };
        self.status.show(text.to_string(), StatusKind::Info);
    }

    /// The user grabbed the map; stop overriding them.
    pub fn on_manual_viewport_drag(&mut self) {
        if self.state.peek().follow_enabled() {
            self.state.write().set_follow_enabled(false);
            self.status.show(
                "Follow mode disabled (manual movement detected).".to_string(),
                StatusKind::Info,
            );
        }
    }

    /// Center the viewport on the last fix, if there is one.
    pub fn center_on_current_position(&mut self) {
        match self.state.peek().latest_fix() {
            Some(fix) => {
                self.viewport.write().recenter(fix.coordinate);
                self.status.show(
                    "Map centered on your current position.".to_string(),
                    StatusKind::Info,
                );
            }
            None => {
                self.status.show(
                    "Current GPS position not available to center on.".to_string(),
                    StatusKind::Error,
                );
            }
        }
    }
}

fn geolocation_handle() -> Option<web_sys::Geolocation> {
    web_sys::window()?.navigator().geolocation().ok()
}
