use wayfinder_shared::coords::Coordinate;

/// One GPS reading. Position, accuracy, and device timestamp always travel
/// together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub coordinate: Coordinate,
    pub accuracy_m: f64,
    pub timestamp_ms: f64,
}

/// The client's shared state: map readiness, GPS state, route endpoints,
/// and the location-watch handle.
///
/// One instance lives in the page component and is handed to each
/// collaborator as a `Signal<SharedState>`. Every mutation goes through an
/// accessor here; multi-field updates that must look atomic (the fix, the
/// endpoint pair) are single calls, so an interleaved callback never
/// observes a half-written pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedState {
    map_ready: bool,
    follow_enabled: bool,
    fix: Option<GpsFix>,
    watch_id: Option<i32>,
    origin: Option<Coordinate>,
    destination: Option<Coordinate>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            map_ready: false,
            follow_enabled: true,
            fix: None,
            watch_id: None,
            origin: None,
            destination: None,
        }
    }

    pub fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    /// Readiness is monotonic; there is no way back to unready.
    pub fn mark_map_ready(&mut self) {
        self.map_ready = true;
    }

    pub fn follow_enabled(&self) -> bool {
        self.follow_enabled
    }

    pub fn set_follow_enabled(&mut self, on: bool) {
        self.follow_enabled = on;
    }

    pub fn latest_fix(&self) -> Option<GpsFix> {
        self.fix
    }

    pub fn record_fix(&mut self, fix: GpsFix) {
        self.fix = Some(fix);
    }

    pub fn watch_id(&self) -> Option<i32> {
        self.watch_id
    }

    /// The watch handle doubles as the "is tracking active" flag.
    pub fn is_tracking(&self) -> bool {
        self.watch_id.is_some()
    }

    pub fn set_watch_id(&mut self, id: i32) {
        self.watch_id = Some(id);
    }

    pub fn clear_watch_id(&mut self) {
        self.watch_id = None;
    }

    pub fn origin(&self) -> Option<Coordinate> {
        self.origin
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    /// Both endpoints when a route session is active.
    pub fn route_endpoints(&self) -> Option<(Coordinate, Coordinate)> {
        Some((self.origin?, self.destination?))
    }

    /// Endpoints are only ever written as a pair.
    pub fn set_route_endpoints(&mut self, origin: Coordinate, destination: Coordinate) {
        self.origin = Some(origin);
        self.destination = Some(destination);
    }

    /// Cleared as a pair as well, so a stale single endpoint cannot survive
    /// into the next session.
    pub fn clear_route_endpoints(&mut self) {
        self.origin = None;
        self.destination = None;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
