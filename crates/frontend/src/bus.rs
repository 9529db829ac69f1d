//! Typed cross-component signaling.
//!
//! The map-ready and route-details signals travel as data rather than
//! stringly-typed DOM events: readiness is the monotonic `SharedState` flag
//! (awaited below), and route details ride a sequence-numbered slot that a
//! component watches from `use_effect`.

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

use wayfinder_shared::route::{OptimizationInfo, RouteStep};
use wayfinder_shared::sheet::SheetState;

use crate::state::SharedState;

/// A single-slot event channel: publishers bump `seq`, watchers re-run on
/// the bump and read the latest payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulse<T> {
    seq: u64,
    payload: Option<T>,
}

impl<T> Pulse<T> {
    pub fn emit(&mut self, payload: T) {
        self.seq += 1;
        self.payload = Some(payload);
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn latest(&self) -> Option<&T> {
        self.payload.as_ref()
    }
}

impl<T> Default for Pulse<T> {
    fn default() -> Self {
        Self {
            seq: 0,
            payload: None,
        }
    }
}

/// Payload of the "route details requested" message. The sheet applies
/// only the slots that are populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDetailsRequest {
    pub distance: Option<String>,
    pub duration: Option<String>,
    pub info_text: Option<String>,
    pub steps: Vec<RouteStep>,
    pub optimization: Option<OptimizationInfo>,
    pub state: Option<SheetState>,
}

impl RouteDetailsRequest {
    pub fn target_state(&self) -> SheetState {
        self.state.unwrap_or(SheetState::Medium)
    }
}

const READY_POLL_MS: u32 = 50;

/// Resolves once the map surface reports ready. Readiness is monotonic, so
/// polling cannot miss the transition.
pub async fn wait_for_map_ready(state: Signal<SharedState>) {
    loop {
        if state.peek().is_map_ready() {
            return;
        }
        TimeoutFuture::new(READY_POLL_MS).await;
    }
}
