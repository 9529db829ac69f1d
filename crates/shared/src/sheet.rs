//! Bottom-sheet geometry: snap offsets, drag math, and state transitions.
//!
//! Pure — the component layer feeds in pointer positions and the viewport
//! height, and applies the resulting offsets to the DOM.

/// The three resting positions of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetState {
    Expanded,
    Medium,
    Minimized,
}

/// A configured breakpoint: a percentage of viewport height or an absolute
/// pixel inset, both measured from the top of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SheetOffset {
    Percent(f64),
    Pixels(f64),
}

impl SheetOffset {
    pub fn resolve(&self, viewport_height: f64) -> f64 {
        match *self {
            SheetOffset::Percent(pct) => viewport_height * pct / 100.0,
            SheetOffset::Pixels(px) => px,
        }
    }

    /// Parse a CSS custom-property value: `"85vh"`, `"120px"`, or a bare
    /// number (read as vh when it fits 0..=100, else as pixels).
    pub fn parse(raw: &str) -> Option<SheetOffset> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(v) = s.strip_suffix("vh") {
            return v.trim().parse().ok().map(SheetOffset::Percent);
        }
        if let Some(v) = s.strip_suffix("px") {
            return v.trim().parse().ok().map(SheetOffset::Pixels);
        }
        let n: f64 = s.parse().ok()?;
        if (0.0..=100.0).contains(&n) {
            Some(SheetOffset::Percent(n))
        } else {
            Some(SheetOffset::Pixels(n))
        }
    }
}

/// Optional overrides for the three breakpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SheetConfig {
    pub expanded: Option<SheetOffset>,
    pub medium: Option<SheetOffset>,
    pub minimized: Option<SheetOffset>,
}

/// Resolved snap offsets (top inset in px), expanded < medium < minimized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetBreakpoints {
    pub expanded: f64,
    pub medium: f64,
    pub minimized: f64,
}

impl SheetBreakpoints {
    pub fn resolve(config: &SheetConfig, viewport_height: f64) -> Self {
        SheetBreakpoints {
            expanded: config
                .expanded
                .unwrap_or(SheetOffset::Percent(10.0))
                .resolve(viewport_height),
            medium: config
                .medium
                .unwrap_or(SheetOffset::Percent(50.0))
                .resolve(viewport_height),
            minimized: config
                .minimized
                .unwrap_or(SheetOffset::Percent(85.0))
                .resolve(viewport_height),
        }
    }

    pub fn offset_for(&self, state: SheetState) -> f64 {
        match state {
            SheetState::Expanded => self.expanded,
            SheetState::Medium => self.medium,
            SheetState::Minimized => self.minimized,
        }
    }

    /// Snap target for a released offset, decided by the two midpoints.
    pub fn snap(&self, offset: f64) -> SheetState {
        let upper_midpoint = (self.expanded + self.medium) / 2.0;
        let lower_midpoint = (self.medium + self.minimized) / 2.0;
        if offset < upper_midpoint {
            SheetState::Expanded
        } else if offset < lower_midpoint {
            SheetState::Medium
        } else {
            SheetState::Minimized
        }
    }

    /// The sheet can never be dragged above the expanded offset. There is
    /// no lower clamp; overshoot below minimized is corrected by the snap.
    pub fn clamp_drag(&self, offset: f64) -> f64 {
        offset.max(self.expanded)
    }
}

/// An in-progress drag: where the pointer started and where the sheet was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub start_pointer_y: f64,
    pub baseline_offset: f64,
}

/// The sheet's gesture state machine. Pointer and touch input share this
/// path; only the Y coordinate matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetController {
    pub breakpoints: SheetBreakpoints,
    pub state: SheetState,
    pub offset: f64,
    dragging: Option<DragGesture>,
}

impl SheetController {
    pub fn new(breakpoints: SheetBreakpoints) -> Self {
        Self {
            breakpoints,
            state: SheetState::Minimized,
            offset: breakpoints.minimized,
            dragging: None,
        }
    }

    /// Valid from any state: captures the current rendered offset as the
    /// drag baseline and switches to direct pointer-following.
    pub fn begin_drag(&mut self, pointer_y: f64) {
        self.dragging = Some(DragGesture {
            start_pointer_y: pointer_y,
            baseline_offset: self.offset,
        });
    }

    /// Applies the pointer delta to the baseline. Returns the new offset,
    /// or `None` when no drag is active.
    pub fn update_drag(&mut self, pointer_y: f64) -> Option<f64> {
        let drag = self.dragging?;
        let offset = self
            .breakpoints
            .clamp_drag(drag.baseline_offset + (pointer_y - drag.start_pointer_y));
        self.offset = offset;
        Some(offset)
    }

    /// Ends the drag and snaps to the nearest state. A drag that never
    /// moved resolves through the same snap logic. Returns the snapped
    /// state, or `None` when no drag was active.
    pub fn end_drag(&mut self, pointer_y: f64) -> Option<SheetState> {
        let drag = self.dragging.take()?;
        let offset = self
            .breakpoints
            .clamp_drag(drag.baseline_offset + (pointer_y - drag.start_pointer_y));
        let state = self.breakpoints.snap(offset);
        self.set_state(state);
        Some(state)
    }

    /// Programmatic jump, bypassing drag math.
    pub fn set_state(&mut self, state: SheetState) {
        self.dragging = None;
        self.state = state;
        self.offset = self.breakpoints.offset_for(state);
    }

    /// An expanded sheet covers the map; map gestures must not fight sheet
    /// gestures.
    pub fn map_interactions_enabled(&self) -> bool {
        self.state != SheetState::Expanded
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakpoints() -> SheetBreakpoints {
        // Defaults at a 1000 px viewport: 100 / 500 / 850.
        SheetBreakpoints::resolve(&SheetConfig::default(), 1000.0)
    }

    #[test]
    fn test_default_breakpoints() {
        let bp = breakpoints();
        assert!((bp.expanded - 100.0).abs() < 1e-9);
        assert!((bp.medium - 500.0).abs() < 1e-9);
        assert!((bp.minimized - 850.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_parse() {
        assert_eq!(SheetOffset::parse("85vh"), Some(SheetOffset::Percent(85.0)));
        assert_eq!(SheetOffset::parse(" 120px "), Some(SheetOffset::Pixels(120.0)));
        assert_eq!(SheetOffset::parse("42"), Some(SheetOffset::Percent(42.0)));
        assert_eq!(SheetOffset::parse("300"), Some(SheetOffset::Pixels(300.0)));
        assert_eq!(SheetOffset::parse(""), None);
        assert_eq!(SheetOffset::parse("banana"), None);
    }

    #[test]
    fn test_configured_breakpoints() {
        let config = SheetConfig {
            expanded: Some(SheetOffset::Pixels(80.0)),
            medium: None,
            minimized: Some(SheetOffset::Percent(90.0)),
        };
        let bp = SheetBreakpoints::resolve(&config, 1000.0);
        assert!((bp.expanded - 80.0).abs() < 1e-9);
        assert!((bp.medium - 500.0).abs() < 1e-9);
        assert!((bp.minimized - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_snap_regions() {
        let bp = breakpoints();
        // Midpoints: 300 and 675.
        assert_eq!(bp.snap(150.0), SheetState::Expanded);
        assert_eq!(bp.snap(299.9), SheetState::Expanded);
        assert_eq!(bp.snap(300.0), SheetState::Medium);
        assert_eq!(bp.snap(674.9), SheetState::Medium);
        assert_eq!(bp.snap(675.0), SheetState::Minimized);
        assert_eq!(bp.snap(900.0), SheetState::Minimized);
    }

    #[test]
    fn test_drag_from_minimized_past_midpoint_snaps_medium() {
        let mut sheet = SheetController::new(breakpoints());
        sheet.begin_drag(800.0);
        sheet.update_drag(700.0);
        // Released at 850 - 180 = 670, above the 675 midpoint.
        let snapped = sheet.end_drag(620.0).unwrap();
        assert_eq!(snapped, SheetState::Medium);
        assert!((sheet.offset - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_released_before_midpoint_snaps_back() {
        let mut sheet = SheetController::new(breakpoints());
        sheet.begin_drag(800.0);
        // Released at 850 - 100 = 750, below the 675 midpoint.
        let snapped = sheet.end_drag(700.0).unwrap();
        assert_eq!(snapped, SheetState::Minimized);
        assert!((sheet.offset - 850.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_clamps_above_expanded() {
        let mut sheet = SheetController::new(breakpoints());
        sheet.begin_drag(900.0);
        let offset = sheet.update_drag(0.0).unwrap();
        assert!((offset - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_has_no_lower_clamp() {
        let mut sheet = SheetController::new(breakpoints());
        sheet.set_state(SheetState::Medium);
        sheet.begin_drag(100.0);
        let offset = sheet.update_drag(600.0).unwrap();
        // 500 + 500 overshoots the minimized offset; allowed mid-drag.
        assert!((offset - 1000.0).abs() < 1e-9);
        assert_eq!(sheet.end_drag(600.0), Some(SheetState::Minimized));
    }

    #[test]
    fn test_update_without_drag_is_noop() {
        let mut sheet = SheetController::new(breakpoints());
        assert!(sheet.update_drag(400.0).is_none());
        assert!(sheet.end_drag(400.0).is_none());
        assert!((sheet.offset - 850.0).abs() < 1e-9);
    }

    #[test]
    fn test_motionless_drag_snaps_to_nearest() {
        let mut sheet = SheetController::new(breakpoints());
        sheet.begin_drag(860.0);
        assert_eq!(sheet.end_drag(860.0), Some(SheetState::Minimized));
    }

    #[test]
    fn test_set_state_toggles_map_interactions() {
        let mut sheet = SheetController::new(breakpoints());
        assert!(sheet.map_interactions_enabled());
        sheet.set_state(SheetState::Expanded);
        assert!(!sheet.map_interactions_enabled());
        assert!((sheet.offset - 100.0).abs() < 1e-9);
        sheet.set_state(SheetState::Medium);
        assert!(sheet.map_interactions_enabled());
    }

    #[test]
    fn test_set_state_cancels_drag() {
        let mut sheet = SheetController::new(breakpoints());
        sheet.begin_drag(800.0);
        sheet.set_state(SheetState::Expanded);
        assert!(!sheet.is_dragging());
        assert!(sheet.update_drag(500.0).is_none());
    }
}
