//! The draggable bottom sheet hosting route details and routing
//! preferences. Gesture math lives in `wayfinder_shared::sheet`; this
//! component wires pointer/touch events into it and renders the content
//! slots.

use dioxus::logger::tracing::debug;
use dioxus::prelude::*;

use wayfinder_shared::route::{OptimizationInfo, RouteConstraints, RouteStep};
use wayfinder_shared::sheet::{SheetBreakpoints, SheetConfig, SheetController, SheetOffset, SheetState};

use crate::bus::{Pulse, RouteDetailsRequest};

/// CSS custom properties the breakpoints may be configured through.
const CSS_VAR_EXPANDED: &str = "--sheet-offset-expanded";
const CSS_VAR_MEDIUM: &str = "--sheet-offset-medium";
const CSS_VAR_MIN: &str = "--sheet-offset-min";

const AVOID_OPTIONS: &[(&str, &str)] = &[
    ("toll", "Tolls"),
    ("highway", "Highways"),
    ("ferry", "Ferries"),
];

const PREFER_OPTIONS: &[(&str, &str)] = &[("fastest", "Fastest"), ("shortest", "Shortest")];

fn css_var(name: &str) -> Option<String> {
    let window = web_sys::window()?;
    let document = window.document()?;
    let root = document.document_element()?;
    let style = window.get_computed_style(&root).ok()??;
    let value = style.get_property_value(name).ok()?;
    let value = value.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn sheet_config_from_css() -> SheetConfig {
    SheetConfig {
        expanded: css_var(CSS_VAR_EXPANDED).as_deref().and_then(SheetOffset::parse),
        medium: css_var(CSS_VAR_MEDIUM).as_deref().and_then(SheetOffset::parse),
        minimized: css_var(CSS_VAR_MIN).as_deref().and_then(SheetOffset::parse),
    }
}

fn viewport_height() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_height().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0)
}

/// Controller seeded from CSS configuration, or the 10/50/85% defaults.
pub fn initial_controller() -> SheetController {
    SheetController::new(SheetBreakpoints::resolve(
        &sheet_config_from_css(),
        viewport_height(),
    ))
}

#[component]
pub fn BottomSheet(
    controller: Signal<SheetController>,
    details: ReadSignal<Pulse<RouteDetailsRequest>>,
    constraints: Signal<RouteConstraints>,
) -> Element {
    // Content slots, updated only from the slots present in each event.
    let mut distance = use_signal(|| "--".to_string());
    let mut duration = use_signal(|| "--".to_string());
    let mut info_text = use_signal(String::new);
    let mut steps = use_signal(Vec::<RouteStep>::new);
    let mut optimization = use_signal(|| None::<OptimizationInfo>);
    let mut seen_seq = use_signal(|| 0_u64);
    let mut last_pointer_y = use_signal(|| 0.0_f64);

    // React to "route details requested" events.
    use_effect(move || {
        let pulse = details.read();
        if pulse.seq() == *seen_seq.peek() {
            return;
        }
        seen_seq.set(pulse.seq());
        if let Some(request) = pulse.latest() {
            if let Some(value) = &request.distance {
                distance.set(value.clone());
            }
            if let Some(value) = &request.duration {
                duration.set(value.clone());
            }
            if let Some(value) = &request.info_text {
                info_text.set(value.clone());
            }
            steps.set(request.steps.clone());
            optimization.set(request.optimization.clone());
            let target = request.target_state();
            controller.write().set_state(target);
            debug!(?target, "sheet opened for route details");
        }
    });

    let sheet = *controller.read();
    let dragging = sheet.is_dragging();
    let sheet_class = if dragging {
        "sheet sheet-transition-off"
    } else {
        "sheet"
    };
    let transform = format!("transform: translateY({:.1}px);", sheet.offset);
    let expanded = sheet.state == SheetState::Expanded;
    let current_avoid = constraints.read().avoid.clone();
    let current_prefer = constraints.read().prefer.first().cloned();
    let step_list = steps.read().clone();
    let optimization_view = optimization.read().clone();

    rsx! {
        // Full-screen capture layer so a drag can leave the sheet without
        // losing the gesture.
        if dragging {
            div {
                class: "drag-capture",
                onmousemove: move |evt: Event<MouseData>| {
                    let y = evt.client_coordinates().y;
                    last_pointer_y.set(y);
                    controller.write().update_drag(y);
                },
                onmouseup: move |evt: Event<MouseData>| {
                    controller.write().end_drag(evt.client_coordinates().y);
                },
                ontouchmove: move |evt: Event<TouchData>| {
                    let touches = evt.data().touches();
                    if let Some(touch) = touches.first() {
                        let y = touch.client_coordinates().y;
                        last_pointer_y.set(y);
                        controller.write().update_drag(y);
                    }
                },
                ontouchend: move |_| {
                    let y = *last_pointer_y.peek();
                    controller.write().end_drag(y);
                },
                ontouchcancel: move |_| {
                    let y = *last_pointer_y.peek();
                    controller.write().end_drag(y);
                },
            }
        }

        div {
            class: "{sheet_class}",
            style: "{transform}",

            div {
                class: "handle",
                onmousedown: move |evt: Event<MouseData>| {
                    let y = evt.client_coordinates().y;
                    last_pointer_y.set(y);
                    controller.write().begin_drag(y);
                },
                ontouchstart: move |evt: Event<TouchData>| {
                    let touches = evt.data().touches();
                    if let Some(touch) = touches.first() {
                        let y = touch.client_coordinates().y;
                        last_pointer_y.set(y);
                        controller.write().begin_drag(y);
                    }
                },
            }

            div { class: "sheet-header",
                h3 { "Route details" }
                button {
                    class: "sheet-toggle",
                    onclick: move |_| {
                        let target = if controller.peek().state == SheetState::Expanded {
                            SheetState::Minimized
                        } else {
                            SheetState::Expanded
                        };
                        controller.write().set_state(target);
                    },
                    if expanded { "Close details" } else { "Details" }
                }
                button {
                    class: "sheet-close",
                    onclick: move |_| controller.write().set_state(SheetState::Minimized),
                    "\u{00d7}"
                }
            }

            if !info_text.read().is_empty() {
                p { class: "sheet-info", "{info_text}" }
            }

            div { class: "route-summary",
                div { class: "stat",
                    div { class: "label", "Distance" }
                    div { class: "value", "{distance}" }
                }
                div { class: "stat",
                    div { class: "label", "Duration" }
                    div { class: "value", "{duration}" }
                }
            }

            div { class: "panel constraints",
                h4 { "Avoid" }
                for (value, text) in AVOID_OPTIONS.iter().copied() {
                    label { class: "constraint-option",
                        input {
                            r#type: "checkbox",
                            name: "avoid",
                            value: "{value}",
                            checked: current_avoid.iter().any(|v| v == value),
                            onchange: move |evt: Event<FormData>| {
                                constraints.write().set_avoid(value, evt.checked());
                            },
                        }
                        "{text}"
                    }
                }
                h4 { "Prefer" }
                for (value, text) in PREFER_OPTIONS.iter().copied() {
                    label { class: "constraint-option",
                        input {
                            r#type: "radio",
                            name: "prefer",
                            value: "{value}",
                            checked: current_prefer.as_deref() == Some(value),
                            onchange: move |evt: Event<FormData>| {
                                if evt.checked() {
                                    constraints.write().set_preference(Some(value));
                                }
                            },
                        }
                        "{text}"
                    }
                }
                button {
                    class: "secondary",
                    onclick: move |_| {
                        let mut selection = constraints.write();
                        selection.avoid.clear();
                        selection.set_preference(None);
                    },
                    "Clear preferences"
                }
            }

            if let Some(info) = optimization_view {
                {
                    let traffic_pct = ((info.traffic_factor - 1.0) * 100.0).round();
                    rsx! {
                        div { class: "optimization-banner",
                            strong { "Optimized route" }
                            p { "{info.reasoning}" }
                            p { class: "optimization-meta",
                                "{info.weather} \u{2022} traffic {traffic_pct}% above normal"
                            }
                        }
                    }
                }
            }

            if !step_list.is_empty() {
                ol { class: "route-steps",
                    for step in step_list {
                        li { "{step.instruction} ({step.distance_m.round()} m)" }
                    }
                }
            }
        }
    }
}
