//! Origin/destination inputs and the route buttons.

use dioxus::prelude::*;

#[component]
pub fn RoutePanel(
    origin_text: Signal<String>,
    destination_text: Signal<String>,
    on_route: EventHandler<()>,
    on_clear: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "panel route-panel",
            input {
                r#type: "text",
                placeholder: "Origin (blank or GPS = your position)",
                value: "{origin_text}",
                oninput: move |evt: Event<FormData>| {
                    origin_text.set(evt.value().to_string());
                },
            }
            input {
                r#type: "text",
                placeholder: "Destination address or lat,lon",
                value: "{destination_text}",
                oninput: move |evt: Event<FormData>| {
                    destination_text.set(evt.value().to_string());
                },
                onkeydown: move |evt: Event<KeyboardData>| {
                    if evt.key() == Key::Enter {
                        on_route.call(());
                    }
                },
            }
            div { class: "route-buttons",
                button { onclick: move |_| on_route.call(()), "Route" }
                button {
                    class: "secondary",
                    onclick: move |_| on_clear.call(()),
                    "Clear"
                }
            }
        }
    }
}
