mod api;
mod bus;
mod components;
mod geolocation;
mod pages;
mod route_layer;
mod session;
mod state;

use dioxus::prelude::*;

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        pages::navigator::Navigator {}
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
