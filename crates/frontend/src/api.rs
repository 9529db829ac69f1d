//! HTTP client for the geocoding and routing backend.
//!
//! The base URL is resolved at startup from an injected global, falling
//! back to the page's own origin; which of the two route endpoints gets
//! called follows from that same choice.

use serde::Serialize;
use serde_json::Value;

use wayfinder_shared::coords::Coordinate;
use wayfinder_shared::route::RouteConstraints;

/// Global the host page may inject to point the client at a public tunnel
/// or an alternative backend.
const API_BASE_GLOBAL: &str = "__API_BASE_URL";

/// Ordered fields a backend error body may carry its human detail in.
const ERROR_DETAIL_FIELDS: &[&str] = &["detalhe", "error", "erro", "message"];

/// Best human-readable detail from an error body.
pub fn extract_error_detail(body: &Value) -> String {
    for field in ERROR_DETAIL_FIELDS {
        if let Some(value) = body.get(*field) {
            return match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }
    }
    body.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeError {
    /// The backend answered but could not resolve the address.
    NotFound(String),
    Network(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::NotFound(detail) => {
                write!(f, "Address not found. Detail: {detail}")
            }
            GeocodeError::Network(detail) => {
                write!(f, "Connection error while geocoding the address: {detail}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteFetchError {
    /// 401/403 from the routing service — reported distinctly so the user
    /// knows it is a key/permission problem, not a routing one.
    AccessDenied { status: u16, detail: String },
    /// Any other non-success status.
    Backend { status: u16, detail: String },
    Network(String),
}

impl std::fmt::Display for RouteFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteFetchError::AccessDenied { status, detail } => write!(
                f,
                "Access denied by the routing service (HTTP {status}). Check the API key and account permissions. Detail: {detail}"
            ),
            RouteFetchError::Backend { status, detail } => {
                write!(f, "Failed to calculate the route (HTTP {status}): {detail}")
            }
            RouteFetchError::Network(detail) => {
                write!(f, "Connection error while calculating the route: {detail}")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GeocodeRequest {
    address: String,
}

/// The injected base URL, when the page provided one. Server templates can
/// render the literal string "None"; treat that as absent.
pub fn injected_base_url() -> Option<String> {
    let window = web_sys::window()?;
    let value =
        js_sys::Reflect::get(&window, &wasm_bindgen::JsValue::from_str(API_BASE_GLOBAL)).ok()?;
    let url = value.as_string()?;
    let url = url.trim().trim_end_matches('/').to_string();
    if url.is_empty() || url == "None" {
        None
    } else {
        Some(url)
    }
}

pub fn api_base_url() -> String {
    if let Some(url) = injected_base_url() {
        return url;
    }
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// The default backend takes `[[lon, lat], ...]` on `/rota`; an injected
/// alternative backend takes origin/destination objects on
/// `/calculate_route`.
pub fn route_endpoint(alternate_backend: bool) -> &'static str {
    if alternate_backend {
        "/calculate_route"
    } else {
        "/rota"
    }
}

/// Request body for either route endpoint. The `constraints` key is
/// omitted entirely when no constraints were passed.
pub fn build_route_body(
    origin: Coordinate,
    destination: Coordinate,
    constraints: Option<&RouteConstraints>,
    alternate_backend: bool,
) -> Value {
    let mut body = if alternate_backend {
        serde_json::json!({
            "origin": { "lat": origin.lat, "lon": origin.lon },
            "destination": { "lat": destination.lat, "lon": destination.lon },
        })
    } else {
        serde_json::json!({
            "coordinates": [[origin.lon, origin.lat], [destination.lon, destination.lat]],
        })
    };
    if let Some(constraints) = constraints {
        body["constraints"] = serde_json::json!({
            "avoid": constraints.avoid,
            "prefer": constraints.prefer,
        });
    }
    body
}

/// Resolve an address through the backend geocoder.
pub async fn geocode(address: &str) -> Result<Coordinate, GeocodeError> {
    let url = format!("{}/geocoding", api_base_url());
    let response = reqwest::Client::new()
        .post(&url)
        .json(&GeocodeRequest {
            address: address.to_string(),
        })
        .send()
        .await
        .map_err(|e| GeocodeError::Network(e.to_string()))?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| GeocodeError::Network(e.to_string()))?;
    if status.is_success() {
        match (
            body.get("lon").and_then(Value::as_f64),
            body.get("lat").and_then(Value::as_f64),
        ) {
            (Some(lon), Some(lat)) => Ok(Coordinate { lon, lat }),
            _ => Err(GeocodeError::NotFound(extract_error_detail(&body))),
        }
    } else {
        Err(GeocodeError::NotFound(extract_error_detail(&body)))
    }
}

/// Request a route. Returns the raw JSON payload; interpretation of its
/// shape lives in `wayfinder_shared::route`.
pub async fn fetch_route(
    origin: Coordinate,
    destination: Coordinate,
    constraints: Option<&RouteConstraints>,
) -> Result<Value, RouteFetchError> {
    let alternate = injected_base_url().is_some();
    let url = format!("{}{}", api_base_url(), route_endpoint(alternate));
    let body = build_route_body(origin, destination, constraints, alternate);
    let response = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| RouteFetchError::Network(e.to_string()))?;
    let status = response.status().as_u16();
    let payload: Value = response
        .json()
        .await
        .map_err(|e| RouteFetchError::Network(e.to_string()))?;
    if (200..300).contains(&status) {
        Ok(payload)
    } else {
        let detail = extract_error_detail(&payload);
        if status == 401 || status == 403 {
            Err(RouteFetchError::AccessDenied { status, detail })
        } else {
            Err(RouteFetchError::Backend { status, detail })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_endpoint_selection() {
        assert_eq!(route_endpoint(false), "/rota");
        assert_eq!(route_endpoint(true), "/calculate_route");
    }

    #[test]
    fn test_build_route_body_default_backend() {
        let body = build_route_body(
            Coordinate::new(-46.63, -23.55),
            Coordinate::new(-46.60, -23.50),
            None,
            false,
        );
        assert_eq!(body["coordinates"][0][0], -46.63);
        assert_eq!(body["coordinates"][0][1], -23.55);
        assert_eq!(body["coordinates"][1][0], -46.60);
        assert_eq!(body["coordinates"][1][1], -23.50);
        assert!(body.get("constraints").is_none());
        assert!(body.get("origin").is_none());
    }

    #[test]
    fn test_build_route_body_alternate_backend() {
        let body = build_route_body(
            Coordinate::new(-46.63, -23.55),
            Coordinate::new(-46.60, -23.50),
            None,
            true,
        );
        assert_eq!(body["origin"]["lat"], -23.55);
        assert_eq!(body["origin"]["lon"], -46.63);
        assert_eq!(body["destination"]["lat"], -23.50);
        assert!(body.get("coordinates").is_none());
    }

    #[test]
    fn test_build_route_body_with_constraints() {
        let constraints = RouteConstraints {
            avoid: vec!["toll".to_string(), "ferry".to_string()],
            prefer: vec!["fastest".to_string()],
        };
        let body = build_route_body(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Some(&constraints),
            false,
        );
        assert_eq!(body["constraints"]["avoid"][0], "toll");
        assert_eq!(body["constraints"]["avoid"][1], "ferry");
        assert_eq!(body["constraints"]["prefer"][0], "fastest");
    }

    #[test]
    fn test_extract_error_detail_field_order() {
        let body = json!({ "erro": "later", "detalhe": "first" });
        assert_eq!(extract_error_detail(&body), "first");
        let body = json!({ "message": "only message" });
        assert_eq!(extract_error_detail(&body), "only message");
        let body = json!({ "unknown": true });
        assert_eq!(extract_error_detail(&body), r#"{"unknown":true}"#);
    }

    #[test]
    fn test_extract_error_detail_non_string_value() {
        let body = json!({ "detalhe": { "code": 2010 } });
        assert_eq!(extract_error_detail(&body), r#"{"code":2010}"#);
    }

    #[test]
    fn test_access_denied_text_is_distinct() {
        let denied = RouteFetchError::AccessDenied {
            status: 403,
            detail: "bad key".to_string(),
        };
        let generic = RouteFetchError::Backend {
            status: 500,
            detail: "boom".to_string(),
        };
        let denied_text = denied.to_string();
        let generic_text = generic.to_string();
        assert!(denied_text.contains("Access denied"));
        assert!(denied_text.contains("403"));
        assert!(generic_text.contains("Failed to calculate the route"));
        assert!(generic_text.contains("500"));
        assert!(!generic_text.contains("Access denied"));
    }

    #[test]
    fn test_geocode_error_display() {
        let not_found = GeocodeError::NotFound("no match".to_string());
        assert!(not_found.to_string().contains("Address not found"));
        let network = GeocodeError::Network("timeout".to_string());
        assert!(network.to_string().contains("Connection error"));
    }
}
