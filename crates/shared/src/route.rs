//! Interpretation of routing-backend responses.
//!
//! The backend's payload shape is not fixed: the same request can come back
//! as an encoded-polyline `routes` array, as a GeoJSON FeatureCollection,
//! or as a FeatureCollection whose summary and steps hide under feature
//! properties. Everything here classifies the payload into an explicit
//! union and pulls summary data through ordered candidate-path lists, so
//! each shape stays independently testable.

use serde::Serialize;
use serde_json::Value;

use crate::coords::Coordinate;
use crate::polyline;

/// User-selected routing preferences, attached to a route request.
///
/// An empty selection must be wire-distinct from an empty-but-present
/// object: the request body omits the `constraints` key entirely when
/// [`RouteConstraints::is_empty`] holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteConstraints {
    pub avoid: Vec<String>,
    pub prefer: Vec<String>,
}

impl RouteConstraints {
    pub fn is_empty(&self) -> bool {
        self.avoid.is_empty() && self.prefer.is_empty()
    }

    pub fn set_avoid(&mut self, value: &str, on: bool) {
        if on {
            if !self.avoid.iter().any(|v| v == value) {
                self.avoid.push(value.to_string());
            }
        } else {
            self.avoid.retain(|v| v != value);
        }
    }

    /// The preference is a single-choice radio; `None` clears it.
    pub fn set_preference(&mut self, value: Option<&str>) {
        self.prefer = value.map(|v| vec![v.to_string()]).unwrap_or_default();
    }
}

/// One turn instruction of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_m: f64,
}

/// Optimization metadata some backends attach to the first feature.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationInfo {
    pub reasoning: String,
    pub weather: String,
    pub traffic_factor: f64,
}

/// The known payload shapes, plus the explicit fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteShape {
    /// `{"routes":[{"geometry":"<encoded polyline>", ...}]}`
    EncodedRoutes,
    /// GeoJSON FeatureCollection with line geometry.
    FeatureCollection,
    /// FeatureCollection carrying `properties.segments[].steps`.
    SegmentedFeatures,
    Unrecognized,
}

pub fn classify(payload: &Value) -> RouteShape {
    if payload
        .pointer("/routes/0/geometry")
        .and_then(Value::as_str)
        .is_some()
    {
        return RouteShape::EncodedRoutes;
    }
    if payload.get("features").and_then(Value::as_array).is_some() {
        if payload
            .pointer("/features/0/properties/segments")
            .and_then(Value::as_array)
            .is_some()
        {
            return RouteShape::SegmentedFeatures;
        }
        return RouteShape::FeatureCollection;
    }
    RouteShape::Unrecognized
}

/// Route geometry in either of its transport forms.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteGeometry {
    /// Encoded polyline, precision factor 1e5.
    Encoded(String),
    /// Already-decoded line coordinates.
    Line(Vec<Coordinate>),
}

impl RouteGeometry {
    /// Decoded coordinates, or `None` for a malformed encoded string or an
    /// empty line.
    pub fn coordinates(&self) -> Option<Vec<Coordinate>> {
        match self {
            RouteGeometry::Encoded(encoded) => {
                polyline::decode(encoded).filter(|line| !line.is_empty())
            }
            RouteGeometry::Line(line) if !line.is_empty() => Some(line.clone()),
            RouteGeometry::Line(_) => None,
        }
    }
}

/// Pull the drawable geometry out of a payload: the encoded `routes` form
/// first, then the first LineString/MultiLineString feature.
pub fn extract_geometry(payload: &Value) -> Option<RouteGeometry> {
    if let Some(encoded) = payload.pointer("/routes/0/geometry").and_then(Value::as_str) {
        return Some(RouteGeometry::Encoded(encoded.to_owned()));
    }
    for feature in payload.get("features").and_then(Value::as_array)? {
        let Some(geometry) = feature.get("geometry") else {
            continue;
        };
        let kind = geometry.get("type").and_then(Value::as_str).unwrap_or("");
        let coordinates = geometry.get("coordinates");
        let line = match kind {
            "LineString" => coordinates.and_then(parse_line),
            "MultiLineString" => coordinates.and_then(Value::as_array).map(|parts| {
                parts
                    .iter()
                    .filter_map(parse_line)
                    .flatten()
                    .collect::<Vec<_>>()
            }),
            _ => None,
        };
        if let Some(line) = line.filter(|l| l.len() >= 2) {
            return Some(RouteGeometry::Line(line));
        }
    }
    None
}

fn parse_line(value: &Value) -> Option<Vec<Coordinate>> {
    let pairs = value.as_array()?;
    let mut line = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let pair = pair.as_array()?;
        let lon = pair.first()?.as_f64()?;
        let lat = pair.get(1)?.as_f64()?;
        line.push(Coordinate { lon, lat });
    }
    Some(line)
}

/// Candidate paths for the route distance (meters), most specific first.
const DISTANCE_PATHS: &[&str] = &[
    "/routes/0/summary/distance",
    "/features/0/properties/summary/distance",
    "/features/0/properties/summary/distance_in_meters",
    "/features/0/properties/summary/distance_m",
    "/features/0/properties/segments/0/distance",
    "/features/0/properties/segments/0/summary/distance",
];

/// Candidate paths for the route duration (seconds), most specific first.
const DURATION_PATHS: &[&str] = &[
    "/routes/0/summary/duration",
    "/features/0/properties/summary/duration",
    "/features/0/properties/summary/duration_in_seconds",
    "/features/0/properties/summary/duration_s",
    "/features/0/properties/segments/0/duration",
    "/features/0/properties/segments/0/summary/duration",
];

/// Whatever summary data a payload yielded; either half may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryExtract {
    pub distance_m: Option<f64>,
    pub duration_s: Option<f64>,
}

pub fn extract_summary(payload: &Value) -> SummaryExtract {
    SummaryExtract {
        distance_m: first_finite(payload, DISTANCE_PATHS),
        duration_s: first_finite(payload, DURATION_PATHS),
    }
}

fn first_finite(payload: &Value, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .find_map(|path| payload.pointer(path).and_then(as_finite))
}

fn as_finite(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Candidate paths for the step list.
const STEP_LIST_PATHS: &[&str] = &[
    "/features/0/properties/segments/0/steps",
    "/routes/0/segments/0/steps",
];

pub fn extract_steps(payload: &Value) -> Vec<RouteStep> {
    for path in STEP_LIST_PATHS {
        if let Some(raw) = payload.pointer(path).and_then(Value::as_array) {
            let steps: Vec<RouteStep> = raw.iter().map(parse_step).collect();
            if !steps.is_empty() {
                return steps;
            }
        }
    }
    Vec::new()
}

fn parse_step(value: &Value) -> RouteStep {
    let instruction = value
        .get("instruction")
        .and_then(Value::as_str)
        .or_else(|| value.get("description").and_then(Value::as_str))
        .unwrap_or("Step")
        .to_owned();
    let distance_m = value.get("distance").and_then(as_finite).unwrap_or(0.0);
    RouteStep {
        instruction,
        distance_m,
    }
}

pub fn extract_optimization(payload: &Value) -> Option<OptimizationInfo> {
    let raw = payload.pointer("/features/0/properties/optimization")?;
    if !raw.get("enabled").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    Some(OptimizationInfo {
        reasoning: raw
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        weather: raw
            .get("weather")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        traffic_factor: raw
            .get("traffic_factor")
            .and_then(as_finite)
            .unwrap_or(1.0),
    })
}

/// Property fields the renderer falls back to when the structured summary
/// paths come up empty. Values here may be bare numbers or unit-suffixed
/// labels.
const FALLBACK_DISTANCE_FIELDS: &[&str] = &[
    "/summary/distance",
    "/distance",
    "/length",
    "/distance_m",
    "/distance_in_meters",
];

const FALLBACK_DURATION_FIELDS: &[&str] = &[
    "/summary/duration",
    "/duration",
    "/time",
    "/duration_s",
    "/duration_in_seconds",
];

/// Best-effort summary from the line feature's properties.
pub fn renderer_fallback_summary(payload: &Value) -> SummaryExtract {
    let Some(properties) = line_feature_properties(payload) else {
        return SummaryExtract::default();
    };
    SummaryExtract {
        distance_m: FALLBACK_DISTANCE_FIELDS
            .iter()
            .find_map(|path| properties.pointer(path).and_then(parse_distance_value)),
        duration_s: FALLBACK_DURATION_FIELDS
            .iter()
            .find_map(|path| properties.pointer(path).and_then(parse_duration_value)),
    }
}

fn line_feature_properties(payload: &Value) -> Option<&Value> {
    let features = payload.get("features")?.as_array()?;
    features
        .iter()
        .find(|f| {
            matches!(
                f.pointer("/geometry/type").and_then(Value::as_str),
                Some("LineString" | "MultiLineString")
            )
        })
        .or_else(|| features.first())
        .and_then(|f| f.get("properties"))
}

/// Distance in meters from a property that may be a bare number (meters)
/// or a label like `"5.2 km"` / `"850 m"`.
pub fn parse_distance_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => {
            let number = leading_number(s)?;
            if s.to_ascii_lowercase().contains("km") {
                Some(number * 1000.0)
            } else {
                Some(number)
            }
        }
        _ => None,
    }
}

/// Duration in seconds from a property that may be a bare number (seconds)
/// or a label like `"1.5 h"` / `"30 min"` (unitless strings read as
/// minutes).
pub fn parse_duration_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => {
            let number = leading_number(s)?;
            if s.to_ascii_lowercase().contains('h') {
                Some(number * 3600.0)
            } else {
                Some(number * 60.0)
            }
        }
        _ => None,
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let tail = &s[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(tail.len());
    tail[..end].replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encoded_routes_payload() -> Value {
        json!({
            "routes": [{
                "geometry": "_p~iF~ps|U_ulLnnqC_mqNvxq`@",
                "summary": { "distance": 1234.5, "duration": 600 }
            }]
        })
    }

    fn feature_collection_payload() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-46.63, -23.55], [-46.60, -23.50]]
                },
                "properties": {
                    "summary": { "distance": 5234.0, "duration": 930.0 }
                }
            }]
        })
    }

    fn segmented_payload() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-46.63, -23.55], [-46.62, -23.54], [-46.60, -23.50]]
                },
                "properties": {
                    "segments": [{
                        "distance": 5234.0,
                        "duration": 930.0,
                        "steps": [
                            { "instruction": "Head north", "distance": 120.4 },
                            { "description": "Turn right", "distance": 80.0 },
                            { "distance": 30.0 }
                        ]
                    }]
                }
            }]
        })
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(classify(&encoded_routes_payload()), RouteShape::EncodedRoutes);
        assert_eq!(
            classify(&feature_collection_payload()),
            RouteShape::FeatureCollection
        );
        assert_eq!(classify(&segmented_payload()), RouteShape::SegmentedFeatures);
        assert_eq!(classify(&json!({"erro": "nope"})), RouteShape::Unrecognized);
    }

    #[test]
    fn test_extract_geometry_encoded() {
        let geometry = extract_geometry(&encoded_routes_payload()).unwrap();
        let line = geometry.coordinates().unwrap();
        assert_eq!(line.len(), 3);
        assert!((line[0].lat - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_extract_geometry_feature_collection() {
        let geometry = extract_geometry(&feature_collection_payload()).unwrap();
        let line = geometry.coordinates().unwrap();
        assert_eq!(line.len(), 2);
        assert!((line[0].lon - (-46.63)).abs() < 1e-9);
    }

    #[test]
    fn test_extract_geometry_multi_line() {
        let payload = json!({
            "features": [{
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [
                        [[-46.63, -23.55], [-46.62, -23.54]],
                        [[-46.62, -23.54], [-46.60, -23.50]]
                    ]
                }
            }]
        });
        let line = extract_geometry(&payload).unwrap().coordinates().unwrap();
        assert_eq!(line.len(), 4);
    }

    #[test]
    fn test_extract_geometry_skips_point_features() {
        let payload = json!({
            "features": [
                { "geometry": { "type": "Point", "coordinates": [-46.63, -23.55] } },
                { "geometry": {
                    "type": "LineString",
                    "coordinates": [[-46.63, -23.55], [-46.60, -23.50]]
                } }
            ]
        });
        let line = extract_geometry(&payload).unwrap().coordinates().unwrap();
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn test_extract_geometry_missing() {
        assert!(extract_geometry(&json!({"erro": "sem rota"})).is_none());
        assert!(extract_geometry(&json!({"features": []})).is_none());
    }

    #[test]
    fn test_malformed_encoded_geometry_decodes_to_none() {
        let geometry = RouteGeometry::Encoded("\u{1}\u{2}".to_string());
        assert!(geometry.coordinates().is_none());
    }

    #[test]
    fn test_extract_summary_routes_shape() {
        let summary = extract_summary(&encoded_routes_payload());
        assert_eq!(summary.distance_m, Some(1234.5));
        assert_eq!(summary.duration_s, Some(600.0));
    }

    #[test]
    fn test_extract_summary_feature_properties() {
        let summary = extract_summary(&feature_collection_payload());
        assert_eq!(summary.distance_m, Some(5234.0));
        assert_eq!(summary.duration_s, Some(930.0));
    }

    #[test]
    fn test_extract_summary_segments() {
        let summary = extract_summary(&segmented_payload());
        assert_eq!(summary.distance_m, Some(5234.0));
        assert_eq!(summary.duration_s, Some(930.0));
    }

    #[test]
    fn test_extract_summary_prefers_routes_over_features() {
        let mut payload = feature_collection_payload();
        payload["routes"] = json!([{ "summary": { "distance": 1.0, "duration": 2.0 } }]);
        let summary = extract_summary(&payload);
        assert_eq!(summary.distance_m, Some(1.0));
        assert_eq!(summary.duration_s, Some(2.0));
    }

    #[test]
    fn test_extract_summary_numeric_strings() {
        let payload = json!({
            "routes": [{ "summary": { "distance": "5234", "duration": "930" } }]
        });
        let summary = extract_summary(&payload);
        assert_eq!(summary.distance_m, Some(5234.0));
        assert_eq!(summary.duration_s, Some(930.0));
    }

    #[test]
    fn test_extract_summary_absent() {
        let summary = extract_summary(&json!({"foo": 1}));
        assert_eq!(summary, SummaryExtract::default());
    }

    #[test]
    fn test_extract_steps() {
        let steps = extract_steps(&segmented_payload());
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].instruction, "Head north");
        assert!((steps[0].distance_m - 120.4).abs() < 1e-9);
        assert_eq!(steps[1].instruction, "Turn right");
        assert_eq!(steps[2].instruction, "Step");
    }

    #[test]
    fn test_extract_steps_routes_shape() {
        let payload = json!({
            "routes": [{
                "segments": [{ "steps": [{ "instruction": "Go", "distance": 10 }] }]
            }]
        });
        let steps = extract_steps(&payload);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].instruction, "Go");
    }

    #[test]
    fn test_extract_steps_none() {
        assert!(extract_steps(&feature_collection_payload()).is_empty());
    }

    #[test]
    fn test_extract_optimization() {
        let payload = json!({
            "features": [{
                "properties": {
                    "optimization": {
                        "enabled": true,
                        "reasoning": "Avoided flooded avenue",
                        "weather": "Heavy rain",
                        "traffic_factor": 1.3
                    }
                }
            }]
        });
        let info = extract_optimization(&payload).unwrap();
        assert_eq!(info.reasoning, "Avoided flooded avenue");
        assert_eq!(info.weather, "Heavy rain");
        assert!((info.traffic_factor - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_extract_optimization_disabled_or_absent() {
        let disabled = json!({
            "features": [{ "properties": { "optimization": { "enabled": false } } }]
        });
        assert!(extract_optimization(&disabled).is_none());
        assert!(extract_optimization(&feature_collection_payload()).is_none());
    }

    #[test]
    fn test_renderer_fallback_labels() {
        let payload = json!({
            "features": [{
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": { "distance": "5.2 km", "duration": "16 min" }
            }]
        });
        let summary = renderer_fallback_summary(&payload);
        assert_eq!(summary.distance_m, Some(5200.0));
        assert_eq!(summary.duration_s, Some(960.0));
    }

    #[test]
    fn test_renderer_fallback_bare_numbers() {
        let payload = json!({
            "features": [{
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": { "length": 850.0, "time": 120.0 }
            }]
        });
        let summary = renderer_fallback_summary(&payload);
        assert_eq!(summary.distance_m, Some(850.0));
        assert_eq!(summary.duration_s, Some(120.0));
    }

    #[test]
    fn test_parse_distance_value_units() {
        assert_eq!(parse_distance_value(&json!("850 m")), Some(850.0));
        assert_eq!(parse_distance_value(&json!("5,2 km")), Some(5200.0));
        assert_eq!(parse_distance_value(&json!(null)), None);
    }

    #[test]
    fn test_parse_duration_value_units() {
        assert_eq!(parse_duration_value(&json!("1.5 h")), Some(5400.0));
        assert_eq!(parse_duration_value(&json!("30 min")), Some(1800.0));
        assert_eq!(parse_duration_value(&json!("12")), Some(720.0));
    }

    #[test]
    fn test_constraints_wire_shape() {
        let mut constraints = RouteConstraints::default();
        assert!(constraints.is_empty());
        constraints.set_avoid("toll", true);
        constraints.set_avoid("toll", true);
        constraints.set_preference(Some("fastest"));
        assert!(!constraints.is_empty());
        assert_eq!(constraints.avoid, vec!["toll"]);
        assert_eq!(constraints.prefer, vec!["fastest"]);
        constraints.set_avoid("toll", false);
        constraints.set_preference(None);
        assert!(constraints.is_empty());
    }
}
