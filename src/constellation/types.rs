use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One confirmed telemetry sample on a track.
///
/// Wind fields are only present when the raw feed carried them (object-form
/// points); array-form `[lat, lon, alt]` points never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub t: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    pub alt_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_kmh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_from_deg: Option<f64>,
}

/// Reconstructed tracks keyed by id (`b000`, `b001`, ...), samples oldest
/// first. BTreeMap keeps output ordering reproducible.
pub type TrackMap = BTreeMap<String, Vec<Position>>;

/// One raw hour file. The upstream feed serves either a flat array of
/// `[lat, lon, alt]` triples or an object keyed by arbitrary ids whose values
/// hold the point directly or nested under a position field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HourPayload {
    Points(Vec<serde_json::Value>),
    Keyed(BTreeMap<String, serde_json::Value>),
}

/// A coerced point before it is attached to any track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt_km: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub wind_from_deg: Option<f64>,
}

impl HourPayload {
    /// Coerce the hour's raw entries into canonical points, dropping anything
    /// without finite lat/lon. Keyed payloads are walked in sorted-key order
    /// so stitching stays deterministic for identical input.
    pub fn points(&self) -> Vec<RawPoint> {
        match self {
            HourPayload::Points(list) => list.iter().filter_map(coerce_point).collect(),
            HourPayload::Keyed(map) => map
                .values()
                .filter_map(|v| coerce_point(unwrap_nested(v)))
                .collect(),
        }
    }
}

/// Keyed entries sometimes nest the coordinates one level down.
fn unwrap_nested(value: &serde_json::Value) -> &serde_json::Value {
    ["position", "pos", "location"]
        .iter()
        .find_map(|k| value.get(k))
        .unwrap_or(value)
}

fn coerce_point(value: &serde_json::Value) -> Option<RawPoint> {
    if let Some(arr) = value.as_array() {
        if arr.len() < 2 {
            return None;
        }
        return Some(RawPoint {
            lat: finite(arr.first())?,
            lon: finite(arr.get(1))?,
            alt_km: finite(arr.get(2)),
            wind_kmh: None,
            wind_from_deg: None,
        });
    }

    if value.is_object() {
        return Some(RawPoint {
            lat: finite(value.get("lat"))?,
            lon: finite(value.get("lon"))?,
            alt_km: finite(value.get("alt")).or_else(|| finite(value.get("alt_km"))),
            wind_kmh: finite(value.get("windKmh")),
            wind_from_deg: finite(value.get("windFromDeg"))
                .or_else(|| finite(value.get("windDirDegFrom"))),
        });
    }

    None
}

fn finite(value: Option<&serde_json::Value>) -> Option<f64> {
    value.and_then(|v| v.as_f64()).filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_array_of_triples() {
        let payload: HourPayload = serde_json::from_value(json!([
            [10.0, 20.0, 12.5],
            [11.0, 21.0, null],
            [null, 21.0, 3.0],
            [95.5]
        ]))
        .unwrap();

        let pts = payload.points();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].lat, 10.0);
        assert_eq!(pts[0].alt_km, Some(12.5));
        assert_eq!(pts[1].alt_km, None);
    }

    #[test]
    fn parses_keyed_objects_with_nested_positions() {
        let payload: HourPayload = serde_json::from_value(json!({
            "x1": { "position": { "lat": 1.0, "lon": 2.0, "alt": 9.0 } },
            "x2": { "lat": 3.0, "lon": 4.0, "windKmh": 40.0, "windFromDeg": 270.0 },
            "x3": { "pos": { "lat": "bogus", "lon": 4.0 } }
        }))
        .unwrap();

        let pts = payload.points();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].alt_km, Some(9.0));
        assert_eq!(pts[1].wind_kmh, Some(40.0));
        assert_eq!(pts[1].wind_from_deg, Some(270.0));
    }

    #[test]
    fn keyed_points_come_out_in_sorted_key_order() {
        let payload: HourPayload = serde_json::from_value(json!({
            "b": { "lat": 2.0, "lon": 2.0 },
            "a": { "lat": 1.0, "lon": 1.0 }
        }))
        .unwrap();

        let pts = payload.points();
        assert_eq!(pts[0].lat, 1.0);
        assert_eq!(pts[1].lat, 2.0);
    }
}
