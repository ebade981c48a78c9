//! Per-track derived motion: last-hop speed and heading, plus the
//! wind-relative decomposition when the latest sample carries wind data.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::constellation::{Position, TrackMap};
use crate::geo::{bearing_deg, haversine_km, norm_360, signed_delta_deg};

/// Derived fields for one track. Every optional field is `None` when its
/// preconditions are unmet; absence of information is never reported as zero.
///
/// Wind direction is assumed to use the meteorological "from" convention.
/// If an upstream source reports "to" instead, the single `+180` conversion
/// below inverts every tailwind/headwind classification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackKinematics {
    pub latest: Position,
    pub heading_deg: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub wind_from_deg: Option<f64>,
    pub wind_to_deg: Option<f64>,
    /// |heading - wind-to| in degrees; 0 = pure tailwind, 180 = pure headwind.
    pub tailwind_delta_deg: Option<f64>,
    pub tailwind_kmh: Option<f64>,
    pub crosswind_kmh: Option<f64>,
}

/// Derive kinematics for every track with at least two samples; tracks with a
/// single sample still get a record carrying just their latest position.
pub fn derive_kinematics(tracks: &TrackMap) -> BTreeMap<String, TrackKinematics> {
    let mut out = BTreeMap::new();
    for (id, samples) in tracks {
        if let Some(kin) = derive_track(samples) {
            out.insert(id.clone(), kin);
        }
    }
    out
}

fn derive_track(samples: &[Position]) -> Option<TrackKinematics> {
    let latest = samples.last()?.clone();

    let mut kin = TrackKinematics {
        latest: latest.clone(),
        heading_deg: None,
        speed_kmh: None,
        wind_kmh: None,
        wind_from_deg: None,
        wind_to_deg: None,
        tailwind_delta_deg: None,
        tailwind_kmh: None,
        crosswind_kmh: None,
    };

    if samples.len() < 2 {
        return Some(kin);
    }
    let prev = &samples[samples.len() - 2];

    let dist_km = haversine_km(prev.lat, prev.lon, latest.lat, latest.lon);
    let dt_hours = (latest.t - prev.t).num_milliseconds() as f64 / 3_600_000.0;
    if dt_hours > 0.0 {
        kin.speed_kmh = Some(dist_km / dt_hours);
    }

    let heading = bearing_deg(prev.lat, prev.lon, latest.lat, latest.lon);
    kin.heading_deg = Some(heading);

    // The delta needs only a wind direction; the component split additionally
    // needs a wind speed.
    if let Some(wind_from) = latest.wind_from_deg {
        let wind_to = norm_360(wind_from + 180.0);
        kin.wind_from_deg = Some(wind_from);
        kin.wind_to_deg = Some(wind_to);

        let delta_signed = signed_delta_deg(heading, wind_to);
        kin.tailwind_delta_deg = Some(delta_signed.abs());

        if let Some(wind_kmh) = latest.wind_kmh {
            kin.wind_kmh = Some(wind_kmh);
            let rad = delta_signed.to_radians();
            kin.tailwind_kmh = Some(wind_kmh * rad.cos());
            kin.crosswind_kmh = Some(wind_kmh * rad.sin());
        }
    }

    Some(kin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-30T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn pos(lat: f64, lon: f64, t: DateTime<Utc>) -> Position {
        Position {
            t,
            lat,
            lon,
            alt_km: Some(12.0),
            wind_kmh: None,
            wind_from_deg: None,
        }
    }

    fn single_track(samples: Vec<Position>) -> TrackMap {
        let mut map = TrackMap::new();
        map.insert("b000".into(), samples);
        map
    }

    #[test]
    fn one_degree_eastward_hop_in_one_hour() {
        let tracks = single_track(vec![
            pos(0.0, 0.0, t0()),
            pos(0.0, 1.0, t0() + Duration::hours(1)),
        ]);
        let derived = derive_kinematics(&tracks);
        let kin = &derived["b000"];

        let speed = kin.speed_kmh.unwrap();
        assert!((speed - 111.0).abs() < 1.5, "got {speed}");
        let heading = kin.heading_deg.unwrap();
        assert!((heading - 90.0).abs() < 0.01, "got {heading}");
    }

    #[test]
    fn zero_movement_is_a_real_zero_speed() {
        let tracks = single_track(vec![
            pos(10.0, 10.0, t0()),
            pos(10.0, 10.0, t0() + Duration::hours(1)),
        ]);
        let derived = derive_kinematics(&tracks);
        let kin = &derived["b000"];
        assert_eq!(kin.speed_kmh, Some(0.0));
    }

    #[test]
    fn non_positive_dt_yields_no_speed() {
        let tracks = single_track(vec![pos(0.0, 0.0, t0()), pos(0.0, 1.0, t0())]);
        let derived = derive_kinematics(&tracks);
        let kin = &derived["b000"];
        assert_eq!(kin.speed_kmh, None);
        // Heading is still well defined.
        assert!(kin.heading_deg.is_some());
    }

    #[test]
    fn missing_wind_stays_absent_not_zero() {
        let tracks = single_track(vec![
            pos(10.0, 10.0, t0()),
            pos(10.0, 11.0, t0() + Duration::hours(1)),
        ]);
        let derived = derive_kinematics(&tracks);
        let kin = &derived["b000"];
        assert_eq!(kin.tailwind_delta_deg, None);
        assert_eq!(kin.tailwind_kmh, None);
        assert_eq!(kin.crosswind_kmh, None);
    }

    #[test]
    fn wind_from_behind_is_a_pure_tailwind() {
        // Heading east; wind blowing from the west (270), i.e. toward 90.
        let mut latest = pos(0.0, 1.0, t0() + Duration::hours(1));
        latest.wind_kmh = Some(50.0);
        latest.wind_from_deg = Some(270.0);
        let tracks = single_track(vec![pos(0.0, 0.0, t0()), latest]);

        let derived = derive_kinematics(&tracks);
        let kin = &derived["b000"];
        let delta = kin.tailwind_delta_deg.unwrap();
        assert!(delta < 0.01, "got {delta}");
        let tail = kin.tailwind_kmh.unwrap();
        assert!((tail - 50.0).abs() < 0.01, "got {tail}");
        let cross = kin.crosswind_kmh.unwrap();
        assert!(cross.abs() < 0.01, "got {cross}");
    }

    #[test]
    fn wind_direction_without_speed_still_yields_the_delta() {
        let mut latest = pos(0.0, 1.0, t0() + Duration::hours(1));
        latest.wind_from_deg = Some(90.0); // blowing toward 270: pure headwind
        let tracks = single_track(vec![pos(0.0, 0.0, t0()), latest]);

        let derived = derive_kinematics(&tracks);
        let kin = &derived["b000"];
        let delta = kin.tailwind_delta_deg.unwrap();
        assert!((delta - 180.0).abs() < 0.01, "got {delta}");
        assert_eq!(kin.tailwind_kmh, None);
    }
}
