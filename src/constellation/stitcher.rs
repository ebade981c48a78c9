use chrono::{DateTime, Duration, Utc};

use crate::geo::haversine_km;

use super::error::ConstellationError;
use super::types::{HourPayload, Position, RawPoint, TrackMap};

/// Hard cap on hour-to-hour displacement. Generous enough for stratospheric
/// drift, tight enough to reject swaps between distant balloons.
pub const MAX_LINK_KM: f64 = 1200.0;

/// Tracks that never get a second sample are treated as noise.
const MIN_TRACK_SAMPLES: usize = 2;

/// Last known position of a track, the anchor for next-hour matching.
struct Tail {
    id: String,
    lat: f64,
    lon: f64,
}

struct Candidate {
    track: usize,
    point: usize,
    dist_km: f64,
}

/// Reconstruct tracks from an ordered window of hourly snapshots
/// (index 0 = most recent hour, 23 = oldest).
///
/// The first non-null hour seeds one track per point; every later hour is
/// greedily matched against current track tails under [`MAX_LINK_KM`].
/// Output samples are chronological (oldest first) and only tracks with at
/// least two samples survive.
pub fn stitch_window(
    hours: &[Option<HourPayload>],
    now: DateTime<Utc>,
) -> Result<TrackMap, ConstellationError> {
    let first_good = hours
        .iter()
        .position(|h| h.is_some())
        .ok_or(ConstellationError::NoData)?;

    let mut by_id = TrackMap::new();
    let mut tails: Vec<Tail> = Vec::new();
    let mut next_id = 0usize;

    for (i, payload) in hours.iter().enumerate().skip(first_good) {
        let Some(payload) = payload else { continue };
        let t = now - Duration::hours(i as i64);
        let points = payload.points();
        if points.is_empty() {
            continue;
        }

        if tails.is_empty() {
            for p in &points {
                open_track(&mut by_id, &mut tails, &mut next_id, p, t);
            }
            continue;
        }

        let mut point_taken = vec![false; points.len()];
        for c in match_hour(&tails, &points) {
            point_taken[c.point] = true;
            if let Some(track) = by_id.get_mut(&tails[c.track].id) {
                track.push(sample(&points[c.point], t));
            }
        }

        for (pi, p) in points.iter().enumerate() {
            if !point_taken[pi] {
                open_track(&mut by_id, &mut tails, &mut next_id, p, t);
            }
        }

        // Advance every tail to its track's newest appended sample. Tracks
        // that went unmatched this hour keep their anchor and stay eligible.
        for tail in &mut tails {
            if let Some(last) = by_id.get(&tail.id).and_then(|track| track.last()) {
                tail.lat = last.lat;
                tail.lon = last.lon;
            }
        }
    }

    for track in by_id.values_mut() {
        track.sort_by_key(|p| p.t);
    }
    by_id.retain(|_, track| track.len() >= MIN_TRACK_SAMPLES);

    if by_id.is_empty() {
        return Err(ConstellationError::NoData);
    }
    Ok(by_id)
}

/// Greedy nearest-neighbor assignment: all tail/point pairs under the cap,
/// ascending by distance (stable sort, so ties keep enumeration order), each
/// tail and each point claimed at most once. Deliberately not an optimal
/// bipartite matching; identities only need to be locally plausible.
fn match_hour(tails: &[Tail], points: &[RawPoint]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (ti, tail) in tails.iter().enumerate() {
        for (pi, p) in points.iter().enumerate() {
            let d = haversine_km(tail.lat, tail.lon, p.lat, p.lon);
            if d <= MAX_LINK_KM {
                candidates.push(Candidate {
                    track: ti,
                    point: pi,
                    dist_km: d,
                });
            }
        }
    }
    candidates.sort_by(|a, b| a.dist_km.total_cmp(&b.dist_km));

    let mut track_taken = vec![false; tails.len()];
    let mut point_taken = vec![false; points.len()];
    let mut assignments = Vec::new();
    for c in candidates {
        if track_taken[c.track] || point_taken[c.point] {
            continue;
        }
        track_taken[c.track] = true;
        point_taken[c.point] = true;
        assignments.push(c);
    }
    assignments
}

fn open_track(
    by_id: &mut TrackMap,
    tails: &mut Vec<Tail>,
    next_id: &mut usize,
    p: &RawPoint,
    t: DateTime<Utc>,
) {
    let id = format!("b{:03}", *next_id);
    *next_id += 1;
    by_id.insert(id.clone(), vec![sample(p, t)]);
    tails.push(Tail {
        id,
        lat: p.lat,
        lon: p.lon,
    });
}

fn sample(p: &RawPoint, t: DateTime<Utc>) -> Position {
    Position {
        t,
        lat: p.lat,
        lon: p.lon,
        alt_km: p.alt_km,
        wind_kmh: p.wind_kmh,
        wind_from_deg: p.wind_from_deg,
    }
}
