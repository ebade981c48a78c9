//! 3-D spatial grouping of the current fleet. Latitude, longitude and
//! altitude (km) are treated as three unweighted Euclidean coordinates; an
//! intentional simplification, not a geodesic metric.

mod kmeans;

use serde::Serialize;
use utoipa::ToSchema;

pub use kmeans::{k_means, KMeansResult};

use crate::constellation::TrackMap;

const KMEANS_ITERS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
    pub alt_km: f64,
}

/// One cluster of the current fleet, immutable once built.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Cluster {
    pub id: String,
    pub size: usize,
    pub centroid: Centroid,
    pub members: Vec<String>,
}

/// Cluster every track's latest position into at most `k` groups.
///
/// Tracks whose latest position lacks a finite latitude, longitude or
/// altitude are left out. Final centroids are recomputed as the plain mean of
/// actual member positions rather than taken from the last k-means estimate.
/// Pure function: a second run with a different `k` shares no state.
pub fn cluster_latest_points(tracks: &TrackMap, k: usize) -> Vec<Cluster> {
    let mut ids = Vec::new();
    let mut points: Vec<[f64; 3]> = Vec::new();

    for (id, samples) in tracks {
        let Some(last) = samples.last() else { continue };
        let Some(alt_km) = last.alt_km else { continue };
        if !last.lat.is_finite() || !last.lon.is_finite() || !alt_km.is_finite() {
            continue;
        }
        ids.push(id.clone());
        points.push([last.lat, last.lon, alt_km]);
    }

    if points.is_empty() {
        return Vec::new();
    }

    let k_eff = k.clamp(1, points.len());
    let result = k_means(&points, k_eff, KMEANS_ITERS);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k_eff];
    for (i, &label) in result.labels.iter().enumerate() {
        members[label].push(i);
    }

    members
        .into_iter()
        .enumerate()
        .map(|(c, idxs)| {
            let centroid = if idxs.is_empty() {
                // Empty partition: fall back to the k-means estimate.
                Centroid {
                    lat: result.centroids[c][0],
                    lon: result.centroids[c][1],
                    alt_km: result.centroids[c][2],
                }
            } else {
                let n = idxs.len() as f64;
                let sum = idxs.iter().fold([0.0f64; 3], |acc, &i| {
                    [
                        acc[0] + points[i][0],
                        acc[1] + points[i][1],
                        acc[2] + points[i][2],
                    ]
                });
                Centroid {
                    lat: sum[0] / n,
                    lon: sum[1] / n,
                    alt_km: sum[2] / n,
                }
            };

            Cluster {
                id: format!("C{}", c + 1),
                size: idxs.len(),
                centroid,
                members: idxs.iter().map(|&i| ids[i].clone()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constellation::Position;
    use chrono::{DateTime, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-30T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn track(lat: f64, lon: f64, alt_km: Option<f64>) -> Vec<Position> {
        vec![Position {
            t: t0(),
            lat,
            lon,
            alt_km,
            wind_kmh: None,
            wind_from_deg: None,
        }]
    }

    fn fleet(positions: &[(f64, f64, Option<f64>)]) -> TrackMap {
        positions
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon, alt))| (format!("b{:03}", i), track(lat, lon, alt)))
            .collect()
    }

    #[test]
    fn sizes_sum_to_the_number_of_valid_tracks() {
        let tracks = fleet(&[
            (0.0, 0.0, Some(10.0)),
            (0.1, 0.1, Some(10.0)),
            (50.0, 50.0, Some(18.0)),
            (50.1, 50.1, Some(18.0)),
            (20.0, 20.0, None), // no altitude: excluded
        ]);

        let clusters = cluster_latest_points(&tracks, 2);
        let total: usize = clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, 4);
        for c in &clusters {
            assert_eq!(c.size, c.members.len());
        }
    }

    #[test]
    fn cluster_count_is_bounded_by_min_of_k_and_n() {
        let tracks = fleet(&[(0.0, 0.0, Some(10.0)), (1.0, 1.0, Some(10.0))]);
        let clusters = cluster_latest_points(&tracks, 100);
        assert!(!clusters.is_empty());
        assert!(clusters.len() <= 2);
    }

    #[test]
    fn empty_input_yields_empty_cluster_list() {
        let clusters = cluster_latest_points(&TrackMap::new(), 100);
        assert!(clusters.is_empty());
    }

    #[test]
    fn centroid_is_the_mean_of_member_positions() {
        let tracks = fleet(&[(0.0, 0.0, Some(10.0)), (2.0, 4.0, Some(14.0))]);
        let clusters = cluster_latest_points(&tracks, 1);
        assert_eq!(clusters.len(), 1);
        let c = &clusters[0];
        assert_eq!(c.centroid.lat, 1.0);
        assert_eq!(c.centroid.lon, 2.0);
        assert_eq!(c.centroid.alt_km, 12.0);
        assert_eq!(c.id, "C1");
    }

    #[test]
    fn rerun_with_same_input_is_identical() {
        let tracks = fleet(
            &(0..30)
                .map(|i| {
                    let f = i as f64;
                    (f.sin() * 40.0, f.cos() * 80.0, Some(8.0 + (f * 0.3).cos() * 6.0))
                })
                .collect::<Vec<_>>(),
        );

        let a = cluster_latest_points(&tracks, 5);
        let b = cluster_latest_points(&tracks, 5);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.members, y.members);
            assert_eq!(x.centroid.lat, y.centroid.lat);
            assert_eq!(x.centroid.lon, y.centroid.lon);
            assert_eq!(x.centroid.alt_km, y.centroid.alt_km);
        }
    }
}
