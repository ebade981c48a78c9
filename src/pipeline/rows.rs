use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::cluster::Cluster;
use crate::geo::{norm_360, signed_delta_deg};
use crate::kinematics::TrackKinematics;
use crate::weather::ClusterWeather;

/// One flat display row per cluster, joining membership, member kinematics
/// and the cluster's forecast.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClusterRow {
    pub cluster_id: String,
    pub size: usize,
    pub lat: f64,
    pub lon: f64,
    pub alt_km: f64,
    pub level_hpa: Option<u16>,
    pub wind_kmh: Option<f64>,
    pub wind_from_deg: Option<f64>,
    pub temp_ground_c: Option<f64>,
    pub temp_alt_c: Option<f64>,
    /// Mean of member ground speeds.
    pub speed_kmh: Option<f64>,
    /// Mean over members of |heading vs cluster wind-to|; 0 = tailwind,
    /// 180 = headwind.
    pub tail_head_delta_deg: Option<f64>,
}

pub fn assemble_rows(
    clusters: &[Cluster],
    kinematics: &BTreeMap<String, TrackKinematics>,
    weather: &BTreeMap<String, ClusterWeather>,
) -> Vec<ClusterRow> {
    clusters
        .iter()
        .map(|c| {
            let wx = weather.get(&c.id);
            let wind_from_deg = wx.and_then(|w| w.wind_from_deg);

            // Tail/head delta per member against the cluster-level wind.
            let tail_head_delta_deg = wind_from_deg.and_then(|from| {
                let wind_to = norm_360(from + 180.0);
                let deltas: Vec<f64> = c
                    .members
                    .iter()
                    .filter_map(|id| kinematics.get(id).and_then(|k| k.heading_deg))
                    .map(|heading| signed_delta_deg(heading, wind_to).abs())
                    .collect();
                mean(&deltas)
            });

            let speeds: Vec<f64> = c
                .members
                .iter()
                .filter_map(|id| kinematics.get(id).and_then(|k| k.speed_kmh))
                .collect();

            ClusterRow {
                cluster_id: c.id.clone(),
                size: c.size,
                lat: round_to(c.centroid.lat, 3),
                lon: round_to(c.centroid.lon, 3),
                alt_km: round_to(c.centroid.alt_km, 2),
                level_hpa: wx.map(|w| w.level_hpa),
                wind_kmh: wx.and_then(|w| w.wind_kmh),
                wind_from_deg,
                temp_ground_c: wx.and_then(|w| w.temp_ground_c),
                temp_alt_c: wx.and_then(|w| w.temp_alt_c),
                speed_kmh: mean(&speeds),
                tail_head_delta_deg,
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}
