//! End-to-end analytics run: stitch the 24-hour window into tracks, derive
//! kinematics, cluster the fleet, enrich clusters with forecasts, and join
//! everything into display rows. Pure with respect to ambient state; the
//! caller owns scheduling and result retention.

mod rows;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::cluster::{cluster_latest_points, Cluster};
use crate::constellation::{stitch_window, ConstellationError, HourPayload, TrackMap};
use crate::kinematics::{derive_kinematics, TrackKinematics};
use crate::weather::{fetch_weather_for_clusters, ClusterWeather, ForecastProvider};

pub use rows::{assemble_rows, ClusterRow};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline has no input: {0}")]
    NoData(#[from] ConstellationError),
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Primary fleet clustering.
    pub cluster_count: usize,
    /// Independent coarse clustering for the broad-strokes view.
    pub coarse_cluster_count: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cluster_count: 100,
            coarse_cluster_count: 10,
        }
    }
}

/// Everything one run produces; the sole contract with the rendering layer.
/// All collections are keyed by stable ids, never by completion order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PipelineReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub tracks: TrackMap,
    pub kinematics: BTreeMap<String, TrackKinematics>,
    pub clusters: Vec<Cluster>,
    pub coarse_clusters: Vec<Cluster>,
    pub weather: BTreeMap<String, ClusterWeather>,
    pub rows: Vec<ClusterRow>,
}

/// Run the pipeline over an already-fetched window of hourly payloads
/// (index 0 = most recent hour). Weather for the primary clusters is fetched
/// through `provider`; the coarse clustering is never enriched.
pub async fn run_pipeline<P: ForecastProvider>(
    hours: &[Option<HourPayload>],
    provider: Arc<P>,
    options: &PipelineOptions,
    now: DateTime<Utc>,
) -> Result<PipelineReport, PipelineError> {
    let tracks = stitch_window(hours, now)?;
    log::info!("stitched {} confirmed tracks", tracks.len());

    let kinematics = derive_kinematics(&tracks);
    let clusters = cluster_latest_points(&tracks, options.cluster_count);
    let coarse_clusters = cluster_latest_points(&tracks, options.coarse_cluster_count);
    log::info!(
        "clustered {} tracks into {} groups ({} coarse)",
        kinematics.len(),
        clusters.len(),
        coarse_clusters.len()
    );

    let weather = fetch_weather_for_clusters(provider, &clusters).await;
    log::info!(
        "weather resolved for {} of {} clusters",
        weather.len(),
        clusters.len()
    );

    let rows = assemble_rows(&clusters, &kinematics, &weather);

    Ok(PipelineReport {
        run_id: generate_run_id(now),
        generated_at: now,
        tracks,
        kinematics,
        clusters,
        coarse_clusters,
        weather,
        rows,
    })
}

fn generate_run_id(now: DateTime<Utc>) -> String {
    format!("{}_{}", now.format("%Y%m%dT%H%M%SZ"), uuid::Uuid::new_v4())
}
