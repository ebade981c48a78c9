use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::constellation::SnapshotClient;
use crate::pipeline::{run_pipeline, PipelineOptions, PipelineReport};
use crate::weather::ForecastClient;

use super::config::Config;

/// Shared handles behind every request handler. The latest report is the only
/// retained pipeline result; a new run replaces it wholesale.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub latest: Arc<RwLock<Option<Arc<PipelineReport>>>>,
    pub status: Arc<RwLock<RefreshStatus>>,
    refresh_tx: mpsc::Sender<()>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct RefreshStatus {
    pub last_run_id: Option<String>,
    pub last_completed: Option<DateTime<Utc>>,
    pub refreshing: bool,
    /// Human-readable reason the last run produced nothing, if it failed.
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(config: Arc<Config>, refresh_tx: mpsc::Sender<()>) -> Self {
        Self {
            config,
            latest: Arc::new(RwLock::new(None)),
            status: Arc::new(RwLock::new(RefreshStatus::default())),
            refresh_tx,
        }
    }

    /// Ask the refresher for an off-schedule run. Returns false when a
    /// trigger is already queued.
    pub fn request_refresh(&self) -> bool {
        self.refresh_tx.try_send(()).is_ok()
    }
}

/// Run the pipeline immediately, then again every `interval` or whenever a
/// manual trigger arrives, whichever comes first. Ends when every trigger
/// sender is gone.
pub fn spawn_refresher(
    state: AppState,
    snapshots: SnapshotClient,
    forecast: Arc<ForecastClient>,
    interval: Duration,
    mut refresh_rx: mpsc::Receiver<()>,
) -> JoinHandle<()> {
    let options = state.config.pipeline.options();
    tokio::spawn(async move {
        loop {
            refresh_once(&state, &snapshots, forecast.clone(), &options).await;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                trigger = refresh_rx.recv() => {
                    if trigger.is_none() {
                        break;
                    }
                    log::info!("manual refresh requested");
                }
            }
        }
    })
}

async fn refresh_once(
    state: &AppState,
    snapshots: &SnapshotClient,
    forecast: Arc<ForecastClient>,
    options: &PipelineOptions,
) {
    state.status.write().await.refreshing = true;

    let hours = snapshots.fetch_window().await;
    let outcome = run_pipeline(&hours, forecast, options, Utc::now()).await;

    let mut status = state.status.write().await;
    status.refreshing = false;
    match outcome {
        Ok(report) => {
            status.last_run_id = Some(report.run_id.clone());
            status.last_completed = Some(report.generated_at);
            status.last_error = None;
            *state.latest.write().await = Some(Arc::new(report));
        }
        Err(e) => {
            // Keep serving the previous report; only record why this run
            // produced nothing.
            log::warn!("pipeline run failed: {e}");
            status.last_error = Some(e.to_string());
        }
    }
}
