use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cluster::Cluster;
use crate::constellation::TrackMap;
use crate::kinematics::TrackKinematics;
use crate::pipeline::{ClusterRow, PipelineReport};
use crate::weather::ClusterWeather;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AuthenticatedUser};
use crate::web::config::Permission;
use crate::web::state::{AppState, RefreshStatus};

async fn latest(state: &AppState) -> ApiResult<Arc<PipelineReport>> {
    state.latest.read().await.clone().ok_or(ApiError::NotReady)
}

#[utoipa::path(
    get,
    path = "/api/report",
    responses(
        (status = 200, description = "Latest pipeline report", body = PipelineReport),
        (status = 503, description = "No report yet", body = ErrorResponse)
    ),
    tag = "report"
)]
pub async fn report(State(state): State<AppState>) -> ApiResult<Json<Arc<PipelineReport>>> {
    Ok(Json(latest(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/report/rows",
    responses(
        (status = 200, description = "Flat per-cluster display rows", body = Vec<ClusterRow>),
        (status = 503, description = "No report yet", body = ErrorResponse)
    ),
    tag = "report"
)]
pub async fn rows(State(state): State<AppState>) -> ApiResult<Json<Vec<ClusterRow>>> {
    Ok(Json(latest(&state).await?.rows.clone()))
}

#[utoipa::path(
    get,
    path = "/api/report/tracks",
    responses(
        (status = 200, description = "Reconstructed tracks keyed by id", body = TrackMap),
        (status = 503, description = "No report yet", body = ErrorResponse)
    ),
    tag = "report"
)]
pub async fn tracks(State(state): State<AppState>) -> ApiResult<Json<TrackMap>> {
    Ok(Json(latest(&state).await?.tracks.clone()))
}

#[utoipa::path(
    get,
    path = "/api/report/clusters",
    responses(
        (status = 200, description = "Primary fleet clustering", body = Vec<Cluster>),
        (status = 503, description = "No report yet", body = ErrorResponse)
    ),
    tag = "report"
)]
pub async fn clusters(State(state): State<AppState>) -> ApiResult<Json<Vec<Cluster>>> {
    Ok(Json(latest(&state).await?.clusters.clone()))
}

#[utoipa::path(
    get,
    path = "/api/report/kinematics",
    responses(
        (status = 200, description = "Per-track kinematics", body = BTreeMap<String, TrackKinematics>),
        (status = 503, description = "No report yet", body = ErrorResponse)
    ),
    tag = "report"
)]
pub async fn kinematics(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, TrackKinematics>>> {
    Ok(Json(latest(&state).await?.kinematics.clone()))
}

#[utoipa::path(
    get,
    path = "/api/report/weather",
    responses(
        (status = 200, description = "Forecast per cluster id", body = BTreeMap<String, ClusterWeather>),
        (status = 503, description = "No report yet", body = ErrorResponse)
    ),
    tag = "report"
)]
pub async fn weather(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, ClusterWeather>>> {
    Ok(Json(latest(&state).await?.weather.clone()))
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Refresh loop status", body = RefreshStatus)
    ),
    tag = "status"
)]
pub async fn status(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.status.read().await.clone())
}

#[utoipa::path(
    post,
    path = "/api/refresh",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 202, description = "Refresh queued", body = RefreshStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "A refresh trigger is already queued", body = ErrorResponse)
    ),
    tag = "status"
)]
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<(axum::http::StatusCode, Json<RefreshStatus>)> {
    require_permission(&user, Permission::TriggerRefresh)?;
    if !state.request_refresh() {
        return Err(ApiError::Conflict("refresh_already_queued"));
    }
    log::info!("refresh triggered by {}", user.name);
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(state.status.read().await.clone()),
    ))
}
