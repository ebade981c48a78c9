use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::constellation::SnapshotClient;
use crate::weather::ForecastClient;

use super::api::report as report_handlers;
use super::api_doc::ApiDoc;
use super::config::{Config, ConfigError};
use super::state::{spawn_refresher, AppState};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn run_server(config: Config) -> Result<(), ServeError> {
    let bind_addr = config.web.bind.clone();
    let interval = config.refresh.interval()?;

    let snapshots = SnapshotClient::new(config.snapshots.base_url.clone())?;
    let forecast = Arc::new(ForecastClient::new(config.weather.base_url.clone())?);

    // A queue depth of 1 is enough: a pending trigger already guarantees a
    // fresh run, extra triggers would only pile up.
    let (refresh_tx, refresh_rx) = mpsc::channel(1);
    let state = AppState::new(Arc::new(config), refresh_tx);
    spawn_refresher(state.clone(), snapshots, forecast, interval, refresh_rx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/report", get(report_handlers::report))
        .route("/api/report/rows", get(report_handlers::rows))
        .route("/api/report/tracks", get(report_handlers::tracks))
        .route("/api/report/clusters", get(report_handlers::clusters))
        .route("/api/report/kinematics", get(report_handlers::kinematics))
        .route("/api/report/weather", get(report_handlers::weather))
        .route("/api/status", get(report_handlers::status))
        .route("/api/refresh", post(report_handlers::refresh))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
