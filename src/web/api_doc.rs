use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use crate::cluster::{Centroid, Cluster};
use crate::constellation::Position;
use crate::kinematics::TrackKinematics;
use crate::pipeline::{ClusterRow, PipelineReport};
use crate::weather::ClusterWeather;
use crate::web::state::RefreshStatus;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::report::report,
        super::api::report::rows,
        super::api::report::tracks,
        super::api::report::clusters,
        super::api::report::kinematics,
        super::api::report::weather,
        super::api::report::status,
        super::api::report::refresh,
    ),
    components(
        schemas(
            PipelineReport,
            ClusterRow,
            Cluster,
            Centroid,
            Position,
            TrackKinematics,
            ClusterWeather,
            RefreshStatus,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Strato-Watch Fleet API",
        description = "Balloon constellation analytics: tracks, clusters, kinematics and per-cluster weather",
        version = "0.1.0"
    ),
    tags(
        (name = "report", description = "Latest pipeline results"),
        (name = "status", description = "Refresh loop control")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
