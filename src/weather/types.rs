use serde::Serialize;
use utoipa::ToSchema;

/// Forecast sample attached to one cluster. Individual fields are `None`
/// when the upstream series did not carry them.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClusterWeather {
    pub wind_kmh: Option<f64>,
    /// Meteorological "from" convention, 0-360.
    pub wind_from_deg: Option<f64>,
    pub temp_alt_c: Option<f64>,
    pub temp_ground_c: Option<f64>,
    pub level_hpa: u16,
}

/// One pending forecast lookup, already snapped to a pressure level.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub cluster_id: String,
    pub lat: f64,
    pub lon: f64,
    pub level_hpa: u16,
}
