use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::error::WeatherError;
use super::types::{ClusterWeather, ForecastRequest};

const FORECAST_TIMEOUT: Duration = Duration::from_secs(15);

/// Anything that can resolve one pressure-level forecast. The orchestrator is
/// written against this so its pooling and retry behavior can be exercised
/// without a network.
pub trait ForecastProvider: Send + Sync + 'static {
    /// `Ok(None)` means the upstream answered but had no usable time series;
    /// that outcome is not retried.
    fn level_forecast(
        &self,
        req: ForecastRequest,
    ) -> impl Future<Output = Result<Option<ClusterWeather>, WeatherError>> + Send;
}

/// Open-Meteo style forecast client: one GET per cluster centroid,
/// parameterized by coordinate and a single pressure level.
pub struct ForecastClient {
    http: reqwest::Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(FORECAST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl ForecastProvider for ForecastClient {
    async fn level_forecast(
        &self,
        req: ForecastRequest,
    ) -> Result<Option<ClusterWeather>, WeatherError> {
        let level = req.level_hpa;
        let hourly = format!(
            "wind_speed_{level}hPa,wind_direction_{level}hPa,temperature_{level}hPa,temperature_2m"
        );
        let url = format!("{}/v1/forecast", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", req.lat.to_string()),
                ("longitude", req.lon.to_string()),
                ("pressure_levels", level.to_string()),
                ("hourly", hourly),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }

        let body: ForecastResponse = response.json().await?;
        Ok(extract_latest(body, level))
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlySeries>,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    time: Vec<String>,
    /// Remaining arrays are keyed by names that embed the pressure level
    /// (e.g. `wind_speed_250hPa`), so they are captured generically.
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

/// Sample the series at the latest available time index ("current-ish"),
/// null-coalescing each field independently.
fn extract_latest(body: ForecastResponse, level_hpa: u16) -> Option<ClusterWeather> {
    let hourly = body.hourly?;
    if hourly.time.is_empty() {
        return None;
    }
    let i = hourly.time.len() - 1;

    let field = |name: String| -> Option<f64> {
        hourly
            .series
            .get(&name)
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.get(i))
            .and_then(|v| v.as_f64())
    };

    Some(ClusterWeather {
        wind_kmh: field(format!("wind_speed_{level_hpa}hPa")),
        wind_from_deg: field(format!("wind_direction_{level_hpa}hPa")),
        temp_alt_c: field(format!("temperature_{level_hpa}hPa")),
        temp_ground_c: field("temperature_2m".to_string()),
        level_hpa,
    })
}
