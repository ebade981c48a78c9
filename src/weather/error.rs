use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("forecast request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success status from the forecast endpoint. 429 lands here and is
    /// retried like any other transient failure.
    #[error("forecast endpoint returned status {0}")]
    Status(reqwest::StatusCode),
}
