mod client;
mod error;
mod levels;
mod orchestrator;
mod types;

pub use client::{ForecastClient, ForecastProvider};
pub use error::WeatherError;
pub use levels::nearest_level_for_alt_km;
pub use orchestrator::fetch_weather_for_clusters;
pub use types::{ClusterWeather, ForecastRequest};
