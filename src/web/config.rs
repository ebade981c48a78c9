use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::PipelineOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid refresh interval {value:?}: {message}")]
    Interval { value: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub snapshots: SnapshotsConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotsConfig {
    /// Base URL serving `00.json` .. `23.json`.
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
        }
    }
}

fn default_weather_url() -> String {
    "https://api.open-meteo.com".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,
    #[serde(default = "default_coarse_cluster_count")]
    pub coarse_cluster_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster_count: default_cluster_count(),
            coarse_cluster_count: default_coarse_cluster_count(),
        }
    }
}

fn default_cluster_count() -> usize {
    100
}

fn default_coarse_cluster_count() -> usize {
    10
}

impl PipelineConfig {
    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            cluster_count: self.cluster_count,
            coarse_cluster_count: self.coarse_cluster_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Human-readable duration, e.g. "10m" or "1h 30m".
    #[serde(default = "default_refresh_interval")]
    pub interval: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_refresh_interval(),
        }
    }
}

fn default_refresh_interval() -> String {
    "10m".to_string()
}

impl RefreshConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(self.interval.trim()).map_err(|e| ConfigError::Interval {
            value: self.interval.clone(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    TriggerRefresh,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config =
            serde_yaml::from_str("snapshots:\n  base_url: https://example.com/telemetry\n")
                .unwrap();

        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.pipeline.cluster_count, 100);
        assert_eq!(config.pipeline.coarse_cluster_count, 10);
        assert_eq!(config.refresh.interval().unwrap(), Duration::from_secs(600));
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn api_keys_and_permissions_parse() {
        let config: Config = serde_yaml::from_str(
            r#"
snapshots:
  base_url: https://example.com/telemetry
refresh:
  interval: 90s
api_keys:
  - key: secret
    name: ops
    permissions: [trigger_refresh]
"#,
        )
        .unwrap();

        assert_eq!(config.refresh.interval().unwrap(), Duration::from_secs(90));
        let key = config.find_api_key("secret").unwrap();
        assert_eq!(key.name, "ops");
        assert!(key.permissions.contains(&Permission::TriggerRefresh));
    }

    #[test]
    fn bad_interval_is_rejected() {
        let config: Config =
            serde_yaml::from_str("snapshots:\n  base_url: u\nrefresh:\n  interval: often\n")
                .unwrap();
        assert!(config.refresh.interval().is_err());
    }
}
