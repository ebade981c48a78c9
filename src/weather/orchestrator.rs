use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cluster::Cluster;

use super::client::ForecastProvider;
use super::levels::nearest_level_for_alt_km;
use super::types::{ClusterWeather, ForecastRequest};

/// Upstream is rate-limited; keep the fan-out polite.
const MAX_IN_FLIGHT: usize = 4;

const RETRY_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: f64 = 700.0;
const BACKOFF_MULTIPLIER: f64 = 1.8;
const JITTER_MS: u64 = 250;

/// Fetch one forecast per cluster centroid, at most [`MAX_IN_FLIGHT`]
/// requests outstanding at a time. Results land in a slot per request index,
/// so completion order never affects the output. A cluster whose request
/// exhausts its retries is simply absent from the result; the rest of the
/// batch is unaffected.
pub async fn fetch_weather_for_clusters<P: ForecastProvider>(
    provider: Arc<P>,
    clusters: &[Cluster],
) -> BTreeMap<String, ClusterWeather> {
    if clusters.is_empty() {
        return BTreeMap::new();
    }

    let requests: Vec<ForecastRequest> = clusters
        .iter()
        .map(|c| ForecastRequest {
            cluster_id: c.id.clone(),
            lat: c.centroid.lat,
            lon: c.centroid.lon,
            level_hpa: nearest_level_for_alt_km(c.centroid.alt_km),
        })
        .collect();

    let semaphore = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
    let mut workers = JoinSet::new();
    for (idx, req) in requests.iter().cloned().enumerate() {
        let provider = provider.clone();
        let semaphore = semaphore.clone();
        workers.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (idx, None);
            };
            (idx, fetch_with_retry(provider.as_ref(), &req).await)
        });
    }

    let mut slots: Vec<Option<ClusterWeather>> = vec![None; requests.len()];
    while let Some(joined) = workers.join_next().await {
        if let Ok((idx, weather)) = joined {
            slots[idx] = weather;
        }
    }

    requests
        .into_iter()
        .zip(slots)
        .filter_map(|(req, weather)| weather.map(|w| (req.cluster_id, w)))
        .collect()
}

async fn fetch_with_retry<P: ForecastProvider>(
    provider: &P,
    req: &ForecastRequest,
) -> Option<ClusterWeather> {
    for attempt in 1..=RETRY_ATTEMPTS {
        match provider.level_forecast(req.clone()).await {
            Ok(weather) => return weather,
            Err(e) if attempt == RETRY_ATTEMPTS => {
                log::warn!(
                    "forecast for cluster {} failed after {RETRY_ATTEMPTS} attempts: {e}",
                    req.cluster_id
                );
                return None;
            }
            Err(e) => {
                log::debug!(
                    "forecast for cluster {} attempt {attempt} failed, backing off: {e}",
                    req.cluster_id
                );
                let backoff = BACKOFF_BASE_MS * BACKOFF_MULTIPLIER.powi(attempt as i32 - 1);
                let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
                tokio::time::sleep(Duration::from_millis(backoff as u64 + jitter)).await;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Centroid;
    use crate::weather::WeatherError;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
        fail_cluster: Option<&'static str>,
        fail_all: bool,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                fail_cluster: None,
                fail_all: false,
            }
        }
    }

    impl ForecastProvider for MockProvider {
        fn level_forecast(
            &self,
            req: ForecastRequest,
        ) -> impl Future<Output = Result<Option<ClusterWeather>, WeatherError>> + Send {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                if self.fail_all || self.fail_cluster == Some(req.cluster_id.as_str()) {
                    return Err(WeatherError::Status(
                        reqwest::StatusCode::TOO_MANY_REQUESTS,
                    ));
                }
                Ok(Some(ClusterWeather {
                    wind_kmh: Some(80.0),
                    wind_from_deg: Some(270.0),
                    temp_alt_c: Some(-50.0),
                    temp_ground_c: Some(12.0),
                    level_hpa: req.level_hpa,
                }))
            }
        }
    }

    fn clusters(n: usize) -> Vec<Cluster> {
        (0..n)
            .map(|i| Cluster {
                id: format!("C{}", i + 1),
                size: 1,
                centroid: Centroid {
                    lat: i as f64,
                    lon: i as f64,
                    alt_km: 12.0,
                },
                members: vec![format!("b{:03}", i)],
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_the_concurrency_cap() {
        let provider = Arc::new(MockProvider::new());
        let weather = fetch_weather_for_clusters(provider.clone(), &clusters(12)).await;

        assert_eq!(weather.len(), 12);
        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= MAX_IN_FLIGHT);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_cluster_does_not_affect_the_others() {
        let provider = Arc::new(MockProvider {
            fail_cluster: Some("C2"),
            ..MockProvider::new()
        });
        let weather = fetch_weather_for_clusters(provider, &clusters(3)).await;

        assert!(weather.contains_key("C1"));
        assert!(!weather.contains_key("C2"));
        assert!(weather.contains_key("C3"));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_yields_an_empty_map_after_retries() {
        let provider = Arc::new(MockProvider {
            fail_all: true,
            ..MockProvider::new()
        });
        let weather = fetch_weather_for_clusters(provider.clone(), &clusters(2)).await;

        assert!(weather.is_empty());
        // Each of the 2 requests was attempted exactly RETRY_ATTEMPTS times.
        assert_eq!(
            provider.calls.load(Ordering::SeqCst),
            2 * RETRY_ATTEMPTS as usize
        );
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_keyed_by_cluster_id() {
        let provider = Arc::new(MockProvider::new());
        let cls = clusters(5);
        let weather = fetch_weather_for_clusters(provider, &cls).await;

        for c in &cls {
            let wx = weather.get(&c.id).expect("every cluster gets weather");
            assert_eq!(wx.level_hpa, nearest_level_for_alt_km(c.centroid.alt_km));
        }
    }

    #[tokio::test]
    async fn empty_cluster_list_short_circuits() {
        let provider = Arc::new(MockProvider::new());
        let weather = fetch_weather_for_clusters(provider.clone(), &[]).await;
        assert!(weather.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
