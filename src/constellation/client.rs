use std::time::Duration;

use tokio::task::JoinSet;

use super::types::HourPayload;

pub const WINDOW_HOURS: usize = 24;

const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Fetches the 24 hourly snapshot files (`{base}/00.json` .. `{base}/23.json`).
/// A failed or malformed hour becomes `None`; only the stitcher decides
/// whether the window as a whole is unusable.
pub struct SnapshotClient {
    http: reqwest::Client,
    base_url: String,
}

impl SnapshotClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch all hours concurrently. The result is indexed by hour
    /// (0 = most recent) regardless of completion order.
    pub async fn fetch_window(&self) -> Vec<Option<HourPayload>> {
        let mut hours: Vec<Option<HourPayload>> = (0..WINDOW_HOURS).map(|_| None).collect();
        let mut set = JoinSet::new();

        for i in 0..WINDOW_HOURS {
            let http = self.http.clone();
            let url = format!("{}/{:02}.json", self.base_url.trim_end_matches('/'), i);
            set.spawn(async move { (i, fetch_hour(&http, &url).await) });
        }

        while let Some(joined) = set.join_next().await {
            if let Ok((i, payload)) = joined {
                hours[i] = payload;
            }
        }

        hours
    }
}

async fn fetch_hour(http: &reqwest::Client, url: &str) -> Option<HourPayload> {
    let response = match http.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            log::warn!("snapshot fetch failed for {url}: {e}");
            return None;
        }
    };

    let response = match response.error_for_status() {
        Ok(r) => r,
        Err(e) => {
            log::warn!("snapshot fetch for {url} returned an error status: {e}");
            return None;
        }
    };

    match response.json::<HourPayload>().await {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!("snapshot payload for {url} did not parse: {e}");
            None
        }
    }
}
