//! Live telemetry from the game server.
//!
//! `TelemetrySource::fetch` reports unavailability as an error so the
//! boundary stays visible in the signature; `fetch_live_snapshot` is the
//! single place where that error is absorbed into a zeroed snapshot.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use pulse_types::{config::TelemetryConfig, live::LiveSnapshot, PulseError, Result};
use tokio::time::Duration;
use tracing::{debug, warn};

const STATS_PATH: &str = "/api/stats";

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Single attempt against the game server.
    async fn fetch(&self) -> Result<LiveSnapshot>;

    /// Never fails: unavailability yields [`LiveSnapshot::unavailable`].
    async fn fetch_live_snapshot(&self) -> LiveSnapshot {
        match self.fetch().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "live telemetry unavailable; reporting zeroed snapshot");
                LiveSnapshot::unavailable()
            }
        }
    }
}

/// Polls `GET {base_url}/api/stats` with a bounded request timeout.
#[derive(Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    stats_url: String,
}

impl HttpTelemetrySource {
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| {
                PulseError::Configuration(format!("failed to build telemetry client: {err}"))
            })?;
        Ok(Self {
            client,
            stats_url: stats_url(&config.base_url),
        })
    }

    pub fn stats_url(&self) -> &str {
        &self.stats_url
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch(&self) -> Result<LiveSnapshot> {
        debug!(url = %self.stats_url, "fetching live telemetry");
        let response = self
            .client
            .get(&self.stats_url)
            .send()
            .await
            .map_err(|err| telemetry_unavailable(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(telemetry_unavailable(format!(
                "game server answered with status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| telemetry_unavailable(format!("failed to read body: {err}")))?;
        serde_json::from_slice(&body)
            .map_err(|err| telemetry_unavailable(format!("malformed stats body: {err}")))
    }
}

/// Fixed-answer source for tests and offline runs.
#[derive(Clone)]
pub struct StaticTelemetrySource {
    snapshot: Option<LiveSnapshot>,
    calls: Arc<AtomicUsize>,
}

impl StaticTelemetrySource {
    pub fn available(snapshot: LiveSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            snapshot: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for StaticTelemetrySource {
    async fn fetch(&self) -> Result<LiveSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .ok_or_else(|| telemetry_unavailable("static source configured as unavailable"))
    }
}

pub fn telemetry_unavailable(message: impl Into<String>) -> PulseError {
    PulseError::TelemetryUnavailable(message.into())
}

fn stats_url(base_url: &str) -> String {
    format!("{}{STATS_PATH}", base_url.trim().trim_end_matches('/'))
}
