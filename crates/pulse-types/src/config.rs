use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{PulseError, Result};

/// Production game server queried for live counters.
pub const DEFAULT_TELEMETRY_BASE_URL: &str = "https://game.impostor-friends.io";
/// Environment variable that overrides `telemetry.base_url`.
pub const TELEMETRY_URL_ENV: &str = "GAME_SERVER_URL";

const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TELEMETRY_BASE_URL.into(),
            timeout_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub peak_stats_limit: usize,
    pub match_sample_limit: usize,
    pub leaderboard_limit: usize,
    pub feedback_limit: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            peak_stats_limit: 7,
            match_sample_limit: 1_000,
            leaderboard_limit: 10,
            feedback_limit: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivityConfig {
    /// Offset of the reference time zone used to decide where "today" starts.
    /// The offset is fixed: it does not follow daylight-saving transitions, so
    /// zones that observe DST need the value updated when their clocks change.
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpsConfig {
    pub log_level: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PulseConfig {
    pub telemetry: TelemetryConfig,
    pub history: HistoryConfig,
    pub activity: ActivityConfig,
    pub store: StoreConfig,
    pub ops: OpsConfig,
}

impl PulseConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            PulseError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            PulseError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    /// Replaces `telemetry.base_url` with `url` when it is non-empty. Callers
    /// pass the value of [`TELEMETRY_URL_ENV`].
    pub fn override_telemetry_url(&mut self, url: Option<String>) {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.telemetry.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.telemetry.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(PulseError::Configuration(
                "telemetry.base_url must be an http(s) URL".into(),
            ));
        }
        if self.telemetry.timeout_ms == 0 {
            return Err(PulseError::Configuration(
                "telemetry.timeout_ms must be greater than zero".into(),
            ));
        }
        if self.history.peak_stats_limit == 0 {
            return Err(PulseError::Configuration(
                "history.peak_stats_limit must be greater than zero".into(),
            ));
        }
        if self.history.match_sample_limit == 0 {
            return Err(PulseError::Configuration(
                "history.match_sample_limit must be greater than zero".into(),
            ));
        }
        if self.history.leaderboard_limit == 0 {
            return Err(PulseError::Configuration(
                "history.leaderboard_limit must be greater than zero".into(),
            ));
        }
        if self.history.feedback_limit == Some(0) {
            return Err(PulseError::Configuration(
                "history.feedback_limit must be greater than zero when set".into(),
            ));
        }
        if self.activity.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(PulseError::Configuration(
                "activity.utc_offset_minutes must be within +/-18 hours".into(),
            ));
        }
        Ok(())
    }
}
