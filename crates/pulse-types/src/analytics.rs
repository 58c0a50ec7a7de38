//! Response payloads produced by the aggregation and analytics operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{live::LiveSnapshot, records::PeakStatSnapshot};

/// Win-rate balance over a bounded sample of recent matches. Rates are
/// sample statistics, not population statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceMetrics {
    pub impostor_win_rate: f64,
    pub avg_duration_minutes: f64,
    pub abandonment_rate: f64,
    pub sample_size: usize,
    pub impostor_wins: usize,
    pub friends_wins: usize,
    pub valid_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: String,
    pub display_name: Option<String>,
    pub points: f64,
    pub games_played: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeaderboards {
    pub top_by_points: Vec<LeaderboardEntry>,
    pub top_by_games: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWindow {
    pub today_start: DateTime<Utc>,
    pub week_ago_start: DateTime<Utc>,
}

/// Raw counters pulled from the player collection for one activity window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    pub dau: u64,
    pub wau: u64,
    pub new_users_today: u64,
    pub total_users: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMetrics {
    pub dau: u64,
    pub wau: u64,
    pub new_users_today: u64,
    pub total_users: u64,
    /// Integer percentage.
    pub dau_wau_ratio: u64,
    pub window: ActivityWindow,
}

/// Dashboard payload for the aggregated stats operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatsPayload {
    pub live: LiveSnapshot,
    pub history: Vec<PeakStatSnapshot>,
    pub total_users: u64,
    pub total_matches: u64,
    // Legacy mirror fields read by older dashboard builds.
    pub active_users: u64,
    pub avg_session_minutes: u64,
    pub retention_rate: u64,
}
