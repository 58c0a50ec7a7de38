//! Records read from the document store. All of them are owned by other
//! services; this crate only ever deserializes them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WinningTeam {
    Impostor,
    Friends,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerParticipation {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub abandoned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub winning_team: Option<WinningTeam>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<PlayerParticipation>,
}

impl MatchRecord {
    /// Elapsed milliseconds, present only when both timestamps are known.
    /// Ordering of the two timestamps is not checked.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub games_played: u64,
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_seen_at: Option<DateTime<Utc>>,
}

/// Daily rollup written by the batch job. Fields beyond the two peaks are
/// carried through untouched. Rollups are keyed by `date`, so the store id is
/// read but never emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeakStatSnapshot {
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub id: String,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub peak_users: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub peak_matches: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Ranking keys supported by the player leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerRankKey {
    Points,
    GamesPlayed,
}

impl PlayerRankKey {
    pub fn field(self) -> &'static str {
        match self {
            PlayerRankKey::Points => "points",
            PlayerRankKey::GamesPlayed => "gamesPlayed",
        }
    }
}

/// Timestamp fields on player records usable as activity thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerTimestampField {
    LastPlayedAt,
    FirstSeenAt,
}

impl PlayerTimestampField {
    pub fn field(self) -> &'static str {
        match self {
            PlayerTimestampField::LastPlayedAt => "lastPlayedAt",
            PlayerTimestampField::FirstSeenAt => "firstSeenAt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_record_tolerates_unknown_team_and_missing_end() {
        let record: MatchRecord = serde_json::from_value(json!({
            "id": "m1",
            "startedAt": "2026-10-01T10:00:00Z",
            "endedAt": null,
            "winningTeam": "draw",
            "players": [{"playerId": "p1", "abandoned": true}, {"playerId": "p2"}]
        }))
        .expect("decode match");

        assert_eq!(record.winning_team, Some(WinningTeam::Other));
        assert_eq!(record.duration_ms(), None);
        assert!(record.players[0].abandoned);
        assert!(!record.players[1].abandoned);
    }

    #[test]
    fn match_duration_uses_both_timestamps() {
        let record: MatchRecord = serde_json::from_value(json!({
            "startedAt": "2026-10-01T10:00:00Z",
            "endedAt": "2026-10-01T10:10:00Z",
            "winningTeam": "friends"
        }))
        .expect("decode match");
        assert_eq!(record.duration_ms(), Some(600_000));
        assert_eq!(record.winning_team, Some(WinningTeam::Friends));
        assert!(record.players.is_empty());
    }

    #[test]
    fn peak_stats_keep_unknown_rollup_fields() {
        let snapshot: PeakStatSnapshot = serde_json::from_value(json!({
            "date": "2026-10-14",
            "peakUsers": 120,
            "peakMatches": 14,
            "avgLobbyWait": 3.5
        }))
        .expect("decode peak stats");
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2026, 10, 14).expect("date"));
        assert_eq!(snapshot.extra.get("avgLobbyWait"), Some(&json!(3.5)));
    }

    #[test]
    fn explicit_nulls_read_as_defaults() {
        let record: MatchRecord = serde_json::from_value(json!({
            "id": "m1",
            "startedAt": "2026-10-01T10:00:00Z",
            "players": [{"playerId": "p1", "abandoned": null}]
        }))
        .expect("decode match");
        assert!(!record.players[0].abandoned);

        let record: MatchRecord = serde_json::from_value(json!({
            "id": "m2",
            "startedAt": "2026-10-01T10:00:00Z",
            "players": null
        }))
        .expect("decode match");
        assert!(record.players.is_empty());

        let player: PlayerStatRecord = serde_json::from_value(json!({
            "id": "p1",
            "points": null,
            "gamesPlayed": null
        }))
        .expect("decode player");
        assert_eq!(player.points, 0.0);
        assert_eq!(player.games_played, 0);

        let snapshot: PeakStatSnapshot = serde_json::from_value(json!({
            "date": "2026-10-14",
            "peakUsers": null
        }))
        .expect("decode peak stats");
        assert_eq!(snapshot.peak_users, 0);
    }

    #[test]
    fn peak_stats_drop_store_id_on_output() {
        let snapshot: PeakStatSnapshot = serde_json::from_value(json!({
            "id": "2026-10-14",
            "date": "2026-10-14",
            "peakUsers": 120,
            "avgLobbyWait": 3.5
        }))
        .expect("decode peak stats");
        assert_eq!(snapshot.id, "2026-10-14");
        assert_eq!(snapshot.extra.get("id"), None);

        let out = serde_json::to_value(&snapshot).expect("encode peak stats");
        assert_eq!(out.get("id"), None);
        assert_eq!(out["peakUsers"], json!(120));
        assert_eq!(out["avgLobbyWait"], json!(3.5));
    }

    #[test]
    fn feedback_passes_payload_through() {
        let entry: FeedbackEntry = serde_json::from_value(json!({
            "id": "f1",
            "message": "lag in lobby",
            "rating": 2
        }))
        .expect("decode feedback");
        assert_eq!(entry.created_at, None);
        assert_eq!(entry.payload.get("message"), Some(&json!("lag in lobby")));

        let out = serde_json::to_value(&entry).expect("encode feedback");
        assert_eq!(out["rating"], json!(2));
        assert_eq!(out["id"], json!("f1"));
    }
}
