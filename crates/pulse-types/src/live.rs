use serde::{Deserialize, Serialize};

/// Point-in-time counters reported by the game server. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub connected_users: u64,
    pub active_matches: u64,
    pub users_in_lobby: u64,
    pub users_in_match: u64,
}

impl LiveSnapshot {
    /// Snapshot reported when the game server cannot be reached.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_game_server_body() {
        let body = r#"{"connectedUsers":42,"activeMatches":5,"usersInLobby":12,"usersInMatch":30,"uptime":991}"#;
        let snapshot: LiveSnapshot = serde_json::from_str(body).expect("parse snapshot");
        assert_eq!(snapshot.connected_users, 42);
        assert_eq!(snapshot.active_matches, 5);
        assert_eq!(snapshot.users_in_lobby, 12);
        assert_eq!(snapshot.users_in_match, 30);
    }

    #[test]
    fn rejects_negative_and_missing_counters() {
        assert!(serde_json::from_str::<LiveSnapshot>(r#"{"connectedUsers":-1,"activeMatches":0,"usersInLobby":0,"usersInMatch":0}"#).is_err());
        assert!(serde_json::from_str::<LiveSnapshot>(r#"{"connectedUsers":3}"#).is_err());
    }

    #[test]
    fn unavailable_snapshot_is_all_zero() {
        assert!(LiveSnapshot::unavailable().is_zero());
    }
}
