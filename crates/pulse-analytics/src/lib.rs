//! Derived metrics over records already fetched from the store.
//!
//! Everything here is pure and deterministic. Rounding is part of the
//! contract: rates are percentages rounded to one decimal place, the
//! DAU/WAU ratio is a whole percentage.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use pulse_types::{
    analytics::{
        ActivityCounts, ActivityMetrics, ActivityWindow, BalanceMetrics, LeaderboardEntry,
        PlayerLeaderboards,
    },
    records::{MatchRecord, PlayerRankKey, PlayerStatRecord, WinningTeam},
};
use tracing::debug;

const MS_PER_MINUTE: f64 = 60_000.0;

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole * 100`, or zero when `whole` is zero.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Win-rate balance over a match sample. An empty sample yields all zeros.
pub fn balance_metrics(sample: &[MatchRecord]) -> BalanceMetrics {
    if sample.is_empty() {
        return BalanceMetrics::default();
    }

    let impostor_wins = sample
        .iter()
        .filter(|m| m.winning_team == Some(WinningTeam::Impostor))
        .count();
    let friends_wins = sample
        .iter()
        .filter(|m| m.winning_team == Some(WinningTeam::Friends))
        .count();
    let valid_matches = impostor_wins + friends_wins;

    let durations: Vec<i64> = sample.iter().filter_map(MatchRecord::duration_ms).collect();
    let avg_duration_minutes = if durations.is_empty() {
        0.0
    } else {
        let total_ms: i64 = durations.iter().sum();
        round_one_decimal(total_ms as f64 / durations.len() as f64 / MS_PER_MINUTE)
    };

    // Matches without a known outcome still contribute participations.
    let participations: usize = sample.iter().map(|m| m.players.len()).sum();
    let abandoned = sample
        .iter()
        .flat_map(|m| m.players.iter())
        .filter(|p| p.abandoned)
        .count();

    let metrics = BalanceMetrics {
        impostor_win_rate: round_one_decimal(percentage(impostor_wins, valid_matches)),
        avg_duration_minutes,
        abandonment_rate: round_one_decimal(percentage(abandoned, participations)),
        sample_size: sample.len(),
        impostor_wins,
        friends_wins,
        valid_matches,
    };
    debug!(?metrics, "computed balance metrics");
    metrics
}

/// Sorts `players` descending on `key` (stable on ties) and keeps the first
/// `limit`, numbering ranks from 1.
pub fn rank_players(
    players: &[PlayerStatRecord],
    key: PlayerRankKey,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&PlayerStatRecord> = players.iter().collect();
    match key {
        PlayerRankKey::Points => ranked.sort_by(|a, b| b.points.total_cmp(&a.points)),
        PlayerRankKey::GamesPlayed => ranked.sort_by(|a, b| b.games_played.cmp(&a.games_played)),
    }

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, player)| LeaderboardEntry {
            rank: index + 1,
            player_id: player.id.clone(),
            display_name: player.display_name.clone(),
            points: player.points,
            games_played: player.games_played,
        })
        .collect()
}

/// Two independent views; a player may appear in either, both or neither.
pub fn leaderboards(
    by_points: &[PlayerStatRecord],
    by_games: &[PlayerStatRecord],
    limit: usize,
) -> PlayerLeaderboards {
    PlayerLeaderboards {
        top_by_points: rank_players(by_points, PlayerRankKey::Points, limit),
        top_by_games: rank_players(by_games, PlayerRankKey::GamesPlayed, limit),
    }
}

/// Midnight of `now`'s calendar day in `offset`, and the instant seven days
/// before it.
pub fn activity_window(now: DateTime<Utc>, offset: FixedOffset) -> ActivityWindow {
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(offset.local_minus_utc().into());
    let today_start = Utc.from_utc_datetime(&utc_midnight);
    ActivityWindow {
        today_start,
        week_ago_start: today_start - Duration::days(7),
    }
}

pub fn dau_wau_ratio(dau: u64, wau: u64) -> u64 {
    if wau == 0 {
        return 0;
    }
    (dau as f64 / wau as f64 * 100.0).round() as u64
}

pub fn activity_metrics(counts: ActivityCounts, window: ActivityWindow) -> ActivityMetrics {
    ActivityMetrics {
        dau: counts.dau,
        wau: counts.wau,
        new_users_today: counts.new_users_today,
        total_users: counts.total_users,
        dau_wau_ratio: dau_wau_ratio(counts.dau, counts.wau),
        window,
    }
}
