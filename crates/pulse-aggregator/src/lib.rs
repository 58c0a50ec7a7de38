//! Request-scoped orchestration of telemetry, history and analytics.

use chrono::{DateTime, FixedOffset, Utc};
use pulse_analytics::{activity_metrics, activity_window, balance_metrics, leaderboards};
use pulse_store::HistoryRepository;
use pulse_telemetry::TelemetrySource;
use pulse_types::{
    analytics::{
        ActivityCounts, ActivityMetrics, AggregateStatsPayload, BalanceMetrics,
        PlayerLeaderboards,
    },
    config::{ActivityConfig, HistoryConfig},
    live::LiveSnapshot,
    records::{FeedbackEntry, PeakStatSnapshot, PlayerRankKey, PlayerTimestampField},
    PulseError, Result,
};
use tracing::{debug, error, info};

/// Lifecycle of one aggregated-stats request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPhase {
    Fetching,
    Merging,
    Done,
    Failed,
}

/// Raw outcome of the concurrent history queries, before merging.
#[derive(Debug)]
pub struct HistoryFetch {
    pub history: Result<Vec<PeakStatSnapshot>>,
    pub total_users: Result<u64>,
    pub total_matches: Result<u64>,
}

/// Merge step for aggregated stats. Live figures arrive already absorbed
/// (zeroed on telemetry failure); any failed history query fails the whole
/// payload with a single aggregation error.
pub fn merge_aggregate(live: LiveSnapshot, fetched: HistoryFetch) -> Result<AggregateStatsPayload> {
    match (fetched.history, fetched.total_users, fetched.total_matches) {
        (Ok(history), Ok(total_users), Ok(total_matches)) => Ok(AggregateStatsPayload {
            live,
            history,
            total_users,
            total_matches,
            active_users: live.connected_users,
            avg_session_minutes: 0,
            retention_rate: 0,
        }),
        (history, total_users, total_matches) => {
            let failures: Vec<PulseError> = [history.err(), total_users.err(), total_matches.err()]
                .into_iter()
                .flatten()
                .collect();
            for failure in &failures {
                error!(error = %failure, "history query failed during aggregation");
            }
            Err(aggregation_error(format!(
                "{} of 3 history queries failed",
                failures.len()
            )))
        }
    }
}

pub struct StatsService<T, H>
where
    T: TelemetrySource,
    H: HistoryRepository,
{
    telemetry: T,
    history: H,
    limits: HistoryConfig,
    reference_offset: FixedOffset,
}

impl<T, H> StatsService<T, H>
where
    T: TelemetrySource,
    H: HistoryRepository,
{
    pub fn new(
        telemetry: T,
        history: H,
        limits: HistoryConfig,
        activity: &ActivityConfig,
    ) -> Result<Self> {
        let reference_offset = FixedOffset::east_opt(activity.utc_offset_minutes * 60)
            .ok_or_else(|| {
                PulseError::Configuration(format!(
                    "invalid utc offset of {} minutes",
                    activity.utc_offset_minutes
                ))
            })?;
        Ok(Self {
            telemetry,
            history,
            limits,
            reference_offset,
        })
    }

    /// Live counters merged with history and totals. Telemetry and the three
    /// history queries run concurrently.
    pub async fn aggregated_stats(&self) -> Result<AggregateStatsPayload> {
        debug!(phase = ?AggregationPhase::Fetching, "aggregating stats");
        let (live, fetched) = tokio::join!(self.telemetry.fetch_live_snapshot(), self.fetch_history());

        debug!(phase = ?AggregationPhase::Merging, "aggregating stats");
        let merged = merge_aggregate(live, fetched);
        match &merged {
            Ok(payload) => debug!(
                phase = ?AggregationPhase::Done,
                history_days = payload.history.len(),
                "aggregated stats ready"
            ),
            Err(err) => error!(phase = ?AggregationPhase::Failed, error = %err, "aggregated stats failed"),
        }
        merged
    }

    async fn fetch_history(&self) -> HistoryFetch {
        let (history, total_users, total_matches) = tokio::join!(
            self.history.list_recent_peak_stats(self.limits.peak_stats_limit),
            self.history.count_players(),
            self.history.count_matches(),
        );
        HistoryFetch {
            history,
            total_users,
            total_matches,
        }
    }

    pub async fn balance_analytics(&self) -> Result<BalanceMetrics> {
        let sample = self
            .history
            .sample_recent_matches(self.limits.match_sample_limit)
            .await
            .map_err(|err| report("balance analytics", err))?;
        info!(sample_size = sample.len(), "computing balance analytics");
        Ok(balance_metrics(&sample))
    }

    pub async fn player_analytics(&self) -> Result<PlayerLeaderboards> {
        let limit = self.limits.leaderboard_limit;
        let (by_points, by_games) = futures::try_join!(
            self.history.top_players_by(PlayerRankKey::Points, limit),
            self.history.top_players_by(PlayerRankKey::GamesPlayed, limit),
        )
        .map_err(|err| report("player analytics", err))?;
        Ok(leaderboards(&by_points, &by_games, limit))
    }

    pub async fn activity_analytics(&self) -> Result<ActivityMetrics> {
        self.activity_analytics_at(Utc::now()).await
    }

    /// Activity counters for the calendar day containing `now`.
    pub async fn activity_analytics_at(&self, now: DateTime<Utc>) -> Result<ActivityMetrics> {
        let window = activity_window(now, self.reference_offset);
        let (dau, wau, new_users_today, total_users) = futures::try_join!(
            self.history
                .count_where(PlayerTimestampField::LastPlayedAt, window.today_start),
            self.history
                .count_where(PlayerTimestampField::LastPlayedAt, window.week_ago_start),
            self.history
                .count_where(PlayerTimestampField::FirstSeenAt, window.today_start),
            self.history.count_players(),
        )
        .map_err(|err| report("activity analytics", err))?;

        Ok(activity_metrics(
            ActivityCounts {
                dau,
                wau,
                new_users_today,
                total_users,
            },
            window,
        ))
    }

    pub async fn feedback(&self) -> Result<Vec<FeedbackEntry>> {
        self.history
            .list_feedback(self.limits.feedback_limit)
            .await
            .map_err(|err| report("feedback", err))
    }
}

pub fn aggregation_error(message: impl Into<String>) -> PulseError {
    PulseError::Aggregation(message.into())
}

fn report(operation: &str, err: PulseError) -> PulseError {
    error!(operation, error = %err, "read operation failed");
    err
}
