//! Query shapes for the history collections. No business logic lives here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_types::{
    records::{
        FeedbackEntry, MatchRecord, PeakStatSnapshot, PlayerRankKey, PlayerStatRecord,
        PlayerTimestampField,
    },
    Result,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    document::{Direction, DocumentStore, FieldValue, Filter, Query},
    repository_error,
};

pub mod collections {
    pub const PEAK_STATS: &str = "peak_stats";
    pub const MATCHES: &str = "matches";
    pub const PLAYER_STATS: &str = "player_stats";
    pub const FEEDBACK: &str = "feedback";
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Most recent `limit` rollups, oldest first.
    async fn list_recent_peak_stats(&self, limit: usize) -> Result<Vec<PeakStatSnapshot>>;
    async fn count_players(&self) -> Result<u64>;
    async fn count_matches(&self) -> Result<u64>;
    /// Up to `limit` matches, most recently ended first.
    async fn sample_recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>>;
    async fn top_players_by(
        &self,
        key: PlayerRankKey,
        limit: usize,
    ) -> Result<Vec<PlayerStatRecord>>;
    /// Players whose `field` is at or after `threshold`.
    async fn count_where(
        &self,
        field: PlayerTimestampField,
        threshold: DateTime<Utc>,
    ) -> Result<u64>;
    /// Feedback, newest first, optionally capped.
    async fn list_feedback(&self, limit: Option<usize>) -> Result<Vec<FeedbackEntry>>;
}

/// `HistoryRepository` over any [`DocumentStore`].
#[derive(Clone)]
pub struct StoreHistoryRepository<S> {
    store: S,
}

impl<S: DocumentStore> StoreHistoryRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: &str, query: Query) -> Result<Vec<T>> {
        debug!(collection, limit = ?query.limit, "querying store");
        let documents = self
            .store
            .query(collection, &query)
            .await
            .map_err(|err| repository_error(format!("query on {collection} failed: {err}")))?;
        documents
            .iter()
            .map(|doc| doc.decode::<T>())
            .collect::<Result<Vec<T>>>()
            .map_err(|err| repository_error(format!("bad document in {collection}: {err}")))
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64> {
        self.store
            .count(collection, filters)
            .await
            .map_err(|err| repository_error(format!("count on {collection} failed: {err}")))
    }
}

#[async_trait]
impl<S: DocumentStore> HistoryRepository for StoreHistoryRepository<S> {
    async fn list_recent_peak_stats(&self, limit: usize) -> Result<Vec<PeakStatSnapshot>> {
        let query = Query::new()
            .order_by("date", Direction::Descending)
            .limit(limit);
        let mut snapshots: Vec<PeakStatSnapshot> =
            self.fetch(collections::PEAK_STATS, query).await?;
        snapshots.reverse();
        Ok(snapshots)
    }

    async fn count_players(&self) -> Result<u64> {
        self.count(collections::PLAYER_STATS, &[]).await
    }

    async fn count_matches(&self) -> Result<u64> {
        self.count(collections::MATCHES, &[]).await
    }

    async fn sample_recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>> {
        let query = Query::new()
            .order_by("endedAt", Direction::Descending)
            .limit(limit);
        self.fetch(collections::MATCHES, query).await
    }

    async fn top_players_by(
        &self,
        key: PlayerRankKey,
        limit: usize,
    ) -> Result<Vec<PlayerStatRecord>> {
        let query = Query::new()
            .order_by(key.field(), Direction::Descending)
            .limit(limit);
        self.fetch(collections::PLAYER_STATS, query).await
    }

    async fn count_where(
        &self,
        field: PlayerTimestampField,
        threshold: DateTime<Utc>,
    ) -> Result<u64> {
        let filters = [Filter::at_least(
            field.field(),
            FieldValue::Timestamp(threshold),
        )];
        self.count(collections::PLAYER_STATS, &filters).await
    }

    async fn list_feedback(&self, limit: Option<usize>) -> Result<Vec<FeedbackEntry>> {
        let mut query = Query::new().order_by("createdAt", Direction::Descending);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.fetch(collections::FEEDBACK, query).await
    }
}
