//! In-process document store used by the CLI and by tests.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use pulse_types::Result;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    document::{compare_documents, Document, DocumentStore, Filter, Query},
    store_error,
};

#[derive(Clone)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            collections: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `{ "<collection>": [ { "id": "...", ... } ] }`.
    /// Documents without an `id` get `<collection>-<index>`.
    pub fn from_seed(seed: Value) -> Result<Self> {
        let Value::Object(seed) = seed else {
            return Err(store_error("seed must be a JSON object of collections"));
        };

        let mut collections = HashMap::new();
        for (name, rows) in seed {
            let Value::Array(rows) = rows else {
                return Err(store_error(format!("seed collection {name} must be an array")));
            };
            let mut documents = Vec::with_capacity(rows.len());
            for (index, row) in rows.into_iter().enumerate() {
                let Value::Object(mut fields) = row else {
                    return Err(store_error(format!(
                        "seed document {index} in {name} must be an object"
                    )));
                };
                let id = match fields.remove("id") {
                    Some(Value::String(id)) => id,
                    Some(other) => other.to_string(),
                    None => format!("{name}-{index}"),
                };
                documents.push(Document::new(id, fields));
            }
            debug!(collection = %name, documents = documents.len(), "seeded collection");
            collections.insert(name, documents);
        }

        Ok(Self {
            collections: Arc::new(RwLock::new(collections)),
            ..Self::default()
        })
    }

    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            store_error(format!(
                "unable to read seed file {}: {err}",
                path_ref.display()
            ))
        })?;
        let seed = serde_json::from_str(&contents).map_err(|err| {
            store_error(format!(
                "failed to parse seed file {}: {err}",
                path_ref.display()
            ))
        })?;
        let store = Self::from_seed(seed)?;
        info!("Loaded document store seed from {}", path_ref.display());
        Ok(store)
    }

    pub async fn insert(&self, collection: &str, document: Document) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// Toggles simulated reachability; while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(store_error("document store unreachable"))
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        self.ensure_available()?;
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = documents
            .iter()
            .filter(|doc| query.filters.iter().all(|filter| filter.matches(doc)))
            .collect();
        if let Some(order) = &query.order_by {
            matched.sort_by(|a, b| compare_documents(a, b, order));
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().take(limit).cloned().collect())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64> {
        self.ensure_available()?;
        let collections = self.collections.read().await;
        let count = collections.get(collection).map_or(0, |documents| {
            documents
                .iter()
                .filter(|doc| filters.iter().all(|filter| filter.matches(doc)))
                .count()
        });
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Direction, FieldValue};
    use serde_json::json;

    fn seeded() -> InMemoryStore {
        InMemoryStore::from_seed(json!({
            "player_stats": [
                {"id": "p1", "points": 40, "gamesPlayed": 3},
                {"id": "p2", "points": 90, "gamesPlayed": 1},
                {"id": "p3", "points": 65},
                {"points": 10, "gamesPlayed": 9}
            ]
        }))
        .expect("seed store")
    }

    #[tokio::test]
    async fn query_orders_filters_and_limits() {
        let store = seeded();
        let query = Query::new()
            .order_by("points", Direction::Descending)
            .filter(Filter::at_least("points", FieldValue::Number(20.0)))
            .limit(2);

        let ids: Vec<String> = store
            .query("player_stats", &query)
            .await
            .expect("query")
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, vec!["p2", "p3"]);
    }

    #[tokio::test]
    async fn missing_ids_are_generated_from_position() {
        let store = seeded();
        let query = Query::new().order_by("gamesPlayed", Direction::Descending);
        let docs = store.query("player_stats", &query).await.expect("query");
        assert_eq!(docs[0].id, "player_stats-3");
        // p3 has no gamesPlayed and sorts last.
        assert_eq!(docs[3].id, "p3");
    }

    #[tokio::test]
    async fn count_applies_filters_and_unknown_collections_are_empty() {
        let store = seeded();
        assert_eq!(store.count("player_stats", &[]).await.expect("count"), 4);
        let filters = [Filter::at_least("gamesPlayed", FieldValue::Number(3.0))];
        assert_eq!(store.count("player_stats", &filters).await.expect("count"), 2);
        assert_eq!(store.count("matches", &[]).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn unavailable_store_rejects_every_call() {
        let store = seeded();
        store.set_available(false);
        assert!(store.count("player_stats", &[]).await.is_err());
        assert!(store.query("player_stats", &Query::new()).await.is_err());
        store.set_available(true);
        assert!(store.count("player_stats", &[]).await.is_ok());
    }

    #[test]
    fn seed_must_be_collections_of_objects() {
        assert!(InMemoryStore::from_seed(json!([1, 2])).is_err());
        assert!(InMemoryStore::from_seed(json!({"matches": {"id": "m1"}})).is_err());
        assert!(InMemoryStore::from_seed(json!({"matches": [42]})).is_err());
    }
}
