//! Store primitives: ordered range queries, `==` / `>=` filters and
//! server-side counts over named collections of JSON documents.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_types::Result;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::store_error;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Field value, treating an explicit `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    /// Decodes the document into a record. The store-assigned id is exposed
    /// as `id` unless the document body already carries one.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields
            .entry("id")
            .or_insert_with(|| Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|err| store_error(format!("failed to decode document {}: {err}", self.id)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Timestamp(DateTime<Utc>),
    Number(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// Orders a stored value against this one; `None` when the two are not
    /// comparable.
    fn compare_stored(&self, stored: &Value) -> Option<Ordering> {
        match (self, stored) {
            (FieldValue::Timestamp(expected), Value::String(raw)) => {
                parse_timestamp(raw).map(|actual| actual.cmp(expected))
            }
            (FieldValue::Number(expected), Value::Number(actual)) => {
                actual.as_f64()?.partial_cmp(expected)
            }
            (FieldValue::Text(expected), Value::String(actual)) => {
                Some(actual.as_str().cmp(expected.as_str()))
            }
            (FieldValue::Bool(expected), Value::Bool(actual)) => Some(actual.cmp(expected)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    GreaterOrEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FieldValue,
}

impl Filter {
    pub fn equal(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Equal,
            value,
        }
    }

    pub fn at_least(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::GreaterOrEqual,
            value,
        }
    }

    /// Missing, null and incomparable fields never match.
    pub fn matches(&self, document: &Document) -> bool {
        let Some(stored) = document.get(&self.field) else {
            return false;
        };
        match (self.op, self.value.compare_stored(stored)) {
            (FilterOp::Equal, Some(Ordering::Equal)) => true,
            (FilterOp::GreaterOrEqual, Some(Ordering::Equal | Ordering::Greater)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub order_by: Option<OrderBy>,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;
    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64>;
}

/// Ordering between two stored values: numbers numerically, RFC 3339
/// strings chronologically, other strings lexically.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Sort comparator for `order`. Documents lacking the field go last in
/// either direction.
pub fn compare_documents(a: &Document, b: &Document, order: &OrderBy) -> Ordering {
    match (a.get(&order.field), b.get(&order.field)) {
        (Some(x), Some(y)) => {
            let ordering = compare_values(x, y).unwrap_or(Ordering::Equal);
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        match fields {
            Value::Object(map) => Document::new(id, map),
            _ => panic!("fields must be an object"),
        }
    }

    #[test]
    fn timestamp_filter_compares_chronologically() {
        let threshold = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        let filter = Filter::at_least("lastPlayedAt", FieldValue::Timestamp(threshold));

        // Offset-bearing timestamps are compared by instant, not by text.
        assert!(filter.matches(&doc("a", json!({"lastPlayedAt": "2026-10-16T01:00:00+01:00"}))));
        assert!(!filter.matches(&doc("b", json!({"lastPlayedAt": "2026-10-15T23:59:59Z"}))));
        assert!(filter.matches(&doc("c", json!({"lastPlayedAt": "2026-10-16T00:00:00Z"}))));
        assert!(!filter.matches(&doc("d", json!({"lastPlayedAt": null}))));
        assert!(!filter.matches(&doc("e", json!({}))));
        assert!(!filter.matches(&doc("f", json!({"lastPlayedAt": "yesterday"}))));
    }

    #[test]
    fn equality_filter_on_text_and_numbers() {
        let team = Filter::equal("winningTeam", FieldValue::Text("impostor".into()));
        assert!(team.matches(&doc("a", json!({"winningTeam": "impostor"}))));
        assert!(!team.matches(&doc("b", json!({"winningTeam": "friends"}))));

        let points = Filter::at_least("points", FieldValue::Number(10.0));
        assert!(points.matches(&doc("a", json!({"points": 10}))));
        assert!(points.matches(&doc("b", json!({"points": 10.5}))));
        assert!(!points.matches(&doc("c", json!({"points": "10"}))));
    }

    #[test]
    fn missing_fields_sort_last_both_ways() {
        let present = doc("a", json!({"endedAt": "2026-10-01T10:00:00Z"}));
        let missing = doc("b", json!({"endedAt": null}));
        for direction in [Direction::Ascending, Direction::Descending] {
            let order = OrderBy {
                field: "endedAt".into(),
                direction,
            };
            assert_eq!(compare_documents(&present, &missing, &order), Ordering::Less);
            assert_eq!(compare_documents(&missing, &present, &order), Ordering::Greater);
        }
    }

    #[test]
    fn decode_exposes_store_id() {
        #[derive(serde::Deserialize)]
        struct Row {
            id: String,
            points: f64,
        }

        let row: Row = doc("player-7", json!({"points": 12})).decode().expect("decode");
        assert_eq!(row.id, "player-7");
        assert_eq!(row.points, 12.0);

        let err = doc("bad", json!({"points": "many"})).decode::<Row>();
        assert!(err.is_err());
    }
}
