//! In-process record store.
//!
//! Evaluates requests the way the hosted store does, which makes it usable
//! for offline runs (seeded from a JSON file) and for tests.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::{Record, RecordStore, StoreError};
use crate::query::{Filter, Projection, QueryRequest};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given collections present but empty.
    pub fn with_collections<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collections = names.into_iter().map(|n| (n.into(), Vec::new())).collect();
        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Build a store from a JSON object mapping collection names to arrays
    /// of rows.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let collections: HashMap<String, Vec<Record>> =
            serde_json::from_str(json).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| StoreError::Transport(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Append rows to a collection, creating it if needed.
    pub fn insert(&self, collection: &str, rows: impl IntoIterator<Item = Record>) {
        let mut collections = match self.collections.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of every row in a collection.
    pub fn rows(&self, collection: &str) -> Vec<Record> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, request: &QueryRequest) -> Result<Vec<Record>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Transport("memory store lock poisoned".to_string()))?;
        let rows = collections
            .get(request.collection())
            .ok_or_else(|| StoreError::UnknownCollection(request.collection().to_string()))?;

        let mut matched: Vec<&Record> = rows
            .iter()
            .filter(|row| {
                request
                    .filters()
                    .iter()
                    .all(|(field, filter)| filter_matches(filter, row.get(field)))
            })
            .collect();

        if let Some(order) = request.order() {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }

        if let Some(limit) = request.row_limit() {
            matched.truncate(limit);
        }

        Ok(matched
            .into_iter()
            .map(|row| project(row, request.projection()))
            .collect())
    }

    async fn upsert(
        &self,
        collection: &str,
        conflict_keys: &[&str],
        record: Record,
    ) -> Result<(), StoreError> {
        if let Some(missing) = conflict_keys.iter().find(|k| !record.contains_key(**k)) {
            return Err(StoreError::Rejected {
                code: "invalid_upsert".to_string(),
                message: format!("record is missing conflict column '{}'", missing),
            });
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Transport("memory store lock poisoned".to_string()))?;
        let rows = collections.entry(collection.to_string()).or_default();

        let existing = rows.iter_mut().find(|row| {
            !conflict_keys.is_empty()
                && conflict_keys
                    .iter()
                    .all(|k| values_equal(row.get(*k), record.get(*k)))
        });

        match existing {
            Some(row) => {
                for (column, value) in record {
                    row.insert(column, value);
                }
            }
            None => rows.push(record),
        }

        Ok(())
    }
}

fn project(row: &Record, projection: &Projection) -> Record {
    match projection {
        Projection::All => row.clone(),
        Projection::Columns(columns) => columns
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect(),
    }
}

fn filter_matches(filter: &Filter, value: Option<&Value>) -> bool {
    match filter {
        Filter::Eq(expected) => values_equal(value, Some(expected)),
        Filter::ILike(pattern) => match value {
            Some(Value::String(text)) => like_matches(pattern, text),
            _ => false,
        },
    }
}

fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.as_f64() == y.as_f64(),
        (Some(x), Some(y)) => x == y,
        (None, None) => true,
        (None, Some(Value::Null)) | (Some(Value::Null), None) => true,
        _ => false,
    }
}

/// Case-insensitive SQL `LIKE` with `%` as the only wildcard.
fn like_matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();

    let (first, last) = match parts.as_slice() {
        [only] => return text == *only,
        [first, .., last] => (*first, *last),
        [] => return text.is_empty(),
    };

    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Bool(_)) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Array(_)) => 3,
        Some(Value::Object(_)) => 4,
        // Nulls sort last ascending, first descending.
        Some(Value::Null) | None => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y))
            if type_rank(Some(x)) == type_rank(Some(y)) =>
        {
            x.to_string().cmp(&y.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
