//! Access to the hosted record store.
//!
//! The store owns persistence and query evaluation. This crate only issues
//! reads described by a [`QueryRequest`] and idempotent upserts.

mod memory;
mod rest;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::query::QueryRequest;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// A single row, keyed by column name.
pub type Record = Map<String, Value>;

/// Errors reported by a record store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The backend refused the request (permissions, bad filter, ...).
    #[error("{message} (code {code})")]
    Rejected { code: String, message: String },

    /// The backend could not be reached or the exchange broke off.
    #[error("record store unreachable: {0}")]
    Transport(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// Rows came back but could not be read.
    #[error("could not decode records: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Run a read and return the matching rows in store order.
    async fn select(&self, request: &QueryRequest) -> Result<Vec<Record>, StoreError>;

    /// Insert `record`, or merge it into the existing row whose
    /// `conflict_keys` columns all match. Repeating the call is harmless.
    async fn upsert(
        &self,
        collection: &str,
        conflict_keys: &[&str],
        record: Record,
    ) -> Result<(), StoreError>;
}

/// Decode rows into typed records.
pub fn decode_records<T: DeserializeOwned>(rows: Vec<Record>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)))
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Encode a typed record as a row.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(StoreError::Decode(format!("expected an object, got {}", other))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}
