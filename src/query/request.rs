//! Description of a single read against a collection.

use std::collections::BTreeMap;

use serde_json::Value;

use super::QueryError;

/// Which columns a read returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<String>),
}

impl Projection {
    /// Render as a PostgREST `select` list.
    pub fn to_select(&self) -> String {
        match self {
            Projection::All => "*".to_string(),
            Projection::Columns(columns) => columns.join(","),
        }
    }
}

/// A condition on one field. All filters of a request are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Value),
    /// Case-insensitive match where `%` stands for any run of characters.
    ILike(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub ascending: bool,
}

/// One read: collection, projection, filters, ordering and limit.
///
/// Requests compare by value, so two requests built from the same inputs are
/// equal even if they were constructed separately.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    collection: String,
    projection: Projection,
    filters: BTreeMap<String, Filter>,
    order: Option<Ordering>,
    limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(collection: impl Into<String>) -> Result<Self, QueryError> {
        let collection = collection.into();
        if collection.trim().is_empty() {
            return Err(QueryError::EmptyCollection);
        }

        Ok(Self {
            collection,
            projection: Projection::All,
            filters: BTreeMap::new(),
            order: None,
            limit: None,
        })
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.projection = if columns.is_empty() || columns.iter().any(|c| c == "*") {
            Projection::All
        } else {
            Projection::Columns(columns)
        };
        self
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), Filter::Eq(value.into()));
        self
    }

    pub fn ilike(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.insert(field.into(), Filter::ILike(pattern.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Ordering {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Cap the number of rows. Zero means no cap.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn filters(&self) -> &BTreeMap<String, Filter> {
        &self.filters
    }

    pub fn order(&self) -> Option<&Ordering> {
        self.order.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }
}
