//! Declarative reads against the record store.
//!
//! A [`QueryFetcher`] owns one [`QueryRequest`] plus a list of extra
//! dependencies, and keeps a [`QueryState`] current: it re-runs the read
//! whenever the request, the dependencies or the signed-in identity change,
//! and only ever publishes the outcome of the latest attempt.

mod fetcher;
mod request;
mod state;

pub use fetcher::QueryFetcher;
pub use request::{Filter, Ordering, Projection, QueryRequest};
pub use state::QueryState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("collection name must not be empty")]
    EmptyCollection,
}
