use std::io;

use crate::data::LoadError;
use crate::query::QueryError;
use crate::store::StoreError;

/// Error type for the crate's top-level operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error("you need to sign in first")]
    NotSignedIn,
}
