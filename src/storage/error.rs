use std::path::PathBuf;
use thiserror::Error;

use crate::identity::IdentityId;

/// A specialized `Result` type for the record store.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on store {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Store {path:?} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No identity with id {id}")]
    UnknownIdentity { id: IdentityId },
}
