//! Persistence of identities and detection records

pub mod error;
pub mod models;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{StorageError, StorageResult};
pub use models::{DetectionRecord, NewRecord, RecordId, Statistics};
pub use store::JsonStore;
