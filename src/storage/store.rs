//! JSON file backed record store

use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use super::error::{StorageError, StorageResult};
use super::models::{DetectionRecord, NewRecord, RecordId, Statistics, StoreDocument};
use crate::identity::{IconIdentity, IdentityId};
use crate::template_library::Fingerprint;

/// Identities and detection records kept in memory and written to a single
/// JSON document on [`flush`](JsonStore::flush).
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl JsonStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if !path.exists() {
            log::info!("Creating new record store at {path:?}");
            return Ok(Self {
                path,
                doc: StoreDocument {
                    next_record_id: 1,
                    ..StoreDocument::default()
                },
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let mut doc: StoreDocument =
            serde_json::from_str(&raw).map_err(|source| StorageError::Json {
                path: path.clone(),
                source,
            })?;
        let max_id = doc.records.iter().map(|r| r.id).max().unwrap_or(0);
        doc.next_record_id = doc.next_record_id.max(max_id + 1);

        log::debug!(
            "Opened store {path:?}: {} identities, {} records",
            doc.identities.len(),
            doc.records.len()
        );
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a detection against a known identity.
    pub fn add_record(&mut self, record: NewRecord) -> StorageResult<RecordId> {
        if !self.doc.identities.iter().any(|i| i.id == record.identity_id) {
            return Err(StorageError::UnknownIdentity {
                id: record.identity_id,
            });
        }

        let id = self.doc.next_record_id;
        self.doc.next_record_id += 1;
        self.doc.records.push(DetectionRecord {
            id,
            identity_id: record.identity_id,
            detected_number: record.detected_number,
            detected_text: record.detected_text,
            source_image: record.source_image,
            bbox: record.bbox,
            confidence: record.confidence,
            timestamp: OffsetDateTime::now_utc(),
            notes: record.notes,
        });
        Ok(id)
    }

    pub fn record(&self, id: RecordId) -> Option<&DetectionRecord> {
        self.doc.records.iter().find(|r| r.id == id)
    }

    /// Newest records for one identity
    pub fn records_for_identity(
        &self,
        identity_id: IdentityId,
        limit: usize,
    ) -> Vec<&DetectionRecord> {
        let mut records: Vec<_> = self
            .doc
            .records
            .iter()
            .filter(|r| r.identity_id == identity_id)
            .collect();
        newest_first(&mut records);
        records.truncate(limit);
        records
    }

    /// Newest records across all identities
    pub fn recent_records(&self, limit: usize) -> Vec<&DetectionRecord> {
        let mut records: Vec<_> = self.doc.records.iter().collect();
        newest_first(&mut records);
        records.truncate(limit);
        records
    }

    pub fn identities(&self) -> &[IconIdentity] {
        &self.doc.identities
    }

    pub fn identity(&self, id: IdentityId) -> Option<&IconIdentity> {
        self.doc.identities.iter().find(|i| i.id == id)
    }

    pub fn identity_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<&IconIdentity> {
        self.doc
            .identities
            .iter()
            .find(|i| &i.fingerprint == fingerprint)
    }

    /// Replace the stored identities with the resolver's current view.
    pub fn replace_identities(&mut self, identities: Vec<IconIdentity>) {
        self.doc.identities = identities;
    }

    /// Remove a record; `false` when no record had that id.
    pub fn delete_record(&mut self, id: RecordId) -> bool {
        let before = self.doc.records.len();
        self.doc.records.retain(|r| r.id != id);
        self.doc.records.len() != before
    }

    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics {
            total_identities: self.doc.identities.len(),
            total_detections: self.doc.records.len(),
            ..Statistics::default()
        };
        for identity in &self.doc.identities {
            *stats
                .identities_per_category
                .entry(identity.category.clone())
                .or_default() += 1;
        }
        stats.categories = stats.identities_per_category.len();
        stats
    }

    /// Write the document next to its final path, then rename it into place.
    pub fn flush(&self) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        serde_json::to_writer_pretty(&mut tmp, &self.doc).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        log::debug!(
            "💾 Saved {} identities, {} records to {:?}",
            self.doc.identities.len(),
            self.doc.records.len(),
            self.path
        );
        Ok(())
    }
}

fn newest_first(records: &mut [&DetectionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}
