use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::identity::{IconIdentity, IdentityId};
use crate::template_matching::BoundingBox;

pub type RecordId = u64;

/// One stored sighting of an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: RecordId,
    pub identity_id: IdentityId,
    pub detected_number: Option<u64>,
    pub detected_text: Option<String>,
    pub source_image: Option<PathBuf>,
    pub bbox: BoundingBox,
    pub confidence: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub notes: Option<String>,
}

/// Fields supplied by the caller when adding a record; id and timestamp are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub identity_id: IdentityId,
    pub detected_number: Option<u64>,
    pub detected_text: Option<String>,
    pub source_image: Option<PathBuf>,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_identities: usize,
    pub total_detections: usize,
    pub categories: usize,
    pub identities_per_category: BTreeMap<String, usize>,
}

/// On-disk layout of the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct StoreDocument {
    pub identities: Vec<IconIdentity>,
    pub records: Vec<DetectionRecord>,
    pub next_record_id: RecordId,
}
