//! Fingerprint keyed icon identities

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;

use crate::template_library::{Fingerprint, MarkerTemplate};

pub type IdentityId = u64;

/// Mutable attributes proposed for an identity on each sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityMetadata {
    pub name: String,
    pub category: String,
    pub image_path: PathBuf,
    pub confidence_threshold: f32,
}

impl IdentityMetadata {
    pub fn for_template(template: &MarkerTemplate, confidence_threshold: f32) -> Self {
        Self {
            name: template.name.clone(),
            category: template.category.clone(),
            image_path: template.path.clone(),
            confidence_threshold,
        }
    }
}

/// Long lived identity that detections accumulate against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconIdentity {
    pub id: IdentityId,
    pub fingerprint: Fingerprint,
    pub name: String,
    pub category: String,
    pub image_path: PathBuf,
    pub confidence_threshold: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct IdentityTable {
    by_id: BTreeMap<IdentityId, IconIdentity>,
    by_fingerprint: HashMap<Fingerprint, IdentityId>,
    next_id: IdentityId,
}

/// Maps fingerprints to identities, creating one on first sight.
///
/// Matching is exact on the fingerprint. Images that differ in any byte of
/// their canonical grid are separate identities, and two distinct icons
/// that collide on the digest share one.
///
/// The whole create-or-update runs under one lock, so concurrent callers
/// resolving the same new fingerprint end up with a single identity.
#[derive(Debug)]
pub struct IdentityResolver {
    table: Mutex<IdentityTable>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(IdentityTable {
                next_id: 1,
                ..IdentityTable::default()
            }),
        }
    }

    /// Resolver seeded with previously stored identities. New ids continue
    /// after the largest stored one.
    pub fn from_identities(identities: impl IntoIterator<Item = IconIdentity>) -> Self {
        let resolver = Self::new();
        {
            let mut table = resolver.lock();
            for identity in identities {
                table.next_id = table.next_id.max(identity.id + 1);
                table
                    .by_fingerprint
                    .insert(identity.fingerprint.clone(), identity.id);
                table.by_id.insert(identity.id, identity);
            }
        }
        resolver
    }

    fn lock(&self) -> MutexGuard<'_, IdentityTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identity for `fingerprint` and whether it was created by this call.
    ///
    /// An existing identity takes over the proposed metadata.
    pub fn resolve(
        &self,
        fingerprint: &Fingerprint,
        metadata: IdentityMetadata,
    ) -> (IdentityId, bool) {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.lock();
        let table = &mut *guard;

        if let Some(&id) = table.by_fingerprint.get(fingerprint)
            && let Some(identity) = table.by_id.get_mut(&id)
        {
            identity.name = metadata.name;
            identity.category = metadata.category;
            identity.image_path = metadata.image_path;
            identity.confidence_threshold = metadata.confidence_threshold;
            identity.updated_at = now;
            return (id, false);
        }

        let id = table.next_id;
        table.next_id += 1;
        log::info!(
            "🆕 New identity #{id} '{}' ({})",
            metadata.name,
            fingerprint
        );
        table.by_fingerprint.insert(fingerprint.clone(), id);
        table.by_id.insert(
            id,
            IconIdentity {
                id,
                fingerprint: fingerprint.clone(),
                name: metadata.name,
                category: metadata.category,
                image_path: metadata.image_path,
                confidence_threshold: metadata.confidence_threshold,
                created_at: now,
                updated_at: now,
            },
        );
        (id, true)
    }

    pub fn get(&self, id: IdentityId) -> Option<IconIdentity> {
        self.lock().by_id.get(&id).cloned()
    }

    pub fn by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<IconIdentity> {
        let table = self.lock();
        let id = table.by_fingerprint.get(fingerprint)?;
        table.by_id.get(id).cloned()
    }

    /// All identities ordered by id
    pub fn snapshot(&self) -> Vec<IconIdentity> {
        self.lock().by_id.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().by_id.is_empty()
    }
}
