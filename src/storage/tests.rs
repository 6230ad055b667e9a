//! Tests for the JSON record store

use std::path::PathBuf;

use crate::identity::{IconIdentity, IdentityMetadata, IdentityResolver};
use crate::storage::{JsonStore, NewRecord, StorageError};
use crate::template_library::Fingerprint;
use crate::template_matching::BoundingBox;

fn identities() -> Vec<IconIdentity> {
    let resolver = IdentityResolver::new();
    for (fp, name, category) in [("aa", "coin", "currency"), ("bb", "gem", "currency"), ("cc", "sword", "items")] {
        resolver.resolve(
            &Fingerprint::from_hex(fp),
            IdentityMetadata {
                name: name.to_string(),
                category: category.to_string(),
                image_path: PathBuf::from(format!("{category}/{name}.png")),
                confidence_threshold: 0.8,
            },
        );
    }
    resolver.snapshot()
}

fn new_record(identity_id: u64, number: Option<u64>) -> NewRecord {
    NewRecord {
        identity_id,
        detected_number: number,
        detected_text: number.map(|n| format!("x{n}")),
        source_image: Some(PathBuf::from("shot.png")),
        bbox: BoundingBox::new(10, 20, 16, 16),
        confidence: 0.93,
        notes: None,
    }
}

#[test]
fn test_open_missing_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path().join("records.json")).unwrap();

    assert!(store.identities().is_empty());
    assert!(store.recent_records(10).is_empty());
    assert_eq!(store.statistics().total_detections, 0);
}

#[test]
fn test_add_record_requires_known_identity() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonStore::open(dir.path().join("records.json")).unwrap();

    let result = store.add_record(new_record(1, Some(5)));
    assert!(matches!(result, Err(StorageError::UnknownIdentity { id: 1 })));

    store.replace_identities(identities());
    let id = store.add_record(new_record(1, Some(5))).unwrap();
    assert_eq!(store.record(id).unwrap().detected_number, Some(5));
}

#[test]
fn test_flush_and_reopen_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/records.json");
    let mut store = JsonStore::open(&path).unwrap();
    store.replace_identities(identities());
    store.add_record(new_record(1, Some(5))).unwrap();
    store.add_record(new_record(2, None)).unwrap();
    store.flush().unwrap();

    let reopened = JsonStore::open(&path).unwrap();
    assert_eq!(reopened.identities(), store.identities());
    assert_eq!(reopened.recent_records(10), store.recent_records(10));

    // Ids keep increasing after a reopen
    let mut reopened = reopened;
    let id = reopened.add_record(new_record(3, Some(1))).unwrap();
    assert_eq!(id, 3);
}

#[test]
fn test_recent_records_newest_first_with_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonStore::open(dir.path().join("records.json")).unwrap();
    store.replace_identities(identities());
    for n in 0..5 {
        store.add_record(new_record(1 + n % 2, Some(n))).unwrap();
    }

    let recent: Vec<_> = store.recent_records(3).iter().map(|r| r.id).collect();
    assert_eq!(recent, vec![5, 4, 3]);

    let coin: Vec<_> = store
        .records_for_identity(1, 10)
        .iter()
        .map(|r| r.detected_number)
        .collect();
    assert_eq!(coin, vec![Some(4), Some(2), Some(0)]);
}

#[test]
fn test_identity_by_fingerprint_and_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonStore::open(dir.path().join("records.json")).unwrap();
    store.replace_identities(identities());
    store.add_record(new_record(3, Some(9))).unwrap();

    let gem = store.identity_by_fingerprint(&Fingerprint::from_hex("bb")).unwrap();
    assert_eq!(gem.name, "gem");
    assert!(store.identity_by_fingerprint(&Fingerprint::from_hex("zz")).is_none());

    let stats = store.statistics();
    assert_eq!(stats.total_identities, 3);
    assert_eq!(stats.total_detections, 1);
    assert_eq!(stats.categories, 2);
    assert_eq!(stats.identities_per_category["currency"], 2);
    assert_eq!(stats.identities_per_category["items"], 1);
}

#[test]
fn test_delete_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonStore::open(dir.path().join("records.json")).unwrap();
    store.replace_identities(identities());
    let id = store.add_record(new_record(1, None)).unwrap();

    assert!(store.delete_record(id));
    assert!(!store.delete_record(id));
    assert!(store.record(id).is_none());
}

#[test]
fn test_open_corrupt_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(JsonStore::open(&path), Err(StorageError::Json { .. })));
}
