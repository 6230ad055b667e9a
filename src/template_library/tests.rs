//! Tests for template loading and fingerprinting

use crate::error::EngineError;
use crate::template_library::{DEFAULT_CATEGORY, Fingerprint, TemplateLibrary};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::fs;

fn icon(seed: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(24, 24, |x, y| {
        Rgb([
            ((x * 9 + seed * 31) % 256) as u8,
            ((y * 11 + seed * 17) % 256) as u8,
            ((x * y + seed) % 256) as u8,
        ])
    }))
}

#[test]
fn test_load_assigns_categories_from_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("buffs")).unwrap();
    fs::create_dir_all(dir.path().join("items")).unwrap();
    icon(1).save(dir.path().join("compass.png")).unwrap();
    icon(2).save(dir.path().join("buffs/attack.png")).unwrap();
    icon(3).save(dir.path().join("items/potion.jpg")).unwrap();
    icon(4).save(dir.path().join("items/elixir.bmp")).unwrap();

    let library = TemplateLibrary::load(dir.path()).unwrap();

    assert_eq!(library.len(), 4);
    assert_eq!(library.get("compass").unwrap().category, DEFAULT_CATEGORY);
    assert_eq!(library.get("attack").unwrap().category, "buffs");
    assert_eq!(library.get("potion").unwrap().category, "items");

    let items: Vec<_> = library.by_category("items").iter().map(|t| t.name.as_str()).collect();
    assert_eq!(items, vec!["elixir", "potion"]);

    let groups = library.grouped();
    assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["buffs", "general", "items"]);
}

#[test]
fn test_load_skips_undecodable_files() {
    let dir = tempfile::tempdir().unwrap();
    icon(1).save(dir.path().join("good.png")).unwrap();
    fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let library = TemplateLibrary::load(dir.path()).unwrap();

    assert_eq!(library.names(), vec!["good"]);
}

#[test]
fn test_load_missing_directory_creates_empty_library() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("templates");

    let library = TemplateLibrary::load(&root).unwrap();

    assert!(library.is_empty());
    assert!(root.is_dir());
}

#[test]
fn test_same_pixels_different_encoding_share_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    let image = icon(7);
    image
        .save_with_format(dir.path().join("a/as_png.png"), ImageFormat::Png)
        .unwrap();
    image
        .save_with_format(dir.path().join("as_bmp.bmp"), ImageFormat::Bmp)
        .unwrap();

    let library = TemplateLibrary::load(dir.path()).unwrap();
    let png = library.get("as_png").unwrap();
    let bmp = library.get("as_bmp").unwrap();

    assert_eq!(png.fingerprint, bmp.fingerprint);
    assert_eq!(png.fingerprint, Fingerprint::of(&image));
}

#[test]
fn test_add_persists_under_category() {
    let dir = tempfile::tempdir().unwrap();
    let mut library = TemplateLibrary::new(dir.path());

    let added = library.add(&icon(5), "silver", "currency").unwrap();
    let path = added.path.clone();
    let fingerprint = added.fingerprint.clone();

    assert_eq!(path, dir.path().join("currency/silver.png"));
    assert!(path.is_file());
    assert_eq!(library.get("silver").unwrap().category, "currency");

    // Reloading from disk sees the same template
    let reloaded = TemplateLibrary::load(dir.path()).unwrap();
    assert_eq!(reloaded.get("silver").unwrap().fingerprint, fingerprint);
}

#[test]
fn test_add_replaces_same_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut library = TemplateLibrary::new(dir.path());
    library.add(&icon(1), "token", "general").unwrap();
    library.add(&icon(2), "token", "general").unwrap();

    assert_eq!(library.len(), 1);
    assert_eq!(library.get("token").unwrap().fingerprint, Fingerprint::of(&icon(2)));
}

#[test]
fn test_add_fails_when_storage_unwritable() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the category directory should be
    let root = dir.path().join("root");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("blocked"), b"file").unwrap();
    let mut library = TemplateLibrary::new(&root);

    let result = library.add(&icon(1), "x", "blocked");

    match result {
        Err(EngineError::TemplateWrite { path, .. }) => assert_eq!(path, root.join("blocked")),
        other => panic!("expected TemplateWrite, got {other:?}"),
    }
    assert!(library.is_empty());
}

#[test]
fn test_add_rejects_names_escaping_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("templates");
    let mut library = TemplateLibrary::new(&root);

    for (name, category) in [
        ("coin", "../outside"),
        ("coin", ".."),
        ("../coin", "general"),
        ("nested/coin", "general"),
        ("coin", "a\\b"),
        ("", "general"),
    ] {
        let result = library.add(&icon(1), name, category);
        assert!(
            matches!(result, Err(EngineError::InvalidTemplateName { .. })),
            "accepted name {name:?} category {category:?}"
        );
    }

    assert!(library.is_empty());
    assert!(!dir.path().join("outside").exists());
    assert!(!root.exists());
}
