//! Marker template value type

use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};

use super::fingerprint::Fingerprint;

/// Category assigned to templates stored directly in the library root
pub const DEFAULT_CATEGORY: &str = "general";

/// A reference icon. Immutable once built.
#[derive(Debug, Clone)]
pub struct MarkerTemplate {
    pub name: String,
    pub category: String,
    pub fingerprint: Fingerprint,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
    /// Single-channel pixels used for matching
    pub intensity: GrayImage,
}

impl MarkerTemplate {
    pub fn from_image(
        name: impl Into<String>,
        category: impl Into<String>,
        path: PathBuf,
        image: &DynamicImage,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            fingerprint: Fingerprint::of(image),
            width: image.width(),
            height: image.height(),
            path,
            intensity: image.to_luma8(),
        }
    }

    /// Template name derived from a file path (file stem)
    pub fn name_from_path(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Centre of this template when matched at `(match_x, match_y)`
    pub fn center_at(&self, match_x: u32, match_y: u32) -> (u32, u32) {
        (match_x + self.width / 2, match_y + self.height / 2)
    }
}
