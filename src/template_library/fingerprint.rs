//! Content fingerprint of a marker image

use image::DynamicImage;
use image::imageops::FilterType;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the canonical square every image is resized to before hashing
pub const CANONICAL_SIZE: u32 = 64;

/// Hex digest of the canonical 64x64 intensity grid of an image.
///
/// Two images that reduce to the same canonical grid share a fingerprint
/// regardless of their original resolution or file encoding. Equality is
/// exact; visually similar images with any differing byte are distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(image: &DynamicImage) -> Self {
        let canonical = image
            .resize_exact(CANONICAL_SIZE, CANONICAL_SIZE, FilterType::Triangle)
            .to_luma8();
        let digest = Md5::digest(canonical.as_raw());
        Self(format!("{digest:x}"))
    }

    /// Wrap an already computed digest, e.g. one read back from storage.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn sample(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 3) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
        }))
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let image = sample(40, 30);
        assert_eq!(Fingerprint::of(&image), Fingerprint::of(&image));
    }

    #[test]
    fn test_fingerprint_is_md5_hex() {
        let fp = Fingerprint::of(&sample(10, 10));
        assert_eq!(fp.as_str().len(), 32);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_canonical_size_images_hash_identically() {
        // Already canonical: resizing is a no-op, so equal pixels give equal hashes
        let a = sample(CANONICAL_SIZE, CANONICAL_SIZE);
        let b = DynamicImage::ImageRgb8(a.to_rgb8());
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_different_content_differs() {
        let a = sample(32, 32);
        let b = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(32, 32, Rgb([9, 9, 9])));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }
}
