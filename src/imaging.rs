//! Image preparation and visualisation helpers

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::template_matching::Detection;

const DETECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Load an image from disk, mapping failures to [`EngineError::Decode`].
pub fn load(path: &Path) -> EngineResult<DynamicImage> {
    image::open(path).map_err(|source| EngineError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Gaussian smoothing used on both sides of a correlation; `None` copies.
pub fn smooth(image: &GrayImage, sigma: Option<f32>) -> GrayImage {
    match sigma {
        Some(sigma) if sigma > 0.0 => gaussian_blur_f32(image, sigma),
        _ => image.clone(),
    }
}

/// Downscale so the image fits `max_width x max_height`, keeping the aspect
/// ratio. Images already within bounds are returned unchanged.
pub fn fit_within(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= max_width && height <= max_height {
        return image;
    }

    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    log::debug!("📐 Downscaling input {width}x{height} -> {new_width}x{new_height}");
    image.resize_exact(new_width, new_height, FilterType::Triangle)
}

/// Copy of `image` with a two pixel box drawn around each detection.
pub fn draw_detections(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for detection in detections {
        let b = detection.bbox;
        if b.width == 0 || b.height == 0 {
            continue;
        }
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(b.x as i32, b.y as i32).of_size(b.width, b.height),
            DETECTION_COLOR,
        );
        if b.width > 2 && b.height > 2 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(b.x as i32 + 1, b.y as i32 + 1).of_size(b.width - 2, b.height - 2),
                DETECTION_COLOR,
            );
        }
    }
    canvas
}

/// Write the visualisation for `source` as `<dir>/<stem>_processed.png`.
pub fn save_visualization(
    image: &DynamicImage,
    detections: &[Detection],
    source: &Path,
    dir: &Path,
) -> EngineResult<std::path::PathBuf> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let out = dir.join(format!("{stem}_processed.png"));

    std::fs::create_dir_all(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    draw_detections(image, detections)
        .save(&out)
        .map_err(|source| EngineError::ImageWrite {
            path: out.clone(),
            source,
        })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template_library::Fingerprint;
    use crate::template_matching::BoundingBox;

    #[test]
    fn test_fit_within_keeps_small_images() {
        let image = DynamicImage::new_luma8(640, 480);
        let out = fit_within(image, 1920, 1080);
        assert_eq!((out.width(), out.height()), (640, 480));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let image = DynamicImage::new_luma8(3840, 1600);
        let out = fit_within(image, 1920, 1080);
        assert_eq!((out.width(), out.height()), (1920, 800));
    }

    #[test]
    fn test_smooth_none_is_identity() {
        let image = GrayImage::from_fn(5, 5, |x, y| image::Luma([(x * 40 + y) as u8]));
        assert_eq!(smooth(&image, None), image);
    }

    #[test]
    fn test_draw_detections_outlines_box() {
        let image = DynamicImage::new_rgb8(30, 30);
        let detection = Detection {
            marker_name: "coin".to_string(),
            fingerprint: Fingerprint::from_hex("00"),
            bbox: BoundingBox::new(5, 5, 10, 10),
            confidence: 0.9,
            scale: 1.0,
        };
        let canvas = draw_detections(&image, &[detection]);

        assert_eq!(*canvas.get_pixel(5, 5), DETECTION_COLOR);
        assert_eq!(*canvas.get_pixel(6, 6), DETECTION_COLOR);
        assert_eq!(*canvas.get_pixel(10, 10), Rgb([0, 0, 0]));
    }
}
