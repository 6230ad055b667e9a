//! Region clean-up before recognition

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;

use crate::template_matching::BoundingBox;

/// Upscale factor applied to regions before recognition
pub const UPSCALE: u32 = 2;

/// Denoise, binarise with Otsu's threshold and upscale `region`.
pub fn prepare(region: &GrayImage) -> GrayImage {
    let denoised = median_filter(region, 1, 1);
    let level = otsu_level(&denoised);
    let binary = GrayImage::from_fn(denoised.width(), denoised.height(), |x, y| {
        if denoised.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    imageops::resize(
        &binary,
        binary.width() * UPSCALE,
        binary.height() * UPSCALE,
        FilterType::CatmullRom,
    )
}

/// Map a box found in a region that was scaled by `factor` back to image
/// coordinates, given the region's origin in the image.
pub fn map_to_image(bbox: BoundingBox, factor: u32, origin: (u32, u32)) -> BoundingBox {
    let factor = factor.max(1);
    BoundingBox::new(
        origin.0 + bbox.x / factor,
        origin.1 + bbox.y / factor,
        bbox.width.div_ceil(factor),
        bbox.height.div_ceil(factor),
    )
}
