//! Correlation and resize primitives backed by `imageproc` / `image`

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use imageproc::template_matching::{MatchTemplateMethod, match_template};

use super::types::CorrelationMetric;

/// Per-placement score surface, `(target - template + 1)` in each dimension
pub type ScoreGrid = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Whether `template` fits inside `target` in both dimensions.
pub fn fits_within(target: &GrayImage, template: &GrayImage) -> bool {
    template.width() > 0
        && template.height() > 0
        && template.width() <= target.width()
        && template.height() <= target.height()
}

/// Score every placement of `template` over `target`.
///
/// Returns `None` when the template does not fit.
pub fn correlate(
    target: &GrayImage,
    template: &GrayImage,
    metric: CorrelationMetric,
) -> Option<ScoreGrid> {
    if !fits_within(target, template) {
        return None;
    }
    let scores = match metric {
        CorrelationMetric::CorrelationCoefficientNormalized => {
            correlation_coefficient(target, template)
        }
        CorrelationMetric::CrossCorrelationNormalized => {
            match_template(target, template, MatchTemplateMethod::CrossCorrelationNormalized)
        }
        CorrelationMetric::SquaredDifferenceNormalized => {
            match_template(target, template, MatchTemplateMethod::SumOfSquaredErrorsNormalized)
        }
    };
    Some(scores)
}

/// Zero-mean normalized cross-correlation in `[-1, 1]`.
///
/// Built from the raw `CrossCorrelation` surface and integral images of the
/// target, so each window's mean and energy cost O(1). Windows or templates
/// with no variance score NaN.
fn correlation_coefficient(target: &GrayImage, template: &GrayImage) -> ScoreGrid {
    let cross = match_template(target, template, MatchTemplateMethod::CrossCorrelation);
    let sums: Image<Luma<u64>> = integral_image(target);
    let squares: Image<Luma<u64>> = integral_squared_image(target);

    let (tw, th) = template.dimensions();
    let n = u128::from(tw) * u128::from(th);
    let (t_sum, t_sq) = template.pixels().fold((0u128, 0u128), |(sum, sq), p| {
        let v = u128::from(p[0]);
        (sum + v, sq + v * v)
    });
    // n * variance, exact in integers
    let t_spread = n * t_sq - t_sum * t_sum;

    ScoreGrid::from_fn(cross.width(), cross.height(), |x, y| {
        let [w_sum] = sum_image_pixels(&sums, x, y, x + tw - 1, y + th - 1);
        let [w_sq] = sum_image_pixels(&squares, x, y, x + tw - 1, y + th - 1);
        let (w_sum, w_sq) = (u128::from(w_sum), u128::from(w_sq));
        let w_spread = n * w_sq - w_sum * w_sum;
        if w_spread == 0 || t_spread == 0 {
            return Luma([f32::NAN]);
        }

        let numerator =
            n as f64 * f64::from(cross.get_pixel(x, y)[0]) - (w_sum * t_sum) as f64;
        let denominator = (w_spread as f64 * t_spread as f64).sqrt();
        Luma([(numerator / denominator) as f32])
    })
}

/// Resize a template by `scale`, area-averaging when shrinking and cubic
/// interpolation when enlarging. Returns `None` if a side collapses to zero.
pub fn scale_template(template: &GrayImage, scale: f32) -> Option<GrayImage> {
    if (scale - 1.0).abs() < f32::EPSILON {
        return Some(template.clone());
    }

    let new_width = (template.width() as f32 * scale) as u32;
    let new_height = (template.height() as f32 * scale) as u32;
    if new_width == 0 || new_height == 0 {
        return None;
    }

    let resized = if scale < 1.0 {
        imageops::thumbnail(template, new_width, new_height)
    } else {
        imageops::resize(template, new_width, new_height, FilterType::CatmullRom)
    };
    Some(resized)
}

/// Location and raw value of the best score on the surface, skipping NaNs
/// produced by flat (zero-energy) windows.
pub fn best_location(scores: &ScoreGrid, metric: CorrelationMetric) -> Option<(u32, u32, f32)> {
    let mut best: Option<(u32, u32, f32)> = None;
    for (x, y, pixel) in scores.enumerate_pixels() {
        let raw = pixel[0];
        if raw.is_nan() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, _, current)) if metric.higher_is_better() => raw > current,
            Some((_, _, current)) => raw < current,
        };
        if better {
            best = Some((x, y, raw));
        }
    }
    best
}
