//! Reading annotations next to detections

use image::GrayImage;
use image::imageops;

use super::region::{Direction, search_window};
use super::result::AnnotationResult;
use crate::ocr::preprocess::{self, UPSCALE};
use crate::ocr::{TextRecognizer, TextSpan};
use crate::template_matching::BoundingBox;

/// Runs OCR over windows of an image and keeps the numeric readings.
pub struct AnnotationReader {
    recognizer: Box<dyn TextRecognizer>,
    preprocess: bool,
}

impl AnnotationReader {
    pub fn new(recognizer: Box<dyn TextRecognizer>, preprocess: bool) -> Self {
        Self {
            recognizer,
            preprocess,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Best numeric annotation in the window beside `anchor`.
    ///
    /// Returns `None` when the window is empty after clipping, when OCR
    /// fails, or when no span contains a digit. Among numeric spans the
    /// most confident wins; ties keep the earlier span.
    pub fn read_near(
        &self,
        image: &GrayImage,
        anchor: (u32, u32),
        size: (u32, u32),
        direction: Direction,
    ) -> Option<AnnotationResult> {
        let window = match search_window(anchor, size, direction, image.dimensions()) {
            Ok(window) => window,
            Err(e) => {
                log::debug!("No annotation read: {e}");
                return None;
            }
        };

        let mut best: Option<AnnotationResult> = None;
        for candidate in self.read_numbers(image, window) {
            if best
                .as_ref()
                .is_none_or(|b| candidate.confidence > b.confidence)
            {
                best = Some(candidate);
            }
        }
        best
    }

    /// Every span in `window`, parsed.
    pub fn read_text(&self, image: &GrayImage, window: BoundingBox) -> Vec<AnnotationResult> {
        self.read_region(image, window)
            .into_iter()
            .map(AnnotationResult::from_span)
            .collect()
    }

    /// Spans in `window` that contain at least one number.
    pub fn read_numbers(&self, image: &GrayImage, window: BoundingBox) -> Vec<AnnotationResult> {
        self.read_text(image, window)
            .into_iter()
            .filter(AnnotationResult::has_number)
            .collect()
    }

    /// Raw spans in `window`, with boxes in full-image coordinates.
    ///
    /// OCR failures are logged and read as no text.
    pub fn read_region(&self, image: &GrayImage, window: BoundingBox) -> Vec<TextSpan> {
        let (width, height) = image.dimensions();
        let x = window.x.min(width);
        let y = window.y.min(height);
        let w = window.width.min(width - x);
        let h = window.height.min(height - y);
        if w == 0 || h == 0 {
            return Vec::new();
        }

        let crop = imageops::crop_imm(image, x, y, w, h).to_image();
        let (region, factor) = if self.preprocess {
            (preprocess::prepare(&crop), UPSCALE)
        } else {
            (crop, 1)
        };

        match self.recognizer.recognize(&region) {
            Ok(spans) => {
                log::debug!(
                    "🔤 {} read {} span(s) in {w}x{h} at ({x},{y})",
                    self.recognizer.name(),
                    spans.len()
                );
                spans
                    .into_iter()
                    .map(|span| TextSpan {
                        bbox: preprocess::map_to_image(span.bbox, factor, (x, y)),
                        ..span
                    })
                    .collect()
            }
            Err(e) => {
                log::warn!("⚠️ OCR failed on window ({x},{y}) {w}x{h}: {e}");
                Vec::new()
            }
        }
    }
}
