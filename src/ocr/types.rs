use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::OcrResult;
use crate::template_matching::BoundingBox;

/// One piece of recognised text with its location inside the recognised
/// region and a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }
}

/// Capability contract shared by every OCR engine.
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Recognise text in `region`. Span boxes are relative to the region.
    fn recognize(&self, region: &GrayImage) -> OcrResult<Vec<TextSpan>>;
}

/// Which engine to construct at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    /// EasyOCR when installed, Tesseract otherwise
    #[default]
    Auto,
    Tesseract,
    EasyOcr,
}

impl fmt::Display for OcrEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrEngineKind::Auto => write!(f, "auto"),
            OcrEngineKind::Tesseract => write!(f, "tesseract"),
            OcrEngineKind::EasyOcr => write!(f, "easyocr"),
        }
    }
}
