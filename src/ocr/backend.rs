use image::GrayImage;

use super::easyocr::EasyOcrCli;
use super::error::{OcrError, OcrResult};
use super::tesseract::TesseractCli;
use super::types::{OcrEngineKind, TextRecognizer, TextSpan};
use crate::config::OcrConfig;

/// The OCR engine selected at startup.
pub enum OcrBackend {
    Tesseract(TesseractCli),
    EasyOcr(EasyOcrCli),
}

impl OcrBackend {
    /// Build the configured engine, probing its executable once.
    ///
    /// `auto` prefers EasyOCR and falls back to Tesseract; when neither
    /// starts this fails with [`OcrError::NoBackendAvailable`].
    pub fn from_config(config: &OcrConfig) -> OcrResult<Self> {
        Self::new(config.engine, &config.language)
    }

    pub fn new(kind: OcrEngineKind, language: &str) -> OcrResult<Self> {
        match kind {
            OcrEngineKind::Tesseract => Ok(OcrBackend::Tesseract(TesseractCli::new(language)?)),
            OcrEngineKind::EasyOcr => Ok(OcrBackend::EasyOcr(EasyOcrCli::new(language)?)),
            OcrEngineKind::Auto => match EasyOcrCli::new(language) {
                Ok(easy) => Ok(OcrBackend::EasyOcr(easy)),
                Err(e) => {
                    log::debug!("EasyOCR not usable ({e}), trying Tesseract");
                    match TesseractCli::new(language) {
                        Ok(tess) => Ok(OcrBackend::Tesseract(tess)),
                        Err(e) => {
                            log::debug!("Tesseract not usable ({e})");
                            Err(OcrError::NoBackendAvailable)
                        }
                    }
                }
            },
        }
    }
}

impl TextRecognizer for OcrBackend {
    fn name(&self) -> &str {
        match self {
            OcrBackend::Tesseract(t) => t.name(),
            OcrBackend::EasyOcr(e) => e.name(),
        }
    }

    fn recognize(&self, region: &GrayImage) -> OcrResult<Vec<TextSpan>> {
        match self {
            OcrBackend::Tesseract(t) => t.recognize(region),
            OcrBackend::EasyOcr(e) => e.recognize(region),
        }
    }
}
