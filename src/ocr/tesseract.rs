//! Tesseract command line adapter

use image::GrayImage;
use std::process::Command;

use super::error::OcrResult;
use super::process;
use super::types::{TextRecognizer, TextSpan};
use crate::template_matching::BoundingBox;

const ENGINE: &str = "tesseract";
/// Row level of individual words in tesseract's TSV output
const WORD_LEVEL: &str = "5";

pub struct TesseractCli {
    binary: String,
    language: String,
}

impl TesseractCli {
    /// Probe the `tesseract` executable and build the adapter.
    pub fn new(language: &str) -> OcrResult<Self> {
        Self::with_binary("tesseract", language)
    }

    pub fn with_binary(binary: impl Into<String>, language: &str) -> OcrResult<Self> {
        let binary = binary.into();
        process::ensure_available(ENGINE, &binary, "--version")?;
        log::info!("Using Tesseract OCR ({binary})");
        Ok(Self {
            binary,
            language: tesseract_language(language),
        })
    }
}

impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        ENGINE
    }

    fn recognize(&self, region: &GrayImage) -> OcrResult<Vec<TextSpan>> {
        let input = process::write_region(region)?;
        let stdout = process::run(
            ENGINE,
            Command::new(&self.binary)
                .arg(input.path())
                .arg("stdout")
                .args(["-l", self.language.as_str(), "--psm", "6", "tsv"]),
        )?;
        Ok(parse_tsv(&stdout))
    }
}

/// Tesseract names languages with three letters; map the common two-letter
/// codes used elsewhere in the configuration.
fn tesseract_language(language: &str) -> String {
    match language {
        "en" => "eng".to_string(),
        "de" => "deu".to_string(),
        "fr" => "fra".to_string(),
        "es" => "spa".to_string(),
        other => other.to_string(),
    }
}

/// Parse word rows from `tesseract ... tsv` output.
///
/// Columns: level page block par line word left top width height conf text.
/// Rows with negative confidence or blank text are layout rows and skipped.
pub fn parse_tsv(tsv: &str) -> Vec<TextSpan> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 || cols[0] != WORD_LEVEL {
                return None;
            }
            let text = cols[11].trim();
            let conf: f32 = cols[10].trim().parse().ok()?;
            if text.is_empty() || conf < 0.0 {
                return None;
            }
            let left = cols[6].trim().parse().ok()?;
            let top = cols[7].trim().parse().ok()?;
            let width = cols[8].trim().parse().ok()?;
            let height = cols[9].trim().parse().ok()?;
            Some(TextSpan::new(
                text,
                (conf / 100.0).clamp(0.0, 1.0),
                BoundingBox::new(left, top, width, height),
            ))
        })
        .collect()
}
