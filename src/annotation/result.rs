//! Parsed annotation text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::ocr::TextSpan;
use crate::template_matching::BoundingBox;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid digit run regex"));

/// Every run of ASCII digits in `text`, in reading order. Runs too long for a
/// `u64` are skipped.
pub fn extract_numbers(text: &str) -> Vec<u64> {
    DIGIT_RUN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// The largest number in `text`.
///
/// The largest value wins, not the first one: for "Lv.45 x3" this is 45,
/// and for "Lv.45 x3 HP100" it is 100.
pub fn primary_number(text: &str) -> Option<u64> {
    extract_numbers(text).into_iter().max()
}

/// Text read near a detection together with the numbers found in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    pub text: String,
    pub confidence: f32,
    pub numbers: Vec<u64>,
    /// Location of the text in full-image coordinates
    pub bbox: Option<BoundingBox>,
}

impl AnnotationResult {
    pub fn from_span(span: TextSpan) -> Self {
        Self {
            numbers: extract_numbers(&span.text),
            text: span.text,
            confidence: span.confidence,
            bbox: Some(span.bbox),
        }
    }

    pub fn primary_number(&self) -> Option<u64> {
        self.numbers.iter().max().copied()
    }

    pub fn has_number(&self) -> bool {
        !self.numbers.is_empty()
    }
}
