//! EasyOCR command line adapter

use image::GrayImage;
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;

use super::error::OcrResult;
use super::process;
use super::types::{TextRecognizer, TextSpan};
use crate::template_matching::BoundingBox;

const ENGINE: &str = "easyocr";

/// `([[x, y], ...], 'text', conf)` as printed by `easyocr --detail 1`.
/// Newer releases wrap numbers as `np.int32(10)` / `np.float64(0.9)`.
static RESULT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\(\[(?P<poly>.*)\],\s*(?:'(?P<sq>.*)'|"(?P<dq>.*)"),\s*(?:np\.\w+\()?(?P<conf>[-+0-9.eE]+)\)?\)\s*$"#,
    )
    .expect("valid result line regex")
});

static COORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:np\.\w+\()?(?P<n>-?\d+(?:\.\d+)?)").expect("valid coordinate regex")
});

pub struct EasyOcrCli {
    binary: String,
    language: String,
}

impl EasyOcrCli {
    /// Probe the `easyocr` executable and build the adapter.
    pub fn new(language: &str) -> OcrResult<Self> {
        Self::with_binary("easyocr", language)
    }

    pub fn with_binary(binary: impl Into<String>, language: &str) -> OcrResult<Self> {
        let binary = binary.into();
        process::ensure_available(ENGINE, &binary, "--help")?;
        log::info!("Using EasyOCR ({binary})");
        Ok(Self {
            binary,
            language: language.to_string(),
        })
    }
}

impl TextRecognizer for EasyOcrCli {
    fn name(&self) -> &str {
        ENGINE
    }

    fn recognize(&self, region: &GrayImage) -> OcrResult<Vec<TextSpan>> {
        let input = process::write_region(region)?;
        let stdout = process::run(
            ENGINE,
            Command::new(&self.binary)
                .args(["-l", self.language.as_str(), "-f"])
                .arg(input.path())
                .args(["--detail", "1", "--gpu", "False"]),
        )?;
        Ok(parse_output(&stdout))
    }
}

/// Parse result lines; anything else EasyOCR prints (download progress,
/// warnings) is ignored.
pub fn parse_output(stdout: &str) -> Vec<TextSpan> {
    stdout.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<TextSpan> {
    let caps = RESULT_LINE.captures(line.trim())?;
    let text = caps.name("sq").or_else(|| caps.name("dq"))?.as_str().trim();
    if text.is_empty() {
        return None;
    }
    let confidence: f32 = caps["conf"].parse().ok()?;
    let bbox = polygon_hull(&caps["poly"])?;
    Some(TextSpan::new(text, confidence.clamp(0.0, 1.0), bbox))
}

/// Axis-aligned hull of the `[x, y]` corner list.
fn polygon_hull(poly: &str) -> Option<BoundingBox> {
    let values: Vec<f64> = COORD
        .captures_iter(poly)
        .filter_map(|c| c["n"].parse().ok())
        .collect();
    if values.len() < 2 || values.len() % 2 != 0 {
        return None;
    }

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for point in values.chunks_exact(2) {
        min_x = min_x.min(point[0]);
        max_x = max_x.max(point[0]);
        min_y = min_y.min(point[1]);
        max_y = max_y.max(point[1]);
    }

    let x = min_x.max(0.0).round() as u32;
    let y = min_y.max(0.0).round() as u32;
    let right = max_x.max(0.0).round() as u32;
    let bottom = max_y.max(0.0).round() as u32;
    Some(BoundingBox::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y)))
}
