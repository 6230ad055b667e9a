//! Template matching data types

use serde::{Deserialize, Serialize};

use crate::template_library::Fingerprint;

/// Axis-aligned box in target-image pixel space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Area shared by both boxes, 0 when they only touch or are disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let left = self.x.max(other.x) as u64;
        let top = self.y.max(other.y) as u64;
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) * (bottom - top)
    }

    /// Intersection over union. Degenerate (zero-area) boxes never overlap.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let (a, b) = (self.area(), other.area());
        if a == 0 || b == 0 {
            return 0.0;
        }
        let intersection = self.intersection_area(other);
        if intersection == 0 {
            return 0.0;
        }
        let union = a + b - intersection;
        (intersection as f64 / union as f64) as f32
    }
}

/// Correlation metric used to score template placements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMetric {
    /// Zero-mean normalized cross-correlation, higher is better
    #[default]
    CorrelationCoefficientNormalized,
    /// Normalized cross-correlation without mean removal, higher is better.
    /// Flat bright regions score high against most templates.
    CrossCorrelationNormalized,
    /// Normalized squared difference, lower is better
    SquaredDifferenceNormalized,
}

impl CorrelationMetric {
    pub fn higher_is_better(self) -> bool {
        !matches!(self, CorrelationMetric::SquaredDifferenceNormalized)
    }

    /// Map a raw surface score onto a confidence where 1.0 is a perfect match.
    pub fn confidence(self, raw: f32) -> f32 {
        let confidence = if self.higher_is_better() {
            raw
        } else {
            1.0 - raw
        };
        confidence.clamp(0.0, 1.0)
    }
}

/// A single scale/position proposal from the matcher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub marker_name: String,
    pub fingerprint: Fingerprint,
    /// Top-left position and size at the matched scale
    pub bbox: BoundingBox,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub scale: f32,
}

impl CandidateMatch {
    pub fn position(&self) -> (u32, u32) {
        (self.bbox.x, self.bbox.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.bbox.width, self.bbox.height)
    }
}

/// A candidate that survived overlap resolution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub marker_name: String,
    pub fingerprint: Fingerprint,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub scale: f32,
}

impl Detection {
    pub fn position(&self) -> (u32, u32) {
        (self.bbox.x, self.bbox.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.bbox.width, self.bbox.height)
    }

    /// Format detection as string with confidence percentage
    pub fn describe(&self) -> String {
        let confidence_pct = (self.confidence * 100.0) as u32;
        format!(
            "{} at ({},{}) {}x{} - {}% (scale {:.2})",
            self.marker_name,
            self.bbox.x,
            self.bbox.y,
            self.bbox.width,
            self.bbox.height,
            confidence_pct,
            self.scale
        )
    }
}

impl From<CandidateMatch> for Detection {
    fn from(candidate: CandidateMatch) -> Self {
        Self {
            marker_name: candidate.marker_name,
            fingerprint: candidate.fingerprint,
            bbox: candidate.bbox,
            confidence: candidate.confidence,
            scale: candidate.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_iou_identical_box_is_one() {
        let a = BoundingBox::new(10, 20, 30, 40);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_is_symmetric() {
        let pairs = [
            (BoundingBox::new(0, 0, 10, 10), BoundingBox::new(5, 5, 10, 10)),
            (BoundingBox::new(3, 7, 20, 4), BoundingBox::new(0, 0, 8, 30)),
            (BoundingBox::new(0, 0, 50, 50), BoundingBox::new(10, 10, 5, 5)),
        ];
        for (a, b) in pairs {
            assert_eq!(a.iou(&b), b.iou(&a));
        }
    }

    #[test]
    fn test_iou_partial_overlap() {
        // 5x5 overlap, union 100 + 100 - 25
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 5, 10, 10);
        assert_relative_eq!(a.iou(&b), 25.0 / 175.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iou_disjoint_and_touching_is_zero() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert_eq!(a.iou(&BoundingBox::new(50, 50, 10, 10)), 0.0);
        // Shares only an edge
        assert_eq!(a.iou(&BoundingBox::new(10, 0, 10, 10)), 0.0);
    }

    #[test]
    fn test_iou_degenerate_box_is_zero() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let empty = BoundingBox::new(2, 2, 0, 5);
        assert_eq!(a.iou(&empty), 0.0);
        assert_eq!(empty.iou(&empty), 0.0);
    }

    #[test]
    fn test_confidence_polarity() {
        let ncc = CorrelationMetric::CrossCorrelationNormalized;
        let coefficient = CorrelationMetric::CorrelationCoefficientNormalized;
        let sqdiff = CorrelationMetric::SquaredDifferenceNormalized;

        assert!(coefficient.higher_is_better());
        assert!(!sqdiff.higher_is_better());
        assert_eq!(coefficient.confidence(-0.6), 0.0);

        assert_relative_eq!(ncc.confidence(0.92), 0.92);
        assert_relative_eq!(sqdiff.confidence(0.08), 0.92, epsilon = 1e-6);
        // Out-of-range raw scores are clamped into [0, 1]
        assert_eq!(sqdiff.confidence(1.7), 0.0);
        assert_eq!(ncc.confidence(-0.3), 0.0);
    }

    #[test]
    fn test_detection_from_candidate() {
        let candidate = CandidateMatch {
            marker_name: "coin".to_string(),
            fingerprint: Fingerprint::from_hex("abc"),
            bbox: BoundingBox::new(4, 5, 6, 7),
            confidence: 0.9,
            scale: 1.1,
        };
        let detection = Detection::from(candidate.clone());
        assert_eq!(detection.position(), candidate.position());
        assert_eq!(detection.size(), (6, 7));
        assert_eq!(detection.describe(), "coin at (4,5) 6x7 - 90% (scale 1.10)");
    }
}
