//! Overlap resolution (non-maximum suppression) across all markers and scales

use std::cmp::Ordering;

use super::types::{CandidateMatch, Detection};

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

#[derive(Clone, Copy, Debug)]
pub struct OverlapResolver {
    iou_threshold: f32,
}

impl Default for OverlapResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_THRESHOLD)
    }
}

impl OverlapResolver {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }

    pub fn iou_threshold(&self) -> f32 {
        self.iou_threshold
    }

    /// Collapse candidates into a spatially disjoint set of detections.
    ///
    /// Output is in discovery order: confidence descending, equal confidences
    /// broken by smaller `y`, smaller `x`, marker name, then smaller area, so
    /// the result does not depend on input order.
    pub fn resolve(&self, mut candidates: Vec<CandidateMatch>) -> Vec<Detection> {
        candidates.sort_by(rank);

        let mut kept: Vec<CandidateMatch> = Vec::new();
        for candidate in candidates {
            let suppressed = kept
                .iter()
                .any(|k| k.bbox.iou(&candidate.bbox) >= self.iou_threshold);
            if !suppressed {
                kept.push(candidate);
            }
        }

        kept.into_iter().map(Detection::from).collect()
    }
}

fn rank(a: &CandidateMatch, b: &CandidateMatch) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.bbox.y.cmp(&b.bbox.y))
        .then_with(|| a.bbox.x.cmp(&b.bbox.x))
        .then_with(|| a.marker_name.cmp(&b.marker_name))
        .then_with(|| a.bbox.area().cmp(&b.bbox.area()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template_library::Fingerprint;
    use crate::template_matching::BoundingBox;

    fn candidate(name: &str, x: u32, y: u32, size: u32, confidence: f32) -> CandidateMatch {
        CandidateMatch {
            marker_name: name.to_string(),
            fingerprint: Fingerprint::from_hex(name),
            bbox: BoundingBox::new(x, y, size, size),
            confidence,
            scale: 1.0,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(OverlapResolver::default().resolve(Vec::new()).is_empty());
    }

    #[test]
    fn test_keeps_highest_of_overlapping_cluster() {
        let resolver = OverlapResolver::default();
        let detections = resolver.resolve(vec![
            candidate("coin", 101, 100, 20, 0.85),
            candidate("coin", 100, 100, 20, 0.97),
            candidate("coin", 99, 101, 20, 0.90),
        ]);

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].position(), (100, 100));
        assert_eq!(detections[0].confidence, 0.97);
    }

    #[test]
    fn test_overlapping_scales_resolve_to_one() {
        // Same marker matched at scale 1.0 and 1.1 on top of each other
        let mut larger = candidate("coin", 199, 99, 22, 0.93);
        larger.scale = 1.1;
        let detections = OverlapResolver::default().resolve(vec![
            larger,
            candidate("coin", 200, 100, 20, 0.97),
        ]);

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].scale, 1.0);
        assert_eq!(detections[0].confidence, 0.97);
    }

    #[test]
    fn test_suppression_crosses_markers() {
        let detections = OverlapResolver::default().resolve(vec![
            candidate("potion", 10, 10, 20, 0.81),
            candidate("elixir", 12, 10, 20, 0.95),
        ]);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].marker_name, "elixir");
    }

    #[test]
    fn test_disjoint_candidates_all_survive_in_confidence_order() {
        let detections = OverlapResolver::default().resolve(vec![
            candidate("a", 0, 0, 10, 0.82),
            candidate("b", 100, 0, 10, 0.99),
            candidate("c", 0, 100, 10, 0.90),
        ]);
        let names: Vec<_> = detections.iter().map(|d| d.marker_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_no_surviving_pair_reaches_threshold() {
        let resolver = OverlapResolver::new(0.3);
        let mut input = Vec::new();
        for i in 0..12u32 {
            for j in 0..6u32 {
                let conf = 0.8 + ((i * 7 + j * 3) % 19) as f32 / 100.0;
                input.push(candidate("grid", i * 6, j * 7, 16, conf));
            }
        }
        let total = input.len();
        let detections = resolver.resolve(input);

        assert!(detections.len() <= total);
        for (i, a) in detections.iter().enumerate() {
            for b in &detections[i + 1..] {
                assert!(a.bbox.iou(&b.bbox) < 0.3);
            }
        }
    }

    #[test]
    fn test_equal_confidence_tie_break_is_order_independent() {
        let first = candidate("b", 30, 10, 20, 0.9);
        let second = candidate("a", 20, 10, 20, 0.9);

        let forward = OverlapResolver::default().resolve(vec![first.clone(), second.clone()]);
        let backward = OverlapResolver::default().resolve(vec![second, first]);

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 1);
        // Smaller x wins among equal confidences on the same row
        assert_eq!(forward[0].position(), (20, 10));
    }
}
