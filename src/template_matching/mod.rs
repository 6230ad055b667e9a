//! Template matching for icon detection in screenshots
//!
//! This module provides:
//! - Correlation and resize primitives over intensity images
//! - Scale-space search producing raw candidate matches per marker
//! - Overlap resolution collapsing candidates from all markers into detections

pub mod correlation;
pub mod matcher;
pub mod nms;
pub mod types;

pub use matcher::{ScaleMode, ScaleSpaceMatcher};
pub use nms::{DEFAULT_IOU_THRESHOLD, OverlapResolver};
pub use types::{BoundingBox, CandidateMatch, CorrelationMetric, Detection};
