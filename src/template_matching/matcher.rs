//! Scale-space template matching
//!
//! Runs the correlation primitive for one marker at each configured scale and
//! emits every placement that clears the confidence threshold.

use image::GrayImage;

use super::correlation::{best_location, correlate, scale_template};
use super::types::{BoundingBox, CandidateMatch, CorrelationMetric};
use crate::config::MatchConfig;
use crate::imaging;
use crate::template_library::MarkerTemplate;

/// Which scales to search
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleMode {
    /// Template at its stored size; at most the global best is reported
    Single,
    /// Every listed factor (ascending); every passing placement is reported
    Multi(Vec<f32>),
}

#[derive(Clone, Debug)]
pub struct ScaleSpaceMatcher {
    mode: ScaleMode,
    threshold: f32,
    metric: CorrelationMetric,
    blur_sigma: Option<f32>,
}

impl ScaleSpaceMatcher {
    pub fn new(mode: ScaleMode, threshold: f32, metric: CorrelationMetric) -> Self {
        let mode = match mode {
            ScaleMode::Multi(mut scales) => {
                scales.retain(|s| s.is_finite() && *s > 0.0);
                scales.sort_by(f32::total_cmp);
                scales.dedup();
                ScaleMode::Multi(scales)
            }
            single => single,
        };
        Self {
            mode,
            threshold,
            metric,
            blur_sigma: None,
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        let mode = if config.multi_scale {
            ScaleMode::Multi(config.scales.clone())
        } else {
            ScaleMode::Single
        };
        Self::new(mode, config.confidence_threshold, config.metric).with_blur(config.blur_sigma)
    }

    /// Smooth templates before correlation. The target must be prepared with
    /// the same sigma, see [`ScaleSpaceMatcher::prepare_target`].
    pub fn with_blur(mut self, sigma: Option<f32>) -> Self {
        self.blur_sigma = sigma.filter(|s| *s > 0.0);
        self
    }

    pub fn mode(&self) -> &ScaleMode {
        &self.mode
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn prepare_target(&self, target: &GrayImage) -> GrayImage {
        imaging::smooth(target, self.blur_sigma)
    }

    /// Find candidate placements of `template` in an already prepared target.
    ///
    /// Templates that do not fit the target at a given scale are skipped
    /// without error.
    pub fn find_candidates(
        &self,
        target: &GrayImage,
        template: &MarkerTemplate,
    ) -> Vec<CandidateMatch> {
        let template_gray = imaging::smooth(&template.intensity, self.blur_sigma);

        match &self.mode {
            ScaleMode::Single => self
                .best_at_scale(target, &template_gray, template, 1.0)
                .into_iter()
                .collect(),
            ScaleMode::Multi(scales) => {
                let mut candidates = Vec::new();
                for &scale in scales {
                    let found = self.all_at_scale(target, &template_gray, template, scale);
                    log::debug!(
                        "  🔍 '{}' scale {:.2}: {} candidate(s)",
                        template.name,
                        scale,
                        found.len()
                    );
                    candidates.extend(found);
                }
                candidates
            }
        }
    }

    fn best_at_scale(
        &self,
        target: &GrayImage,
        template_gray: &GrayImage,
        template: &MarkerTemplate,
        scale: f32,
    ) -> Option<CandidateMatch> {
        let scaled = scale_template(template_gray, scale)?;
        let Some(scores) = correlate(target, &scaled, self.metric) else {
            log::debug!(
                "⚠️ Skipping '{}' - {}x{} template larger than {}x{} target",
                template.name,
                scaled.width(),
                scaled.height(),
                target.width(),
                target.height()
            );
            return None;
        };

        let (x, y, raw) = best_location(&scores, self.metric)?;
        let confidence = self.metric.confidence(raw);
        if confidence < self.threshold {
            return None;
        }
        Some(self.candidate(template, &scaled, x, y, confidence, scale))
    }

    fn all_at_scale(
        &self,
        target: &GrayImage,
        template_gray: &GrayImage,
        template: &MarkerTemplate,
        scale: f32,
    ) -> Vec<CandidateMatch> {
        let Some(scaled) = scale_template(template_gray, scale) else {
            return Vec::new();
        };
        let Some(scores) = correlate(target, &scaled, self.metric) else {
            return Vec::new();
        };

        scores
            .enumerate_pixels()
            .filter(|(_, _, pixel)| !pixel[0].is_nan())
            .filter_map(|(x, y, pixel)| {
                let confidence = self.metric.confidence(pixel[0]);
                (confidence >= self.threshold)
                    .then(|| self.candidate(template, &scaled, x, y, confidence, scale))
            })
            .collect()
    }

    fn candidate(
        &self,
        template: &MarkerTemplate,
        scaled: &GrayImage,
        x: u32,
        y: u32,
        confidence: f32,
        scale: f32,
    ) -> CandidateMatch {
        CandidateMatch {
            marker_name: template.name.clone(),
            fingerprint: template.fingerprint.clone(),
            bbox: BoundingBox::new(x, y, scaled.width(), scaled.height()),
            confidence,
            scale,
        }
    }
}
