//! Typed application configuration, loaded once at startup

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::annotation::Direction;
use crate::ocr::OcrEngineKind;
use crate::template_matching::CorrelationMetric;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub matching: MatchConfig,
    pub ocr: OcrConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/icon_records.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Directory holding the reference icons, one subdirectory per category
    pub template_dir: PathBuf,
    /// Confidence threshold for template matching (0.0 to 1.0)
    pub confidence_threshold: f32,
    /// Whether to search every scale in `scales` or only the template's own size
    pub multi_scale: bool,
    /// Scale factors for multi-scale matching, ascending
    pub scales: Vec<f32>,
    pub metric: CorrelationMetric,
    /// Candidates overlapping a kept detection at or above this IoU are dropped
    pub iou_threshold: f32,
    /// Gaussian smoothing applied to target and template before correlation
    pub blur_sigma: Option<f32>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("data/templates"),
            confidence_threshold: 0.8,
            multi_scale: true,
            scales: vec![0.8, 0.9, 1.0, 1.1, 1.2],
            metric: CorrelationMetric::CorrelationCoefficientNormalized,
            iou_threshold: 0.3,
            blur_sigma: Some(0.8),
        }
    }
}

impl MatchConfig {
    /// Configuration that only tries the template at its stored size
    pub fn single_scale(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            multi_scale: false,
            scales: vec![1.0],
            ..Self::default()
        }
    }

    /// Check ranges and normalise the scale list to ascending, unique values.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "matching.confidence_threshold",
                reason: format!("{} is outside [0, 1]", self.confidence_threshold),
            });
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::Invalid {
                field: "matching.iou_threshold",
                reason: format!("{} is outside [0, 1]", self.iou_threshold),
            });
        }
        if let Some(bad) = self.scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(ConfigError::Invalid {
                field: "matching.scales",
                reason: format!("scale factor {bad} must be positive"),
            });
        }
        if self.multi_scale && self.scales.is_empty() {
            return Err(ConfigError::Invalid {
                field: "matching.scales",
                reason: "multi-scale matching needs at least one scale".to_string(),
            });
        }
        if let Some(sigma) = self.blur_sigma
            && !(sigma.is_finite() && sigma > 0.0)
        {
            return Err(ConfigError::Invalid {
                field: "matching.blur_sigma",
                reason: format!("{sigma} must be positive, or null to disable"),
            });
        }

        self.scales.sort_by(f32::total_cmp);
        self.scales.dedup();
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: OcrEngineKind,
    pub language: String,
    /// Denoise, binarise and upscale regions before recognition
    pub preprocess: bool,
    pub search_width: u32,
    pub search_height: u32,
    pub direction: Direction,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Auto,
            language: "en".to_string(),
            preprocess: true,
            search_width: 100,
            search_height: 50,
            direction: Direction::Right,
        }
    }
}

impl OcrConfig {
    pub fn search_size(&self) -> (u32, u32) {
        (self.search_width, self.search_height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub save_visualizations: bool,
    pub visualization_dir: PathBuf,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_image_width: 1920,
            max_image_height: 1080,
            save_visualizations: true,
            visualization_dir: PathBuf::from("data/processed"),
        }
    }
}

impl AppConfig {
    /// Load the configuration file. A missing file falls back to defaults; a
    /// file that exists but does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!("Config file not found at {path:?}, using defaults");
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        log::info!("Configuration loaded from {path:?}");
        Ok(config)
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.matching.validate()?;
        if self.ocr.search_width == 0 || self.ocr.search_height == 0 {
            return Err(ConfigError::Invalid {
                field: "ocr.search_width/search_height",
                reason: "search region must be non-empty".to_string(),
            });
        }
        if self.processing.max_image_width == 0 || self.processing.max_image_height == 0 {
            return Err(ConfigError::Invalid {
                field: "processing.max_image_width/max_image_height",
                reason: "maximum image size must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_config_defaults() {
        let config = MatchConfig::default();

        assert_eq!(config.confidence_threshold, 0.8);
        assert!(config.multi_scale);
        assert_eq!(config.scales, vec![0.8, 0.9, 1.0, 1.1, 1.2]);
        assert_eq!(config.iou_threshold, 0.3);
        assert_eq!(config.metric, CorrelationMetric::CorrelationCoefficientNormalized);
    }

    #[test]
    fn test_scales_sorted_and_deduplicated() {
        let mut config = MatchConfig {
            scales: vec![1.2, 0.8, 1.0, 0.8],
            ..MatchConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.scales, vec![0.8, 1.0, 1.2]);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = MatchConfig {
            confidence_threshold: 1.5,
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "matching.confidence_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let mut config = MatchConfig {
            scales: vec![0.0, 1.0],
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let raw = r#"{ "matching": { "confidence_threshold": 0.9, "blur_sigma": null },
                       "ocr": { "engine": "tesseract", "direction": "left" } }"#;
        let mut config: AppConfig = serde_json::from_str(raw).unwrap();
        config.validate().unwrap();

        assert_eq!(config.matching.confidence_threshold, 0.9);
        assert_eq!(config.matching.blur_sigma, None);
        assert_eq!(config.matching.scales.len(), 5);
        assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
        assert_eq!(config.ocr.direction, Direction::Left);
        assert_eq!(config.ocr.search_size(), (100, 50));
        assert_eq!(config.processing.max_image_width, 1920);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.database.path, PathBuf::from("data/icon_records.json"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
