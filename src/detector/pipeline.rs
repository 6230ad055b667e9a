//! Per-image processing: detection, identity and annotation

use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::engine::IconDetector;
use crate::annotation::{AnnotationReader, AnnotationResult, Direction};
use crate::config::AppConfig;
use crate::error::EngineResult;
use crate::identity::{IdentityId, IdentityMetadata, IdentityResolver};
use crate::imaging;
use crate::storage::NewRecord;
use crate::template_library::{MarkerTemplate, TemplateLibrary};
use crate::template_matching::Detection;

/// Knobs the pipeline needs beyond the detector itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognizerSettings {
    pub search_size: (u32, u32),
    pub direction: Direction,
    pub max_image_size: (u32, u32),
    /// Threshold recorded on identities created by this pipeline
    pub confidence_threshold: f32,
}

impl RecognizerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search_size: config.ocr.search_size(),
            direction: config.ocr.direction,
            max_image_size: (
                config.processing.max_image_width,
                config.processing.max_image_height,
            ),
            confidence_threshold: config.matching.confidence_threshold,
        }
    }
}

/// A detection with its resolved identity and the annotation read beside it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub detection: Detection,
    pub identity_id: IdentityId,
    /// Whether this detection created its identity
    pub created: bool,
    pub annotation: Option<AnnotationResult>,
}

impl Observation {
    pub fn detected_number(&self) -> Option<u64> {
        self.annotation.as_ref().and_then(AnnotationResult::primary_number)
    }

    /// Record to store for this observation
    pub fn to_record(&self, source_image: Option<&Path>) -> NewRecord {
        NewRecord {
            identity_id: self.identity_id,
            detected_number: self.detected_number(),
            detected_text: self.annotation.as_ref().map(|a| a.text.clone()),
            source_image: source_image.map(Path::to_path_buf),
            bbox: self.detection.bbox,
            confidence: self.detection.confidence,
            notes: None,
        }
    }
}

/// Result of processing one image
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// The image detections refer to, after any downscaling
    pub image: DynamicImage,
    pub observations: Vec<Observation>,
}

impl ProcessedImage {
    pub fn detections(&self) -> Vec<Detection> {
        self.observations.iter().map(|o| o.detection.clone()).collect()
    }
}

/// Detection, identity resolution and annotation reading for whole images.
///
/// Shareable between threads; identity create-or-update is serialised by
/// the resolver.
pub struct IconRecognizer {
    detector: IconDetector,
    reader: AnnotationReader,
    identities: IdentityResolver,
    settings: RecognizerSettings,
}

impl IconRecognizer {
    pub fn new(
        detector: IconDetector,
        reader: AnnotationReader,
        identities: IdentityResolver,
        settings: RecognizerSettings,
    ) -> Self {
        Self {
            detector,
            reader,
            identities,
            settings,
        }
    }

    /// Load the template library named in `config` and wire up the pipeline.
    pub fn from_config(
        config: &AppConfig,
        reader: AnnotationReader,
        identities: IdentityResolver,
    ) -> EngineResult<Self> {
        let library = TemplateLibrary::load(&config.matching.template_dir)?;
        let detector = IconDetector::from_config(library, &config.matching);
        Ok(Self::new(
            detector,
            reader,
            identities,
            RecognizerSettings::from_config(config),
        ))
    }

    pub fn detector(&self) -> &IconDetector {
        &self.detector
    }

    pub fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    pub fn settings(&self) -> &RecognizerSettings {
        &self.settings
    }

    /// Load `path` and process it.
    pub fn process_path(&self, path: &Path) -> EngineResult<ProcessedImage> {
        let image = imaging::load(path)?;
        Ok(self.process(image))
    }

    /// Downscale, detect, then resolve and annotate every detection.
    pub fn process(&self, image: DynamicImage) -> ProcessedImage {
        let (max_w, max_h) = self.settings.max_image_size;
        let image = imaging::fit_within(image, max_w, max_h);
        let detections = self.detector.detect(&image);
        let gray = image.to_luma8();

        let observations = detections
            .into_iter()
            .map(|detection| {
                let (identity_id, created) = self.resolve_identity(&detection);
                let annotation = self.reader.read_near(
                    &gray,
                    detection.position(),
                    self.settings.search_size,
                    self.settings.direction,
                );
                Observation {
                    detection,
                    identity_id,
                    created,
                    annotation,
                }
            })
            .collect();

        ProcessedImage {
            image,
            observations,
        }
    }

    fn resolve_identity(&self, detection: &Detection) -> (IdentityId, bool) {
        let metadata = match self.detector.library().get(&detection.marker_name) {
            Some(template) => {
                IdentityMetadata::for_template(template, self.settings.confidence_threshold)
            }
            None => IdentityMetadata {
                name: detection.marker_name.clone(),
                category: "unknown".to_string(),
                image_path: PathBuf::new(),
                confidence_threshold: self.settings.confidence_threshold,
            },
        };
        self.identities.resolve(&detection.fingerprint, metadata)
    }

    /// Add a template and register its identity.
    pub fn add_template(
        &mut self,
        image: &DynamicImage,
        name: &str,
        category: &str,
    ) -> EngineResult<(IdentityId, bool)> {
        let threshold = self.settings.confidence_threshold;
        let template: &MarkerTemplate = self.detector.add_template(image, name, category)?;
        let metadata = IdentityMetadata::for_template(template, threshold);
        let fingerprint = template.fingerprint.clone();
        Ok(self.identities.resolve(&fingerprint, metadata))
    }
}
