//! Icon detection over a template library

use image::DynamicImage;
use std::time::Instant;

use crate::config::MatchConfig;
use crate::error::{EngineError, EngineResult};
use crate::template_library::{MarkerTemplate, TemplateLibrary};
use crate::template_matching::{Detection, OverlapResolver, ScaleSpaceMatcher};

/// Runs every template over an image and resolves overlaps across all of
/// them in one pass.
pub struct IconDetector {
    library: TemplateLibrary,
    matcher: ScaleSpaceMatcher,
    resolver: OverlapResolver,
}

impl IconDetector {
    pub fn new(
        library: TemplateLibrary,
        matcher: ScaleSpaceMatcher,
        resolver: OverlapResolver,
    ) -> Self {
        Self {
            library,
            matcher,
            resolver,
        }
    }

    pub fn from_config(library: TemplateLibrary, config: &MatchConfig) -> Self {
        Self::new(
            library,
            ScaleSpaceMatcher::from_config(config),
            OverlapResolver::new(config.iou_threshold),
        )
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn matcher(&self) -> &ScaleSpaceMatcher {
        &self.matcher
    }

    /// Detections of every loaded template, most confident first.
    pub fn detect(&self, image: &DynamicImage) -> Vec<Detection> {
        self.detect_templates(image, self.library.iter())
    }

    /// Detections restricted to the named templates. Unknown names are
    /// ignored.
    pub fn detect_named(&self, image: &DynamicImage, names: &[&str]) -> Vec<Detection> {
        let selected = names.iter().filter_map(|name| {
            let template = self.library.get(name);
            if template.is_none() {
                log::debug!("Ignoring unknown template '{name}'");
            }
            template
        });
        self.detect_templates(image, selected)
    }

    fn detect_templates<'a>(
        &self,
        image: &DynamicImage,
        templates: impl Iterator<Item = &'a MarkerTemplate>,
    ) -> Vec<Detection> {
        if self.library.is_empty() {
            log::warn!("{}", EngineError::NoTemplatesLoaded);
            return Vec::new();
        }

        let start = Instant::now();
        let target = self.matcher.prepare_target(&image.to_luma8());

        let mut candidates = Vec::new();
        let mut searched = 0usize;
        for template in templates {
            let found = self.matcher.find_candidates(&target, template);
            if !found.is_empty() {
                log::debug!("✅ {} candidate(s) for '{}'", found.len(), template.name);
            }
            candidates.extend(found);
            searched += 1;
        }

        let raw = candidates.len();
        let detections = self.resolver.resolve(candidates);
        log::info!(
            "🔍 {} detection(s) from {raw} candidate(s) over {searched} template(s) in {} ms",
            detections.len(),
            start.elapsed().as_millis()
        );
        detections
    }

    /// Add a template to the library, persisting its image.
    pub fn add_template(
        &mut self,
        image: &DynamicImage,
        name: &str,
        category: &str,
    ) -> EngineResult<&MarkerTemplate> {
        self.library.add(image, name, category)
    }
}
