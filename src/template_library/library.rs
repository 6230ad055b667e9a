//! Loading and organising marker templates

use image::DynamicImage;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::template::{DEFAULT_CATEGORY, MarkerTemplate};
use crate::error::{EngineError, EngineResult};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Owned set of marker templates, indexed by name.
///
/// Files directly in the root get the `general` category; files below a
/// first-level subdirectory take that subdirectory's name as category.
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    root: PathBuf,
    templates: Vec<MarkerTemplate>,
    by_name: HashMap<String, usize>,
}

impl TemplateLibrary {
    /// Empty library that stores added templates under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Scan `root` for template images and load them.
    ///
    /// Files that fail to decode are logged and skipped. A missing root is
    /// created and yields an empty library.
    pub fn load(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let mut library = Self::new(root);
        let root = library.root.clone();

        if !root.exists() {
            log::warn!("Template directory does not exist, creating {root:?}");
            std::fs::create_dir_all(&root).map_err(|source| EngineError::Io {
                path: root.clone(),
                source,
            })?;
            return Ok(library);
        }

        let mut files = Vec::new();
        collect_image_files(&root, &mut files)?;
        files.sort();

        let mut loaded = Vec::new();
        for path in files {
            let category = category_for(&root, &path);
            match image::open(&path) {
                Ok(image) => {
                    let name = MarkerTemplate::name_from_path(&path);
                    loaded.push(MarkerTemplate::from_image(name, category, path, &image));
                }
                Err(e) => {
                    log::warn!("⚠️ Failed to load template {path:?}: {e}");
                }
            }
        }

        for template in loaded {
            library.insert(template);
        }
        library.sort();

        if library.is_empty() {
            log::warn!("No template images found in {root:?}");
        } else {
            log::info!("Loaded {} templates from {root:?}", library.len());
        }
        Ok(library)
    }

    /// Add a new template: fingerprint it, persist the image as
    /// `<root>/<category>/<name>.png` and insert it, replacing any template
    /// with the same name.
    pub fn add(
        &mut self,
        image: &DynamicImage,
        name: &str,
        category: &str,
    ) -> EngineResult<&MarkerTemplate> {
        check_component("name", name)?;
        check_component("category", category)?;

        let dir = self.root.join(category);
        std::fs::create_dir_all(&dir).map_err(|e| EngineError::TemplateWrite {
            path: dir.clone(),
            source: image::ImageError::IoError(e),
        })?;

        let path = dir.join(format!("{name}.png"));
        image
            .save(&path)
            .map_err(|source| EngineError::TemplateWrite {
                path: path.clone(),
                source,
            })?;

        let template = MarkerTemplate::from_image(name, category, path, image);
        log::info!("Added template: {name} (category: {category})");
        self.insert(template);
        self.sort();

        Ok(&self.templates[self.by_name[name]])
    }

    /// Insert an in-memory template without touching storage.
    pub fn insert(&mut self, template: MarkerTemplate) {
        match self.by_name.get(&template.name) {
            Some(&idx) => {
                log::warn!(
                    "Template '{}' from {:?} replaces {:?}",
                    template.name,
                    template.path,
                    self.templates[idx].path
                );
                self.templates[idx] = template;
            }
            None => {
                self.by_name.insert(template.name.clone(), self.templates.len());
                self.templates.push(template);
            }
        }
    }

    /// Order by category then name for consistent processing, then rebuild
    /// the name index.
    fn sort(&mut self) {
        self.templates.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.name.cmp(&b.name))
        });
        self.by_name = self
            .templates
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.name.clone(), idx))
            .collect();
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&MarkerTemplate> {
        self.by_name.get(name).map(|&idx| &self.templates[idx])
    }

    pub fn by_category(&self, category: &str) -> Vec<&MarkerTemplate> {
        self.templates
            .iter()
            .filter(|t| t.category == category)
            .collect()
    }

    /// Templates grouped by category, both levels sorted
    pub fn grouped(&self) -> BTreeMap<&str, Vec<&MarkerTemplate>> {
        let mut groups: BTreeMap<&str, Vec<&MarkerTemplate>> = BTreeMap::new();
        for template in &self.templates {
            groups.entry(template.category.as_str()).or_default().push(template);
        }
        groups
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Names and categories become path components under the library root.
fn check_component(field: &'static str, value: &str) -> EngineResult<()> {
    let invalid = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if invalid {
        return Err(EngineError::InvalidTemplateName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_image_files(dir: &Path, out: &mut Vec<PathBuf>) -> EngineResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_image_files(&path, out)?;
        } else if path.is_file() && is_image_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// First path component below `root`, or the default category for files
/// stored in the root itself.
fn category_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut components = relative.components();
    let first = components.next();
    match (first, components.next()) {
        (Some(dir), Some(_)) => dir.as_os_str().to_string_lossy().into_owned(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}
