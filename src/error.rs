use std::path::PathBuf;
use thiserror::Error;

use crate::annotation::Direction;
use crate::config::ConfigError;
use crate::ocr::OcrError;
use crate::storage::StorageError;

/// A specialized `Result` type for detection engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// The error type for the detection and association engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write template image to {path:?}: {source}")]
    TemplateWrite {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Invalid template {field} '{value}': must be a single non-empty path component")]
    InvalidTemplateName { field: &'static str, value: String },

    #[error("Failed to write image to {path:?}: {source}")]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No templates loaded; nothing can be detected")]
    NoTemplatesLoaded,

    #[error(
        "Search window {width}x{height} {direction} of ({x},{y}) lies outside the image"
    )]
    InvalidSearchWindow {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        direction: Direction,
    },

    #[error("Failed to start async runtime: {source}")]
    Runtime { source: std::io::Error },

    #[error("Processing task failed to complete: {source}")]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("OCR failed: {source}")]
    Ocr {
        #[from]
        source: OcrError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },
}

impl EngineError {
    /// Errors that only affect a single template or window and must not stop
    /// the rest of a detection pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Decode { .. }
                | EngineError::NoTemplatesLoaded
                | EngineError::InvalidSearchWindow { .. }
                | EngineError::Ocr { .. }
        )
    }
}
