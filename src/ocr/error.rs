use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for text recognition.
pub type OcrResult<T> = Result<T, OcrError>;

/// The error type for OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine '{engine}' is not usable: {reason}")]
    BackendUnavailable { engine: &'static str, reason: String },

    #[error("No OCR engine available. Install EasyOCR or Tesseract and make sure it is in PATH.")]
    NoBackendAvailable,

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to run '{engine}': {source}")]
    Spawn {
        engine: &'static str,
        source: std::io::Error,
    },

    #[error("'{engine}' exited with {status}: {stderr}")]
    ProcessFailed {
        engine: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Failed to write OCR input image: {source}")]
    ImageWrite {
        #[from]
        source: image::ImageError,
    },
}
