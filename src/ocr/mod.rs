//! Text recognition adapters
//!
//! Engines are external executables behind the [`TextRecognizer`] trait;
//! which one is used is decided once, when [`OcrBackend`] is built.

pub mod backend;
pub mod easyocr;
pub mod error;
pub mod preprocess;
pub mod process;
pub mod tesseract;
pub mod types;

pub use backend::OcrBackend;
pub use easyocr::EasyOcrCli;
pub use error::{OcrError, OcrResult};
pub use tesseract::TesseractCli;
pub use types::{OcrEngineKind, TextRecognizer, TextSpan};
