pub mod annotation;
pub mod config;
pub mod detector;
pub mod error;
pub mod identity;
pub mod imaging;
pub mod ocr;
pub mod storage;
pub mod template_library;
pub mod template_matching;

pub use detector::{IconDetector, IconRecognizer, Observation};
pub use error::{EngineError, EngineResult};
