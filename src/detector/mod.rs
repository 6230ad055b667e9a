//! Detection and association pipeline
//!
//! [`IconDetector`] finds icons; [`IconRecognizer`] adds identities and the
//! numbers printed next to them.

pub mod engine;
pub mod pipeline;


pub use engine::IconDetector;
pub use pipeline::{IconRecognizer, Observation, ProcessedImage, RecognizerSettings};
