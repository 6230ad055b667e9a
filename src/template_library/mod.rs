//! Template library
//!
//! Loads reference icons from a directory tree, fingerprints each one and
//! groups them by category. Built once at startup and owned by the detector.

pub mod fingerprint;
pub mod library;
pub mod template;

#[cfg(test)]
mod tests;

pub use fingerprint::{CANONICAL_SIZE, Fingerprint};
pub use library::TemplateLibrary;
pub use template::{DEFAULT_CATEGORY, MarkerTemplate};
