//! Positional annotation reading
//!
//! Finds the number printed next to a detected icon: a window is placed
//! beside the icon's anchor and handed to the OCR backend.

pub mod reader;
pub mod region;
pub mod result;


pub use reader::AnnotationReader;
pub use region::{Direction, search_window};
pub use result::{AnnotationResult, extract_numbers, primary_number};
