//! Optical character recognition for the text filter.
//!
//! Provides the [`TextRecognizer`] abstraction the content filter depends on
//! and a default engine that shells out to the `tesseract` executable.

pub(crate) mod engine;
pub(crate) mod tesseract;

pub use engine::TextRecognizer;
pub use tesseract::TesseractEngine;
