//! Text recognizer trait.

use async_trait::async_trait;

use crate::error::PipelineError;

/// Extracts text from encoded image bytes.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the filter holds an `Arc<dyn TextRecognizer>`).
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Engine name for logging (e.g., "tesseract").
    fn name(&self) -> &str;

    /// Run recognition once over the image and return all text found.
    async fn extract_text(&self, image: &[u8]) -> Result<String, PipelineError>;
}
