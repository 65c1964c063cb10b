//! Text-content filter over recognized image text.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::ocr::TextRecognizer;

/// Decision of the content filter for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// No fragments configured; OCR was not run
    Unfiltered,
    /// The recognized text contains this fragment
    Match { fragment: String },
    /// None of the fragments occur in the recognized text
    Mismatch,
}

impl FilterVerdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, FilterVerdict::Mismatch)
    }
}

/// Accepts images whose recognized text contains any configured fragment.
pub struct ContentFilter {
    fragments: Vec<String>,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl ContentFilter {
    /// Filter that accepts everything and never runs OCR.
    pub fn disabled() -> Self {
        Self {
            fragments: Vec::new(),
            recognizer: None,
        }
    }

    /// Build a filter from raw fragments.
    ///
    /// Fragments are trimmed and lowercased; blank ones are dropped. If none
    /// remain the filter is disabled and `recognizer` is never called.
    pub fn new<S: AsRef<str>>(fragments: &[S], recognizer: Arc<dyn TextRecognizer>) -> Self {
        let fragments = normalize_fragments(fragments);
        if fragments.is_empty() {
            return Self::disabled();
        }
        Self {
            fragments,
            recognizer: Some(recognizer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Run OCR once (if filtering) and decide.
    pub async fn check(&self, image: &[u8]) -> Result<FilterVerdict, PipelineError> {
        let Some(text) = self.recognize(image).await? else {
            return Ok(FilterVerdict::Unfiltered);
        };
        Ok(match self.first_match(&text) {
            Some(fragment) => FilterVerdict::Match {
                fragment: fragment.to_string(),
            },
            None => FilterVerdict::Mismatch,
        })
    }

    /// Recognized text, or `None` when filtering is disabled.
    pub async fn recognize(&self, image: &[u8]) -> Result<Option<String>, PipelineError> {
        let Some(recognizer) = &self.recognizer else {
            return Ok(None);
        };
        let text = recognizer.extract_text(image).await?;
        tracing::trace!(
            "{} recognized {} chars",
            recognizer.name(),
            text.chars().count()
        );
        Ok(Some(text))
    }

    /// First configured fragment found in `text`, case-insensitively.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.fragments
            .iter()
            .find(|fragment| haystack.contains(fragment.as_str()))
            .map(String::as_str)
    }
}

/// Trim, lowercase and drop blank fragments.
pub fn normalize_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|f| f.as_ref().trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Split a comma-separated fragment list (`"invoice, password"`).
pub fn parse_fragment_list(raw: &str) -> Vec<String> {
    normalize_fragments(&raw.split(',').collect::<Vec<_>>())
}
