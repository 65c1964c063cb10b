//! Offline text search over a folder of saved captures.
//!
//! Runs the same OCR + fragment match as the live filter, one file at a time,
//! and reports which files contain any of the fragments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::discovery::{DiscoveredFile, FileDiscovery};
use super::filter::ContentFilter;

/// A file whose recognized text contains a fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMatch {
    /// Path of the matching file
    pub path: PathBuf,
    /// File name portion
    pub file_name: String,
    /// Fragment that matched
    pub fragment: String,
    /// Full recognized text
    pub text: String,
}

/// Totals of a folder scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Files examined
    pub scanned: usize,
    /// Files whose text matched
    pub matched: usize,
    /// Files that could not be read or recognized
    pub failed: usize,
}

/// OCR-searches saved captures.
pub struct FolderScanner {
    discovery: FileDiscovery,
    filter: ContentFilter,
}

impl FolderScanner {
    pub fn new(discovery: FileDiscovery, filter: ContentFilter) -> Self {
        Self { discovery, filter }
    }

    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Recognize every file and collect matches.
    ///
    /// `on_match` fires as soon as a file matches. Read and OCR failures are
    /// logged and counted; they never stop the scan.
    pub async fn scan<F>(
        &self,
        files: &[DiscoveredFile],
        mut on_match: F,
    ) -> (Vec<ScanMatch>, ScanSummary)
    where
        F: FnMut(&ScanMatch),
    {
        let mut matches = Vec::new();
        let mut summary = ScanSummary::default();

        for file in files {
            summary.scanned += 1;

            if file.size == 0 {
                tracing::warn!("Skipping empty file {:?}", file.path);
                summary.failed += 1;
                continue;
            }

            let bytes = match tokio::fs::read(&file.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("Failed to read {:?}: {e}", file.path);
                    summary.failed += 1;
                    continue;
                }
            };

            let text = match self.filter.recognize(&bytes).await {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("OCR error for {:?}: {e}", file.path);
                    summary.failed += 1;
                    continue;
                }
            };

            if let Some(fragment) = self.filter.first_match(&text) {
                let found = ScanMatch {
                    path: file.path.clone(),
                    file_name: file
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                    fragment: fragment.to_string(),
                    text,
                };
                summary.matched += 1;
                on_match(&found);
                matches.push(found);
            }
        }

        (matches, summary)
    }
}
