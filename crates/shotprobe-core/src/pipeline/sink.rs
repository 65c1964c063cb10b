//! Persistence of accepted captures into the run directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Extension used when the source URL carries none.
pub const DEFAULT_EXTENSION: &str = ".png";

/// Destination for accepted image bytes.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Create the destination (and any parents) if absent.
    async fn ensure_dir(&self) -> Result<(), PipelineError>;

    /// Write `bytes` under `file_name` and return the full path.
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError>;
}

/// Writes captures as plain files into one directory.
///
/// Every file name is derived from its own identifier, so concurrent writers
/// never collide and no locking is needed.
pub struct DiskSink {
    dir: PathBuf,
}

impl DiskSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageSink for DiskSink {
    async fn ensure_dir(&self) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PipelineError::Persist {
                path: self.dir.clone(),
                source,
            })
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        self.ensure_dir().await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PipelineError::Persist {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// `<id><ext>`, with the extension taken from the source URL's path.
///
/// Query strings and fragments are ignored; anything that does not look like
/// a short alphanumeric extension falls back to [`DEFAULT_EXTENSION`].
pub fn capture_filename(id: &str, image_url: &str) -> String {
    format!("{id}{}", url_extension(image_url))
}

fn url_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let path = path
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(path);
    let last_segment = path.rsplit('/').next().unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}
