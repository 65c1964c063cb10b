//! Error types for the shotprobe discovery pipeline.
//!
//! Errors are organized by stage so every rejection carries the identifier or
//! URL it concerns. Only [`ConfigError`] and [`PipelineError::InvalidRun`] are
//! fatal to a run; everything else is folded into a probe outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for shotprobe operations.
#[derive(Error, Debug)]
pub enum ShotprobeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// DNS, connection or protocol failure talking to the remote service
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// A network call or OCR run exceeded its budget
    #[error("Timeout in {stage} stage for {target} after {timeout_ms}ms")]
    Timeout {
        target: String,
        stage: String,
        timeout_ms: u64,
    },

    /// Payload is not a genuine image
    #[error("Invalid image from {url}: {message}")]
    InvalidImage { url: String, message: String },

    /// Declared content type is not an image family
    #[error("Unsupported content type from {url}: {content_type}")]
    UnsupportedFormat { url: String, content_type: String },

    /// Payload or dimensions exceed the configured limits
    #[error("Image too large from {url}: {detail}")]
    ImageTooLarge { url: String, detail: String },

    /// The OCR engine failed
    #[error("Text recognition failed ({engine}): {message}")]
    Recognition { engine: String, message: String },

    /// Writing an accepted capture failed
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run options rejected before any work was dispatched
    #[error("Invalid run options: {0}")]
    InvalidRun(String),
}

/// Convenience type alias for shotprobe results.
pub type Result<T> = std::result::Result<T, ShotprobeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_stage() {
        let err = PipelineError::Timeout {
            target: "https://prnt.sc/abc123".to_string(),
            stage: "lookup".to_string(),
            timeout_ms: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("lookup"));
        assert!(msg.contains("abc123"));
        assert!(msg.contains("10000ms"));
    }

    #[test]
    fn test_config_error_wraps_into_top_level() {
        let err: ShotprobeError =
            ConfigError::ValidationError("probe.workers must be > 0".into()).into();
        assert!(err.to_string().contains("probe.workers"));
    }
}
