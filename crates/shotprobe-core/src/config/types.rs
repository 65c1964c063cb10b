//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root under which each run gets its own timestamped folder
    pub output_root: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("~/shotprobe/captures"),
        }
    }
}

/// Probe run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Number of accepted captures that ends a run
    pub target: usize,

    /// Maximum units of work in flight at once
    pub workers: usize,

    /// Length of each generated identifier
    pub id_length: usize,

    /// Give up after this many dispatched identifiers (unbounded when unset)
    pub max_attempts: Option<u64>,

    /// Seed for identifier sampling; entropy-seeded when unset
    pub seed: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target: 10,
            workers: 8,
            id_length: 6,
            max_attempts: None,
            seed: None,
        }
    }
}

/// Remote screenshot host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Page URL prefix; the identifier is appended as the last path segment
    pub base_url: String,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Image sources starting with any of these mean "no such capture"
    pub placeholder_prefixes: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://prnt.sc".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            placeholder_prefixes: vec![
                "//st.prntscr.com".to_string(),
                "https://i.imgur.com/removed".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-request timeout in milliseconds (page lookup and byte fetch)
    pub request_timeout_ms: u64,

    /// OCR timeout in milliseconds
    pub ocr_timeout_ms: u64,

    /// Maximum image payload in megabytes
    pub max_image_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            ocr_timeout_ms: 30_000,
            max_image_size_mb: 20,
            max_image_dimension: 10_000,
        }
    }
}

impl LimitsConfig {
    /// Payload limit in bytes.
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_size_mb * 1024 * 1024
    }
}

/// Text filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Fragments to look for in recognized text; empty disables filtering
    pub fragments: Vec<String>,

    /// OCR executable
    pub ocr_command: String,

    /// OCR language pack (tesseract `-l`)
    pub ocr_language: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            fragments: Vec::new(),
            ocr_command: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
