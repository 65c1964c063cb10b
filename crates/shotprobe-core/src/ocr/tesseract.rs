//! Tesseract engine driven through its command-line interface.
//!
//! The image is piped on stdin and the text read back from stdout
//! (`tesseract stdin stdout -l <lang>`), so nothing touches the disk.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::engine::TextRecognizer;
use crate::config::{FilterConfig, LimitsConfig};
use crate::error::PipelineError;

/// Runs the `tesseract` executable once per image.
pub struct TesseractEngine {
    command: String,
    language: String,
    timeout_ms: u64,
}

impl TesseractEngine {
    pub fn new(command: &str, language: &str, timeout_ms: u64) -> Self {
        Self {
            command: command.to_string(),
            language: language.to_string(),
            timeout_ms,
        }
    }

    /// Build from the filter and limits config sections.
    pub fn from_config(filter: &FilterConfig, limits: &LimitsConfig) -> Self {
        Self::new(&filter.ocr_command, &filter.ocr_language, limits.ocr_timeout_ms)
    }

    /// Whether the executable can be started at all.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn failure(&self, message: impl Into<String>) -> PipelineError {
        PipelineError::Recognition {
            engine: self.command.clone(),
            message: message.into(),
        }
    }

    async fn run(&self, image: &[u8]) -> Result<String, PipelineError> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", self.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("Failed to start {}: {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|e| self.failure(format!("Failed to pipe image: {e}")))?;
            // Dropping stdin closes the pipe so tesseract sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.failure(format!("Failed to read output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextRecognizer for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String, PipelineError> {
        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), self.run(image)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                target: self.command.clone(),
                stage: "ocr".to_string(),
                timeout_ms: self.timeout_ms,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults() {
        let engine =
            TesseractEngine::from_config(&FilterConfig::default(), &LimitsConfig::default());
        assert_eq!(engine.command, "tesseract");
        assert_eq!(engine.language, "eng");
        assert_eq!(engine.timeout_ms, 30_000);
    }

    #[tokio::test]
    async fn test_missing_executable_is_recognition_error() {
        let engine = TesseractEngine::new("definitely-not-a-real-ocr-binary-xyz", "eng", 1000);
        assert!(!engine.is_available().await);

        let err = engine.extract_text(&[0x89, b'P', b'N', b'G']).await.unwrap_err();
        assert!(matches!(err, PipelineError::Recognition { .. }));
    }
}
