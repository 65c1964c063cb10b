//! Validation of fetched payloads before any expensive work.

use image::ImageFormat;
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Header facts about a payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    /// Format detected from the bytes
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Rejects mislabeled, truncated or oversized payloads.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check a fetched payload.
    ///
    /// Checks, in order:
    /// - Declared content type is an image family
    /// - Payload is non-empty and within the size limit
    /// - Magic bytes match a known image format
    /// - Header decodes to sane dimensions (no pixel decode)
    pub fn validate(
        &self,
        url: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<ValidatedImage, PipelineError> {
        if !is_image_content_type(content_type) {
            return Err(PipelineError::UnsupportedFormat {
                url: url.to_string(),
                content_type: content_type.unwrap_or("<missing>").to_string(),
            });
        }

        if bytes.is_empty() {
            return Err(PipelineError::InvalidImage {
                url: url.to_string(),
                message: "Empty payload".to_string(),
            });
        }

        let max_bytes = self.limits.max_image_bytes();
        if bytes.len() as u64 > max_bytes {
            return Err(PipelineError::ImageTooLarge {
                url: url.to_string(),
                detail: format!("{} bytes > {} bytes", bytes.len(), max_bytes),
            });
        }

        if !Self::is_valid_image_header(bytes) {
            return Err(PipelineError::InvalidImage {
                url: url.to_string(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::InvalidImage {
                url: url.to_string(),
                message: format!("Cannot detect image format: {e}"),
            })?;
        let format = reader.format().ok_or_else(|| PipelineError::InvalidImage {
            url: url.to_string(),
            message: "Unknown image format".to_string(),
        })?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| PipelineError::InvalidImage {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImage {
                url: url.to_string(),
                message: format!("Degenerate dimensions {width}x{height}"),
            });
        }
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                url: url.to_string(),
                detail: format!("{width}x{height} > {max_dim}"),
            });
        }

        Ok(ValidatedImage {
            format,
            width,
            height,
        })
    }

    /// Check if the leading bytes match a known image format.
    fn is_valid_image_header(header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return true;
        }

        // GIF: GIF8
        if header.starts_with(b"GIF8") {
            return true;
        }

        // WebP: RIFF....WEBP
        if header.starts_with(b"RIFF") {
            return header.len() >= 12 && &header[8..12] == b"WEBP";
        }

        // BMP: BM
        if header.starts_with(b"BM") {
            return true;
        }

        // TIFF: II (little-endian) or MM (big-endian) followed by version 42
        let is_tiff_le = header.starts_with(&[b'I', b'I', 0x2A, 0x00]);
        let is_tiff_be = header.starts_with(&[b'M', b'M', 0x00, 0x2A]);
        is_tiff_le || is_tiff_be
    }
}

/// `image/*`, ignoring case and parameters. A missing header is not an image.
pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
                .starts_with("image/")
        })
        .unwrap_or(false)
}

/// Lowercase name of an image format.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
