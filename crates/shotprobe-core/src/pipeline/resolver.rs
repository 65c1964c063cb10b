//! Remote lookup: identifier → page → image bytes.
//!
//! The pipeline only depends on the [`Resolver`] trait. [`HttpResolver`] is the
//! production implementation; tests substitute stubs.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::{LimitsConfig, RemoteConfig};
use crate::error::PipelineError;

/// An `<img>` tag; quoted attribute values may contain `>`.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("img tag pattern is valid")
});

/// One attribute: name, then an optional double-quoted, single-quoted or bare value.
static IMG_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\s([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

/// CSS class marking the screenshot on a capture page.
const SCREENSHOT_CLASS: &str = "screenshot-image";

/// Result of looking up an identifier's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    /// The page embeds a real capture
    Found { page_url: String, image_url: String },
    /// The page answered with the host's "nothing here" image
    Placeholder { page_url: String },
    /// Non-success status, or no screenshot on the page
    Missing {
        page_url: String,
        status: Option<u16>,
    },
}

/// Raw response of an image fetch.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// HTTP status code
    pub status: u16,
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    /// Body (empty when the status was not a success)
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Maps identifiers to captures on the remote host.
///
/// Uses `async_trait` because the pipeline holds it as `Arc<dyn Resolver>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Canonical page URL for an identifier.
    fn page_url(&self, id: &str) -> String;

    /// Look up the page for `id` (one request).
    async fn resolve(&self, id: &str) -> Result<PageLookup, PipelineError>;

    /// Fetch image bytes and their declared content type (one request).
    async fn fetch_bytes(&self, url: &str) -> Result<FetchedImage, PipelineError>;
}

/// Outcome of scanning a capture page's HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScan {
    Image(String),
    Placeholder,
    NoImage,
}

/// Find the screenshot `<img>` in a capture page.
///
/// Attribute order and quoting style don't matter. A `src` starting with any
/// of `placeholder_prefixes` is the host's sentinel for a missing capture.
pub fn scan_page(html: &str, placeholder_prefixes: &[String]) -> PageScan {
    for tag in IMG_TAG.find_iter(html) {
        let mut class = None;
        let mut src = None;
        for caps in IMG_ATTR.captures_iter(tag.as_str()) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str());
            match caps[1].to_ascii_lowercase().as_str() {
                "class" => class = value,
                "src" => src = value,
                _ => {}
            }
        }

        let is_screenshot = class
            .map(|c| c.split_whitespace().any(|name| name == SCREENSHOT_CLASS))
            .unwrap_or(false);
        if !is_screenshot {
            continue;
        }

        let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
            return PageScan::NoImage;
        };
        if placeholder_prefixes
            .iter()
            .any(|prefix| src.starts_with(prefix.as_str()))
        {
            return PageScan::Placeholder;
        }
        return PageScan::Image(absolute_url(src));
    }
    PageScan::NoImage
}

/// Upgrade protocol-relative sources to https.
fn absolute_url(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    }
}

/// [`Resolver`] backed by a shared `reqwest` client.
pub struct HttpResolver {
    client: reqwest::Client,
    base_url: String,
    placeholder_prefixes: Vec<String>,
    timeout_ms: u64,
    max_bytes: u64,
}

impl HttpResolver {
    /// Build the client with the configured User-Agent and per-call timeout.
    pub fn new(remote: &RemoteConfig, limits: &LimitsConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(remote.user_agent.as_str())
            .timeout(Duration::from_millis(limits.request_timeout_ms))
            .build()
            .map_err(|e| PipelineError::Transport {
                url: remote.base_url.clone(),
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: remote.base_url.trim_end_matches('/').to_string(),
            placeholder_prefixes: remote.placeholder_prefixes.clone(),
            timeout_ms: limits.request_timeout_ms,
            max_bytes: limits.max_image_bytes(),
        })
    }

    /// Read a response body, giving up as soon as it passes `max_bytes`.
    ///
    /// `Content-Length` is checked up front, but chunked or unlabeled bodies
    /// are only bounded by counting as they arrive.
    async fn read_capped(
        &self,
        mut resp: reqwest::Response,
        url: &str,
        stage: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        let too_large = |seen: u64| PipelineError::ImageTooLarge {
            url: url.to_string(),
            detail: format!("{seen} bytes > {} bytes", self.max_bytes),
        };

        if let Some(len) = resp.content_length() {
            if len > self.max_bytes {
                return Err(too_large(len));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| self.request_error(url, stage, e))?
        {
            let seen = (body.len() + chunk.len()) as u64;
            if seen > self.max_bytes {
                return Err(too_large(seen));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn request_error(&self, url: &str, stage: &str, e: reqwest::Error) -> PipelineError {
        if e.is_timeout() {
            PipelineError::Timeout {
                target: url.to_string(),
                stage: stage.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            PipelineError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    fn page_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    async fn resolve(&self, id: &str) -> Result<PageLookup, PipelineError> {
        let page_url = self.page_url(id);
        let resp = self
            .client
            .get(&page_url)
            .send()
            .await
            .map_err(|e| self.request_error(&page_url, "lookup", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Ok(PageLookup::Missing {
                page_url,
                status: Some(status.as_u16()),
            });
        }

        let body = self
            .read_capped(resp, &page_url, "lookup")
            .await
            .map_err(|e| match e {
                PipelineError::ImageTooLarge { url, detail } => PipelineError::Transport {
                    url,
                    message: format!("Page body too large: {detail}"),
                },
                other => other,
            })?;
        let html = String::from_utf8_lossy(&body);

        Ok(match scan_page(&html, &self.placeholder_prefixes) {
            PageScan::Image(image_url) => PageLookup::Found {
                page_url,
                image_url,
            },
            PageScan::Placeholder => PageLookup::Placeholder { page_url },
            PageScan::NoImage => PageLookup::Missing {
                page_url,
                status: Some(status.as_u16()),
            },
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<FetchedImage, PipelineError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, "fetch", e))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            return Ok(FetchedImage {
                status: status.as_u16(),
                content_type,
                bytes: Vec::new(),
            });
        }

        let bytes = self.read_capped(resp, url, "fetch").await?;

        Ok(FetchedImage {
            status: status.as_u16(),
            content_type,
            bytes,
        })
    }
}
