//! One unit of work: resolve → fetch → validate → filter → persist.
//!
//! Every stage failure is folded into a [`ProbeOutcome`]; nothing here can end
//! the run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::PipelineError;
use crate::types::{Capture, ProbeOutcome};

use super::filter::{ContentFilter, FilterVerdict};
use super::resolver::{PageLookup, Resolver};
use super::sink::{capture_filename, ImageSink};
use super::validate::{format_to_string, Validator};

/// Slots for captures still allowed to be saved in this run.
///
/// A unit of work reserves a slot right before persisting, so no more than
/// `target` captures are ever written even while other units are in flight.
#[derive(Debug)]
pub struct AcceptGate {
    remaining: AtomicUsize,
}

impl AcceptGate {
    pub fn new(slots: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(slots),
        }
    }

    /// Claim a slot, or `None` if the target is already spoken for.
    pub fn try_reserve(&self) -> Option<Reservation<'_>> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| Reservation {
                gate: self,
                committed: false,
            })
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }
}

/// A claimed slot; handed back on drop unless committed.
#[derive(Debug)]
pub struct Reservation<'a> {
    gate: &'a AcceptGate,
    committed: bool,
}

impl Reservation<'_> {
    /// Keep the slot for good (the capture was saved).
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.gate.remaining.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Composes the pipeline stages for a single identifier.
pub struct Prober {
    resolver: Arc<dyn Resolver>,
    validator: Validator,
    filter: ContentFilter,
    sink: Arc<dyn ImageSink>,
}

impl Prober {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        validator: Validator,
        filter: ContentFilter,
        sink: Arc<dyn ImageSink>,
    ) -> Self {
        Self {
            resolver,
            validator,
            filter,
            sink,
        }
    }

    /// Drive one identifier to its terminal outcome.
    pub async fn probe(&self, id: String, gate: &AcceptGate) -> ProbeOutcome {
        let (page_url, image_url) = match self.resolver.resolve(&id).await {
            Ok(PageLookup::Found {
                page_url,
                image_url,
            }) => (page_url, image_url),
            Ok(PageLookup::Placeholder { page_url }) => {
                tracing::debug!("Placeholder at {page_url}");
                return ProbeOutcome::RejectedNotFound { id };
            }
            Ok(PageLookup::Missing { page_url, status }) => {
                tracing::debug!("No capture at {page_url} (status {status:?})");
                return ProbeOutcome::RejectedNotFound { id };
            }
            Err(e) => {
                tracing::warn!("Lookup failed for {id}: {e}");
                return ProbeOutcome::RejectedTransportError {
                    id,
                    cause: e.to_string(),
                };
            }
        };

        let fetched = match self.resolver.fetch_bytes(&image_url).await {
            Ok(fetched) => fetched,
            Err(e @ PipelineError::ImageTooLarge { .. }) => {
                tracing::warn!("Rejected {id}: {e}");
                return ProbeOutcome::RejectedInvalidImage {
                    id,
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                tracing::warn!("Fetch failed for {id}: {e}");
                return ProbeOutcome::RejectedTransportError {
                    id,
                    cause: e.to_string(),
                };
            }
        };

        if !fetched.is_success() {
            tracing::warn!("Image fetch for {id} returned HTTP {}", fetched.status);
            return ProbeOutcome::RejectedInvalidImage {
                id,
                reason: format!("HTTP {} fetching {image_url}", fetched.status),
            };
        }

        let validated = match self.validator.validate(
            &image_url,
            &fetched.bytes,
            fetched.content_type.as_deref(),
        ) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!("Rejected {id}: {e}");
                return ProbeOutcome::RejectedInvalidImage {
                    id,
                    reason: e.to_string(),
                };
            }
        };

        let matched_fragment = match self.filter.check(&fetched.bytes).await {
            Ok(FilterVerdict::Unfiltered) => None,
            Ok(FilterVerdict::Match { fragment }) => Some(fragment),
            Ok(FilterVerdict::Mismatch) => {
                tracing::debug!("No fragment matched in {id}");
                return ProbeOutcome::RejectedFilterMismatch { id };
            }
            Err(e) => {
                tracing::warn!("Recognition failed for {id}: {e}");
                return ProbeOutcome::RejectedRecognition {
                    id,
                    reason: e.to_string(),
                };
            }
        };

        let Some(reservation) = gate.try_reserve() else {
            tracing::debug!("Target already claimed, discarding {id}");
            return ProbeOutcome::RejectedSurplus { id };
        };

        let file_name = capture_filename(&id, &image_url);
        match self.sink.write(&file_name, &fetched.bytes).await {
            Ok(saved_path) => {
                reservation.commit();
                tracing::info!("Found: {page_url} -> {image_url}");
                ProbeOutcome::Accepted(Box::new(Capture {
                    id,
                    page_url,
                    image_url,
                    file_name,
                    saved_path,
                    format: format_to_string(validated.format),
                    width: validated.width,
                    height: validated.height,
                    file_size: fetched.bytes.len() as u64,
                    matched_fragment,
                }))
            }
            Err(e) => {
                tracing::error!("Failed to save {id}: {e}");
                ProbeOutcome::RejectedPersist {
                    id,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::pipeline::filter::tests::FixedText;
    use crate::pipeline::resolver::FetchedImage;
    use crate::pipeline::sink::DiskSink;
    use crate::pipeline::validate::tests::png_bytes;
    use async_trait::async_trait;
    use std::path::PathBuf;

    /// Resolver returning the same page/fetch result for every identifier.
    pub(crate) struct StaticResolver {
        pub(crate) image_src: Option<String>,
        pub(crate) placeholder: bool,
        pub(crate) fetch_status: u16,
        pub(crate) content_type: &'static str,
        pub(crate) body: Vec<u8>,
    }

    impl StaticResolver {
        pub(crate) fn found_png() -> Self {
            Self {
                image_src: Some("https://image.prntscr.com/image/shot.png".to_string()),
                placeholder: false,
                fetch_status: 200,
                content_type: "image/png",
                body: png_bytes(16, 16),
            }
        }
    }

    #[async_trait]
    impl Resolver for StaticResolver {
        fn page_url(&self, id: &str) -> String {
            format!("https://prnt.sc/{id}")
        }

        async fn resolve(&self, id: &str) -> Result<PageLookup, PipelineError> {
            let page_url = self.page_url(id);
            Ok(match (&self.image_src, self.placeholder) {
                (_, true) => PageLookup::Placeholder { page_url },
                (Some(src), false) => PageLookup::Found {
                    page_url,
                    image_url: src.clone(),
                },
                (None, false) => PageLookup::Missing {
                    page_url,
                    status: Some(404),
                },
            })
        }

        async fn fetch_bytes(&self, _url: &str) -> Result<FetchedImage, PipelineError> {
            Ok(FetchedImage {
                status: self.fetch_status,
                content_type: Some(self.content_type.to_string()),
                bytes: self.body.clone(),
            })
        }
    }

    /// Sink that always fails.
    struct BrokenSink;

    #[async_trait]
    impl ImageSink for BrokenSink {
        async fn ensure_dir(&self) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn write(&self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf, PipelineError> {
            Err(PipelineError::Persist {
                path: PathBuf::from(file_name),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn prober(resolver: StaticResolver, filter: ContentFilter, dir: &std::path::Path) -> Prober {
        Prober::new(
            Arc::new(resolver),
            Validator::new(LimitsConfig::default()),
            filter,
            Arc::new(DiskSink::new(dir)),
        )
    }

    #[tokio::test]
    async fn test_found_image_is_accepted_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let p = prober(StaticResolver::found_png(), ContentFilter::disabled(), dir.path());
        let gate = AcceptGate::new(1);

        match p.probe("abc123".to_string(), &gate).await {
            ProbeOutcome::Accepted(capture) => {
                assert_eq!(capture.file_name, "abc123.png");
                assert_eq!(capture.format, "png");
                assert_eq!((capture.width, capture.height), (16, 16));
                assert!(capture.saved_path.exists());
            }
            other => panic!("Expected Accepted, got {other:?}"),
        }
        assert_eq!(gate.remaining(), 0);
    }

    #[tokio::test]
    async fn test_placeholder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = StaticResolver::found_png();
        resolver.image_src = Some("//st.prntscr.com/2023/img/0_173a7b_211be8ff.png".to_string());
        resolver.placeholder = true;
        let p = prober(resolver, ContentFilter::disabled(), dir.path());

        let outcome = p.probe("abc123".to_string(), &AcceptGate::new(1)).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedNotFound { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_image_bytes_labeled_png_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = StaticResolver::found_png();
        resolver.body = b"<html>oops</html>".to_vec();
        let p = prober(resolver, ContentFilter::disabled(), dir.path());

        let outcome = p.probe("abc123".to_string(), &AcceptGate::new(1)).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedInvalidImage { .. }));
    }

    #[tokio::test]
    async fn test_failed_fetch_status_is_invalid_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = StaticResolver::found_png();
        resolver.fetch_status = 403;
        let p = prober(resolver, ContentFilter::disabled(), dir.path());

        let outcome = p.probe("abc123".to_string(), &AcceptGate::new(1)).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedInvalidImage { .. }));
    }

    #[tokio::test]
    async fn test_filter_match_and_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let matching = prober(
            StaticResolver::found_png(),
            ContentFilter::new(&["world"], Arc::new(FixedText::new("Hello World"))),
            dir.path(),
        );
        match matching.probe("aaa111".to_string(), &AcceptGate::new(5)).await {
            ProbeOutcome::Accepted(capture) => {
                assert_eq!(capture.matched_fragment.as_deref(), Some("world"))
            }
            other => panic!("Expected Accepted, got {other:?}"),
        }

        let mismatching = prober(
            StaticResolver::found_png(),
            ContentFilter::new(&["xyz"], Arc::new(FixedText::new("Hello World"))),
            dir.path(),
        );
        let outcome = mismatching
            .probe("bbb222".to_string(), &AcceptGate::new(5))
            .await;
        assert!(matches!(outcome, ProbeOutcome::RejectedFilterMismatch { .. }));
    }

    #[tokio::test]
    async fn test_ocr_not_run_on_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = StaticResolver::found_png();
        resolver.body = b"GIF8 truncated".to_vec();
        let recognizer = FixedText::new("Hello World");
        let calls = recognizer.calls.clone();
        let p = prober(
            resolver,
            ContentFilter::new(&["world"], Arc::new(recognizer)),
            dir.path(),
        );

        let outcome = p.probe("abc123".to_string(), &AcceptGate::new(1)).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedInvalidImage { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recognition_failure_is_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let p = prober(
            StaticResolver::found_png(),
            ContentFilter::new(&["world"], Arc::new(FixedText::failing())),
            dir.path(),
        );
        let outcome = p.probe("abc123".to_string(), &AcceptGate::new(1)).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedRecognition { .. }));
    }

    #[tokio::test]
    async fn test_full_gate_yields_surplus() {
        let dir = tempfile::tempdir().unwrap();
        let p = prober(StaticResolver::found_png(), ContentFilter::disabled(), dir.path());
        let outcome = p.probe("abc123".to_string(), &AcceptGate::new(0)).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedSurplus { .. }));
    }

    #[tokio::test]
    async fn test_persist_failure_releases_slot() {
        let p = Prober::new(
            Arc::new(StaticResolver::found_png()),
            Validator::new(LimitsConfig::default()),
            ContentFilter::disabled(),
            Arc::new(BrokenSink),
        );
        let gate = AcceptGate::new(1);
        let outcome = p.probe("abc123".to_string(), &gate).await;
        assert!(matches!(outcome, ProbeOutcome::RejectedPersist { .. }));
        assert_eq!(gate.remaining(), 1);
    }

    #[test]
    fn test_reservation_commit_keeps_slot() {
        let gate = AcceptGate::new(2);
        let first = gate.try_reserve().unwrap();
        let second = gate.try_reserve().unwrap();
        assert!(gate.try_reserve().is_none());

        first.commit();
        drop(second);
        assert_eq!(gate.remaining(), 1);
    }

    /// Resolver whose lookups always fail at the network level.
    struct UnreachableResolver;

    #[async_trait]
    impl Resolver for UnreachableResolver {
        fn page_url(&self, id: &str) -> String {
            format!("https://prnt.sc/{id}")
        }

        async fn resolve(&self, id: &str) -> Result<PageLookup, PipelineError> {
            Err(PipelineError::Transport {
                url: self.page_url(id),
                message: "connection refused".to_string(),
            })
        }

        async fn fetch_bytes(&self, url: &str) -> Result<FetchedImage, PipelineError> {
            Err(PipelineError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = Prober::new(
            Arc::new(UnreachableResolver),
            Validator::new(LimitsConfig::default()),
            ContentFilter::disabled(),
            Arc::new(DiskSink::new(dir.path())),
        );
        let gate = AcceptGate::new(1);

        let outcome = p.probe("abc123".to_string(), &gate).await;
        assert!(matches!(
            outcome,
            ProbeOutcome::RejectedTransportError { ref id, .. } if id == "abc123"
        ));
        assert_eq!(gate.remaining(), 1);
    }
}
