//! Probe pipeline components.
//!
//! Stages of one unit of work, leaves first:
//! - **identifier**: Random candidate identifiers
//! - **resolver**: Identifier → capture page → image bytes
//! - **validate**: Reject payloads that are not genuine images
//! - **filter**: Optional OCR text match
//! - **sink**: Write accepted captures to the run directory
//! - **probe**: Composes the stages for one identifier
//! - **orchestrator**: Bounded worker pool, stopping rule, statistics
//!
//! Plus **discovery** and **scan** for searching already-saved captures.

pub mod discovery;
pub mod filter;
pub mod identifier;
pub mod orchestrator;
pub mod probe;
pub mod resolver;
pub mod scan;
pub mod sink;
pub mod validate;

// Re-exports for convenient access
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use filter::{parse_fragment_list, ContentFilter, FilterVerdict};
pub use identifier::IdGenerator;
pub use orchestrator::{Harvester, RunOptions, RunPhase};
pub use probe::{AcceptGate, Prober};
pub use resolver::{FetchedImage, HttpResolver, PageLookup, Resolver};
pub use scan::{FolderScanner, ScanMatch, ScanSummary};
pub use sink::{capture_filename, DiskSink, ImageSink};
pub use validate::{ValidatedImage, Validator};
