//! Labtrace: structured biomarker readings out of unstructured lab reports.
//!
//! The pipeline is deliberately leaf-first: a best-effort text extractor, a
//! substring pattern matcher, a validating normalizer, an append-only
//! per-biomarker history store, and a symptom-correlated recommendation
//! engine. All lookup tables (aliases, units, reference ranges, expiration
//! rules, weights) are immutable configuration constructed once and passed
//! explicitly; nothing in this crate holds package-level mutable state.

pub mod config;
pub mod error;
pub mod models;
pub mod extraction;
pub mod matcher;
pub mod structuring;
pub mod store;
pub mod recommend;
pub mod pipeline;

pub use config::ImportConfig;
pub use error::PipelineError;
pub use models::{BiomarkerReading, RawReadingFields, Recommendation};
pub use pipeline::{ImportOutcome, LabReportProcessor};
pub use store::{BiomarkerStore, MemoryProfileStore, ProfileStore};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and integration tests.
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
