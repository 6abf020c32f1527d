//! Compliance Map Core Library
//!
//! Semantic control-mapping and drift-detection engine: given an
//! unstructured compliance finding or scanned dependency vulnerability,
//! determine which canonical regulatory controls it satisfies or violates,
//! rank candidate controls by semantic closeness, and track how that
//! mapping changes between successive scans of the same project.
//!
//! # Architecture
//!
//! Components in dependency order, leaves first:
//!
//! - [`similarity`] - pure vector primitives (dot, norm, cosine)
//! - [`catalog`] - shared read-mostly index over canonical controls
//! - [`matching`] - blended top-K ranking of catalog candidates per finding
//! - [`recommendation`] - canned or derived remediation guidance
//! - [`drift`] - classification of control-status changes across scan runs
//!
//! The engine is a library consumed by a surrounding service: it has no
//! wire protocol, performs no I/O, and treats findings, controls,
//! embeddings, and prior-scan summaries as already materialized in memory.
//! Embedding vectors are produced by an external provider; this crate only
//! validates length consistency.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use compliance_map_core::{Control, ControlCatalog, Finding, MatchEngine, MatchingConfig, Severity};
//! use uuid::Uuid;
//!
//! let catalog = Arc::new(ControlCatalog::new());
//! catalog.upsert(
//!     Control::new("AC-2", "NIST-800-53", "Account Management", "Manage accounts")
//!         .with_embedding(vec![1.0, 0.0])
//!         .with_tags(["access"]),
//! )?;
//!
//! let engine = MatchEngine::new(Arc::clone(&catalog), MatchingConfig::default())?;
//! let finding = Finding::new("FAILED_LOGIN", "login failures", Uuid::new_v4(), Uuid::new_v4(), Severity::High)
//!     .with_embedding(vec![0.9, 0.1])
//!     .with_tags(["access"]);
//!
//! let result = engine.match_finding(&finding)?;
//! assert_eq!(result.top().unwrap().control_id, "AC-2");
//! # Ok::<(), compliance_map_core::CoreError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod drift;
pub mod error;
pub mod matching;
pub mod recommendation;
pub mod similarity;
pub mod types;

// Re-exports for convenience
pub use catalog::{CandidateScore, ControlCatalog};
pub use config::{Config, DriftConfig, LoggingConfig, MatchingConfig};
pub use drift::{
    BaselineState, BaselineTracker, DriftAnalyzer, DriftClass, DriftCounts, DriftEntry,
    DriftReport,
};
pub use error::{CoreError, CoreResult};
pub use matching::{MatchBatch, MatchEngine};
pub use recommendation::{Recommendation, RecommendationResolver, RecommendationSource};
pub use types::{
    Control, ControlStatus, Finding, MatchResult, ScanSummary, ScoredControl, Severity,
};
