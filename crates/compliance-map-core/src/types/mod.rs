//! Domain types for the control-mapping engine.
//!
//! # Types
//!
//! - [`Control`] - a canonical regulatory control from a compliance framework
//! - [`Finding`] / [`Severity`] - a unit of scan output
//! - [`MatchResult`] / [`ScoredControl`] - ranked control matches for a finding
//! - [`ScanSummary`] / [`ControlStatus`] - immutable per-scan snapshot used as
//!   the drift comparison baseline

mod control;
mod finding;
mod match_result;
mod scan_summary;

pub use control::Control;
pub use finding::{Finding, Severity};
pub use match_result::{MatchResult, ScoredControl};
pub use scan_summary::{ControlStatus, ScanSummary};
