//! Scan summaries: immutable per-run snapshots used as drift baselines.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MatchResult;

/// Aggregate compliance status of a control within one scan run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    /// The control's requirements are met.
    Satisfied,
    /// At least one finding violates the control.
    Violated,
    /// The control was mapped but its status could not be determined.
    Unknown,
}

impl ControlStatus {
    /// Whether this status represents an outstanding compliance problem.
    #[inline]
    pub fn is_outstanding(self) -> bool {
        !matches!(self, ControlStatus::Satisfied)
    }
}

/// A named, versioned snapshot of one completed scan run for a project.
///
/// Created once per completed run and immutable thereafter. Summaries are
/// append-only history: a newer run's summary supersedes (never deletes)
/// the previous one as the drift comparison baseline.
///
/// `control_status` uses a `BTreeMap` so iteration order — and therefore
/// every derived report — is deterministic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Project this summary belongs to.
    pub project_id: Uuid,

    /// Scan run that produced this summary.
    pub scan_run_id: Uuid,

    /// When the summary was created.
    pub created_at: DateTime<Utc>,

    /// Match results for every finding in the run, sorted by finding id.
    pub matches: Vec<MatchResult>,

    /// Aggregate status per matched control.
    pub control_status: BTreeMap<String, ControlStatus>,
}

impl ScanSummary {
    /// Create a summary from a run's match results and per-control statuses.
    ///
    /// Match results are sorted by finding id on construction so that two
    /// summaries built from the same inputs compare identically.
    pub fn new(
        project_id: Uuid,
        scan_run_id: Uuid,
        mut matches: Vec<MatchResult>,
        control_status: BTreeMap<String, ControlStatus>,
    ) -> Self {
        matches.sort_by_key(|m| m.finding_id);
        Self {
            project_id,
            scan_run_id,
            created_at: Utc::now(),
            matches,
            control_status,
        }
    }

    /// Status of a control in this summary, if it was mapped.
    pub fn status_of(&self, control_id: &str) -> Option<ControlStatus> {
        self.control_status.get(control_id).copied()
    }

    /// Number of controls with an outstanding (non-satisfied) status.
    pub fn outstanding_count(&self) -> usize {
        self.control_status
            .values()
            .filter(|s| s.is_outstanding())
            .count()
    }
}
