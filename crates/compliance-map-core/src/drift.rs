//! Drift analysis between successive scans of the same project.
//!
//! Compares the current scan's per-control status map against the previous
//! scan's persisted [`ScanSummary`] and classifies every control in the
//! union of both maps. The structured per-control classification list is
//! the primary output; the rendered summary string is a derived view for
//! the surrounding persistence layer's `driftSummary` field.
//!
//! # Scan lifecycle
//!
//! Per project: `NoBaseline` (no prior summary) → `Baseline` (one summary
//! stored). Each observed run is analyzed against the stored baseline and
//! then supersedes it; past summaries are never mutated, only retained as
//! history.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::ControlCatalog;
use crate::config::DriftConfig;
use crate::types::{ControlStatus, ScanSummary};

/// Classification of one control's status change between two scans.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DriftClass {
    /// Absent in the baseline, present now.
    New,
    /// Outstanding (violated/unknown) in the baseline; absent or satisfied now.
    Resolved,
    /// Satisfied in the baseline, outstanding now.
    Regressed,
    /// Outstanding in both scans.
    Persisting,
    /// Satisfied in both scans (or satisfied before and dropped from scope).
    Unchanged,
}

/// Per-control drift classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriftEntry {
    /// The control this entry classifies.
    pub control_id: String,

    /// Status in the baseline summary, if present there.
    pub previous: Option<ControlStatus>,

    /// Status in the current summary, if present there.
    pub current: Option<ControlStatus>,

    /// Classification outcome.
    pub class: DriftClass,
}

/// Aggregate counts per drift classification.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriftCounts {
    pub new: usize,
    pub resolved: usize,
    pub regressed: usize,
    pub persisting: usize,
    pub unchanged: usize,
}

impl DriftCounts {
    fn record(&mut self, class: DriftClass) {
        match class {
            DriftClass::New => self.new += 1,
            DriftClass::Resolved => self.resolved += 1,
            DriftClass::Regressed => self.regressed += 1,
            DriftClass::Persisting => self.persisting += 1,
            DriftClass::Unchanged => self.unchanged += 1,
        }
    }

    /// Total classified controls.
    pub fn total(&self) -> usize {
        self.new + self.resolved + self.regressed + self.persisting + self.unchanged
    }
}

/// Structured drift report for one comparison.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriftReport {
    /// Project both summaries belong to.
    pub project_id: Uuid,

    /// Scan run of the baseline summary; `None` on the initial run.
    pub baseline_run: Option<Uuid>,

    /// Scan run of the current summary.
    pub current_run: Uuid,

    /// Per-control classifications, sorted by control id.
    pub entries: Vec<DriftEntry>,

    /// Aggregate counts per classification.
    pub counts: DriftCounts,

    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
}

impl DriftReport {
    /// Whether the comparison outcome is drifted (any new, resolved, or
    /// regressed control) rather than stable.
    pub fn has_drifted(&self) -> bool {
        self.counts.new + self.counts.resolved + self.counts.regressed > 0
    }

    /// Render the human-readable summary line derived from the counts.
    ///
    /// The structured `entries` list is the primary output; this string is
    /// a secondary rendering for display and persistence.
    pub fn render_summary(&self) -> String {
        format!(
            "{}: {} new, {} resolved, {} regressed, {} persisting, {} unchanged ({} controls)",
            if self.has_drifted() { "drifted" } else { "stable" },
            self.counts.new,
            self.counts.resolved,
            self.counts.regressed,
            self.counts.persisting,
            self.counts.unchanged,
            self.counts.total()
        )
    }

    /// Group entries under the parent control that cross-maps them.
    ///
    /// Classification stays at leaf `control_id` granularity; rollup is a
    /// post-processing view that collapses child controls into a parent
    /// framework area via `mapped_controls`. Entries with no mapping parent
    /// group under their own id.
    pub fn rollup(&self, catalog: &ControlCatalog) -> BTreeMap<String, Vec<DriftEntry>> {
        let controls = catalog.snapshot();
        let mut parent_of: BTreeMap<&str, &str> = BTreeMap::new();
        for control in &controls {
            for child in &control.mapped_controls {
                parent_of.insert(child.as_str(), control.control_id.as_str());
            }
        }

        let mut grouped: BTreeMap<String, Vec<DriftEntry>> = BTreeMap::new();
        for entry in &self.entries {
            let key = parent_of
                .get(entry.control_id.as_str())
                .copied()
                .unwrap_or(entry.control_id.as_str());
            grouped.entry(key.to_string()).or_default().push(entry.clone());
        }
        grouped
    }
}

/// Classifies control-status changes between successive scan summaries.
#[derive(Debug, Default)]
pub struct DriftAnalyzer;

impl DriftAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Analyze the current summary against the previous one, if any.
    ///
    /// A missing baseline is the normal first-run condition, not an error:
    /// every current entry classifies as [`DriftClass::New`]. Neither
    /// summary is mutated.
    pub fn analyze(&self, current: &ScanSummary, previous: Option<&ScanSummary>) -> DriftReport {
        let mut entries = Vec::new();
        let mut counts = DriftCounts::default();

        match previous {
            None => {
                for (control_id, status) in &current.control_status {
                    counts.record(DriftClass::New);
                    entries.push(DriftEntry {
                        control_id: control_id.clone(),
                        previous: None,
                        current: Some(*status),
                        class: DriftClass::New,
                    });
                }
            }
            Some(baseline) => {
                // Union of both status maps; BTreeSet keeps entries sorted
                // by control id for reproducible reports.
                let ids: BTreeSet<&String> = baseline
                    .control_status
                    .keys()
                    .chain(current.control_status.keys())
                    .collect();

                for control_id in ids {
                    let before = baseline.status_of(control_id);
                    let now = current.status_of(control_id);
                    let class = classify(before, now);
                    counts.record(class);
                    entries.push(DriftEntry {
                        control_id: control_id.clone(),
                        previous: before,
                        current: now,
                        class,
                    });
                }
            }
        }

        debug!(
            project = %current.project_id,
            new = counts.new,
            resolved = counts.resolved,
            regressed = counts.regressed,
            "drift analysis complete"
        );

        DriftReport {
            project_id: current.project_id,
            baseline_run: previous.map(|p| p.scan_run_id),
            current_run: current.scan_run_id,
            entries,
            counts,
            generated_at: Utc::now(),
        }
    }
}

/// Classify one control's transition. `None` means absent from that scan.
fn classify(before: Option<ControlStatus>, now: Option<ControlStatus>) -> DriftClass {
    match (before, now) {
        (None, _) => DriftClass::New,
        (Some(prev), Some(cur)) if prev.is_outstanding() => {
            if cur.is_outstanding() {
                DriftClass::Persisting
            } else {
                DriftClass::Resolved
            }
        }
        (Some(prev), None) if prev.is_outstanding() => DriftClass::Resolved,
        // Satisfied in the baseline from here on.
        (Some(_), Some(cur)) if cur.is_outstanding() => DriftClass::Regressed,
        (Some(_), _) => DriftClass::Unchanged,
    }
}

/// Per-project baseline lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaselineState {
    /// No prior summary exists for the project.
    NoBaseline,
    /// A summary is stored as the comparison baseline.
    Baseline {
        /// Scan run of the stored baseline.
        scan_run_id: Uuid,
    },
}

/// Tracks the comparison baseline per project across scan runs.
///
/// Shared, read-mostly state: concurrent `observe` calls for different
/// projects never contend, and a superseded baseline is retained in
/// history rather than deleted.
#[derive(Debug)]
pub struct BaselineTracker {
    analyzer: DriftAnalyzer,
    baselines: DashMap<Uuid, Arc<ScanSummary>>,
    /// Superseded summaries per project, oldest first, capped.
    history: DashMap<Uuid, Vec<Arc<ScanSummary>>>,
    history_per_project: usize,
}

impl BaselineTracker {
    /// Create a tracker with the configured history retention.
    pub fn new(config: &DriftConfig) -> Self {
        Self {
            analyzer: DriftAnalyzer::new(),
            baselines: DashMap::new(),
            history: DashMap::new(),
            history_per_project: config.history_per_project,
        }
    }

    /// Lifecycle state for a project.
    pub fn state(&self, project_id: Uuid) -> BaselineState {
        match self.baselines.get(&project_id) {
            Some(entry) => BaselineState::Baseline {
                scan_run_id: entry.value().scan_run_id,
            },
            None => BaselineState::NoBaseline,
        }
    }

    /// The current baseline summary for a project, if any.
    pub fn baseline(&self, project_id: Uuid) -> Option<Arc<ScanSummary>> {
        self.baselines
            .get(&project_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Superseded summaries for a project, oldest first.
    pub fn superseded(&self, project_id: Uuid) -> Vec<Arc<ScanSummary>> {
        self.history
            .get(&project_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Analyze a completed run against the stored baseline, then promote
    /// the run's summary to be the new baseline.
    ///
    /// The superseded baseline moves into per-project history (capped at
    /// the configured retention); it is never mutated.
    pub fn observe(&self, summary: ScanSummary) -> DriftReport {
        let project_id = summary.project_id;
        let summary = Arc::new(summary);

        let previous = self.baseline(project_id);
        let report = self.analyzer.analyze(&summary, previous.as_deref());

        if let Some(old) = self.baselines.insert(project_id, Arc::clone(&summary)) {
            let mut entry = self.history.entry(project_id).or_default();
            entry.push(old);
            let excess = entry.len().saturating_sub(self.history_per_project);
            if excess > 0 {
                entry.drain(..excess);
            }
        }

        info!(
            project = %project_id,
            run = %summary.scan_run_id,
            drifted = report.has_drifted(),
            "baseline superseded"
        );
        report
    }
}
