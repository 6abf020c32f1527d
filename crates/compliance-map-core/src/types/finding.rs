//! Scan findings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a finding as reported by the scanner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// A single observation from a compliance or dependency scan.
///
/// A finding may legitimately carry no matchable signal (no embedding and no
/// tags); matching such a finding yields an empty result, not an error —
/// an "unmapped finding" is a valid compliance state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Finding {
    /// Unique finding identifier.
    pub id: Uuid,

    /// Free-text or coded classification (e.g., "FAILED_LOGIN",
    /// "CVE-2024-12345"). Keyed case-sensitively against the canned
    /// remediation table.
    pub category: String,

    /// Tags for overlap scoring against control topic tags.
    pub tags: BTreeSet<String>,

    /// Human-readable description of the observation.
    pub description: String,

    /// Embedding supplied by the caller, if any.
    pub embedding: Option<Vec<f32>>,

    /// Project this finding belongs to.
    pub project_id: Uuid,

    /// Scan run that produced this finding.
    pub scan_run_id: Uuid,

    /// Scanner-reported severity.
    pub severity: Severity,
}

impl Finding {
    /// Create a finding with no embedding and no tags.
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        project_id: Uuid,
        scan_run_id: Uuid,
        severity: Severity,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            tags: BTreeSet::new(),
            description: description.into(),
            embedding: None,
            project_id,
            scan_run_id,
            severity,
        }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this finding carries any matchable signal.
    pub fn has_signal(&self) -> bool {
        self.embedding.is_some() || !self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_signal() {
        let project = Uuid::new_v4();
        let run = Uuid::new_v4();

        let bare = Finding::new("MISC", "no signal", project, run, Severity::Low);
        assert!(!bare.has_signal());

        let tagged = bare.clone().with_tags(["access"]);
        assert!(tagged.has_signal());

        let embedded = bare.with_embedding(vec![0.1, 0.2]);
        assert!(embedded.has_signal());
        println!("[VERIFIED] has_signal reflects embedding/tag presence");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Info < Severity::Low);
    }
}
