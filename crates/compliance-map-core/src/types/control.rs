//! Canonical regulatory controls.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A canonical rule or requirement from a regulatory/compliance framework.
///
/// Controls are immutable within a matching session: the catalog replaces a
/// control wholesale on upsert, it never patches fields in place.
///
/// The `embedding` is optional. Controls without one are excluded from
/// semantic ranking but remain eligible for tag-only matching.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Control {
    /// Unique control identifier (e.g., "AC-2", "A.9.2.3").
    pub control_id: String,

    /// Framework this control belongs to (e.g., "NIST-800-53", "ISO-27001").
    pub framework: String,

    /// Short human-readable title.
    pub title: String,

    /// Full control description; also serves as derived remediation text
    /// when no canned recommendation exists for a finding's category.
    pub description: String,

    /// Embedding produced by the external text-embedding provider, if any.
    pub embedding: Option<Vec<f32>>,

    /// Topic tags for overlap scoring. Order irrelevant.
    pub topic_tags: BTreeSet<String>,

    /// Ids of controls this one subsumes or relates to, used for rollup in
    /// drift reporting.
    pub mapped_controls: BTreeSet<String>,
}

impl Control {
    /// Create a control with no embedding, no tags, and no cross-mappings.
    pub fn new(
        control_id: impl Into<String>,
        framework: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            control_id: control_id.into(),
            framework: framework.into(),
            title: title.into(),
            description: description.into(),
            embedding: None,
            topic_tags: BTreeSet::new(),
            mapped_controls: BTreeSet::new(),
        }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach topic tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach cross-mapped control ids.
    pub fn with_mapped_controls<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapped_controls = ids.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let control = Control::new("AC-2", "NIST-800-53", "Account Management", "Manage accounts")
            .with_embedding(vec![1.0, 0.0])
            .with_tags(["access", "identity"])
            .with_mapped_controls(["AC-2(1)"]);

        assert_eq!(control.control_id, "AC-2");
        assert_eq!(control.embedding.as_deref(), Some(&[1.0, 0.0][..]));
        assert!(control.topic_tags.contains("access"));
        assert!(control.mapped_controls.contains("AC-2(1)"));
        println!("[VERIFIED] Control builder chain");
    }

    #[test]
    fn test_serde_round_trip() {
        let control = Control::new("AU-3", "NIST-800-53", "Content of Audit Records", "...")
            .with_tags(["audit"]);
        let json = serde_json::to_string(&control).unwrap();
        let back: Control = serde_json::from_str(&json).unwrap();
        assert_eq!(back.control_id, "AU-3");
        assert!(back.embedding.is_none());
    }
}
