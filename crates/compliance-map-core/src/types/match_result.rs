//! Match results: ranked control candidates for a finding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single matched control with its blended ranking score.
///
/// The score is a blend of semantic similarity and tag overlap in
/// `[-1.0, 1.0]`; it is a ranking score, not a probability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredControl {
    /// Id of the matched catalog control.
    pub control_id: String,

    /// Blended ranking score.
    pub score: f32,
}

impl ScoredControl {
    /// Create a new scored control.
    pub fn new(control_id: impl Into<String>, score: f32) -> Self {
        Self {
            control_id: control_id.into(),
            score,
        }
    }
}

/// Ranked control matches for one finding.
///
/// Matches are sorted descending by score, ties broken by `control_id`
/// ascending so that identical inputs always produce identical output
/// ordering. An empty match list is a valid state ("unmapped finding").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchResult {
    /// The finding these matches belong to.
    pub finding_id: Uuid,

    /// Matched controls, best first.
    pub matches: Vec<ScoredControl>,
}

impl MatchResult {
    /// Create an empty result for a finding with no matches.
    pub fn empty(finding_id: Uuid) -> Self {
        Self {
            finding_id,
            matches: Vec::new(),
        }
    }

    /// Whether no control matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The best-ranked match, if any.
    pub fn top(&self) -> Option<&ScoredControl> {
        self.matches.first()
    }

    /// Ids of matched controls in rank order.
    pub fn control_ids(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.control_id.as_str())
    }
}
