//! Match engine: ranked control matching for scan findings.
//!
//! Given a finding's embedding and tags, queries the [`ControlCatalog`] for
//! the full candidate set, blends semantic similarity and tag overlap into a
//! single ranking score, applies the confidence threshold, and truncates to
//! the configured top-K.
//!
//! This is a top-K threshold-filtered ranking problem, not exact
//! nearest-neighbor search: a linear catalog scan is sufficient at
//! compliance-taxonomy scale (hundreds of controls). See the catalog module
//! for the documented scaling limit.
//!
//! # Determinism
//!
//! - Per finding: matches sort descending by blended score, ties broken by
//!   `control_id` ascending.
//! - Per batch: results sort by `finding_id` before return, so downstream
//!   drift comparison sees a stable ordering regardless of worker
//!   interleaving.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::catalog::ControlCatalog;
use crate::config::MatchingConfig;
use crate::error::CoreResult;
use crate::types::{Finding, MatchResult, ScoredControl};

/// Outcome of matching a batch of findings.
///
/// A deadline reached mid-batch stops further matching; the outcome is then
/// flagged `partial` with the matched/total counts so the caller can report
/// it as such rather than mistaking it for a complete run.
#[derive(Clone, Debug)]
pub struct MatchBatch {
    /// Completed match results, sorted by finding id.
    pub results: Vec<MatchResult>,

    /// Number of findings actually matched.
    pub matched: usize,

    /// Number of findings submitted.
    pub total: usize,

    /// Whether the batch was abandoned before all findings were matched.
    pub partial: bool,
}

/// Maps findings to ranked catalog controls.
///
/// Stateless between calls apart from the shared catalog reference; a single
/// engine may serve many threads concurrently.
#[derive(Debug)]
pub struct MatchEngine {
    catalog: Arc<ControlCatalog>,
    config: MatchingConfig,
}

impl MatchEngine {
    /// Create an engine over a shared catalog.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::InvalidConfig`] if the configuration fails
    /// validation; rejected here, before any matching work.
    pub fn new(catalog: Arc<ControlCatalog>, config: MatchingConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    /// The engine's scoring configuration.
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Match one finding against the catalog.
    ///
    /// Returns an empty [`MatchResult`] — not an error — when the finding
    /// carries no matchable signal (no embedding, no tags) or the catalog is
    /// empty. An unmapped finding is a legitimate compliance state.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::DimensionMismatch`] if the finding's embedding
    /// length disagrees with the catalog's dimensionality.
    pub fn match_finding(&self, finding: &Finding) -> CoreResult<MatchResult> {
        if !finding.has_signal() || self.catalog.is_empty() {
            debug!(finding_id = %finding.id, "no matchable signal or empty catalog");
            return Ok(MatchResult::empty(finding.id));
        }

        let candidates = self
            .catalog
            .query(finding.embedding.as_deref(), &finding.tags)?;

        let mut matches: Vec<ScoredControl> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let blended = self.config.weight_semantic * candidate.semantic_score
                    + self.config.weight_tag * candidate.tag_score;
                (blended >= self.config.min_score)
                    .then(|| ScoredControl::new(candidate.control.control_id.clone(), blended))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.control_id.cmp(&b.control_id))
        });
        matches.truncate(self.config.top_k);

        debug!(
            finding_id = %finding.id,
            matched = matches.len(),
            "finding matched"
        );
        Ok(MatchResult {
            finding_id: finding.id,
            matches,
        })
    }

    /// Match a batch of findings in parallel.
    ///
    /// Findings are independent, so they are scored on the rayon pool with
    /// no shared mutable state. Results are combined only after all
    /// individual matches complete and sorted by finding id for
    /// reproducible downstream reporting.
    ///
    /// If `deadline` is given and passes mid-batch, findings not yet started
    /// are skipped and the outcome is flagged partial.
    ///
    /// # Errors
    ///
    /// The first [`crate::CoreError`] from any individual match aborts the
    /// batch.
    pub fn match_batch(
        &self,
        findings: &[Finding],
        deadline: Option<Instant>,
    ) -> CoreResult<MatchBatch> {
        let outcomes: Vec<Option<MatchResult>> = findings
            .par_iter()
            .map(|finding| {
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                }
                self.match_finding(finding).map(Some)
            })
            .collect::<CoreResult<_>>()?;

        let mut results: Vec<MatchResult> = outcomes.into_iter().flatten().collect();
        results.sort_by_key(|r| r.finding_id);

        let matched = results.len();
        let total = findings.len();
        let partial = matched < total;
        if partial {
            warn!(matched, total, "batch abandoned at deadline; reporting partial");
        }

        Ok(MatchBatch {
            results,
            matched,
            total,
            partial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Control, Severity};
    use uuid::Uuid;

    // ========================================
    // FIXTURES
    // ========================================

    fn two_control_catalog() -> Arc<ControlCatalog> {
        let catalog = ControlCatalog::new();
        catalog
            .upsert(
                Control::new("A", "NIST-800-53", "Access Control", "Restrict access")
                    .with_embedding(vec![1.0, 0.0])
                    .with_tags(["access"]),
            )
            .unwrap();
        catalog
            .upsert(
                Control::new("B", "NIST-800-53", "Authentication", "Authenticate users")
                    .with_embedding(vec![0.0, 1.0])
                    .with_tags(["auth"]),
            )
            .unwrap();
        Arc::new(catalog)
    }

    fn access_finding() -> Finding {
        Finding::new(
            "FAILED_LOGIN",
            "Repeated failed logins",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Severity::High,
        )
        .with_embedding(vec![0.9, 0.1])
        .with_tags(["access"])
    }

    // ========================================
    // SINGLE FINDING
    // ========================================

    #[test]
    fn test_blended_score_scenario() {
        // A: cosine([0.9,0.1],[1,0]) ≈ 0.994, tags {access}∩{access} = 1.0
        //    blended ≈ 0.7*0.994 + 0.3*1.0 ≈ 0.996
        let engine = MatchEngine::new(two_control_catalog(), MatchingConfig::default()).unwrap();
        let result = engine.match_finding(&access_finding()).unwrap();

        let top = result.top().unwrap();
        assert_eq!(top.control_id, "A");
        assert!(
            (top.score - 0.996).abs() < 0.005,
            "expected ≈0.996, got {}",
            top.score
        );
        println!("[VERIFIED] blended score scenario: A = {}", top.score);
    }

    #[test]
    fn test_min_score_filters_candidates() {
        // B's blended score: 0.7*0.110 + 0.3*0.0 ≈ 0.077 < 0.15 default.
        let engine = MatchEngine::new(two_control_catalog(), MatchingConfig::default()).unwrap();
        let result = engine.match_finding(&access_finding()).unwrap();

        assert!(result.control_ids().all(|id| id != "B"));
        for m in &result.matches {
            assert!(m.score >= engine.config().min_score);
        }
        println!("[VERIFIED] no returned score below min_score");
    }

    #[test]
    fn test_ranking_a_above_b_without_threshold() {
        let config = MatchingConfig {
            min_score: 0.0,
            ..MatchingConfig::default()
        };
        let engine = MatchEngine::new(two_control_catalog(), config).unwrap();
        let result = engine.match_finding(&access_finding()).unwrap();

        let ids: Vec<&str> = result.control_ids().collect();
        assert_eq!(ids, vec!["A", "B"]);
        // Sorted non-increasing.
        for window in result.matches.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }

    #[test]
    fn test_tie_broken_by_control_id() {
        let catalog = ControlCatalog::new();
        for id in ["Z-1", "A-1", "M-1"] {
            catalog
                .upsert(
                    Control::new(id, "NIST-800-53", "Dup", "Same direction")
                        .with_embedding(vec![1.0, 0.0]),
                )
                .unwrap();
        }
        let engine = MatchEngine::new(Arc::new(catalog), MatchingConfig::default()).unwrap();

        let finding = Finding::new(
            "X",
            "desc",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Severity::Low,
        )
        .with_embedding(vec![1.0, 0.0]);

        let result = engine.match_finding(&finding).unwrap();
        let ids: Vec<&str> = result.control_ids().collect();
        assert_eq!(ids, vec!["A-1", "M-1", "Z-1"]);
        println!("[VERIFIED] equal scores ordered by control id");
    }

    #[test]
    fn test_top_k_truncation() {
        let catalog = ControlCatalog::new();
        for i in 0..10 {
            catalog
                .upsert(
                    Control::new(format!("C-{}", i), "NIST-800-53", "C", "desc")
                        .with_embedding(vec![1.0, 0.0]),
                )
                .unwrap();
        }
        let config = MatchingConfig {
            top_k: 3,
            ..MatchingConfig::default()
        };
        let engine = MatchEngine::new(Arc::new(catalog), config).unwrap();

        let finding = Finding::new("X", "d", Uuid::new_v4(), Uuid::new_v4(), Severity::Low)
            .with_embedding(vec![1.0, 0.0]);
        let result = engine.match_finding(&finding).unwrap();
        assert_eq!(result.matches.len(), 3);
    }

    #[test]
    fn test_no_signal_finding_returns_empty() {
        let engine = MatchEngine::new(two_control_catalog(), MatchingConfig::default()).unwrap();
        let finding = Finding::new(
            "BARE",
            "no embedding, no tags",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Severity::Low,
        );
        let result = engine.match_finding(&finding).unwrap();
        assert!(result.is_empty());
        println!("[VERIFIED] signal-free finding yields empty result, not error");
    }

    #[test]
    fn test_empty_catalog_returns_empty() {
        let engine =
            MatchEngine::new(Arc::new(ControlCatalog::new()), MatchingConfig::default()).unwrap();
        let result = engine.match_finding(&access_finding()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = MatchingConfig {
            weight_tag: -1.0,
            ..MatchingConfig::default()
        };
        assert!(MatchEngine::new(two_control_catalog(), config).is_err());
    }

    // ========================================
    // BATCH
    // ========================================

    #[test]
    fn test_batch_sorted_by_finding_id_and_complete() {
        let engine = MatchEngine::new(two_control_catalog(), MatchingConfig::default()).unwrap();
        let findings: Vec<Finding> = (0..8).map(|_| access_finding()).collect();

        let batch = engine.match_batch(&findings, None).unwrap();
        assert!(!batch.partial);
        assert_eq!(batch.matched, 8);
        assert_eq!(batch.total, 8);
        for window in batch.results.windows(2) {
            assert!(window[0].finding_id <= window[1].finding_id);
        }
        println!("[VERIFIED] batch results sorted by finding id");
    }

    #[test]
    fn test_batch_past_deadline_reported_partial() {
        let engine = MatchEngine::new(two_control_catalog(), MatchingConfig::default()).unwrap();
        let findings: Vec<Finding> = (0..8).map(|_| access_finding()).collect();

        // Deadline already elapsed: nothing gets matched, nothing is silent.
        let deadline = Instant::now() - std::time::Duration::from_millis(1);
        let batch = engine.match_batch(&findings, Some(deadline)).unwrap();
        assert!(batch.partial);
        assert_eq!(batch.matched, 0);
        assert_eq!(batch.total, 8);
        println!("[VERIFIED] abandoned batch reported as partial");
    }
}
