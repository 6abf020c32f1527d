//! In-memory index over canonical controls.
//!
//! The catalog is shared, read-mostly state: many concurrent match queries
//! run against it while upserts happen rarely (taxonomy revisions). Entries
//! live behind `DashMap<String, Arc<Control>>`, so an upsert swaps the whole
//! `Arc` atomically per control id — a reader observes either the old or the
//! new control, never a mix of fields.
//!
//! `query` is a linear scan over all entries. At the scale of a
//! compliance-control taxonomy (hundreds of controls, not millions) this is
//! the right trade-off; if catalogs ever grow beyond low thousands, an
//! inverted tag index or ANN structure can replace the scan behind the same
//! contract.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::similarity::cosine_similarity;
use crate::types::Control;

/// An unranked candidate produced by [`ControlCatalog::query`].
///
/// Ranking, thresholding, and truncation are the match engine's
/// responsibility; the catalog stays a pure index.
#[derive(Clone, Debug)]
pub struct CandidateScore {
    /// The candidate control.
    pub control: Arc<Control>,

    /// Cosine similarity against the query embedding, or `0.0` when either
    /// side has no embedding.
    pub semantic_score: f32,

    /// Jaccard overlap between query tags and the control's topic tags.
    pub tag_score: f32,
}

/// Shared in-memory index over canonical controls, unique by `control_id`.
#[derive(Debug, Default)]
pub struct ControlCatalog {
    /// control_id -> control. Arc swap per upsert keeps reads consistent.
    entries: DashMap<String, Arc<Control>>,
    /// Embedding dimensionality established by the first embedded control;
    /// 0 means not yet established.
    dimension: AtomicUsize,
}

impl ControlCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a control by `control_id`.
    ///
    /// Duplicate insertion with a different payload is an update, not a
    /// second entry.
    ///
    /// # Errors
    ///
    /// [`CoreError::DimensionMismatch`] if the control carries an embedding
    /// whose length disagrees with the catalog's established dimensionality.
    pub fn upsert(&self, control: Control) -> CoreResult<()> {
        if let Some(embedding) = &control.embedding {
            // First embedded control fixes the catalog dimension; a lost
            // race re-validates against the winner's value.
            let established = match self.dimension.compare_exchange(
                0,
                embedding.len(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => embedding.len(),
                Err(current) => current,
            };
            if embedding.len() != established {
                return Err(CoreError::DimensionMismatch {
                    expected: established,
                    actual: embedding.len(),
                });
            }
        }

        let replaced = self
            .entries
            .insert(control.control_id.clone(), Arc::new(control))
            .is_some();
        debug!(replaced, total = self.entries.len(), "catalog upsert");
        Ok(())
    }

    /// Look up a control by id.
    ///
    /// # Errors
    ///
    /// [`CoreError::ControlNotFound`] if no entry exists for `control_id`.
    pub fn by_id(&self, control_id: &str) -> CoreResult<Arc<Control>> {
        self.entries
            .get(control_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CoreError::ControlNotFound {
                control_id: control_id.to_string(),
            })
    }

    /// Score every catalog entry against a finding's embedding and tags.
    ///
    /// Entries with an embedding get a cosine `semantic_score`; entries
    /// without one participate via tag overlap only (`semantic_score` 0.0).
    /// Returns the full unranked candidate set.
    ///
    /// # Errors
    ///
    /// [`CoreError::DimensionMismatch`] if the query embedding's length
    /// disagrees with the catalog's established dimensionality.
    pub fn query(
        &self,
        embedding: Option<&[f32]>,
        tags: &BTreeSet<String>,
    ) -> CoreResult<Vec<CandidateScore>> {
        if let Some(query_embedding) = embedding {
            let established = self.dimension.load(Ordering::Acquire);
            if established != 0 && query_embedding.len() != established {
                return Err(CoreError::DimensionMismatch {
                    expected: established,
                    actual: query_embedding.len(),
                });
            }
        }

        let mut candidates = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            let control = Arc::clone(entry.value());

            let semantic_score = match (embedding, &control.embedding) {
                (Some(a), Some(b)) => cosine_similarity(a, b)?,
                _ => 0.0,
            };
            let tag_score = jaccard(tags, &control.topic_tags);

            candidates.push(CandidateScore {
                control,
                semantic_score,
                tag_score,
            });
        }
        Ok(candidates)
    }

    /// A point-in-time snapshot of every control in the catalog.
    ///
    /// Used by drift rollup to resolve `mapped_controls` parents; cheap at
    /// taxonomy scale since entries are `Arc`-shared, not cloned.
    pub fn snapshot(&self) -> Vec<Arc<Control>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of controls in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no controls.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Jaccard overlap: `|a ∩ b| / max(1, |a ∪ b|)`.
///
/// The `max(1, ..)` floor makes two empty sets score 0.0 instead of
/// dividing by zero.
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f32 / union.max(1) as f32
}
