//! Vector similarity primitives.
//!
//! Pure numeric functions over dense `f32` slices: dot product, L2 norm, and
//! cosine similarity. No logging, no shared state; deterministic for
//! identical inputs (floating-point associativity may cause ULP-level
//! differences across platforms, which is acceptable).
//!
//! All comparisons are length-checked. Vectors compared within one
//! deployment must share the same dimensionality; a mismatch is a
//! [`CoreError::DimensionMismatch`], not a recoverable condition.

use crate::error::{CoreError, CoreResult};

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm of a slice.
#[inline]
pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Cosine similarity between two non-empty, equal-length vectors.
///
/// Returns the normalized dot product in `[-1.0, 1.0]`.
///
/// Returns `Ok(0.0)` when either vector has zero magnitude: a zero vector
/// carries no directional information and ranks as maximally dissimilar
/// rather than failing the caller.
///
/// # Errors
///
/// [`CoreError::DimensionMismatch`] if the lengths differ, or if both
/// slices are empty (zero dimensionality carries no signal).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> CoreResult<f32> {
    if a.len() != b.len() || a.is_empty() {
        return Err(CoreError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok(dot(a, b) / (norm_a * norm_b))
}
