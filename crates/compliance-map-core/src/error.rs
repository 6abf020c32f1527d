//! Error types for compliance-map-core.
//!
//! This module defines the central error type [`CoreError`] used throughout
//! the crate, along with the [`CoreResult<T>`] type alias.
//!
//! Absence-of-signal conditions (a finding with no embedding and no tags, an
//! empty catalog, a missing drift baseline) are deliberately *not* errors:
//! they are modeled as valid empty results by the components that produce
//! them. `CoreError` covers genuine failures only.

use thiserror::Error;

/// Top-level error type for compliance-map-core operations.
///
/// # Examples
///
/// ```rust
/// use compliance_map_core::CoreError;
///
/// let error = CoreError::DimensionMismatch {
///     expected: 1536,
///     actual: 768,
/// };
/// assert!(error.to_string().contains("1536"));
/// ```
#[derive(Debug, Error)]
pub enum CoreError {
    /// Embedding vector dimension does not match the expected size.
    ///
    /// # When This Occurs
    ///
    /// - Comparing vectors of unequal length
    /// - Upserting a control whose embedding disagrees with the catalog's
    ///   established dimensionality
    /// - Querying with an embedding from a different model
    ///
    /// This is a programming/data error, surfaced to the caller and never
    /// retried.
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension provided
        actual: usize,
    },

    /// A requested control was not found in the catalog.
    ///
    /// Recoverable; the caller decides the fallback.
    #[error("Control not found: {control_id}")]
    ControlNotFound {
        /// The id of the control that was not found
        control_id: String,
    },

    /// Matching configuration failed validation.
    ///
    /// # When This Occurs
    ///
    /// - Negative scoring weights
    /// - `top_k == 0`
    ///
    /// Rejected at the boundary before any matching work begins.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the validation failure
        reason: String,
    },

    /// Configuration file or environment loading failed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
