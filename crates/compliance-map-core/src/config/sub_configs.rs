//! Sub-configuration structures for the control-mapping engine.
//!
//! This module contains the individual configuration structs that make up
//! the main `Config` structure.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Scoring and ranking configuration for the match engine.
///
/// The weights need not sum to 1; the caller owns meaningful weighting.
/// Defaults are tunable deployment choices, not reverse-engineered
/// constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Weight applied to cosine similarity (default: 0.7).
    #[serde(default = "default_weight_semantic")]
    pub weight_semantic: f32,

    /// Weight applied to tag overlap (default: 0.3).
    #[serde(default = "default_weight_tag")]
    pub weight_tag: f32,

    /// Candidates with a blended score below this are dropped (default: 0.15).
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Maximum matches returned per finding (default: 5).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weight_semantic: default_weight_semantic(),
            weight_tag: default_weight_tag(),
            min_score: default_min_score(),
            top_k: default_top_k(),
        }
    }
}

impl MatchingConfig {
    /// Validate the configuration before any matching work begins.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] for negative weights or a zero `top_k`.
    pub fn validate(&self) -> CoreResult<()> {
        if self.weight_semantic < 0.0 {
            return Err(CoreError::InvalidConfig {
                reason: format!(
                    "weight_semantic must be non-negative, got {}",
                    self.weight_semantic
                ),
            });
        }
        if self.weight_tag < 0.0 {
            return Err(CoreError::InvalidConfig {
                reason: format!("weight_tag must be non-negative, got {}", self.weight_tag),
            });
        }
        if self.top_k == 0 {
            return Err(CoreError::InvalidConfig {
                reason: "top_k must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn default_weight_semantic() -> f32 {
    0.7
}

fn default_weight_tag() -> f32 {
    0.3
}

fn default_min_score() -> f32 {
    0.15
}

fn default_top_k() -> usize {
    5
}

/// Drift analysis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriftConfig {
    /// Superseded summaries retained per project for history (default: 100).
    #[serde(default = "default_history_per_project")]
    pub history_per_project: usize,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            history_per_project: default_history_per_project(),
        }
    }
}

fn default_history_per_project() -> usize {
    100
}

/// Logging configuration consumed by the surrounding service when it
/// initializes its `tracing` subscriber.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
