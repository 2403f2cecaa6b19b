//! Analysis error types.
//!
//! Upstream data gaps (no events in the window, missing buff data) are not
//! errors: they surface as `Ok(None)` from the pipeline. Everything here
//! indicates a reference-table or logic defect and must fail fast rather
//! than silently corrupt downstream statistics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An observed falloff fraction had potency candidates but none within
    /// tolerance. Guessing would assign the wrong potency tier.
    #[error(
        "no falloff candidate within {tolerance} of observed fraction {observed:.4} \
         for ability {ability_id} ({ability_name})"
    )]
    FalloffMatch {
        ability_id: i64,
        ability_name: String,
        observed: f64,
        tolerance: f64,
    },

    /// Rotation rows referenced base actions absent from the normalized
    /// table, which means the potency reference rows are inconsistent.
    #[error("rotation rows do not trace back to normalized actions: {actions:?}")]
    RotationMismatch { actions: Vec<String> },

    /// A ground-effect multiplier was still unresolved when the potency
    /// resolver needed it.
    #[error("action {action_name} at t={elapsed_time:.3}s has no damage multiplier")]
    MissingMultiplier {
        action_name: String,
        elapsed_time: f64,
    },

    /// A distribution failed shape or finiteness validation.
    #[error("invalid distribution: {context}")]
    InvalidDistribution { context: &'static str },

    /// A distribution's support cannot carry a density (too few or
    /// non-increasing points).
    #[error("degenerate distribution support: {context}")]
    DegenerateSupport { context: &'static str },

    /// No level coefficients are known for the requested level.
    #[error("unsupported player level {level}")]
    UnsupportedLevel { level: u8 },
}
