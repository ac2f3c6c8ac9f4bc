//! Error types.
//!
//! The controller has no runtime failure modes of its own. Everything that can
//! go wrong is a configuration problem, and is caught before the state machine
//! runs for an entity.

use thiserror::Error;

/// Reasons a [`ControllerConfig`](crate::config::ControllerConfig) is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tunable is NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    /// A tunable that must be `>= 0` is negative.
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// A tunable that must be `> 0` is zero or negative.
    #[error("`{field}` must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// A gravity multiplier below 1 would weaken gravity instead of adding to it.
    #[error("`{field}` must be at least 1.0, got {value}")]
    BelowOne { field: &'static str, value: f32 },

    /// A tunable lies outside its allowed range.
    #[error("`{field}` must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// `min_pitch` is not strictly below `max_pitch`.
    #[error("pitch bounds are inverted: min_pitch {min} >= max_pitch {max}")]
    InvertedPitchBounds { min: f32, max: f32 },

    /// A RON config document could not be parsed.
    #[error("failed to parse controller config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
