//! Error types surfaced by the engine.

use thiserror::Error;

/// Errors raised while turning user-facing strings into engine inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid dice notation `{input}` (expected an integer or NdM)")]
    InvalidDiceNotation { input: String },
    #[error("unrecognised modifier token `{token}`")]
    InvalidModifierToken { token: String },
    #[error("{field} must be an integer (got `{value}`)")]
    InvalidNumber { field: &'static str, value: String },
    #[error("unknown target preset `{name}`")]
    UnknownPreset { name: String },
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} exclusive (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}
