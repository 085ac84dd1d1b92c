//! Engine presentation settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pmf::DEFAULT_TAIL_THRESHOLD;

/// Knobs that shape derived output without touching the exact distributions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trailing cumulative entries below this probability are dropped from summaries.
    #[serde(default = "EngineConfig::default_tail_threshold")]
    pub tail_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tail_threshold: Self::default_tail_threshold(),
        }
    }
}

impl EngineConfig {
    const fn default_tail_threshold() -> f64 {
        DEFAULT_TAIL_THRESHOLD
    }

    /// Parse a config from JSON, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the payload is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when `tail_threshold` is outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tail_threshold > 0.0 && self.tail_threshold < 1.0) {
            return Err(ConfigError::RangeViolation {
                field: "tail_threshold",
                min: 0.0,
                max: 1.0,
                value: self.tail_threshold,
            });
        }
        Ok(())
    }
}
