//! Display-ready statistics for a damage distribution.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::pmf::Pmf;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    /// `P(X >= i)` with the negligible tail removed.
    pub cumulative: Vec<f64>,
}

impl Summary {
    #[must_use]
    pub fn from_pmf(pmf: &Pmf, cfg: &EngineConfig) -> Self {
        Self {
            mean: pmf.mean(),
            std: pmf.std(),
            cumulative: pmf.cumulative().trim_tail(cfg.tail_threshold).into_values(),
        }
    }

    /// Largest value reached with at least `probability`.
    #[must_use]
    pub fn reached_with(&self, probability: f64) -> usize {
        self.cumulative
            .iter()
            .rposition(|&p| p >= probability)
            .unwrap_or(0)
    }
}
