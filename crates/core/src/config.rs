//! Compaction configuration and progress reporting.

use crate::error::{Error, Result};
use crate::sa::{SaConfig, SaProgress};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Common configuration for the compaction pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Annealing schedule and budget.
    pub sa: SaConfig,

    /// Module count from which cost evaluation runs in parallel.
    pub parallel_cost_threshold: usize,

    /// Re-check every reconstructed candidate for pairwise box overlap.
    pub validate_candidates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sa: SaConfig::default(),
            parallel_cost_threshold: 64,
            validate_candidates: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the annealing configuration.
    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sa.seed = seed;
        self
    }

    /// Sets the parallel cost threshold.
    pub fn with_parallel_cost_threshold(mut self, modules: usize) -> Self {
        self.parallel_cost_threshold = modules.max(1);
        self
    }

    /// Enables or disables pairwise overlap validation.
    pub fn with_candidate_validation(mut self, enabled: bool) -> Self {
        self.validate_candidates = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.sa.validate()?;
        if self.parallel_cost_threshold == 0 {
            return Err(Error::ConfigError(
                "parallel cost threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress callback for long-running operations.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// Progress information during compaction.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Current temperature.
    pub temperature: f64,
    /// Trials performed so far.
    pub iteration: u64,
    /// Best cost so far.
    pub best_cost: f64,
    /// Cost of the committed layout.
    pub current_cost: f64,
    /// Acceptance rate over the last temperature level.
    pub acceptance_rate: f64,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the search is still running.
    pub running: bool,
}

impl From<&SaProgress> for ProgressInfo {
    fn from(progress: &SaProgress) -> Self {
        Self {
            temperature: progress.temperature,
            iteration: progress.iteration,
            best_cost: progress.best_cost,
            current_cost: progress.current_cost,
            acceptance_rate: progress.acceptance_rate,
            elapsed_ms: progress.elapsed.as_millis() as u64,
            running: true,
        }
    }
}
