//! Simulated Annealing framework for commit/rollback search states.
//!
//! The runner drives a problem that keeps its own committed state and a
//! working candidate. Each trial asks the problem to propose a candidate and
//! report its cost; the runner then either commits or rolls it back by the
//! Metropolis criterion. Costs are minimized.

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for Simulated Annealing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SaConfig {
    /// Initial temperature.
    pub initial_temp: f64,
    /// The search stops once the temperature falls below this floor.
    pub final_temp: f64,
    /// Geometric cooling factor applied after each temperature level.
    pub cooling_rate: f64,
    /// Number of trials at each temperature level.
    pub iterations_per_temp: usize,
    /// Maximum total trials (None = temperature-based stopping only).
    pub max_iterations: Option<u64>,
    /// Maximum wall-clock time (None = unlimited).
    pub time_limit: Option<Duration>,
    /// Seed of the run's random source.
    pub seed: u64,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temp: 100.0,
            final_temp: 0.01,
            cooling_rate: 0.99,
            iterations_per_temp: 1000,
            max_iterations: None,
            time_limit: None,
            seed: 0x7165_6370,
        }
    }
}

impl SaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial temperature. Zero gives a greedy descent.
    pub fn with_initial_temp(mut self, temp: f64) -> Self {
        self.initial_temp = temp.max(0.0);
        self
    }

    /// Sets the final temperature.
    pub fn with_final_temp(mut self, temp: f64) -> Self {
        self.final_temp = temp.max(0.0001);
        self
    }

    /// Sets the cooling rate.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate.clamp(0.001, 0.9999);
        self
    }

    /// Sets the trials per temperature level.
    pub fn with_iterations_per_temp(mut self, iterations: usize) -> Self {
        self.iterations_per_temp = iterations.max(1);
        self
    }

    /// Sets the maximum iterations.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks values that the builders clamp but deserialization does not.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_temp.is_finite() || self.initial_temp < 0.0 {
            return Err(Error::ConfigError(format!(
                "initial temperature must be finite and non-negative, got {}",
                self.initial_temp
            )));
        }
        if !self.final_temp.is_finite() || self.final_temp <= 0.0 {
            return Err(Error::ConfigError(format!(
                "final temperature must be positive, got {}",
                self.final_temp
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(Error::ConfigError(format!(
                "cooling rate must lie in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if self.iterations_per_temp == 0 {
            return Err(Error::ConfigError(
                "iterations per temperature must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A search state that can propose, commit and roll back candidates.
pub trait SaProblem {
    /// Copy of the committed state used to remember the best solution.
    type Snapshot;

    /// Returns the cost of the committed starting state.
    fn initial_cost(&mut self) -> f64;

    /// Builds a working candidate and returns its cost.
    ///
    /// An error marks the candidate as structurally invalid; the runner rolls
    /// it back and continues.
    fn propose(&mut self, rng: &mut StdRng) -> Result<f64>;

    /// Makes the working candidate the committed state.
    ///
    /// On error the committed state must be left as it was; the runner then
    /// counts the trial as invalid.
    fn commit(&mut self) -> Result<()>;

    /// Discards the working candidate.
    fn rollback(&mut self);

    /// Captures the committed state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Reinstates a captured state as the committed state.
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Called after each temperature level (for progress reporting).
    fn on_temperature_change(&mut self, _progress: &SaProgress) {}
}

/// Progress information during SA execution.
#[derive(Debug, Clone)]
pub struct SaProgress {
    /// Temperature of the level just finished.
    pub temperature: f64,
    /// Trials performed so far.
    pub iteration: u64,
    /// Best cost so far.
    pub best_cost: f64,
    /// Cost of the committed state.
    pub current_cost: f64,
    /// Acceptance rate over the level just finished.
    pub acceptance_rate: f64,
    /// Elapsed time since start.
    pub elapsed: Duration,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopReason {
    /// Temperature fell below the floor.
    Frozen,
    /// Iteration budget exhausted.
    IterationLimit,
    /// Time limit exceeded.
    TimeLimit,
    /// Cancel handle was set.
    Cancelled,
}

/// Result of a SA run.
#[derive(Debug, Clone)]
pub struct SaResult {
    /// Cost of the starting state.
    pub initial_cost: f64,
    /// Best cost found; the problem is left in this state.
    pub best_cost: f64,
    /// Final temperature reached.
    pub final_temperature: f64,
    /// Total trials performed.
    pub iterations: u64,
    /// Candidates committed.
    pub accepted: u64,
    /// Valid candidates rolled back by the acceptance test.
    pub rejected: u64,
    /// Candidates rolled back because they were structurally invalid.
    pub invalid: u64,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Why the run stopped.
    pub stop_reason: StopReason,
    /// Committed cost sampled at each temperature change.
    pub history: Vec<f64>,
}

/// Metropolis acceptance test.
///
/// Non-worsening moves are always accepted. A worsening move is accepted
/// with probability `exp(-delta / temperature)`, and never at a temperature
/// of zero or below.
pub fn should_accept<R: Rng + ?Sized>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < (-delta / temperature).exp()
}

/// Simulated Annealing runner.
///
/// The runner owns the run's only random source, seeded once from
/// [`SaConfig::seed`] at construction.
pub struct SaRunner<P: SaProblem> {
    config: SaConfig,
    problem: P,
    rng: StdRng,
    cancelled: Arc<AtomicBool>,
}

impl<P: SaProblem> SaRunner<P> {
    /// Creates a new SA runner.
    pub fn new(config: SaConfig, problem: P) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            problem,
            rng,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an externally owned cancellation flag.
    pub fn with_cancel_handle(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Returns a handle to cancel the algorithm.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Returns the problem.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Consumes the runner and returns the problem.
    pub fn into_problem(self) -> P {
        self.problem
    }

    fn stop_reason(&self, start: &Instant, iteration: u64) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }
        if let Some(limit) = self.config.time_limit {
            if start.elapsed() > limit {
                return Some(StopReason::TimeLimit);
            }
        }
        if let Some(max) = self.config.max_iterations {
            if iteration >= max {
                return Some(StopReason::IterationLimit);
            }
        }
        None
    }

    /// Runs the Simulated Annealing algorithm.
    ///
    /// Stop conditions are checked between trials only, so the problem is
    /// never interrupted with a half-built candidate. On return the problem
    /// holds the best state seen.
    pub fn run(&mut self) -> SaResult {
        let start = Instant::now();
        let mut history = Vec::new();

        let initial_cost = self.problem.initial_cost();
        let mut current_cost = initial_cost;
        let mut best_cost = initial_cost;
        let mut best = self.problem.snapshot();
        let mut best_is_current = true;

        let mut temperature = self.config.initial_temp;
        let mut iteration = 0u64;
        let mut accepted = 0u64;
        let mut rejected = 0u64;
        let mut invalid = 0u64;

        let stop_reason = 'levels: loop {
            let mut level_accepted = 0usize;
            let mut level_trials = 0usize;

            for _ in 0..self.config.iterations_per_temp {
                if let Some(reason) = self.stop_reason(&start, iteration) {
                    break 'levels reason;
                }
                iteration += 1;
                level_trials += 1;

                let new_cost = match self.problem.propose(&mut self.rng) {
                    Ok(cost) => cost,
                    Err(e) => {
                        log::trace!("candidate {} rejected: {}", iteration, e);
                        self.problem.rollback();
                        invalid += 1;
                        continue;
                    }
                };

                if should_accept(new_cost - current_cost, temperature, &mut self.rng) {
                    if let Err(e) = self.problem.commit() {
                        log::warn!("candidate {} could not be committed: {}", iteration, e);
                        self.problem.rollback();
                        invalid += 1;
                        continue;
                    }
                    current_cost = new_cost;
                    accepted += 1;
                    level_accepted += 1;
                    best_is_current = false;

                    if current_cost < best_cost {
                        best_cost = current_cost;
                        best = self.problem.snapshot();
                        best_is_current = true;
                    }
                } else {
                    self.problem.rollback();
                    rejected += 1;
                }
            }

            history.push(current_cost);

            let progress = SaProgress {
                temperature,
                iteration,
                best_cost,
                current_cost,
                acceptance_rate: if level_trials > 0 {
                    level_accepted as f64 / level_trials as f64
                } else {
                    0.0
                },
                elapsed: start.elapsed(),
            };
            self.problem.on_temperature_change(&progress);

            // Cool down
            temperature *= self.config.cooling_rate;
            if temperature < self.config.final_temp {
                break StopReason::Frozen;
            }
        };

        if !best_is_current {
            self.problem.restore(best);
        }

        SaResult {
            initial_cost,
            best_cost,
            final_temperature: temperature,
            iterations: iteration,
            accepted,
            rejected,
            invalid,
            elapsed: start.elapsed(),
            stop_reason,
            history,
        }
    }
}
