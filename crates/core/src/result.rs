//! Compaction result representation.

use crate::placement::{Placement, PlacementStats};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a single compaction stage did.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StageReport {
    /// Stage name.
    pub name: String,
    /// Cost before the stage ran (None for stages without a cost model).
    pub initial_cost: Option<f64>,
    /// Cost after the stage ran.
    pub final_cost: Option<f64>,
    /// Trials performed.
    pub iterations: u64,
    /// Candidates committed.
    pub accepted: u64,
    /// Valid candidates rolled back.
    pub rejected: u64,
    /// Structurally invalid candidates.
    pub invalid: u64,
    /// Committed cost at each temperature change.
    pub cost_history: Vec<f64>,
    /// Whether the stage stopped on its cancel handle.
    pub cancelled: bool,
    /// Stage wall-clock time in milliseconds.
    pub time_ms: u64,
}

impl StageReport {
    /// Creates an empty report for the named stage.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fraction of valid candidates that were committed.
    pub fn acceptance_rate(&self) -> f64 {
        let valid = self.accepted + self.rejected;
        if valid == 0 {
            0.0
        } else {
            self.accepted as f64 / valid as f64
        }
    }
}

/// Result of a compaction run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactionResult {
    /// Final placement of every module, in input order.
    pub placements: Vec<Placement>,

    /// Cost of the seeded layout.
    pub initial_cost: f64,

    /// Cost of the final layout.
    pub final_cost: f64,

    /// Total trials over every stage.
    pub iterations: u64,

    /// Candidates committed.
    pub accepted: u64,

    /// Valid candidates rolled back.
    pub rejected: u64,

    /// Structurally invalid candidates.
    pub invalid: u64,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,

    /// Relocation cost history over temperature levels.
    pub cost_history: Vec<f64>,

    /// Whether the run was cancelled early.
    pub cancelled: bool,

    /// Names of the stages that ran, in order.
    pub stages: Vec<String>,

    #[cfg_attr(feature = "serde", serde(skip))]
    costed: bool,
}

impl CompactionResult {
    /// Creates a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a stage report into the totals.
    pub fn record_stage(&mut self, report: StageReport) {
        if let Some(cost) = report.initial_cost {
            if !self.costed {
                self.initial_cost = cost;
                self.costed = true;
            }
        }
        if let Some(cost) = report.final_cost {
            self.final_cost = cost;
        }
        if !report.cost_history.is_empty() {
            self.cost_history = report.cost_history;
        }
        self.iterations += report.iterations;
        self.accepted += report.accepted;
        self.rejected += report.rejected;
        self.invalid += report.invalid;
        self.computation_time_ms += report.time_ms;
        self.cancelled |= report.cancelled;
        self.stages.push(report.name);
    }

    /// Returns the number of placed modules.
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    /// Returns true if the run completed without cancellation.
    pub fn completed_normally(&self) -> bool {
        !self.cancelled
    }

    /// Relative cost reduction against the seed (0.0 when the seed cost is zero).
    pub fn improvement(&self) -> f64 {
        if self.initial_cost.abs() > f64::EPSILON {
            (self.initial_cost - self.final_cost) / self.initial_cost.abs()
        } else {
            0.0
        }
    }

    /// Computes placement statistics.
    pub fn placement_stats(&self) -> PlacementStats {
        PlacementStats::from_placements(&self.placements)
    }
}

/// Summary statistics for a compaction result.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactionSummary {
    /// Modules placed.
    pub modules: usize,
    /// Rotated modules.
    pub rotated: usize,
    /// Seed cost.
    pub initial_cost: f64,
    /// Final cost.
    pub final_cost: f64,
    /// Improvement percentage.
    pub improvement_percent: f64,
    /// Enclosing box extents (width, height, depth).
    pub extents: [f64; 3],
    /// Occupied over enclosing volume, as a percentage.
    pub density_percent: f64,
    /// Total trials.
    pub iterations: u64,
    /// Computation time in milliseconds.
    pub time_ms: u64,
}

impl From<&CompactionResult> for CompactionSummary {
    fn from(result: &CompactionResult) -> Self {
        let stats = result.placement_stats();
        let extents = stats
            .enclosing
            .map(|b| [b.width(), b.height(), b.depth()])
            .unwrap_or([0.0; 3]);
        Self {
            modules: stats.count,
            rotated: stats.rotated_count,
            initial_cost: result.initial_cost,
            final_cost: result.final_cost,
            improvement_percent: result.improvement() * 100.0,
            extents,
            density_percent: stats.density() * 100.0,
            iterations: result.iterations,
            time_ms: result.computation_time_ms,
        }
    }
}
