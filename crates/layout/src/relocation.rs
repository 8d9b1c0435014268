//! Simulated Annealing relocation of modules.
//!
//! Modules are first chained along Z from the origin. The chain is encoded
//! as a sequence-triple, which the annealer then perturbs with Swap, Shift
//! and Rotate moves. Each candidate is reconstructed into coordinates,
//! optionally re-validated for overlap, and scored by the half-span of all
//! node positions. The best layout seen is written back into the modules.

use crate::module::Module;
use crate::sequence_triple::{NeighborMove, SequenceState, SequenceTriple};
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tqec_pack_core::config::{Config, ProgressCallback, ProgressInfo};
use tqec_pack_core::geometry::Point3;
use tqec_pack_core::result::StageReport;
use tqec_pack_core::sa::{SaProblem, SaProgress, SaRunner, StopReason};
use tqec_pack_core::transform::AABB3D;
use tqec_pack_core::{Error, Result};

/// Stage name reported by [`Relocation`].
pub const RELOCATION_STAGE: &str = "relocation";

/// Places modules end to end along Z, the first at the origin.
pub fn seed_linear(modules: &mut [Module]) {
    let mut z = 0.0;
    for module in modules.iter_mut() {
        module.set_pos(Point3::new(0.0, 0.0, z), true);
        z += module.depth();
    }
}

fn node_bounds(module: &Module) -> Option<AABB3D<f64>> {
    AABB3D::from_points(module.positions(), 0.0)
}

fn merge(a: Option<AABB3D<f64>>, b: Option<AABB3D<f64>>) -> Option<AABB3D<f64>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Cost of a layout: `Σ_axis ((max - min) / 2 - 1)` over every frame and
/// cross node of every module.
///
/// From `parallel_threshold` modules on, the min/max reduction runs on the
/// rayon pool.
pub fn placement_cost(modules: &[Module], parallel_threshold: usize) -> f64 {
    let span = if modules.len() >= parallel_threshold {
        modules.par_iter().map(node_bounds).reduce(|| None, merge)
    } else {
        modules.iter().map(node_bounds).fold(None, merge)
    };

    match span {
        Some(b) => b.size().iter().map(|extent| extent / 2.0 - 1.0).sum(),
        None => 0.0,
    }
}

/// Returns the first pair of modules whose boxes overlap.
pub fn find_overlap(modules: &[Module]) -> Option<(usize, usize)> {
    for i in 0..modules.len() {
        for j in (i + 1)..modules.len() {
            if modules[i].overlaps(&modules[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

/// SA problem definition for module relocation.
struct RelocationProblem<'a> {
    triple: SequenceTriple,
    /// Committed layout.
    modules: Vec<Module>,
    /// Layout of the pending candidate.
    candidate: Option<Vec<Module>>,
    last_move: Option<NeighborMove>,
    config: &'a Config,
    progress: Option<&'a ProgressCallback>,
}

impl<'a> RelocationProblem<'a> {
    fn cost(&self, modules: &[Module]) -> f64 {
        placement_cost(modules, self.config.parallel_cost_threshold)
    }
}

impl SaProblem for RelocationProblem<'_> {
    type Snapshot = (SequenceState, Vec<Module>);

    fn initial_cost(&mut self) -> f64 {
        self.cost(&self.modules)
    }

    fn propose(&mut self, rng: &mut StdRng) -> Result<f64> {
        let mv = self.triple.create_neighborhood(&self.modules, rng)?;
        self.last_move = Some(mv);

        let placed = self.triple.recalculate_coordinate(&self.modules)?;
        if self.config.validate_candidates {
            if let Some((i, j)) = find_overlap(&placed) {
                return Err(Error::InfeasiblePlacement(format!(
                    "modules {} and {} overlap after {}",
                    placed[i].id(),
                    placed[j].id(),
                    mv
                )));
            }
        }

        let cost = self.cost(&placed);
        self.candidate = Some(placed);
        Ok(cost)
    }

    fn commit(&mut self) -> Result<()> {
        let candidate = self.candidate.take().ok_or_else(|| {
            Error::InfeasiblePlacement("no candidate to commit".to_string())
        })?;
        self.triple.apply(&mut self.modules, &candidate)?;
        if let Some(mv) = self.last_move.take() {
            log::trace!("committed {}", mv);
        }
        Ok(())
    }

    fn rollback(&mut self) {
        self.candidate = None;
        self.last_move = None;
        self.triple.recover();
    }

    fn snapshot(&self) -> Self::Snapshot {
        (self.triple.snapshot(), self.modules.clone())
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        let (state, modules) = snapshot;
        self.triple.restore(state);
        self.modules = modules;
        self.candidate = None;
    }

    fn on_temperature_change(&mut self, progress: &SaProgress) {
        log::debug!(
            "Relocation iteration {}: temp={:.4}, current={:.2}, best={:.2}, acceptance={:.2}",
            progress.iteration,
            progress.temperature,
            progress.current_cost,
            progress.best_cost,
            progress.acceptance_rate
        );
        if let Some(callback) = self.progress {
            callback(ProgressInfo::from(progress));
        }
    }
}

/// Simulated Annealing relocation stage.
pub struct Relocation {
    config: Config,
    progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
}

impl Relocation {
    /// Creates a new relocation stage with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a relocation stage with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Sets a callback invoked at every temperature change.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a handle that stops a running relocation between trials.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Cost of `modules` under this stage's configuration.
    pub fn cost(&self, modules: &[Module]) -> f64 {
        placement_cost(modules, self.config.parallel_cost_threshold)
    }

    /// Seeds, anneals and writes the best layout back into `modules`.
    pub fn run(&self, modules: &mut [Module]) -> Result<StageReport> {
        self.config.validate()?;
        let start = Instant::now();

        seed_linear(modules);
        let triple = SequenceTriple::new(modules)?;
        log::info!(
            "Relocating {} modules (seed cost {:.2})",
            modules.len(),
            self.cost(modules)
        );

        let problem = RelocationProblem {
            triple,
            modules: modules.to_vec(),
            candidate: None,
            last_move: None,
            config: &self.config,
            progress: self.progress.as_ref(),
        };

        let mut runner =
            SaRunner::new(self.config.sa.clone(), problem).with_cancel_handle(self.cancelled.clone());
        let result = runner.run();
        let problem = runner.into_problem();
        modules.clone_from_slice(&problem.modules);

        let cancelled = result.stop_reason == StopReason::Cancelled
            || self.cancelled.load(Ordering::Relaxed);
        if let Some(callback) = &self.progress {
            callback(ProgressInfo {
                temperature: result.final_temperature,
                iteration: result.iterations,
                best_cost: result.best_cost,
                current_cost: result.best_cost,
                acceptance_rate: 0.0,
                elapsed_ms: result.elapsed.as_millis() as u64,
                running: false,
            });
        }

        log::info!(
            "Relocation finished: cost {:.2} -> {:.2} after {} trials ({} accepted, {} invalid, {:?})",
            result.initial_cost,
            result.best_cost,
            result.iterations,
            result.accepted,
            result.invalid,
            result.stop_reason
        );

        Ok(StageReport {
            name: RELOCATION_STAGE.to_string(),
            initial_cost: Some(result.initial_cost),
            final_cost: Some(result.best_cost),
            iterations: result.iterations,
            accepted: result.accepted,
            rejected: result.rejected,
            invalid: result.invalid,
            cost_history: result.history,
            cancelled,
            time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ModuleFactory;
    use crate::loops::{Loop, LoopType};
    use approx::assert_relative_eq;
    use std::sync::Mutex;
    use tqec_pack_core::sa::SaConfig;

    fn modules(count: i64) -> Vec<Module> {
        let factory = ModuleFactory::new();
        (0..count)
            .map(|i| {
                let l = Loop::new(i, LoopType::Primal)
                    .with_pins((i % 3) as u32)
                    .with_caps((i % 2) as u32);
                factory.create(&l)
            })
            .collect()
    }

    fn quick_config(seed: u64) -> Config {
        Config::default().with_sa(
            SaConfig::default()
                .with_initial_temp(10.0)
                .with_final_temp(0.5)
                .with_cooling_rate(0.8)
                .with_iterations_per_temp(50)
                .with_seed(seed),
        )
    }

    #[test]
    fn test_single_module_cost() {
        let mut ms = modules(1);
        seed_linear(&mut ms);
        assert_eq!(ms[0].pos(), &Point3::origin());
        assert_relative_eq!(placement_cost(&ms, usize::MAX), -1.0);
    }

    #[test]
    fn test_parallel_cost_matches_sequential() {
        let mut ms = modules(12);
        seed_linear(&mut ms);
        assert_relative_eq!(placement_cost(&ms, 1), placement_cost(&ms, usize::MAX));
    }

    #[test]
    fn test_seed_chain_has_no_overlap() {
        let mut ms = modules(5);
        seed_linear(&mut ms);
        assert!(find_overlap(&ms).is_none());
        for pair in ms.windows(2) {
            assert_relative_eq!(pair[1].pos().z, pair[0].pos().z + pair[0].depth());
        }
    }

    #[test]
    fn test_relocation_never_worse_than_seed() {
        let mut ms = modules(6);
        let relocation = Relocation::new(quick_config(17).with_candidate_validation(true));
        let report = relocation.run(&mut ms).unwrap();

        let initial = report.initial_cost.unwrap();
        let best = report.final_cost.unwrap();
        assert!(best <= initial);
        assert_relative_eq!(relocation.cost(&ms), best);
        assert!(find_overlap(&ms).is_none());
        assert_eq!(report.name, RELOCATION_STAGE);
        assert_eq!(
            report.iterations,
            report.accepted + report.rejected + report.invalid
        );
    }

    #[test]
    fn test_relocation_is_deterministic() {
        let mut a = modules(5);
        let mut b = modules(5);
        let ra = Relocation::new(quick_config(99)).run(&mut a).unwrap();
        let rb = Relocation::new(quick_config(99)).run(&mut b).unwrap();

        assert_eq!(ra.cost_history, rb.cost_history);
        for (ma, mb) in a.iter().zip(&b) {
            assert_eq!(ma.pos(), mb.pos());
            assert_eq!(ma.rotation(), mb.rotation());
        }
    }

    #[test]
    fn test_cancelled_relocation_keeps_seed() {
        let mut ms = modules(4);
        let relocation = Relocation::new(quick_config(1));
        relocation.cancel_handle().store(true, Ordering::Relaxed);
        let report = relocation.run(&mut ms).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.initial_cost, report.final_cost);
        assert_eq!(ms[0].pos(), &Point3::origin());
    }

    #[test]
    fn test_progress_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let relocation = Relocation::new(quick_config(4)).with_progress(Box::new(move |info: ProgressInfo| {
            if let Ok(mut v) = sink.lock() {
                v.push(info.running);
            }
        }));
        let mut ms = modules(3);
        relocation.run(&mut ms).unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.len() > 1);
        assert_eq!(seen.last(), Some(&false));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let relocation = Relocation::default_config();
        assert!(matches!(
            relocation.run(&mut []),
            Err(Error::MalformedInput(_))
        ));
    }
}
