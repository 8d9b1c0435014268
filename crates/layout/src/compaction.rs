//! Compaction pipeline.
//!
//! A [`Compaction`] runs an ordered list of stages over the module list.
//! The default pipeline holds a single [`Relocation`] stage; later physical
//! design steps plug in through [`CompactionStage`].

use crate::module::Module;
use crate::relocation::{Relocation, RELOCATION_STAGE};
use std::time::Instant;
use tqec_pack_core::config::Config;
use tqec_pack_core::result::{CompactionResult, StageReport};
use tqec_pack_core::{Error, Result};

/// One step of the compaction pipeline.
pub trait CompactionStage {
    /// Stage name used in reports.
    fn name(&self) -> &str;

    /// Transforms the modules in place.
    fn execute(&mut self, modules: &mut [Module]) -> Result<StageReport>;
}

impl CompactionStage for Relocation {
    fn name(&self) -> &str {
        RELOCATION_STAGE
    }

    fn execute(&mut self, modules: &mut [Module]) -> Result<StageReport> {
        self.run(modules)
    }
}

/// Ordered set of compaction stages.
pub struct Compaction {
    stages: Vec<Box<dyn CompactionStage>>,
}

impl Compaction {
    /// Creates the default pipeline: relocation only.
    pub fn new(config: Config) -> Self {
        Self::from_relocation(Relocation::new(config))
    }

    /// Creates a pipeline around a preconfigured relocation stage.
    pub fn from_relocation(relocation: Relocation) -> Self {
        Self {
            stages: vec![Box::new(relocation)],
        }
    }

    /// Creates a pipeline with no stages.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage.
    pub fn with_stage(mut self, stage: Box<dyn CompactionStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Names of the stages, in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage in order and collects the final placements.
    pub fn execute(&mut self, modules: &mut [Module]) -> Result<CompactionResult> {
        if modules.is_empty() {
            return Err(Error::MalformedInput("no modules to compact".to_string()));
        }

        let start = Instant::now();
        let mut result = CompactionResult::new();
        for stage in &mut self.stages {
            log::info!("Compaction stage '{}' starting", stage.name());
            let report = stage.execute(modules)?;
            log::info!(
                "Compaction stage '{}' done in {} ms",
                report.name,
                report.time_ms
            );
            let cancelled = report.cancelled;
            result.record_stage(report);
            if cancelled {
                log::warn!("Compaction cancelled; skipping remaining stages");
                break;
            }
        }

        result.placements = modules.iter().map(|m| m.placement()).collect();
        result.computation_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
