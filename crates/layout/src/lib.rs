//! # tqec-pack Layout
//!
//! Module synthesis and 3D compaction for the tqec-pack engine.
//!
//! Loops become rigid [`Module`]s through the [`ModuleFactory`]. The
//! [`Compaction`] pipeline then relocates them with a sequence-triple
//! encoded simulated annealing search ([`Relocation`]).

pub mod compaction;
pub mod factory;
pub mod graph;
pub mod loops;
pub mod module;
pub mod relocation;
pub mod sequence_triple;

// Re-exports
pub use compaction::{Compaction, CompactionStage};
pub use factory::ModuleFactory;
pub use graph::{Edge, EdgeCategory, EdgeId, Node, NodeId, NodeKind};
pub use loops::{Loop, LoopType};
pub use module::Module;
pub use relocation::{placement_cost, seed_linear, Relocation};
pub use sequence_triple::{NeighborMove, Permutation, SequenceState, SequenceTriple};
pub use tqec_pack_core::{CompactionResult, Config, Error, Placement, Result, SaConfig};
