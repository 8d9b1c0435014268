//! # tqec-pack Core
//!
//! Core types and abstractions for the tqec-pack module compaction engine.
//!
//! This crate provides the foundational pieces shared by the layout engine
//! and the command line tool.
//!
//! ## Core Components
//!
//! - **Geometry**: `Point3`, `Vector3`, `Axis`, Manhattan distance, quarter turns
//! - **Bounding boxes**: `AABB3D`
//! - **SA framework**: commit/rollback simulated annealing with best-state tracking
//! - **Results**: `Placement`, `CompactionResult`, `StageReport`
//! - **Configuration**: `Config`, `SaConfig`, progress reporting
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod result;
pub mod sa;
pub mod transform;

// Re-exports
pub use config::{Config, ProgressCallback, ProgressInfo};
pub use error::{Error, Result};
pub use geometry::{
    is_odd, manhattan, quarter_turn, Axis, ManhattanDistance, Point3, RotationState, Vector3,
};
pub use placement::{ModuleId, Placement, PlacementStats};
pub use result::{CompactionResult, CompactionSummary, StageReport};
pub use sa::{should_accept, SaConfig, SaProblem, SaProgress, SaResult, SaRunner, StopReason};
pub use transform::AABB3D;
