//! Placement representation for positioned modules.

use crate::geometry::{Point3, RotationState, Vector3};
use crate::transform::AABB3D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a placed module (the id of the loop it was built from).
pub type ModuleId = i64;

/// Final position of one module.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// The ID of the placed module.
    pub module_id: ModuleId,

    /// Minimum corner of the module's bounding box.
    pub position: Point3,

    /// Extents of the module's bounding box.
    pub size: Vector3,

    /// Quarter turns applied to the module.
    pub rotation: RotationState,
}

impl Placement {
    /// Creates a new unrotated placement.
    pub fn new(module_id: ModuleId, position: Point3, size: Vector3) -> Self {
        Self {
            module_id,
            position,
            size,
            rotation: RotationState::identity(),
        }
    }

    /// Sets the rotation state.
    pub fn with_rotation(mut self, rotation: RotationState) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns the bounding box occupied by this placement.
    pub fn bounds(&self) -> AABB3D<f64> {
        AABB3D::from_corner(&self.position, &self.size)
    }

    /// Returns the volume of the bounding box.
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }

    /// Returns true if any quarter turn was applied.
    pub fn is_rotated(&self) -> bool {
        !self.rotation.is_identity()
    }
}

/// Placement statistics for a set of placements.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementStats {
    /// Total number of placements.
    pub count: usize,
    /// Number of rotated placements.
    pub rotated_count: usize,
    /// Box enclosing every placement (None when empty).
    pub enclosing: Option<AABB3D<f64>>,
    /// Sum of the module box volumes.
    pub occupied_volume: f64,
}

impl PlacementStats {
    /// Computes statistics from a set of placements.
    pub fn from_placements(placements: &[Placement]) -> Self {
        let mut stats = Self {
            count: placements.len(),
            ..Default::default()
        };

        for p in placements {
            if p.is_rotated() {
                stats.rotated_count += 1;
            }
            stats.occupied_volume += p.volume();

            let bounds = p.bounds();
            stats.enclosing = Some(match stats.enclosing {
                Some(acc) => acc.union(&bounds),
                None => bounds,
            });
        }

        stats
    }

    /// Volume of the enclosing box.
    pub fn enclosing_volume(&self) -> f64 {
        self.enclosing.map(|b| b.volume()).unwrap_or(0.0)
    }

    /// Occupied volume divided by enclosing volume (0.0 - 1.0).
    pub fn density(&self) -> f64 {
        let enclosing = self.enclosing_volume();
        if enclosing > 0.0 {
            self.occupied_volume / enclosing
        } else {
            0.0
        }
    }
}
