//! Geometry primitives shared by the layout crate.
//!
//! Coordinates are plain `f64` nalgebra points. Module geometry lives on an
//! integer lattice, so every operation here is exact for the values the
//! factory and the placer produce.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A position in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A displacement or extent in 3D space.
pub type Vector3 = nalgebra::Vector3<f64>;

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Width direction.
    X,
    /// Height direction.
    Y,
    /// Depth direction.
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns the component index of this axis (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Returns the axis for a component index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the component that a quarter turn about this axis moves away
    /// from its original lattice line. The rotation validity gate compares
    /// the parity of this component before and after the turn.
    pub fn parity_component(self) -> usize {
        match self {
            Axis::X => 1,
            Axis::Y | Axis::Z => 0,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Manhattan (L1) distance between positions.
pub trait ManhattanDistance {
    /// Returns `|dx| + |dy| + |dz|`.
    fn dist(&self, other: &Self) -> f64;
}

impl ManhattanDistance for Point3 {
    fn dist(&self, other: &Self) -> f64 {
        manhattan(self, other)
    }
}

/// Manhattan distance between two points.
pub fn manhattan(a: &Point3, b: &Point3) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
}

/// Rotates a vector by +90° about the given axis.
///
/// - X: `(x, y, z) -> (x, -z, y)`
/// - Y: `(x, y, z) -> (z, y, -x)`
/// - Z: `(x, y, z) -> (-y, x, z)`
pub fn quarter_turn(axis: Axis, v: &Vector3) -> Vector3 {
    match axis {
        Axis::X => Vector3::new(v.x, -v.z, v.y),
        Axis::Y => Vector3::new(v.z, v.y, -v.x),
        Axis::Z => Vector3::new(-v.y, v.x, v.z),
    }
}

/// Returns true if the integer part of `value` is odd.
pub fn is_odd(value: f64) -> bool {
    (value.trunc() as i64) % 2 != 0
}

/// Accumulated quarter turns of a module, counted per axis modulo 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotationState {
    turns: [u8; 3],
}

impl RotationState {
    /// Creates the unrotated state.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Records one quarter turn about `axis`.
    pub fn turn(&mut self, axis: Axis) {
        let t = &mut self.turns[axis.index()];
        *t = (*t + 1) % 4;
    }

    /// Returns the quarter-turn count about `axis`.
    pub fn turns(&self, axis: Axis) -> u8 {
        self.turns[axis.index()]
    }

    /// Returns true if no net rotation has been recorded.
    pub fn is_identity(&self) -> bool {
        self.turns == [0, 0, 0]
    }
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}]",
            self.turns[0], self.turns[1], self.turns[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_manhattan() {
        let a = Point3::new(1.0, -2.0, 3.0);
        let b = Point3::new(-1.0, 2.0, 0.0);
        assert_relative_eq!(a.dist(&b), 9.0);
        assert_relative_eq!(manhattan(&a, &a), 0.0);
    }

    #[test]
    fn test_quarter_turn_mappings() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(quarter_turn(Axis::X, &v), Vector3::new(1.0, -3.0, 2.0));
        assert_eq!(quarter_turn(Axis::Y, &v), Vector3::new(3.0, 2.0, -1.0));
        assert_eq!(quarter_turn(Axis::Z, &v), Vector3::new(-2.0, 1.0, 3.0));
    }

    #[test]
    fn test_four_quarter_turns_is_identity() {
        let v = Vector3::new(1.0, -4.0, 7.0);
        for axis in Axis::ALL {
            let mut w = v;
            for _ in 0..4 {
                w = quarter_turn(axis, &w);
            }
            assert_eq!(w, v);
        }
    }

    #[test]
    fn test_is_odd_truncates() {
        assert!(is_odd(3.0));
        assert!(is_odd(-1.0));
        assert!(is_odd(1.5));
        assert!(!is_odd(-2.0));
        assert!(!is_odd(0.9));
    }

    #[test]
    fn test_rotation_state() {
        let mut r = RotationState::identity();
        assert!(r.is_identity());
        r.turn(Axis::Y);
        r.turn(Axis::Y);
        assert_eq!(r.turns(Axis::Y), 2);
        r.turn(Axis::Y);
        r.turn(Axis::Y);
        assert!(r.is_identity());
        assert_eq!(Axis::from_index(2), Some(Axis::Z));
        assert_eq!(Axis::from_index(3), None);
    }
}
