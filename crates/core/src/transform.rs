//! Axis-aligned bounding boxes for module geometry.

use crate::geometry::Axis;
use nalgebra::{Point3, RealField, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB3D<S> {
    /// Minimum x coordinate.
    pub min_x: S,
    /// Minimum y coordinate.
    pub min_y: S,
    /// Minimum z coordinate.
    pub min_z: S,
    /// Maximum x coordinate.
    pub max_x: S,
    /// Maximum y coordinate.
    pub max_y: S,
    /// Maximum z coordinate.
    pub max_z: S,
}

impl<S: RealField + Copy> AABB3D<S> {
    /// Creates a new AABB from min/max coordinates.
    pub fn new(min_x: S, min_y: S, min_z: S, max_x: S, max_y: S, max_z: S) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    /// Creates an AABB from its minimum corner and extents.
    pub fn from_corner(corner: &Point3<S>, size: &Vector3<S>) -> Self {
        Self::new(
            corner.x,
            corner.y,
            corner.z,
            corner.x + size.x,
            corner.y + size.y,
            corner.z + size.z,
        )
    }

    /// Creates an AABB from a set of points, each inflated by `margin`.
    ///
    /// Returns `None` when the iterator is empty.
    pub fn from_points<'a, I>(points: I, margin: S) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<S>>,
        S: 'a,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first.x, first.y, first.z, first.x, first.y, first.z);
        for p in iter {
            aabb.include_point(p);
        }
        Some(aabb.expand(margin))
    }

    /// Grows the box to contain `p`.
    pub fn include_point(&mut self, p: &Point3<S>) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.min_z = self.min_z.min(p.z);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
        self.max_z = self.max_z.max(p.z);
    }

    /// Returns the width (x dimension) of the AABB.
    pub fn width(&self) -> S {
        self.max_x - self.min_x
    }

    /// Returns the height (y dimension) of the AABB.
    pub fn height(&self) -> S {
        self.max_y - self.min_y
    }

    /// Returns the depth (z dimension) of the AABB.
    pub fn depth(&self) -> S {
        self.max_z - self.min_z
    }

    /// Returns the extent along `axis`.
    pub fn extent(&self, axis: Axis) -> S {
        match axis {
            Axis::X => self.width(),
            Axis::Y => self.height(),
            Axis::Z => self.depth(),
        }
    }

    /// Returns the minimum corner.
    pub fn min_corner(&self) -> Point3<S> {
        Point3::new(self.min_x, self.min_y, self.min_z)
    }

    /// Returns the extents as a vector.
    pub fn size(&self) -> Vector3<S> {
        Vector3::new(self.width(), self.height(), self.depth())
    }

    /// Returns the volume of the AABB.
    pub fn volume(&self) -> S {
        self.width() * self.height() * self.depth()
    }

    /// Returns the center point of the AABB.
    pub fn center(&self) -> Point3<S> {
        let two = S::one() + S::one();
        Point3::new(
            (self.min_x + self.max_x) / two,
            (self.min_y + self.max_y) / two,
            (self.min_z + self.max_z) / two,
        )
    }

    /// Checks if this AABB contains a point.
    pub fn contains_point(&self, p: &Point3<S>) -> bool {
        p.x >= self.min_x
            && p.x <= self.max_x
            && p.y >= self.min_y
            && p.y <= self.max_y
            && p.z >= self.min_z
            && p.z <= self.max_z
    }

    /// Checks if the intersection with another AABB has positive volume.
    ///
    /// Boxes that only share a face, edge or corner do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
            && self.min_z < other.max_z
            && self.max_z > other.min_z
    }

    /// Returns the union (bounding box) of two AABBs.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            min_z: self.min_z.min(other.min_z),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Expands the AABB by a margin on all sides.
    pub fn expand(&self, margin: S) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            min_z: self.min_z - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
            max_z: self.max_z + margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb3d_volume() {
        let aabb = AABB3D::new(0.0, 0.0, 0.0, 10.0, 20.0, 30.0);
        assert_relative_eq!(aabb.volume(), 6000.0);
        assert_relative_eq!(aabb.extent(Axis::Y), 20.0);
    }

    #[test]
    fn test_from_points_with_margin() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 4.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let aabb = AABB3D::from_points(&points, 1.0).unwrap();
        assert_relative_eq!(aabb.min_x, -1.0);
        assert_relative_eq!(aabb.max_y, 3.0);
        assert_relative_eq!(aabb.depth(), 6.0);

        let empty: Vec<Point3<f64>> = Vec::new();
        assert!(AABB3D::from_points(&empty, 1.0).is_none());
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = AABB3D::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0);
        let b = AABB3D::new(2.0, 0.0, 0.0, 4.0, 2.0, 2.0);
        assert!(!a.overlaps(&b));

        let c = AABB3D::new(1.0, 1.0, 1.0, 3.0, 3.0, 3.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_corner_and_center() {
        let aabb = AABB3D::from_corner(&Point3::new(-1.0, -1.0, -1.0), &Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.min_corner(), Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.center(), Point3::new(0.0, 1.0, 2.0));
        assert!(aabb.contains_point(&Point3::new(1.0, 3.0, 5.0)));
    }
}
