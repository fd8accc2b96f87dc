// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding box utilities

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(point);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Overlap test; boxes separated by no more than `tol` on every axis
    /// still count as overlapping
    pub fn intersects(&self, other: &BoundingBox, tol: f64) -> bool {
        (0..3).all(|axis| {
            self.min[axis] <= other.max[axis] + tol && other.min[axis] <= self.max[axis] + tol
        })
    }

    pub fn contains_point(&self, point: &Point3<f64>, tol: f64) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] - tol && point[axis] <= self.max[axis] + tol)
    }

    /// Slab test; returns the entry distance along `dir`, zero when `origin`
    /// is already inside, or `None` on a miss. Components of `dir` smaller
    /// than `tol` are treated as parallel to that slab.
    pub fn ray_distance(&self, origin: &Point3<f64>, dir: &Vector3<f64>, tol: f64) -> Option<f64> {
        let mut t_enter = 0.0_f64;
        let mut t_exit = f64::INFINITY;

        for axis in 0..3 {
            let lo = self.min[axis] - tol;
            let hi = self.max[axis] + tol;
            if dir[axis].abs() < tol {
                if origin[axis] < lo || origin[axis] > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir[axis];
            let mut t0 = (lo - origin[axis]) * inv;
            let mut t1 = (hi - origin[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(t_enter)
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            (self.min[axis] - other.min[axis]).abs() < tolerance
                && (self.max[axis] - other.max[axis]).abs() < tolerance
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        bbox.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
        bbox.expand_to_include(&Point3::new(-1.0, -2.0, -3.0));

        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.volume(), 48.0);
    }

    #[test]
    fn test_intersects_with_slack() {
        let a = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let touching = BoundingBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let apart = BoundingBox::new(Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));

        assert!(a.intersects(&touching, 1e-10));
        assert!(!a.intersects(&apart, 1e-10));
        assert!(a.intersects(&apart, 0.6));
    }

    #[test]
    fn test_ray_distance() {
        let bbox = BoundingBox::new(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0));
        let origin = Point3::new(0.0, 0.5, 0.5);

        let hit = bbox.ray_distance(&origin, &Vector3::x(), 1e-10);
        assert!((hit.unwrap() - 2.0).abs() < 1e-9);

        assert!(bbox.ray_distance(&origin, &-Vector3::x(), 1e-10).is_none());
        assert!(bbox.ray_distance(&origin, &Vector3::y(), 1e-10).is_none());

        let inside = Point3::new(2.5, 0.5, 0.5);
        assert_eq!(bbox.ray_distance(&inside, &Vector3::z(), 1e-10), Some(0.0));
    }
}
