// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerance-based geometric predicates for the boolean kernel
//!
//! Planes, signed distances, ray casts against triangles and the
//! plane-plane line solve. Every predicate takes the tolerance explicitly.

use nalgebra::{Matrix3, Point3, Vector3};
use std::cmp::Ordering;

/// Plane `normal · x = dist_root`; a zero normal marks a degenerate source
/// triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub dist_root: f64,
}

impl Plane {
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.dist_root
    }

    /// No reliable plane could be built
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vector3::zeros()
    }
}

/// Plane of a triangle from the cross product of two edges
pub fn plane_of(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Plane {
    let cross = (p1 - p0).cross(&(p2 - p0));
    match cross.try_normalize(f64::MIN_POSITIVE) {
        Some(normal) => Plane {
            normal,
            dist_root: normal.dot(&p0.coords),
        },
        None => Plane {
            normal: Vector3::zeros(),
            dist_root: 0.0,
        },
    }
}

/// Bucket a signed value into -1, 0 or +1
#[inline]
pub fn sign_of(value: f64, eps: f64) -> i8 {
    if value > eps {
        1
    } else if value < -eps {
        -1
    } else {
        0
    }
}

/// Outcome of a ray-triangle test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    Miss,
    /// Parametric distance along the ray
    Hit(f64),
    /// The ray runs inside the triangle's plane
    Ambiguous,
}

/// Cast a ray against a triangle with a precomputed plane. Hits behind the
/// origin are reported; callers filter on the sign of the distance.
pub fn ray_triangle_distance(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    triangle: [&Point3<f64>; 3],
    plane: &Plane,
    eps: f64,
) -> RayHit {
    if plane.is_degenerate() {
        return RayHit::Miss;
    }

    let denom = plane.normal.dot(dir);
    let offset = -plane.signed_distance(origin);
    if denom.abs() < eps {
        return if offset.abs() < eps {
            RayHit::Ambiguous
        } else {
            RayHit::Miss
        };
    }

    let t = offset / denom;
    let hit = origin + dir * t;
    if point_in_triangle(&hit, triangle[0], triangle[1], triangle[2], eps) {
        RayHit::Hit(t)
    } else {
        RayHit::Miss
    }
}

/// Barycentric containment test; points on the border count as inside
pub fn point_in_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    eps: f64,
) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < f64::MIN_POSITIVE {
        return false;
    }

    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;

    u >= -eps && v >= -eps && u + v <= 1.0 + eps
}

/// A point common to both planes, picked as the one whose projection on
/// `line_dir` is zero. `None` when the planes are parallel.
pub fn solve_plane_plane_line(
    a: &Plane,
    b: &Plane,
    line_dir: &Vector3<f64>,
) -> Option<Point3<f64>> {
    let system = Matrix3::from_rows(&[
        a.normal.transpose(),
        b.normal.transpose(),
        line_dir.transpose(),
    ]);
    let rhs = Vector3::new(a.dist_root, b.dist_root, 0.0);
    system.lu().solve(&rhs).map(Point3::from)
}

/// Lexicographic order on coordinates
pub fn lex_cmp(a: &Point3<f64>, b: &Point3<f64>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

/// Where segment `p`-`q` crosses a plane, given the endpoint distances to
/// it. Endpoints are ordered first so both faces sharing the edge compute
/// the identical point.
pub fn edge_plane_point(p: &Point3<f64>, q: &Point3<f64>, dp: f64, dq: f64) -> Point3<f64> {
    let (p, q, dp, dq) = if lex_cmp(p, q) == Ordering::Greater {
        (q, p, dq, dp)
    } else {
        (p, q, dp, dq)
    };
    let t = dp / (dp - dq);
    p + (q - p) * t
}

/// Distance from `p` to segment `a`-`b` and the clamped parameter of the
/// closest point
pub fn distance_to_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> (f64, f64) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return ((p - a).norm(), 0.0);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    ((a + ab * t - p).norm(), t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-10;

    fn unit_triangle() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_plane_of() {
        let [a, b, c] = unit_triangle();
        let plane = plane_of(&a, &b, &c);
        assert_eq!(plane.normal, Vector3::z());
        assert_eq!(plane.dist_root, 0.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(3.0, 3.0, 2.0)), 2.0);

        let degenerate = plane_of(&a, &b, &Point3::new(2.0, 0.0, 0.0));
        assert!(degenerate.is_degenerate());
    }

    #[test]
    fn test_sign_of() {
        assert_eq!(sign_of(1e-3, EPS), 1);
        assert_eq!(sign_of(-1e-3, EPS), -1);
        assert_eq!(sign_of(1e-12, EPS), 0);
    }

    #[test]
    fn test_ray_triangle_outcomes() {
        let [a, b, c] = unit_triangle();
        let plane = plane_of(&a, &b, &c);
        let tri = [&a, &b, &c];

        let origin = Point3::new(0.25, 0.25, 2.0);
        assert_eq!(
            ray_triangle_distance(&origin, &-Vector3::z(), tri, &plane, EPS),
            RayHit::Hit(2.0)
        );
        assert_eq!(
            ray_triangle_distance(&origin, &Vector3::z(), tri, &plane, EPS),
            RayHit::Hit(-2.0)
        );

        let outside = Point3::new(2.0, 2.0, 2.0);
        assert_eq!(
            ray_triangle_distance(&outside, &-Vector3::z(), tri, &plane, EPS),
            RayHit::Miss
        );

        let in_plane = Point3::new(-1.0, 0.25, 0.0);
        assert_eq!(
            ray_triangle_distance(&in_plane, &Vector3::x(), tri, &plane, EPS),
            RayHit::Ambiguous
        );
        let above = Point3::new(-1.0, 0.25, 1.0);
        assert_eq!(
            ray_triangle_distance(&above, &Vector3::x(), tri, &plane, EPS),
            RayHit::Miss
        );
    }

    #[test]
    fn test_point_in_triangle_border() {
        let [a, b, c] = unit_triangle();
        assert!(point_in_triangle(&Point3::new(0.5, 0.0, 0.0), &a, &b, &c, EPS));
        assert!(point_in_triangle(&Point3::new(0.5, 0.5, 0.0), &a, &b, &c, EPS));
        assert!(!point_in_triangle(&Point3::new(0.6, 0.6, 0.0), &a, &b, &c, EPS));
    }

    #[test]
    fn test_plane_plane_line() {
        let xy = Plane {
            normal: Vector3::z(),
            dist_root: 1.0,
        };
        let xz = Plane {
            normal: Vector3::y(),
            dist_root: 2.0,
        };
        let dir = Vector3::z().cross(&Vector3::y());
        let root = solve_plane_plane_line(&xy, &xz, &dir).unwrap();
        assert_relative_eq!(root, Point3::new(0.0, 2.0, 1.0), epsilon = 1e-12);

        assert!(solve_plane_plane_line(&xy, &xy, &Vector3::zeros()).is_none());
    }

    #[test]
    fn test_edge_plane_point_is_order_independent() {
        let p = Point3::new(0.1, 0.7, -0.3);
        let q = Point3::new(0.9, -0.2, 0.4);
        let plane = Plane {
            normal: Vector3::new(1.0, 1.0, 1.0).normalize(),
            dist_root: 0.33,
        };
        let (dp, dq) = (plane.signed_distance(&p), plane.signed_distance(&q));
        let forward = edge_plane_point(&p, &q, dp, dq);
        let backward = edge_plane_point(&q, &p, dq, dp);
        assert_eq!(forward, backward);
        assert!(plane.signed_distance(&forward).abs() < 1e-12);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let (d, t) = distance_to_segment(&Point3::new(1.0, 1.0, 0.0), &a, &b);
        assert_relative_eq!(d, 1.0);
        assert_relative_eq!(t, 0.5);
        let (d, t) = distance_to_segment(&Point3::new(3.0, 0.0, 0.0), &a, &b);
        assert_relative_eq!(d, 1.0);
        assert_eq!(t, 1.0);
    }
}
