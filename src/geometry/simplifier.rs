// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Post-boolean seam simplification

use super::{Mesh, Triangle};
use crate::error::{CsgError, Result};
use ahash::AHashMap;

/// Cleans up an assembled boolean result. `candidates` lists edges whose
/// endpoints both lie on the seam between the operands.
///
/// A failing simplifier leaves the caller's result untouched, so
/// implementations may bail out halfway through.
pub trait Simplifier: Send + Sync {
    fn simplify(&self, mesh: &mut Mesh, candidates: &[[usize; 2]]) -> Result<()>;
}

/// Collapses seam edges shorter than `tolerance`, dropping the faces that
/// degenerate and keeping the crease smoothness of the edges that survive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeamWelder {
    pub tolerance: f64,
}

impl SeamWelder {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

fn find(parent: &mut [usize], mut v: usize) -> usize {
    while parent[v] != v {
        parent[v] = parent[parent[v]];
        v = parent[v];
    }
    v
}

impl Simplifier for SeamWelder {
    fn simplify(&self, mesh: &mut Mesh, candidates: &[[usize; 2]]) -> Result<()> {
        let count = mesh.vertex_count();
        let mut parent: Vec<usize> = (0..count).collect();
        let mut merged = 0;

        for &[a, b] in candidates {
            if a >= count || b >= count {
                return Err(CsgError::Simplify(format!(
                    "seam edge ({a}, {b}) outside a mesh of {count} vertices"
                )));
            }
            let length = (mesh.vertices[a].position - mesh.vertices[b].position).norm();
            if length > self.tolerance {
                continue;
            }
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            if ra != rb {
                parent[ra.max(rb)] = ra.min(rb);
                merged += 1;
            }
        }

        if merged == 0 {
            return Ok(());
        }

        let remap: Vec<usize> = (0..count).map(|v| find(&mut parent, v)).collect();
        let key = |a: usize, b: usize| (remap[a].min(remap[b]), remap[a].max(remap[b]));

        let mut smoothness: AHashMap<(usize, usize), f64> = AHashMap::new();
        for edge in mesh.edges() {
            let [a, b] = edge.vertices;
            if remap[a] == remap[b] {
                continue;
            }
            smoothness
                .entry(key(a, b))
                .and_modify(|s| *s = s.min(edge.smoothness))
                .or_insert(edge.smoothness);
        }

        let triangles: Vec<Triangle> = mesh
            .triangles
            .iter()
            .map(|t| Triangle::new(t.indices.map(|i| remap[i])))
            .filter(|t| {
                let [a, b, c] = t.indices;
                a != b && b != c && a != c
            })
            .collect();

        if triangles.is_empty() {
            return Err(CsgError::Simplify("every face collapsed".into()));
        }

        mesh.triangles = triangles;
        mesh.rebuild_edges();
        mesh.update_edge_smoothness(|edge| {
            let [a, b] = edge.vertices;
            smoothness.get(&(a.min(b), a.max(b))).copied().unwrap_or(1.0)
        });
        mesh.remove_orphaned_vertices();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Vertex};
    use nalgebra::{Point3, Vector3};

    /// Unit cube with corner 7 doubled by a sliver-close twin on the +z face
    fn cube_with_twin() -> (Mesh, usize) {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let twin = mesh.add_vertex(Vertex::new(Point3::new(1.0, 1.0, 1.0 + 1e-12)));
        // +z quad is triangles 10 and 11: (4, 5, 7), (4, 7, 6)
        mesh.triangles[11] = Triangle::new([4, twin, 6]);
        mesh.add_triangle(Triangle::new([4, 7, twin]));
        mesh.rebuild_edges();
        (mesh, twin)
    }

    #[test]
    fn test_welds_short_seam_edge() -> Result<()> {
        let (mut mesh, twin) = cube_with_twin();
        assert_eq!(mesh.triangle_count(), 13);

        SeamWelder::new(1e-9).simplify(&mut mesh, &[[7, twin]])?;
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed());
        assert!((mesh.volume() - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_long_edges_are_kept() -> Result<()> {
        let (mut mesh, twin) = cube_with_twin();
        SeamWelder::new(1e-15).simplify(&mut mesh, &[[7, twin]])?;
        assert_eq!(mesh.triangle_count(), 13);
        Ok(())
    }

    #[test]
    fn test_keeps_edge_smoothness() -> Result<()> {
        let (mut mesh, twin) = cube_with_twin();
        mesh.set_edge_smoothness(4, 5, 0.3);
        SeamWelder::new(1e-9).simplify(&mut mesh, &[[7, twin]])?;
        assert_eq!(mesh.edge_smoothness(4, 5), Some(0.3));
        Ok(())
    }

    #[test]
    fn test_rejects_bad_candidates() {
        let (mut mesh, _) = cube_with_twin();
        let result = SeamWelder::new(1e-9).simplify(&mut mesh, &[[0, 99]]);
        assert!(matches!(result, Err(CsgError::Simplify(_))));
    }
}
