// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Result mesh reconstruction
//!
//! Picks the surviving faces of both classified operands, welds shared
//! boundary vertices and rebuilds edge smoothness across the new seam.

use super::working_mesh::{Classification, WorkingMesh, WorkingVertex};
use super::{BooleanOp, Mesh, Triangle, Vertex};
use ahash::AHashMap;
use tracing::debug;

/// Which operand a face came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    A,
    B,
}

/// Whether a face with `tag` from `operand` survives `op`, and if so
/// whether its winding must be reversed
pub fn select(op: BooleanOp, operand: Operand, tag: Classification) -> Option<bool> {
    use Classification::*;
    match (op, operand, tag) {
        (BooleanOp::Union, Operand::A, Outside | Same) => Some(false),
        (BooleanOp::Union, Operand::B, Outside) => Some(false),
        (BooleanOp::Intersection, Operand::A, Inside | Same) => Some(false),
        (BooleanOp::Intersection, Operand::B, Inside) => Some(false),
        (BooleanOp::Difference, Operand::A, Outside | Opposite) => Some(false),
        (BooleanOp::Difference, Operand::B, Inside) => Some(true),
        (BooleanOp::ReverseDifference, Operand::A, Inside) => Some(true),
        (BooleanOp::ReverseDifference, Operand::B, Outside | Opposite) => Some(false),
        _ => None,
    }
}

/// Assembled result plus the seam edges handed to the simplifier
#[derive(Debug, Clone)]
pub struct Assembly {
    pub mesh: Mesh,
    /// Edges whose endpoints are both boundary vertices
    pub seam_candidates: Vec<[usize; 2]>,
    /// Faces taken from the first operand; they precede those of the second
    pub faces_from_a: usize,
    pub faces_from_b: usize,
}

/// Scale-relative weld distance for boundary vertices
fn merge_tolerance(eps: f64, position: &nalgebra::Point3<f64>) -> f64 {
    let norm = position.coords.norm();
    if norm < 1.0 {
        eps
    } else {
        eps * norm
    }
}

struct Builder {
    eps: f64,
    cell: f64,
    vertices: Vec<Vertex>,
    boundary: Vec<bool>,
    grid: AHashMap<(i64, i64, i64), Vec<usize>>,
    triangles: Vec<Triangle>,
    creases: Vec<[f64; 3]>,
}

impl Builder {
    fn cell_of(&self, position: &nalgebra::Point3<f64>) -> (i64, i64, i64) {
        (
            (position.x / self.cell).floor() as i64,
            (position.y / self.cell).floor() as i64,
            (position.z / self.cell).floor() as i64,
        )
    }

    fn find_boundary(&self, position: &nalgebra::Point3<f64>) -> Option<usize> {
        let tolerance = merge_tolerance(self.eps, position);
        let (cx, cy, cz) = self.cell_of(position);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    if let Some(&found) = bucket
                        .iter()
                        .find(|&&i| (self.vertices[i].position - position).norm() <= tolerance)
                    {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Output index for a working vertex; boundary vertices weld onto an
    /// earlier boundary vertex at the same spot
    fn emit_vertex(&mut self, vertex: &WorkingVertex) -> usize {
        let is_boundary = vertex.tag == Classification::Boundary;
        if is_boundary {
            if let Some(found) = self.find_boundary(&vertex.position) {
                return found;
            }
        }

        let index = self.vertices.len();
        self.vertices.push(Vertex {
            position: vertex.position,
            smoothness: vertex.smoothness,
            params: vertex.params.clone(),
        });
        self.boundary.push(is_boundary);
        if is_boundary {
            let cell = self.cell_of(&vertex.position);
            self.grid.entry(cell).or_default().push(index);
        }
        index
    }

    /// Emit the faces of `mesh` that survive `op`. Returns the number kept.
    fn take(&mut self, mesh: &WorkingMesh, operand: Operand, op: BooleanOp) -> usize {
        let mut map: Vec<Option<usize>> = vec![None; mesh.vertices.len()];
        let mut kept = 0;

        for face in &mesh.faces {
            let Some(reversed) = select(op, operand, face.tag) else {
                continue;
            };

            let mut indices = [0; 3];
            for (slot, &v) in indices.iter_mut().zip(&face.v) {
                *slot = match map[v] {
                    Some(index) => index,
                    None => {
                        let index = self.emit_vertex(&mesh.vertices[v]);
                        map[v] = Some(index);
                        index
                    }
                };
            }

            let [a, b, c] = indices;
            if a == b || b == c || a == c {
                continue;
            }

            let s = face.smoothness;
            if reversed {
                self.triangles.push(Triangle::new([a, c, b]));
                self.creases.push([s[2], s[1], s[0]]);
            } else {
                self.triangles.push(Triangle::new([a, b, c]));
                self.creases.push(s);
            }
            kept += 1;
        }
        kept
    }
}

/// Build the result of `op` from two split and classified operands
pub fn assemble(a: &WorkingMesh, b: &WorkingMesh, op: BooleanOp, eps: f64) -> Assembly {
    let extent = a
        .vertices
        .iter()
        .chain(&b.vertices)
        .map(|v| v.position.coords.norm())
        .fold(1.0_f64, f64::max);

    let mut builder = Builder {
        eps,
        cell: 2.0 * eps * extent,
        vertices: Vec::new(),
        boundary: Vec::new(),
        grid: AHashMap::new(),
        triangles: Vec::new(),
        creases: Vec::new(),
    };

    let faces_from_a = builder.take(a, Operand::A, op);
    let faces_from_b = builder.take(b, Operand::B, op);
    debug!(?op, faces_from_a, faces_from_b, "faces selected");

    if builder.triangles.is_empty() {
        return Assembly {
            mesh: Mesh::degenerate(),
            seam_candidates: Vec::new(),
            faces_from_a: 0,
            faces_from_b: 0,
        };
    }

    let mut creases: AHashMap<(usize, usize), f64> = AHashMap::new();
    for (triangle, values) in builder.triangles.iter().zip(&builder.creases) {
        for (k, &value) in values.iter().enumerate() {
            let (p, q) = triangle.edge(k);
            creases
                .entry((p.min(q), p.max(q)))
                .and_modify(|s| *s = s.min(value))
                .or_insert(value);
        }
    }

    let boundary = builder.boundary;
    let mut mesh = Mesh::new(builder.vertices, builder.triangles);
    mesh.update_edge_smoothness(|edge| {
        let [p, q] = edge.vertices;
        let crosses_seam = match edge.faces {
            [Some(f), Some(g)] => (f < faces_from_a) != (g < faces_from_a),
            _ => false,
        };
        if crosses_seam {
            0.0
        } else {
            creases.get(&(p.min(q), p.max(q))).copied().unwrap_or(1.0)
        }
    });

    let seam_candidates = mesh
        .edges()
        .iter()
        .filter(|e| boundary[e.vertices[0]] && boundary[e.vertices[1]])
        .map(|e| e.vertices)
        .collect();

    Assembly {
        mesh,
        seam_candidates,
        faces_from_a,
        faces_from_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Edge, Primitive};
    use nalgebra::{Matrix4, Vector3};

    fn tagged_cube(offset: Vector3<f64>, tag: Classification) -> WorkingMesh {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let mut working = WorkingMesh::from_mesh(&mesh, &Matrix4::new_translation(&offset));
        for face in &mut working.faces {
            face.tag = tag;
        }
        working
    }

    #[test]
    fn test_selection_table() {
        use Classification::*;
        assert_eq!(select(BooleanOp::Union, Operand::A, Same), Some(false));
        assert_eq!(select(BooleanOp::Union, Operand::B, Same), None);
        assert_eq!(select(BooleanOp::Intersection, Operand::B, Inside), Some(false));
        assert_eq!(select(BooleanOp::Difference, Operand::A, Opposite), Some(false));
        assert_eq!(select(BooleanOp::Difference, Operand::B, Inside), Some(true));
        assert_eq!(select(BooleanOp::Difference, Operand::A, Same), None);
        assert_eq!(select(BooleanOp::ReverseDifference, Operand::A, Inside), Some(true));
        assert_eq!(select(BooleanOp::ReverseDifference, Operand::B, Opposite), Some(false));
    }

    #[test]
    fn test_disjoint_union_keeps_everything() {
        let a = tagged_cube(Vector3::zeros(), Classification::Outside);
        let b = tagged_cube(Vector3::new(3.0, 0.0, 0.0), Classification::Outside);
        let result = assemble(&a, &b, BooleanOp::Union, 1e-10);

        assert_eq!(result.faces_from_a, 12);
        assert_eq!(result.faces_from_b, 12);
        assert_eq!(result.mesh.vertex_count(), 16);
        assert!(result.mesh.is_closed());
        assert!((result.mesh.volume() - 2.0).abs() < 1e-12);
        assert!(result.seam_candidates.is_empty());
    }

    #[test]
    fn test_empty_selection_is_degenerate() {
        let a = tagged_cube(Vector3::zeros(), Classification::Outside);
        let b = tagged_cube(Vector3::new(3.0, 0.0, 0.0), Classification::Outside);
        let result = assemble(&a, &b, BooleanOp::Intersection, 1e-10);

        assert_eq!(result.mesh.vertex_count(), 1);
        assert_eq!(result.mesh.triangle_count(), 0);
    }

    #[test]
    fn test_reversed_faces_flip_volume() {
        let a = tagged_cube(Vector3::zeros(), Classification::Inside);
        let b = tagged_cube(Vector3::zeros(), Classification::Same);
        let result = assemble(&a, &b, BooleanOp::ReverseDifference, 1e-10);

        assert_eq!(result.faces_from_a, 12);
        assert!((result.mesh.volume() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_vertices_weld_and_seam_is_hard() {
        // Two cubes glued at x = 1 with the shared wall dropped
        let mut a = tagged_cube(Vector3::zeros(), Classification::Outside);
        let mut b = tagged_cube(Vector3::new(1.0, 0.0, 0.0), Classification::Outside);
        for (mesh, wall) in [(&mut a, 1.0), (&mut b, -1.0)] {
            for v in &mut mesh.vertices {
                if v.position.x == 1.0 {
                    v.tag = Classification::Boundary;
                }
            }
            for face in &mut mesh.faces {
                face.smoothness = [1.0; 3];
                if face.plane.normal.x * wall > 0.5 {
                    face.tag = Classification::Inside;
                }
            }
        }

        let result = assemble(&a, &b, BooleanOp::Union, 1e-10);
        assert_eq!(result.mesh.vertex_count(), 12);
        assert_eq!(result.mesh.triangle_count(), 20);
        assert!(result.mesh.is_closed());
        assert!((result.mesh.volume() - 2.0).abs() < 1e-12);
        assert_eq!(result.seam_candidates.len(), 4);

        let faces_from_a = result.faces_from_a;
        let (seam, rest): (Vec<&Edge>, Vec<&Edge>) =
            result.mesh.edges().iter().partition(|e| match e.faces {
                [Some(f), Some(g)] => (f < faces_from_a) != (g < faces_from_a),
                _ => false,
            });
        assert_eq!(seam.len(), 4);
        assert!(seam.iter().all(|e| e.smoothness == 0.0));
        assert!(rest.iter().all(|e| e.smoothness == 1.0));
    }
}
