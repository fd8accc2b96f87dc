// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Index-addressed working copies of the boolean operands
//!
//! Vertices and faces only ever grow while the kernel runs, so plain `usize`
//! handles into the two arenas stay valid for the whole operation.

use super::robust_predicates::{plane_of, Plane};
use super::{BoundingBox, Mesh, SmoothingMethod};
use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};

/// Position of a vertex or face relative to the other operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    #[default]
    Unknown,
    /// On the other surface; vertices only
    Boundary,
    Inside,
    Outside,
    /// Coplanar with a face of the other operand, same orientation
    Same,
    /// Coplanar with a face of the other operand, reversed orientation
    Opposite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingVertex {
    pub position: Point3<f64>,
    pub smoothness: f64,
    pub params: Option<Vec<f64>>,
    pub tag: Classification,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingFace {
    pub v: [usize; 3],
    /// Crease smoothness of edges v0-v1, v1-v2 and v2-v0
    pub smoothness: [f64; 3],
    pub plane: Plane,
    pub bounds: BoundingBox,
    pub min_proj: f64,
    pub max_proj: f64,
    pub tag: Classification,
}

/// One operand of a boolean, placed in the shared world frame
#[derive(Debug, Clone)]
pub struct WorkingMesh {
    pub vertices: Vec<WorkingVertex>,
    pub faces: Vec<WorkingFace>,
    pub bounds: BoundingBox,
    axis: usize,
}

impl WorkingMesh {
    /// Load `mesh` placed by `transform`. Faces of a faceted mesh get hard
    /// creases; a mirroring transform has its winding restored.
    pub fn from_mesh(mesh: &Mesh, transform: &Matrix4<f64>) -> Self {
        let vertices: Vec<WorkingVertex> = mesh
            .vertices
            .iter()
            .map(|v| WorkingVertex {
                position: transform.transform_point(&v.position),
                smoothness: v.smoothness,
                params: v.params.clone(),
                tag: Classification::Unknown,
            })
            .collect();

        let creases = match mesh.smoothing_method {
            SmoothingMethod::None => vec![[0.0; 3]; mesh.triangles.len()],
            SmoothingMethod::Interpolating | SmoothingMethod::Approximating => {
                mesh.face_edge_smoothness()
            }
        };

        let mirrored = transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0;

        let mut working = Self {
            vertices,
            faces: Vec::with_capacity(mesh.triangles.len()),
            bounds: BoundingBox::empty(),
            axis: 0,
        };

        for (triangle, smoothness) in mesh.triangles.iter().zip(creases) {
            let [a, b, c] = triangle.indices;
            let (v, smoothness) = if mirrored {
                ([a, c, b], [smoothness[2], smoothness[1], smoothness[0]])
            } else {
                ([a, b, c], smoothness)
            };
            working.push_face(v, smoothness, Classification::Unknown);
        }

        working.bounds = BoundingBox::from_points(working.vertices.iter().map(|v| &v.position));
        working
    }

    pub fn main_axis(&self) -> usize {
        self.axis
    }

    /// Select the sweep axis and refresh every face projection
    pub fn set_main_axis(&mut self, axis: usize) {
        self.axis = axis;
        for index in 0..self.faces.len() {
            self.refresh_face(index);
        }
    }

    pub fn face_points(&self, face: usize) -> [&Point3<f64>; 3] {
        let [a, b, c] = self.faces[face].v;
        [
            &self.vertices[a].position,
            &self.vertices[b].position,
            &self.vertices[c].position,
        ]
    }

    pub fn centroid(&self, face: usize) -> Point3<f64> {
        let [a, b, c] = self.face_points(face);
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    pub fn add_vertex(&mut self, vertex: WorkingVertex) -> usize {
        self.bounds.expand_to_include(&vertex.position);
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn push_face(&mut self, v: [usize; 3], smoothness: [f64; 3], tag: Classification) -> usize {
        self.faces.push(WorkingFace {
            v,
            smoothness,
            plane: Plane {
                normal: nalgebra::Vector3::zeros(),
                dist_root: 0.0,
            },
            bounds: BoundingBox::empty(),
            min_proj: 0.0,
            max_proj: 0.0,
            tag,
        });
        let index = self.faces.len() - 1;
        self.refresh_face(index);
        index
    }

    pub fn replace_face(&mut self, index: usize, v: [usize; 3], smoothness: [f64; 3]) {
        self.faces[index].v = v;
        self.faces[index].smoothness = smoothness;
        self.refresh_face(index);
    }

    fn refresh_face(&mut self, index: usize) {
        let [a, b, c] = self.faces[index].v;
        let (p0, p1, p2) = (
            self.vertices[a].position,
            self.vertices[b].position,
            self.vertices[c].position,
        );
        let bounds = BoundingBox::from_points([&p0, &p1, &p2]);
        let face = &mut self.faces[index];
        face.plane = plane_of(&p0, &p1, &p2);
        face.min_proj = bounds.min[self.axis];
        face.max_proj = bounds.max[self.axis];
        face.bounds = bounds;
    }

    /// Faces incident to each vertex
    pub fn vertex_faces(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.vertices.len()];
        for (index, face) in self.faces.iter().enumerate() {
            for &v in &face.v {
                adjacency[v].push(index);
            }
        }
        adjacency
    }

    pub fn count_faces(&self, tag: Classification) -> usize {
        self.faces.iter().filter(|f| f.tag == tag).count()
    }
}

/// Axis along which the two boxes overlap least, relative to their joint
/// extent
pub fn choose_main_axis(a: &BoundingBox, b: &BoundingBox) -> usize {
    let mut best = 0;
    let mut best_ratio = f64::INFINITY;
    for axis in 0..3 {
        let overlap = (a.max[axis].min(b.max[axis]) - a.min[axis].max(b.min[axis])).max(0.0);
        let extent = a.max[axis].max(b.max[axis]) - a.min[axis].min(b.min[axis]);
        let ratio = if extent > 0.0 { overlap / extent } else { 1.0 };
        if ratio < best_ratio {
            best_ratio = ratio;
            best = axis;
        }
    }
    best
}
