// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities
//!
//! A closed triangle mesh with per-vertex smoothness, optional texture
//! parameters and derived edges carrying crease smoothness. This is the
//! surface the boolean kernel consumes and produces.

use super::BoundingBox;
use crate::error::{CsgError, Result};
use ahash::AHashMap;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// How the surrounding application smooths the mesh. Consumed once when a
/// mesh enters the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmoothingMethod {
    /// Faceted: every edge is a hard crease
    None,
    /// Interpolating subdivision
    #[default]
    Interpolating,
    /// Approximating subdivision
    Approximating,
}

/// Vertex with position, smoothness and optional parameter payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    /// Smoothness in [0, 1]
    pub smoothness: f64,
    /// Texture-parameter values interpolated through splits
    pub params: Option<Vec<f64>>,
}

impl Vertex {
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            smoothness: 1.0,
            params: None,
        }
    }

    pub fn with_smoothness(mut self, smoothness: f64) -> Self {
        self.smoothness = smoothness;
        self
    }

    pub fn with_params(mut self, params: Vec<f64>) -> Self {
        self.params = Some(params);
        self
    }
}

/// Triangle defined by three vertex indices, counter-clockwise from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// Endpoints of edge `k` (v_k to v_{k+1})
    pub fn edge(&self, k: usize) -> (usize, usize) {
        (self.indices[k], self.indices[(k + 1) % 3])
    }
}

/// Undirected edge shared by at most two triangles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub vertices: [usize; 2],
    pub faces: [Option<usize>; 2],
    /// Crease smoothness in [0, 1]; 0 is a hard edge
    pub smoothness: f64,
}

/// Triangular mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    edges: Vec<Edge>,
    pub smoothing_method: SmoothingMethod,
    /// Opaque material handle carried through to the result
    pub material: Option<String>,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Mesh {
    /// Build a mesh; edges are derived and start fully smooth
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Self {
        let mut mesh = Self {
            vertices,
            triangles,
            edges: Vec::new(),
            smoothing_method: SmoothingMethod::default(),
            material: None,
        };
        mesh.rebuild_edges();
        mesh
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// The placeholder a boolean returns when nothing survives: one vertex,
    /// no faces
    pub fn degenerate() -> Self {
        Self::new(vec![Vertex::new(Point3::origin())], Vec::new())
    }

    /// Build from raw position and index buffers, rejecting out-of-range
    /// indices and faces that repeat a vertex
    pub fn from_indexed(positions: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<Self> {
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= positions.len()) {
                return Err(CsgError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count: positions.len(),
                });
            }
            if indices[0] == indices[1] || indices[1] == indices[2] || indices[0] == indices[2] {
                return Err(CsgError::DegenerateFace { face });
            }
        }

        let vertices = positions.iter().map(|p| Vertex::new(*p)).collect();
        let triangles = faces.iter().map(|&f| Triangle::new(f)).collect();
        Ok(Self::new(vertices, triangles))
    }

    pub fn with_smoothing_method(mut self, method: SmoothingMethod) -> Self {
        self.smoothing_method = method;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Add a vertex and return its index. Call `rebuild_edges` after
    /// adding triangles.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Recompute the edge list from the triangles, keeping the smoothness of
    /// edges that already existed
    pub fn rebuild_edges(&mut self) {
        let previous: AHashMap<(usize, usize), f64> = self
            .edges
            .iter()
            .map(|e| (edge_key(e.vertices[0], e.vertices[1]), e.smoothness))
            .collect();

        let mut lookup: AHashMap<(usize, usize), usize> = AHashMap::new();
        let mut edges: Vec<Edge> = Vec::with_capacity(self.triangles.len() * 3 / 2);

        for (face, triangle) in self.triangles.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = triangle.edge(k);
                let key = edge_key(a, b);
                match lookup.get(&key) {
                    Some(&index) => {
                        let edge = &mut edges[index];
                        if edge.faces[1].is_none() {
                            edge.faces[1] = Some(face);
                        }
                    }
                    None => {
                        lookup.insert(key, edges.len());
                        edges.push(Edge {
                            vertices: [a, b],
                            faces: [Some(face), None],
                            smoothness: previous.get(&key).copied().unwrap_or(1.0),
                        });
                    }
                }
            }
        }

        self.edges = edges;
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Index of the edge joining `a` and `b`
    pub fn edge_index(&self, a: usize, b: usize) -> Option<usize> {
        let key = edge_key(a, b);
        self.edges
            .iter()
            .position(|e| edge_key(e.vertices[0], e.vertices[1]) == key)
    }

    /// Set the crease smoothness of the edge joining `a` and `b`; returns
    /// false when there is no such edge
    pub fn set_edge_smoothness(&mut self, a: usize, b: usize, smoothness: f64) -> bool {
        match self.edge_index(a, b) {
            Some(index) => {
                self.edges[index].smoothness = smoothness.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn edge_smoothness(&self, a: usize, b: usize) -> Option<f64> {
        self.edge_index(a, b).map(|i| self.edges[i].smoothness)
    }

    /// Replace every edge smoothness in one pass; `f` receives the edge
    pub fn update_edge_smoothness(&mut self, mut f: impl FnMut(&Edge) -> f64) {
        for edge in &mut self.edges {
            edge.smoothness = f(edge).clamp(0.0, 1.0);
        }
    }

    /// Per-triangle crease smoothness aligned with `Triangle::edge(k)`
    pub fn face_edge_smoothness(&self) -> Vec<[f64; 3]> {
        let lookup: AHashMap<(usize, usize), f64> = self
            .edges
            .iter()
            .map(|e| (edge_key(e.vertices[0], e.vertices[1]), e.smoothness))
            .collect();

        self.triangles
            .iter()
            .map(|t| {
                let mut values = [1.0; 3];
                for (k, value) in values.iter_mut().enumerate() {
                    let (a, b) = t.edge(k);
                    *value = lookup.get(&edge_key(a, b)).copied().unwrap_or(1.0);
                }
                values
            })
            .collect()
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.position = matrix.transform_point(&vertex.position);
        }
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Unit normal of a triangle, zero for degenerate ones
    pub fn face_normal(&self, face: usize) -> Vector3<f64> {
        let [a, b, c] = self.triangles[face].indices;
        let p0 = self.vertices[a].position;
        let normal = (self.vertices[b].position - p0).cross(&(self.vertices[c].position - p0));
        normal.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    /// Signed enclosed volume; positive for an outward-wound closed mesh
    pub fn volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.indices;
                let v0 = self.vertices[a].position.coords;
                let v1 = self.vertices[b].position.coords;
                let v2 = self.vertices[c].position.coords;
                v0.dot(&v1.cross(&v2)) / 6.0
            })
            .sum()
    }

    /// Every edge is shared by exactly two triangles
    pub fn is_closed(&self) -> bool {
        !self.edges.is_empty() && self.edges.iter().all(|e| e.faces[1].is_some())
    }

    /// Remove vertices no triangle references, remapping triangle indices
    /// and edges. Returns the number of vertices removed.
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in &triangle.indices {
                used[index] = true;
            }
        }

        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (old, vertex) in self.vertices.drain(..).enumerate() {
            if used[old] {
                remap[old] = vertices.len();
                vertices.push(vertex);
            }
        }
        let removed = used.len() - vertices.len();
        self.vertices = vertices;

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }
        for edge in &mut self.edges {
            edge.vertices = [remap[edge.vertices[0]], remap[edge.vertices[1]]];
        }
        self.rebuild_edges();
        removed
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::empty()
    }
}
