// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::Mesh;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Signed enclosed volume; negative for an inside-out mesh
    pub volume: f64,
    /// Total surface area
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Area-weighted surface centroid [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Edges used by a single triangle
    pub open_edges: usize,
    /// Edges used by more than two triangles
    pub non_manifold_edges: usize,
    /// Every edge is shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            open_edges: 0,
            non_manifold_edges: 0,
            is_watertight: false,
        }
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.bbox[3] - self.bbox[0],
            self.bbox[4] - self.bbox[1],
            self.bbox[5] - self.bbox[2],
        ]
    }
}

impl fmt::Display for GeometryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [sx, sy, sz] = self.size();
        writeln!(f, "volume        {:>14.6}", self.volume)?;
        writeln!(f, "surface area  {:>14.6}", self.surface_area)?;
        writeln!(
            f,
            "bounds        ({:.4}, {:.4}, {:.4}) .. ({:.4}, {:.4}, {:.4})",
            self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3], self.bbox[4], self.bbox[5]
        )?;
        writeln!(f, "size          {sx:.4} x {sy:.4} x {sz:.4}")?;
        writeln!(
            f,
            "vertices      {:>14}\ntriangles     {:>14}",
            self.vertex_count, self.triangle_count
        )?;
        write!(
            f,
            "watertight    {:>14}  (open edges: {}, non-manifold: {})",
            if self.is_watertight { "yes" } else { "no" },
            self.open_edges,
            self.non_manifold_edges
        )
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();

    if vertex_count == 0 || triangle_count == 0 {
        return GeometryStats {
            vertex_count,
            ..GeometryStats::empty()
        };
    }

    let bounds = mesh.bounding_box();
    let (surface_area, centroid) = area_and_centroid(mesh);
    let (open_edges, non_manifold_edges) = edge_defects(mesh);

    GeometryStats {
        volume: mesh.volume(),
        surface_area,
        bbox: [
            bounds.min.x,
            bounds.min.y,
            bounds.min.z,
            bounds.max.x,
            bounds.max.y,
            bounds.max.z,
        ],
        centroid,
        vertex_count,
        triangle_count,
        open_edges,
        non_manifold_edges,
        is_watertight: open_edges == 0 && non_manifold_edges == 0,
    }
}

fn area_and_centroid(mesh: &Mesh) -> (f64, [f64; 3]) {
    let mut area = 0.0;
    let mut weighted = nalgebra::Vector3::zeros();

    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices.map(|i| mesh.vertices[i].position);
        let triangle_area = (b - a).cross(&(c - a)).norm() / 2.0;
        area += triangle_area;
        weighted += (a.coords + b.coords + c.coords) * (triangle_area / 3.0);
    }

    if area > 0.0 {
        weighted /= area;
    }
    (area, [weighted.x, weighted.y, weighted.z])
}

/// Count edges used once and edges used more than twice
fn edge_defects(mesh: &Mesh) -> (usize, usize) {
    let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();

    for triangle in &mesh.triangles {
        for k in 0..3 {
            let (v1, v2) = triangle.edge(k);
            let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    let open = edge_count.values().filter(|&&count| count == 1).count();
    let non_manifold = edge_count.values().filter(|&&count| count > 2).count();
    (open, non_manifold)
}
