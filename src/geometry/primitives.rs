// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed primitive solids with shared vertices and outward winding

use super::{Mesh, SmoothingMethod, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Sphere { r: f64, segments: u32 },
    Cylinder { h: f64, r: f64, segments: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f64, segments: u32) -> Self {
        Self::Sphere {
            r,
            segments: segments.max(3),
        }
    }

    pub fn cylinder(h: f64, r: f64, segments: u32) -> Self {
        Self::Cylinder {
            h,
            r,
            segments: segments.max(3),
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match *self {
            Self::Cube { size, center } => generate_cube_mesh(size, center),
            Self::Sphere { r, segments } => generate_sphere_mesh(r, segments),
            Self::Cylinder { h, r, segments } => generate_cylinder_mesh(h, r, segments),
        }
    }
}

// Corner i sits at (i & 1, (i >> 1) & 1, (i >> 2) & 1) scaled by size.
// Each quad is split along its first-to-third diagonal.
const CUBE_QUADS: [[usize; 4]; 6] = [
    [0, 4, 6, 2], // -x
    [1, 3, 7, 5], // +x
    [0, 1, 5, 4], // -y
    [2, 6, 7, 3], // +y
    [0, 2, 3, 1], // -z
    [4, 5, 7, 6], // +z
];

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let offset = if center { -size / 2.0 } else { Vector3::zeros() };

    let mut mesh = Mesh::empty().with_smoothing_method(SmoothingMethod::None);
    for i in 0..8 {
        let corner = Vector3::new(
            (i & 1) as f64 * size.x,
            ((i >> 1) & 1) as f64 * size.y,
            ((i >> 2) & 1) as f64 * size.z,
        );
        mesh.add_vertex(Vertex::new(Point3::from(corner + offset)));
    }

    for [a, b, c, d] in CUBE_QUADS {
        mesh.add_triangle(Triangle::new([a, b, c]));
        mesh.add_triangle(Triangle::new([a, c, d]));
    }

    mesh.rebuild_edges();
    mesh
}

/// UV sphere about the origin with single pole vertices
fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let segments = segments.max(3) as usize;
    let (stacks, slices) = (segments, segments);
    let mut mesh = Mesh::empty();

    let north = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, radius)));
    let mut rings: Vec<Vec<usize>> = Vec::with_capacity(stacks - 1);
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let ring = (0..slices)
            .map(|j| {
                let theta = 2.0 * PI * j as f64 / slices as f64;
                mesh.add_vertex(Vertex::new(Point3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                )))
            })
            .collect();
        rings.push(ring);
    }
    let south = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, -radius)));

    for j in 0..slices {
        let next = (j + 1) % slices;
        mesh.add_triangle(Triangle::new([north, rings[0][j], rings[0][next]]));
    }

    for pair in rings.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for j in 0..slices {
            let next = (j + 1) % slices;
            mesh.add_triangle(Triangle::new([upper[j], lower[j], lower[next]]));
            mesh.add_triangle(Triangle::new([upper[j], lower[next], upper[next]]));
        }
    }

    let last = &rings[rings.len() - 1];
    for j in 0..slices {
        let next = (j + 1) % slices;
        mesh.add_triangle(Triangle::new([last[j], south, last[next]]));
    }

    mesh.rebuild_edges();
    mesh
}

/// Cylinder standing on the XY plane, from z = 0 to z = height
fn generate_cylinder_mesh(height: f64, radius: f64, segments: u32) -> Mesh {
    let segments = segments.max(3) as usize;
    let mut mesh = Mesh::empty();

    let bottom_center = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
    let top_center = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, height)));

    let mut bottom = Vec::with_capacity(segments);
    let mut top = Vec::with_capacity(segments);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        bottom.push(mesh.add_vertex(Vertex::new(Point3::new(radius * cos, radius * sin, 0.0))));
        top.push(mesh.add_vertex(Vertex::new(Point3::new(radius * cos, radius * sin, height))));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.add_triangle(Triangle::new([bottom_center, bottom[next], bottom[i]]));
        mesh.add_triangle(Triangle::new([top_center, top[i], top[next]]));
        mesh.add_triangle(Triangle::new([bottom[i], bottom[next], top[i]]));
        mesh.add_triangle(Triangle::new([top[i], bottom[next], top[next]]));
    }

    mesh.rebuild_edges();

    // Rim edges are creases between the caps and the side
    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.set_edge_smoothness(bottom[i], bottom[next], 0.0);
        mesh.set_edge_smoothness(top[i], top[next], 0.0);
    }
    mesh
}
