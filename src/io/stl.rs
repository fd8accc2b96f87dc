// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL import and export through `stl_io`

use crate::error::Result;
use crate::geometry::Mesh;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};
use tracing::{debug, warn};

/// Read an STL file (ASCII or binary) into an indexed mesh
pub fn read_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let mesh = read_stl_from(&mut reader)?;
    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "STL loaded"
    );
    Ok(mesh)
}

/// Read STL data from any seekable reader.
///
/// `stl_io` merges bitwise-equal vertices, so a closed STL solid comes back
/// with shared vertices. Facets that collapse to a repeated vertex are
/// skipped.
pub fn read_stl_from<R: Read + Seek>(reader: &mut R) -> Result<Mesh> {
    let stl = stl_io::read_stl(reader)?;

    let positions: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|face| face.vertices)
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    let skipped = stl.faces.len() - faces.len();
    if skipped > 0 {
        warn!(skipped, "dropped degenerate STL facets");
    }

    let mut mesh = Mesh::from_indexed(&positions, &faces)?;
    if skipped > 0 {
        mesh.remove_orphaned_vertices();
    }
    Ok(mesh)
}

/// Write a mesh as binary STL
pub fn write_stl(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_stl_to(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as binary STL to any writer. Facet normals are computed from
/// the triangle geometry.
pub fn write_stl_to<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .enumerate()
        .map(|(face, triangle)| {
            let normal = mesh.face_normal(face);
            let [v0, v1, v2] = triangle.indices.map(|i| {
                let p = mesh.vertices[i].position;
                StlVertex::new([p.x as f32, p.y as f32, p.z as f32])
            });

            StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: [v0, v1, v2],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())?;
    Ok(())
}
