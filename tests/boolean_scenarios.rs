// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end boolean scenarios on cubes and spheres

use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point3, Vector3};
use polyframe_csg::{
    analyze, boolean_with, io, BooleanOp, BoundingBox, CsgConfig, CsgModeller, Mesh, Primitive,
};

fn unit_cube() -> Mesh {
    Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()
}

fn modeller_with_offset(offset: Vector3<f64>) -> CsgModeller {
    CsgModeller::new(
        &unit_cube(),
        &Matrix4::identity(),
        &unit_cube(),
        &Matrix4::new_translation(&offset),
        &CsgConfig::default(),
    )
}

fn bounds(min: [f64; 3], max: [f64; 3]) -> BoundingBox {
    BoundingBox::new(Point3::from(min), Point3::from(max))
}

#[test]
fn test_half_overlap_intersection() {
    let result = modeller_with_offset(Vector3::new(0.5, 0.0, 0.0)).result(BooleanOp::Intersection);

    assert!(result
        .bounding_box()
        .approx_eq(&bounds([0.5, 0.0, 0.0], [1.0, 1.0, 1.0]), 1e-9));
    assert_relative_eq!(result.volume(), 0.5, epsilon = 1e-9);
}

#[test]
fn test_half_overlap_union() {
    let result = modeller_with_offset(Vector3::new(0.5, 0.0, 0.0)).result(BooleanOp::Union);

    assert!(result
        .bounding_box()
        .approx_eq(&bounds([0.0, 0.0, 0.0], [1.5, 1.0, 1.0]), 1e-9));
    assert_relative_eq!(result.volume(), 1.5, epsilon = 1e-9);
}

#[test]
fn test_union_intersection_complement() {
    let modeller = modeller_with_offset(Vector3::new(0.5, 0.0, 0.0));
    let union = modeller.result(BooleanOp::Union).volume();
    let intersection = modeller.result(BooleanOp::Intersection).volume();

    assert_relative_eq!(union + intersection, 2.0, epsilon = 1e-9);
}

#[test]
fn test_differences_of_half_overlap() {
    let modeller = modeller_with_offset(Vector3::new(0.5, 0.0, 0.0));

    let a_minus_b = modeller.result(BooleanOp::Difference);
    assert!(a_minus_b
        .bounding_box()
        .approx_eq(&bounds([0.0, 0.0, 0.0], [0.5, 1.0, 1.0]), 1e-9));
    assert_relative_eq!(a_minus_b.volume(), 0.5, epsilon = 1e-9);

    let b_minus_a = modeller.result(BooleanOp::ReverseDifference);
    assert!(b_minus_a
        .bounding_box()
        .approx_eq(&bounds([1.0, 0.0, 0.0], [1.5, 1.0, 1.0]), 1e-9));
    assert_relative_eq!(b_minus_a.volume(), 0.5, epsilon = 1e-9);
}

#[test]
fn test_face_sharing_cubes() {
    let modeller = modeller_with_offset(Vector3::new(1.0, 0.0, 0.0));

    let union = modeller.result(BooleanOp::Union);
    assert_relative_eq!(union.volume(), 2.0, epsilon = 1e-9);
    // No face of the result lies on the shared wall
    for face in 0..union.triangle_count() {
        let on_wall = union.triangles[face]
            .indices
            .iter()
            .all(|&v| (union.vertices[v].position.x - 1.0).abs() < 1e-9);
        assert!(!on_wall, "face {face} lies on the internal wall");
    }

    let intersection = modeller.result(BooleanOp::Intersection);
    assert_eq!(intersection.triangle_count(), 0);
}

#[test]
fn test_disjoint_cubes() {
    let modeller = modeller_with_offset(Vector3::new(3.0, 0.0, 0.0));

    let union = modeller.result(BooleanOp::Union);
    assert_eq!(union.triangle_count(), 24);
    assert_relative_eq!(union.volume(), 2.0, epsilon = 1e-12);

    let intersection = modeller.result(BooleanOp::Intersection);
    assert_eq!(intersection.triangle_count(), 0);
    assert_eq!(intersection.vertex_count(), 1);

    let difference = modeller.result(BooleanOp::Difference);
    assert_eq!(difference.triangle_count(), 12);
    assert_eq!(difference.vertex_count(), 8);
    assert!(difference
        .bounding_box()
        .approx_eq(&unit_cube().bounding_box(), 1e-12));
}

#[test]
fn test_cubes_touching_along_an_edge() {
    let modeller = modeller_with_offset(Vector3::new(1.0, 1.0, 0.0));

    assert!(modeller.split_stats().iter().all(|pass| pass.splits == 0));
    assert_relative_eq!(modeller.result(BooleanOp::Union).volume(), 2.0, epsilon = 1e-12);
    assert_eq!(modeller.result(BooleanOp::Intersection).triangle_count(), 0);
}

/// Volumes of all four results satisfy the inclusion-exclusion identities
/// and every non-empty result is closed
fn assert_consistent(a: &Mesh, b: &Mesh, transform_b: &Matrix4<f64>) {
    let modeller = CsgModeller::new(a, &Matrix4::identity(), b, transform_b, &CsgConfig::default());
    let volume_a = a.volume();
    let volume_b = b.volume();

    let results: Vec<Mesh> = BooleanOp::ALL.iter().map(|&op| modeller.result(op)).collect();
    for (op, mesh) in BooleanOp::ALL.iter().zip(&results) {
        assert!(mesh.triangle_count() > 0, "{op} is empty");
        assert!(mesh.is_closed(), "{op} is not closed");
        assert!(mesh.volume() > 0.0, "{op} is inside out");
    }

    let [union, intersection, a_minus_b, b_minus_a] = [0, 1, 2, 3].map(|i| results[i].volume());
    assert_relative_eq!(union + intersection, volume_a + volume_b, epsilon = 1e-8);
    assert_relative_eq!(a_minus_b + intersection, volume_a, epsilon = 1e-8);
    assert_relative_eq!(b_minus_a + intersection, volume_b, epsilon = 1e-8);
}

#[test]
fn test_rotated_cube() {
    let b = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), true).to_mesh();
    let placement = Matrix4::new_translation(&Vector3::new(0.9, 0.6, 0.55))
        * Matrix4::new_rotation(Vector3::new(0.3, 0.5, 0.7));
    assert_consistent(&unit_cube(), &b, &placement);
}

#[test]
fn test_sphere_through_cube_face() {
    let sphere = Primitive::sphere(0.4, 16).to_mesh();
    let placement = Matrix4::new_translation(&Vector3::new(1.1, 0.45, 0.52));
    assert_consistent(&unit_cube(), &sphere, &placement);
}

#[test]
fn test_self_difference_is_empty() {
    let cube = unit_cube();
    let identity = Matrix4::identity();
    let result = boolean_with(
        &cube,
        &identity,
        &cube,
        &identity,
        BooleanOp::Difference,
        &CsgConfig::default(),
    );

    assert_eq!(result.triangle_count(), 0);
}

#[test]
fn test_result_survives_stl_round_trip() {
    let result = modeller_with_offset(Vector3::new(0.5, 0.0, 0.0)).result(BooleanOp::Union);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("union.stl");
    io::write_stl(&result, &path).unwrap();
    let loaded = io::read_stl(&path).unwrap();

    let before = analyze(&result);
    let after = analyze(&loaded);
    assert_eq!(before.triangle_count, after.triangle_count);
    assert_relative_eq!(before.volume, after.volume, epsilon = 1e-6);
}
