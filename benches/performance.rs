// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{Matrix4, Vector3};
use polyframe_csg::{run_batch, BooleanJob, BooleanOp, CsgConfig, CsgModeller, Mesh, Primitive};

fn shifted(mesh: &Mesh, offset: Vector3<f64>) -> Mesh {
    let mut moved = mesh.clone();
    moved.transform(&Matrix4::new_translation(&offset));
    moved
}

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    group.bench_function("cube", |b| {
        b.iter(|| Primitive::cube(black_box(Vector3::new(10.0, 10.0, 10.0)), false).to_mesh());
    });

    group.bench_function("sphere_32", |b| {
        b.iter(|| Primitive::sphere(black_box(10.0), black_box(32)).to_mesh());
    });

    group.finish();
}

fn bench_modeller(c: &mut Criterion) {
    let mut group = c.benchmark_group("modeller");
    let config = CsgConfig::default();
    let identity = Matrix4::identity();

    for segments in [16, 32, 64] {
        let sphere = Primitive::sphere(6.0, segments).to_mesh();
        let cube = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();

        group.bench_with_input(
            BenchmarkId::new("cube_sphere_prepare", segments),
            &segments,
            |b, _| {
                b.iter(|| {
                    CsgModeller::new(
                        black_box(&cube),
                        &identity,
                        black_box(&sphere),
                        &identity,
                        &config,
                    )
                });
            },
        );
    }

    let cube = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh();
    let other = shifted(&cube, Vector3::new(5.0, 3.0, 2.0));
    let modeller = CsgModeller::new(&cube, &identity, &other, &identity, &config);
    for op in BooleanOp::ALL {
        group.bench_with_input(BenchmarkId::new("cube_cube_result", op), &op, |b, &op| {
            b.iter(|| modeller.result(black_box(op)));
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let config = CsgConfig::default();
    let cube = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh();
    let cylinder = Primitive::cylinder(14.0, 3.0, 24).to_mesh();

    let jobs: Vec<BooleanJob> = (0..8)
        .map(|i| {
            let offset = Vector3::new(2.0 + i as f64, 5.0, -2.0);
            BooleanJob::new(cube.clone(), shifted(&cylinder, offset), BooleanOp::Difference)
        })
        .collect();

    group.bench_function("drilled_cubes_8", |b| {
        b.iter(|| run_batch(black_box(&jobs), &config));
    });

    group.finish();
}

criterion_group!(benches, bench_primitives, bench_modeller, bench_batch);
criterion_main!(benches);
