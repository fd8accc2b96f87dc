// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parallel batch of independent boolean operations using rayon
//!
//! Each job owns its inputs and the kernel keeps no shared state, so jobs
//! run on the rayon pool without locking.

use super::{boolean::CsgModeller, BooleanOp, Mesh};
use crate::config::CsgConfig;
use nalgebra::Matrix4;
use rayon::prelude::*;
use tracing::debug;

/// One boolean operation with its placed operands
#[derive(Debug, Clone)]
pub struct BooleanJob {
    pub a: Mesh,
    pub transform_a: Matrix4<f64>,
    pub b: Mesh,
    pub transform_b: Matrix4<f64>,
    pub op: BooleanOp,
}

impl BooleanJob {
    /// Job on two meshes already in the same frame
    pub fn new(a: Mesh, b: Mesh, op: BooleanOp) -> Self {
        Self {
            a,
            transform_a: Matrix4::identity(),
            b,
            transform_b: Matrix4::identity(),
            op,
        }
    }

    pub fn with_transforms(mut self, transform_a: Matrix4<f64>, transform_b: Matrix4<f64>) -> Self {
        self.transform_a = transform_a;
        self.transform_b = transform_b;
        self
    }

    pub fn run(&self, config: &CsgConfig) -> Mesh {
        CsgModeller::new(&self.a, &self.transform_a, &self.b, &self.transform_b, config)
            .result(self.op)
    }
}

/// Run every job on the rayon pool; results keep the order of `jobs`
pub fn run_batch(jobs: &[BooleanJob], config: &CsgConfig) -> Vec<Mesh> {
    debug!(jobs = jobs.len(), "running boolean batch");
    jobs.par_iter().map(|job| job.run(config)).collect()
}

/// Every result of one operand pair, computed in parallel from a shared
/// split and classification
pub fn all_results(modeller: &CsgModeller) -> Vec<(BooleanOp, Mesh)> {
    BooleanOp::ALL
        .par_iter()
        .map(|&op| (op, modeller.result(op)))
        .collect()
}
