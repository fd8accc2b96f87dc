// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on closed triangle meshes
//!
//! Both operands are split against each other in three alternating passes,
//! classified once, and can then produce any of the four results.

use super::classification::{classify_faces, ClassifyStats};
use super::mesh_reconstruction::assemble;
use super::simplifier::{SeamWelder, Simplifier};
use super::triangle_splitting::{split_faces, SplitStats};
use super::working_mesh::{choose_main_axis, WorkingMesh};
use super::Mesh;
use crate::config::CsgConfig;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Intersection,
    /// A minus B
    Difference,
    /// B minus A
    ReverseDifference,
}

impl BooleanOp {
    pub const ALL: [BooleanOp; 4] = [
        BooleanOp::Union,
        BooleanOp::Intersection,
        BooleanOp::Difference,
        BooleanOp::ReverseDifference,
    ];
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BooleanOp::Union => "union",
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
            BooleanOp::ReverseDifference => "reverse-difference",
        };
        f.write_str(name)
    }
}

impl FromStr for BooleanOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "union" | "add" => Ok(BooleanOp::Union),
            "intersection" | "intersect" => Ok(BooleanOp::Intersection),
            "difference" | "subtract" | "a-b" => Ok(BooleanOp::Difference),
            "reverse-difference" | "b-a" => Ok(BooleanOp::ReverseDifference),
            other => Err(format!("unknown boolean operation: {other}")),
        }
    }
}

/// Split and classified operands, ready to produce any boolean result
#[derive(Debug, Clone)]
pub struct CsgModeller {
    a: WorkingMesh,
    b: WorkingMesh,
    config: CsgConfig,
    smoothing_method: super::SmoothingMethod,
    material: Option<String>,
    split_stats: [SplitStats; 3],
    classify_stats: [ClassifyStats; 2],
}

impl CsgModeller {
    /// Place both meshes, split them against each other and classify every
    /// face. This is where nearly all the work happens.
    #[instrument(skip_all, fields(faces_a = a.triangle_count(), faces_b = b.triangle_count()))]
    pub fn new(
        a: &Mesh,
        transform_a: &Matrix4<f64>,
        b: &Mesh,
        transform_b: &Matrix4<f64>,
        config: &CsgConfig,
    ) -> Self {
        let eps = config.tolerance;
        let mut wa = WorkingMesh::from_mesh(a, transform_a);
        let mut wb = WorkingMesh::from_mesh(b, transform_b);

        let axis = choose_main_axis(&wa.bounds, &wb.bounds);
        wa.set_main_axis(axis);
        wb.set_main_axis(axis);
        debug!(axis, "main axis chosen");

        let split_stats = [
            split_faces(&mut wa, &wb, eps),
            split_faces(&mut wb, &wa, eps),
            split_faces(&mut wa, &wb, eps),
        ];

        let classify_stats = [
            classify_faces(&mut wa, &wb, config),
            classify_faces(&mut wb, &wa, config),
        ];

        info!(
            faces_a = wa.faces.len(),
            faces_b = wb.faces.len(),
            splits = split_stats.iter().map(|s| s.splits).sum::<usize>(),
            probe_fallbacks = classify_stats[0].fallbacks + classify_stats[1].fallbacks,
            "operands prepared"
        );

        Self {
            a: wa,
            b: wb,
            config: config.clone(),
            smoothing_method: a.smoothing_method,
            material: a.material.clone(),
            split_stats,
            classify_stats,
        }
    }

    /// Attach a material handle to every result
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Result of `op`, simplified with a [`SeamWelder`] when the
    /// configuration asks for it
    pub fn result(&self, op: BooleanOp) -> Mesh {
        if self.config.simplify {
            let welder = SeamWelder::new(self.config.simplify_tolerance);
            self.result_with(op, Some(&welder))
        } else {
            self.result_with(op, None)
        }
    }

    /// Result of `op` with an explicit simplifier. A simplifier error is
    /// logged and the unsimplified mesh returned.
    #[instrument(skip(self, simplifier))]
    pub fn result_with(&self, op: BooleanOp, simplifier: Option<&dyn Simplifier>) -> Mesh {
        let assembly = assemble(&self.a, &self.b, op, self.config.tolerance);
        let mut mesh = assembly.mesh;

        if let Some(simplifier) = simplifier {
            if !assembly.seam_candidates.is_empty() {
                let mut candidate = mesh.clone();
                match simplifier.simplify(&mut candidate, &assembly.seam_candidates) {
                    Ok(()) => mesh = candidate,
                    Err(error) => warn!(%error, "simplification failed, keeping raw result"),
                }
            }
        }

        mesh.smoothing_method = self.smoothing_method;
        mesh.material = self.material.clone();
        debug!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "result assembled"
        );
        mesh
    }

    /// Split operands in the shared world frame
    pub fn operands(&self) -> (&WorkingMesh, &WorkingMesh) {
        (&self.a, &self.b)
    }

    /// Counters of the three split passes, in order
    pub fn split_stats(&self) -> &[SplitStats; 3] {
        &self.split_stats
    }

    /// Classification counters for A and B
    pub fn classify_stats(&self) -> &[ClassifyStats; 2] {
        &self.classify_stats
    }
}

/// Boolean of two meshes already placed in the same frame, with the default
/// configuration
pub fn boolean(a: &Mesh, b: &Mesh, op: BooleanOp) -> Mesh {
    let identity = Matrix4::identity();
    CsgModeller::new(a, &identity, b, &identity, &CsgConfig::default()).result(op)
}

/// Boolean of two placed meshes
pub fn boolean_with(
    a: &Mesh,
    transform_a: &Matrix4<f64>,
    b: &Mesh,
    transform_b: &Matrix4<f64>,
    op: BooleanOp,
    config: &CsgConfig,
) -> Mesh {
    CsgModeller::new(a, transform_a, b, transform_b, config).result(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CsgError;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    struct AlwaysFails;

    impl Simplifier for AlwaysFails {
        fn simplify(&self, _: &mut Mesh, _: &[[usize; 2]]) -> crate::Result<()> {
            Err(CsgError::Simplify("refused".into()))
        }
    }

    fn unit_cube() -> Mesh {
        Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()
    }

    #[test]
    fn test_op_parsing() {
        assert_eq!("union".parse::<BooleanOp>(), Ok(BooleanOp::Union));
        assert_eq!("B-A".parse::<BooleanOp>(), Ok(BooleanOp::ReverseDifference));
        assert!("xor".parse::<BooleanOp>().is_err());
        for op in BooleanOp::ALL {
            assert_eq!(op.to_string().parse::<BooleanOp>(), Ok(op));
        }
    }

    #[test]
    fn test_union_of_overlapping_cubes() {
        let shift = Matrix4::new_translation(&Vector3::new(0.5, 0.0, 0.0));
        let result = boolean_with(
            &unit_cube(),
            &Matrix4::identity(),
            &unit_cube(),
            &shift,
            BooleanOp::Union,
            &CsgConfig::default(),
        );
        assert_relative_eq!(result.volume(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_failing_simplifier_keeps_result() {
        let shift = Matrix4::new_translation(&Vector3::new(0.5, 0.0, 0.0));
        let modeller = CsgModeller::new(
            &unit_cube(),
            &Matrix4::identity(),
            &unit_cube(),
            &shift,
            &CsgConfig::default(),
        );

        let raw = modeller.result_with(BooleanOp::Intersection, None);
        let kept = modeller.result_with(BooleanOp::Intersection, Some(&AlwaysFails));
        assert_eq!(raw.triangle_count(), kept.triangle_count());
        assert_relative_eq!(kept.volume(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_result_carries_material() {
        let shift = Matrix4::new_translation(&Vector3::new(3.0, 0.0, 0.0));
        let modeller = CsgModeller::new(
            &unit_cube(),
            &Matrix4::identity(),
            &unit_cube(),
            &shift,
            &CsgConfig::default(),
        )
        .with_material("steel");

        let result = modeller.result(BooleanOp::Union);
        assert_eq!(result.material.as_deref(), Some("steel"));
        assert_eq!(modeller.split_stats()[0], SplitStats::default());
    }
}
