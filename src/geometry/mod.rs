// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and boolean operations

pub mod analytics;
mod bbox;
pub mod boolean;
pub mod classification;
mod mesh;
pub mod mesh_reconstruction;
pub mod parallel_boolean;
mod primitives;
pub mod robust_predicates;
pub mod simplifier;
pub mod triangle_splitting;
pub mod working_mesh;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use boolean::{boolean, boolean_with, BooleanOp, CsgModeller};
pub use mesh::{Edge, Mesh, SmoothingMethod, Triangle, Vertex};
pub use parallel_boolean::{run_batch, BooleanJob};
pub use primitives::Primitive;
pub use simplifier::{SeamWelder, Simplifier};
pub use working_mesh::Classification;
