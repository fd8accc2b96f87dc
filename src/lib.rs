// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG
//!
//! Boolean operations (union, intersection and both differences) on closed,
//! consistently oriented triangle meshes. Operands are split against each
//! other, every face is classified relative to the other solid by ray
//! probing, and the surviving faces are stitched into the result with
//! creased seams.

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;

pub use config::CsgConfig;
pub use error::{CsgError, Result};
pub use geometry::{
    analyze, boolean, boolean_with, run_batch, BooleanJob, BooleanOp, BoundingBox,
    Classification, CsgModeller, Edge, GeometryStats, Mesh, Primitive, SeamWelder, Simplifier,
    SmoothingMethod, Triangle, Vertex,
};
pub use io::{read_stl, write_stl};
