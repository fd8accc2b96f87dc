// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the fallible edges of the crate
//!
//! The boolean pipeline itself never fails; these cover mesh construction
//! from raw buffers, configuration loading, file I/O and the simplifier.

use thiserror::Error;

/// Errors produced outside the boolean pipeline proper
#[derive(Debug, Error)]
pub enum CsgError {
    #[error("invalid mesh: {reason}")]
    InvalidMesh { reason: String },

    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error("face {face} repeats a vertex")]
    DegenerateFace { face: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("simplification failed: {0}")]
    Simplify(String),
}

pub type Result<T> = std::result::Result<T, CsgError>;
