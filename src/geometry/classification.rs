// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face classification for CSG operations
//!
//! One probe ray per connected patch decides inside, outside, same or
//! opposite; the result then floods across faces sharing non-boundary
//! vertices.

use super::robust_predicates::{ray_triangle_distance, RayHit};
use super::working_mesh::{Classification, WorkingMesh};
use crate::config::CsgConfig;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Counters for one classification run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// Faces that fired a probe ray
    pub seeds: usize,
    /// Probe rays re-fired after an ambiguous cast
    pub retries: usize,
    /// Seeds that ran out of attempts and fell back to outside
    pub fallbacks: usize,
    /// Faces classified by the flood fill
    pub flooded: usize,
    /// Faces nothing reached, set to outside
    pub unreached: usize,
}

/// Tag every unclassified face of `subject` relative to `other`. Faces
/// already classified keep their tag.
pub fn classify_faces(
    subject: &mut WorkingMesh,
    other: &WorkingMesh,
    config: &CsgConfig,
) -> ClassifyStats {
    let mut stats = ClassifyStats::default();
    let mut rng = StdRng::seed_from_u64(config.rng_seed);
    let adjacency = subject.vertex_faces();

    for seed in 0..subject.faces.len() {
        let face = &subject.faces[seed];
        if face.tag != Classification::Unknown || face.plane.is_degenerate() {
            continue;
        }

        let outcome = probe(subject, seed, other, config, &mut rng);
        stats.seeds += 1;
        stats.retries += outcome.attempts.saturating_sub(1) as usize;
        if outcome.fell_back {
            stats.fallbacks += 1;
        }

        subject.faces[seed].tag = outcome.class;
        stats.flooded += flood_fill(subject, seed, &adjacency);
    }

    for face in &mut subject.faces {
        if face.tag == Classification::Unknown {
            face.tag = Classification::Outside;
            stats.unreached += 1;
        }
    }

    debug!(
        seeds = stats.seeds,
        retries = stats.retries,
        fallbacks = stats.fallbacks,
        flooded = stats.flooded,
        unreached = stats.unreached,
        "classification finished"
    );
    stats
}

/// Spread the class of `seed` to every unknown face reachable through
/// vertices that are not on the boundary. Returns the number of faces
/// tagged.
fn flood_fill(mesh: &mut WorkingMesh, seed: usize, adjacency: &[Vec<usize>]) -> usize {
    let class = mesh.faces[seed].tag;
    let mut tagged = 0;
    let mut stack = vec![seed];

    while let Some(face) = stack.pop() {
        for v in mesh.faces[face].v {
            let vertex = &mut mesh.vertices[v];
            match vertex.tag {
                Classification::Boundary => continue,
                Classification::Unknown => vertex.tag = class,
                tag if tag != class => continue,
                _ => {}
            }

            for &neighbour in &adjacency[v] {
                if mesh.faces[neighbour].tag == Classification::Unknown {
                    mesh.faces[neighbour].tag = class;
                    tagged += 1;
                    stack.push(neighbour);
                }
            }
        }
    }
    tagged
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProbeOutcome {
    class: Classification,
    attempts: u32,
    fell_back: bool,
}

enum Cast {
    Classified(Classification),
    Miss,
    Retry,
}

/// Fire rays from the centroid of `face`, starting along its normal, until
/// one gives an unambiguous answer
fn probe(
    mesh: &WorkingMesh,
    face: usize,
    other: &WorkingMesh,
    config: &CsgConfig,
    rng: &mut StdRng,
) -> ProbeOutcome {
    let eps = config.tolerance;
    let origin = mesh.centroid(face);
    let normal = mesh.faces[face].plane.normal;
    let mut dir = normal;

    for attempt in 1..=config.max_probe_attempts {
        match cast(&origin, &dir, &normal, other, eps) {
            Cast::Classified(class) => {
                return ProbeOutcome {
                    class,
                    attempts: attempt,
                    fell_back: false,
                }
            }
            Cast::Miss => {
                return ProbeOutcome {
                    class: Classification::Outside,
                    attempts: attempt,
                    fell_back: false,
                }
            }
            Cast::Retry => {
                let jitter = Vector3::new(
                    rng.gen_range(-1.0_f64..=1.0),
                    rng.gen_range(-1.0_f64..=1.0),
                    rng.gen_range(-1.0_f64..=1.0),
                ) * config.probe_jitter;
                dir = (jitter - dir).try_normalize(eps).unwrap_or(-dir);
                trace!(face, attempt, "ambiguous probe, retrying");
            }
        }
    }

    ProbeOutcome {
        class: Classification::Outside,
        attempts: config.max_probe_attempts,
        fell_back: true,
    }
}

/// One ray against `other`, keeping the two nearest hits in front of the
/// origin
fn cast(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    normal: &Vector3<f64>,
    other: &WorkingMesh,
    eps: f64,
) -> Cast {
    if other.bounds.ray_distance(origin, dir, eps).is_none() {
        return Cast::Miss;
    }

    let mut nearest: Option<(f64, Classification)> = None;
    let mut second: Option<(f64, Classification)> = None;

    for (g, face) in other.faces.iter().enumerate() {
        if face.bounds.ray_distance(origin, dir, eps).is_none() {
            continue;
        }

        let t = match ray_triangle_distance(origin, dir, other.face_points(g), &face.plane, eps) {
            RayHit::Miss => continue,
            RayHit::Ambiguous => return Cast::Retry,
            RayHit::Hit(t) if t < -eps => continue,
            RayHit::Hit(t) if t <= eps => 0.0,
            RayHit::Hit(t) => t,
        };

        let class = if t == 0.0 {
            if normal.dot(&face.plane.normal) > 0.0 {
                Classification::Same
            } else {
                Classification::Opposite
            }
        } else if dir.dot(&face.plane.normal) > 0.0 {
            Classification::Inside
        } else {
            Classification::Outside
        };

        match nearest {
            Some((best, _)) if t >= best => {
                if second.map_or(true, |(s, _)| t < s) {
                    second = Some((t, class));
                }
            }
            _ => {
                second = nearest;
                nearest = Some((t, class));
            }
        }
    }

    match (nearest, second) {
        (None, _) => Cast::Miss,
        (Some((t0, c0)), Some((t1, c1))) if t1 - t0 <= eps && c0 != c1 => Cast::Retry,
        (Some((_, class)), _) => Cast::Classified(class),
    }
}
