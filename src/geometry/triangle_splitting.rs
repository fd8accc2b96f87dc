// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle splitting for CSG operations
//!
//! Cuts the faces of one operand along their intersection with the other so
//! that no face of the subject crosses the interior of a face of the other
//! operand. Vertices landing on the other surface are tagged `Boundary`.

use super::robust_predicates::{
    distance_to_segment, edge_plane_point, sign_of, solve_plane_plane_line,
};
use super::working_mesh::{Classification, WorkingMesh, WorkingVertex};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use tracing::{debug, trace};

/// Times a single face index may be re-split before the scan moves on
const MAX_RESPLITS: usize = 64;

/// Sine of the angle below which two edge directions count as parallel
const PARALLEL_EPS: f64 = 1e-9;

/// Counters for one splitting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub pairs_tested: usize,
    pub splits: usize,
    pub faces_added: usize,
    pub vertices_added: usize,
    /// Faces abandoned after hitting the re-split limit
    pub capped: usize,
}

/// Split `subject` against `other` in place. A no-op when the two bounding
/// boxes are apart by more than `eps`.
pub fn split_faces(subject: &mut WorkingMesh, other: &WorkingMesh, eps: f64) -> SplitStats {
    if !subject.bounds.intersects(&other.bounds, eps) {
        trace!("bounding boxes apart, nothing to split");
        return SplitStats::default();
    }

    let sweep = SweepIndex::new(other);
    let faces_before = subject.faces.len();
    let vertices_before = subject.vertices.len();

    let mut splitter = Splitter {
        mesh: subject,
        other,
        eps,
        edge_cache: AHashMap::new(),
        stats: SplitStats::default(),
    };

    let mut index = 0;
    let mut resplits = 0;
    while index < splitter.mesh.faces.len() {
        if splitter.scan_face(index, &sweep) {
            resplits += 1;
            if resplits < MAX_RESPLITS {
                continue;
            }
            splitter.stats.capped += 1;
        }
        resplits = 0;
        index += 1;
    }

    let mut stats = splitter.stats;
    stats.faces_added = subject.faces.len() - faces_before;
    stats.vertices_added = subject.vertices.len() - vertices_before;
    debug!(
        pairs = stats.pairs_tested,
        splits = stats.splits,
        faces_added = stats.faces_added,
        capped = stats.capped,
        "split pass finished"
    );
    stats
}

/// Faces of the other operand sorted by their max projection on the main
/// axis, with a suffix minimum of min projections for early exit
struct SweepIndex {
    order: Vec<usize>,
    max_proj: Vec<f64>,
    suffix_min: Vec<f64>,
}

impl SweepIndex {
    fn new(mesh: &WorkingMesh) -> Self {
        let mut order: Vec<usize> = (0..mesh.faces.len()).collect();
        order.sort_by(|&a, &b| mesh.faces[a].max_proj.total_cmp(&mesh.faces[b].max_proj));

        let max_proj = order.iter().map(|&i| mesh.faces[i].max_proj).collect();

        let mut suffix_min = vec![f64::INFINITY; order.len()];
        let mut running = f64::INFINITY;
        for k in (0..order.len()).rev() {
            running = running.min(mesh.faces[order[k]].min_proj);
            suffix_min[k] = running;
        }

        Self {
            order,
            max_proj,
            suffix_min,
        }
    }

    /// Faces whose projected extent may overlap `[lo, hi]`
    fn candidates(&self, lo: f64, hi: f64, eps: f64) -> impl Iterator<Item = usize> + '_ {
        let start = self.max_proj.partition_point(|&m| m < lo - eps);
        (start..self.order.len())
            .take_while(move |&k| self.suffix_min[k] <= hi + eps)
            .map(move |k| self.order[k])
    }
}

/// Where a span endpoint sits on its own triangle
#[derive(Debug, Clone, Copy, PartialEq)]
enum SpanKind {
    Vertex(usize),
    /// On edge k, from v_k to v_{k+1}
    Edge(usize),
}

#[derive(Debug, Clone, Copy)]
struct SpanEnd {
    t: f64,
    point: Point3<f64>,
    kind: SpanKind,
}

/// Endpoint of a cut expressed on the face being split
#[derive(Debug, Clone, Copy)]
enum CutPoint {
    Vertex(usize),
    Edge(usize, Point3<f64>),
    Face(Point3<f64>),
}

impl CutPoint {
    fn rank(&self) -> u8 {
        match self {
            CutPoint::Vertex(_) => 0,
            CutPoint::Edge(..) => 1,
            CutPoint::Face(_) => 2,
        }
    }
}

/// Corner of a new triangle: a mesh vertex plus the bitmask of original
/// edges it lies on
#[derive(Debug, Clone, Copy)]
struct Corner {
    v: usize,
    edges: u8,
}

struct Splitter<'a> {
    mesh: &'a mut WorkingMesh,
    other: &'a WorkingMesh,
    eps: f64,
    /// Vertices inserted on each original edge, keyed by sorted endpoints
    edge_cache: AHashMap<(usize, usize), Vec<usize>>,
    stats: SplitStats,
}

fn same_side(signs: &[i8; 3]) -> bool {
    signs[0] != 0 && signs[0] == signs[1] && signs[1] == signs[2]
}

/// Span of a triangle along the line `root + t * dir`, from the signs of its
/// vertices relative to the other plane
fn span_of(
    points: &[Point3<f64>; 3],
    dist: &[f64; 3],
    signs: &[i8; 3],
    root: &Point3<f64>,
    dir: &Vector3<f64>,
) -> Option<[SpanEnd; 2]> {
    let mut ends: Vec<SpanEnd> = Vec::with_capacity(3);
    let param = |p: &Point3<f64>| dir.dot(&(p - root));

    for k in 0..3 {
        if signs[k] == 0 {
            ends.push(SpanEnd {
                t: param(&points[k]),
                point: points[k],
                kind: SpanKind::Vertex(k),
            });
        }
    }
    for k in 0..3 {
        let n = (k + 1) % 3;
        if signs[k] * signs[n] < 0 {
            let point = edge_plane_point(&points[k], &points[n], dist[k], dist[n]);
            ends.push(SpanEnd {
                t: param(&point),
                point,
                kind: SpanKind::Edge(k),
            });
        }
    }

    match ends.as_slice() {
        [single] => Some([*single, *single]),
        [a, b] if a.t <= b.t => Some([*a, *b]),
        [a, b] => Some([*b, *a]),
        _ => None,
    }
}

fn barycentric(p: &Point3<f64>, tri: &[Point3<f64>; 3]) -> [f64; 3] {
    let v0 = tri[1] - tri[0];
    let v1 = tri[2] - tri[0];
    let v2 = p - tri[0];
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f64::MIN_POSITIVE {
        return [1.0 / 3.0; 3];
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    [1.0 - v - w, v, w]
}

impl<'a> Splitter<'a> {
    /// Test face `f` against every candidate; true when it was split
    fn scan_face(&mut self, f: usize, sweep: &SweepIndex) -> bool {
        let eps = self.eps;
        let face = &self.mesh.faces[f];
        if face.plane.is_degenerate() || !face.bounds.intersects(&self.other.bounds, eps) {
            return false;
        }

        let (lo, hi) = (face.min_proj, face.max_proj);
        for g in sweep.candidates(lo, hi, eps) {
            if !self.mesh.faces[f]
                .bounds
                .intersects(&self.other.faces[g].bounds, eps)
            {
                continue;
            }
            self.stats.pairs_tested += 1;
            if self.intersect_pair(f, g) {
                self.stats.splits += 1;
                return true;
            }
        }
        false
    }

    fn points(&self, f: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.mesh.face_points(f);
        [*a, *b, *c]
    }

    fn tag_boundary(&mut self, vertex: usize) {
        self.mesh.vertices[vertex].tag = Classification::Boundary;
    }

    fn intersect_pair(&mut self, f: usize, g: usize) -> bool {
        let eps = self.eps;
        let f_plane = self.mesh.faces[f].plane;
        let g_plane = self.other.faces[g].plane;
        if g_plane.is_degenerate() {
            return false;
        }

        let fp = self.points(f);
        let gp = {
            let [a, b, c] = self.other.face_points(g);
            [*a, *b, *c]
        };

        let dg = gp.map(|p| f_plane.signed_distance(&p));
        let sg = dg.map(|d| sign_of(d, eps));
        if same_side(&sg) {
            return false;
        }

        let df = fp.map(|p| g_plane.signed_distance(&p));
        let sf = df.map(|d| sign_of(d, eps));
        if same_side(&sf) {
            return false;
        }

        if sf == [0; 3] {
            return self.split_coplanar(f, g, &fp);
        }

        let Some(dir) = f_plane.normal.cross(&g_plane.normal).try_normalize(eps) else {
            return false;
        };
        let Some(root) = solve_plane_plane_line(&f_plane, &g_plane, &dir) else {
            return false;
        };
        let (Some(span_f), Some(span_g)) = (
            span_of(&fp, &df, &sf, &root, &dir),
            span_of(&gp, &dg, &sg, &root, &dir),
        ) else {
            return false;
        };

        // Ties within eps go to the subject's own endpoint
        let (lo, lo_from_f) = if span_f[0].t >= span_g[0].t - eps {
            (span_f[0], true)
        } else {
            (span_g[0], false)
        };
        let (hi, hi_from_f) = if span_f[1].t <= span_g[1].t + eps {
            (span_f[1], true)
        } else {
            (span_g[1], false)
        };

        if hi.t < lo.t - eps {
            return false;
        }

        if hi.t - lo.t <= eps {
            // Point-on-edge touch: the meshes meet at a single point
            self.tag_touch(f, &fp, &lo, lo_from_f);
            self.tag_touch(f, &fp, &hi, hi_from_f);
            return false;
        }

        let edge_on_line = match (span_f[0].kind, span_f[1].kind) {
            (SpanKind::Vertex(i), SpanKind::Vertex(j)) if i != j => Some((i, j)),
            _ => None,
        };
        let a = self.locate(&fp, &lo, lo_from_f, edge_on_line);
        let b = self.locate(&fp, &hi, hi_from_f, edge_on_line);

        for cut in [a, b] {
            if let CutPoint::Vertex(k) = cut {
                let vertex = self.mesh.faces[f].v[k];
                self.tag_boundary(vertex);
            }
        }

        self.split_one_face(f, a, b)
    }

    fn tag_touch(&mut self, f: usize, fp: &[Point3<f64>; 3], end: &SpanEnd, from_f: bool) {
        match (from_f, end.kind) {
            (true, SpanKind::Vertex(k)) => {
                let vertex = self.mesh.faces[f].v[k];
                self.tag_boundary(vertex);
            }
            (true, SpanKind::Edge(_)) => {}
            (false, _) => {
                for k in 0..3 {
                    if (fp[k] - end.point).norm() <= self.eps {
                        let vertex = self.mesh.faces[f].v[k];
                        self.tag_boundary(vertex);
                    }
                }
            }
        }
    }

    /// Express a span endpoint as a location on face `f`
    fn locate(
        &self,
        fp: &[Point3<f64>; 3],
        end: &SpanEnd,
        from_f: bool,
        edge_on_line: Option<(usize, usize)>,
    ) -> CutPoint {
        if from_f {
            return match end.kind {
                SpanKind::Vertex(k) => CutPoint::Vertex(k),
                SpanKind::Edge(k) => CutPoint::Edge(k, end.point),
            };
        }

        let eps = self.eps;
        if let Some(k) = (0..3).find(|&k| (fp[k] - end.point).norm() <= eps) {
            return CutPoint::Vertex(k);
        }

        let project = |k: usize| {
            let (a, b) = (fp[k], fp[(k + 1) % 3]);
            let (_, t) = distance_to_segment(&end.point, &a, &b);
            a + (b - a) * t
        };

        if let Some((i, j)) = edge_on_line {
            let edge = if j == (i + 1) % 3 { i } else { j };
            return CutPoint::Edge(edge, project(edge));
        }

        for k in 0..3 {
            let (distance, _) = distance_to_segment(&end.point, &fp[k], &fp[(k + 1) % 3]);
            if distance <= eps {
                return CutPoint::Edge(k, project(k));
            }
        }
        CutPoint::Face(end.point)
    }

    fn same_location(&self, a: &CutPoint, b: &CutPoint) -> bool {
        match (a, b) {
            (CutPoint::Vertex(i), CutPoint::Vertex(j)) => i == j,
            (CutPoint::Edge(_, p) | CutPoint::Face(p), CutPoint::Edge(_, q) | CutPoint::Face(q)) => {
                (p - q).norm() <= self.eps
            }
            _ => false,
        }
    }

    /// Replace face `f` with the fan of triangles the cut from `a` to `b`
    /// requires. Returns false when the cut runs along existing edges.
    fn split_one_face(&mut self, f: usize, a: CutPoint, b: CutPoint) -> bool {
        if self.same_location(&a, &b) {
            return false;
        }
        let (a, b) = if a.rank() <= b.rank() { (a, b) } else { (b, a) };

        match (a, b) {
            (CutPoint::Vertex(_), CutPoint::Vertex(_)) => false,
            (CutPoint::Vertex(i), CutPoint::Edge(j, q)) => {
                if j == (i + 1) % 3 {
                    let q = self.edge_corner(f, j, &q);
                    let (vi, vn, vp) = (self.corner(f, i), self.corner(f, j), self.corner(f, (j + 1) % 3));
                    self.emit(f, &[[vi, vn, q], [vi, q, vp]])
                } else {
                    self.split_edge(f, j, &q)
                }
            }
            (CutPoint::Vertex(_), CutPoint::Face(p)) => {
                let p = self.face_corner(f, &p);
                let c = [self.corner(f, 0), self.corner(f, 1), self.corner(f, 2)];
                self.emit(f, &[[c[0], c[1], p], [c[1], c[2], p], [c[2], c[0], p]])
            }
            (CutPoint::Edge(i, q1), CutPoint::Edge(j, q2)) if i == j => {
                let p0 = self.mesh.vertices[self.mesh.faces[f].v[i]].position;
                let (q1, q2) = if (q2 - p0).norm() < (q1 - p0).norm() {
                    (q2, q1)
                } else {
                    (q1, q2)
                };
                let r1 = self.edge_corner(f, i, &q1);
                let r2 = self.edge_corner(f, i, &q2);
                let (vi, vn, vo) = (
                    self.corner(f, i),
                    self.corner(f, (i + 1) % 3),
                    self.corner(f, (i + 2) % 3),
                );
                self.emit(f, &[[vi, r1, vo], [r1, r2, vo], [r2, vn, vo]])
            }
            (CutPoint::Edge(i, q1), CutPoint::Edge(j, q2)) => {
                // k is the corner shared by both cut edges
                let (k, into, out) = if j == (i + 1) % 3 {
                    (j, (i, q1), (j, q2))
                } else {
                    (i, (j, q2), (i, q1))
                };
                let r_in = self.edge_corner(f, into.0, &into.1);
                let r_out = self.edge_corner(f, out.0, &out.1);
                let (c, next, prev) = (
                    self.corner(f, k),
                    self.corner(f, (k + 1) % 3),
                    self.corner(f, (k + 2) % 3),
                );
                self.emit(f, &[[r_in, c, r_out], [prev, r_in, r_out], [prev, r_out, next]])
            }
            (CutPoint::Edge(j, q), CutPoint::Face(p)) => {
                let q = self.edge_corner(f, j, &q);
                let p = self.face_corner(f, &p);
                let (v0, v1, v2) = (
                    self.corner(f, j),
                    self.corner(f, (j + 1) % 3),
                    self.corner(f, (j + 2) % 3),
                );
                self.emit(f, &[[v0, q, p], [q, v1, p], [v1, v2, p], [v2, v0, p]])
            }
            (CutPoint::Face(p), CutPoint::Face(_)) => {
                // Fan at the first point; the rescan finishes the cut
                let p = self.face_corner(f, &p);
                let c = [self.corner(f, 0), self.corner(f, 1), self.corner(f, 2)];
                self.emit(f, &[[c[0], c[1], p], [c[1], c[2], p], [c[2], c[0], p]])
            }
            _ => false,
        }
    }

    fn split_edge(&mut self, f: usize, j: usize, q: &Point3<f64>) -> bool {
        let q = self.edge_corner(f, j, q);
        let (v0, v1, v2) = (
            self.corner(f, j),
            self.corner(f, (j + 1) % 3),
            self.corner(f, (j + 2) % 3),
        );
        self.emit(f, &[[v0, q, v2], [q, v1, v2]])
    }

    fn corner(&self, f: usize, k: usize) -> Corner {
        Corner {
            v: self.mesh.faces[f].v[k],
            edges: (1 << k) | (1 << ((k + 2) % 3)),
        }
    }

    /// Vertex on edge `j` of face `f`, reusing one already inserted there
    fn edge_corner(&mut self, f: usize, j: usize, point: &Point3<f64>) -> Corner {
        let a = self.mesh.faces[f].v[j];
        let b = self.mesh.faces[f].v[(j + 1) % 3];
        let key = (a.min(b), a.max(b));
        let eps = self.eps;

        let existing = self.edge_cache.get(&key).and_then(|list| {
            list.iter()
                .copied()
                .find(|&v| (self.mesh.vertices[v].position - point).norm() <= eps)
        });

        let v = match existing {
            Some(v) => v,
            None => {
                let pa = self.mesh.vertices[a].position;
                let pb = self.mesh.vertices[b].position;
                let length = (pb - pa).norm();
                let t = if length > 0.0 {
                    ((point - pa).norm() / length).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let vertex = self.interpolate(*point, &[(a, 1.0 - t), (b, t)]);
                let v = self.mesh.add_vertex(vertex);
                self.edge_cache.entry(key).or_default().push(v);
                v
            }
        };

        Corner { v, edges: 1 << j }
    }

    fn face_corner(&mut self, f: usize, point: &Point3<f64>) -> Corner {
        let weights = barycentric(point, &self.points(f));
        let [a, b, c] = self.mesh.faces[f].v;
        let vertex = self.interpolate(*point, &[(a, weights[0]), (b, weights[1]), (c, weights[2])]);
        Corner {
            v: self.mesh.add_vertex(vertex),
            edges: 0,
        }
    }

    /// New boundary vertex whose smoothness and parameters blend the
    /// weighted sources
    fn interpolate(&self, position: Point3<f64>, sources: &[(usize, f64)]) -> WorkingVertex {
        let smoothness = sources
            .iter()
            .map(|&(v, w)| self.mesh.vertices[v].smoothness * w)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let params = sources
            .iter()
            .map(|&(v, w)| self.mesh.vertices[v].params.as_ref().map(|p| (p, w)))
            .collect::<Option<Vec<_>>>()
            .filter(|list| list.windows(2).all(|pair| pair[0].0.len() == pair[1].0.len()))
            .map(|list| {
                let len = list[0].0.len();
                (0..len)
                    .map(|i| list.iter().map(|(p, w)| p[i] * w).sum::<f64>())
                    .collect()
            });

        WorkingVertex {
            position,
            smoothness,
            params,
            tag: Classification::Boundary,
        }
    }

    /// Replace face `f` with the first triangle and append the rest,
    /// carrying crease smoothness over edges that lie on the original ones
    fn emit(&mut self, f: usize, triangles: &[[Corner; 3]]) -> bool {
        if triangles
            .iter()
            .any(|t| t[0].v == t[1].v || t[1].v == t[2].v || t[0].v == t[2].v)
        {
            trace!(face = f, "split would produce a degenerate triangle, skipped");
            return false;
        }

        let original = self.mesh.faces[f].smoothness;
        let tag = self.mesh.faces[f].tag;
        let crease = |a: &Corner, b: &Corner| {
            let shared = a.edges & b.edges;
            if shared == 0 {
                1.0
            } else {
                original[shared.trailing_zeros() as usize]
            }
        };

        for (n, t) in triangles.iter().enumerate() {
            let v = [t[0].v, t[1].v, t[2].v];
            let smoothness = [crease(&t[0], &t[1]), crease(&t[1], &t[2]), crease(&t[2], &t[0])];
            if n == 0 {
                self.mesh.replace_face(f, v, smoothness);
            } else {
                self.mesh.push_face(v, smoothness, tag);
            }
        }
        true
    }

    /// Coplanar pair: split an edge of `f` where a boundary vertex of `g`
    /// sits strictly inside it and a `g` edge runs along it
    fn split_coplanar(&mut self, f: usize, g: usize, fp: &[Point3<f64>; 3]) -> bool {
        let eps = self.eps;
        let g_vertices = self.other.faces[g].v;

        for k in 0..3 {
            let (pa, pb) = (fp[k], fp[(k + 1) % 3]);
            let Some(edge_dir) = (pb - pa).try_normalize(eps) else {
                continue;
            };

            for gi in 0..3 {
                let vertex = &self.other.vertices[g_vertices[gi]];
                if vertex.tag != Classification::Boundary {
                    continue;
                }
                let q = vertex.position;
                let (distance, t) = distance_to_segment(&q, &pa, &pb);
                if distance > eps || (q - pa).norm() <= eps || (q - pb).norm() <= eps {
                    continue;
                }

                let aligned = [(gi + 1) % 3, (gi + 2) % 3].iter().any(|&o| {
                    let towards = self.other.vertices[g_vertices[o]].position - q;
                    towards
                        .try_normalize(eps)
                        .is_some_and(|d| d.cross(&edge_dir).norm() < PARALLEL_EPS)
                });

                if aligned {
                    let point = pa + (pb - pa) * t;
                    return self.split_edge(f, k, &point);
                }
            }
        }
        false
    }
}
