//! Geometry primitives for region polygons.
//!
//! Pure functions over vertex lists: tolerance-aware comparisons, area and
//! orientation, vertex cleanup, adjacency detection (shared boundary edges or
//! overlapping interiors) and polygon union.
//!
//! Polygons are closed implicitly: the last vertex connects to the first.

use cavalier_contours::polyline::{
    BooleanOp, BooleanResult, PlineSource, PlineSourceMut, PlineVertex, Polyline,
};
use mapkit_core::Point;

/// Tolerance used when no grid is available.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Returns true if two points coincide within `tolerance` on both axes.
pub fn points_equal(a: &Point, b: &Point, tolerance: f64) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
}

/// Axis-aligned bounding box of a vertex list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Computes the bounds of `vertices`, or `None` for an empty list.
    pub fn from_points(vertices: &[Point]) -> Option<Self> {
        let first = vertices.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &vertices[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    /// Returns true if the boxes touch or overlap, growing both by `tolerance`.
    pub fn intersects(&self, other: &Bounds, tolerance: f64) -> bool {
        !(self.max_x + tolerance < other.min_x
            || other.max_x + tolerance < self.min_x
            || self.max_y + tolerance < other.min_y
            || other.max_y + tolerance < self.min_y)
    }
}

fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Signed area of a polygon (shoelace). Positive for counter-clockwise order.
pub fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        twice_area += a.x * b.y - b.x * a.y;
    }
    twice_area / 2.0
}

/// Unsigned area of a polygon.
pub fn polygon_area(vertices: &[Point]) -> f64 {
    signed_area(vertices).abs()
}

pub fn is_counter_clockwise(vertices: &[Point]) -> bool {
    signed_area(vertices) > 0.0
}

/// Reorders `vertices` counter-clockwise, keeping the first vertex in place.
pub fn ensure_counter_clockwise(mut vertices: Vec<Point>) -> Vec<Point> {
    if signed_area(&vertices) < 0.0 {
        vertices[1..].reverse();
    }
    vertices
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Returns true if `cur` lies on the line through `prev` and `next`.
fn is_collinear(prev: &Point, cur: &Point, next: &Point, tolerance: f64) -> bool {
    let base = prev.distance_to(next);
    if base <= tolerance {
        // zero-width spike
        return true;
    }
    (cross(prev, next, cur) / base).abs() <= tolerance
}

/// Removes duplicate, closing-duplicate and collinear vertices.
///
/// The result may have fewer than three vertices when the input was
/// degenerate; callers decide whether that is an error.
pub fn clean_polygon_vertices(vertices: &[Point], tolerance: f64) -> Vec<Point> {
    let mut cleaned: Vec<Point> = Vec::with_capacity(vertices.len());
    for p in vertices {
        if cleaned.last().is_some_and(|last| points_equal(last, p, tolerance)) {
            continue;
        }
        cleaned.push(*p);
    }
    while cleaned.len() > 1 && points_equal(&cleaned[0], &cleaned[cleaned.len() - 1], tolerance) {
        cleaned.pop();
    }

    let mut changed = true;
    while changed && cleaned.len() >= 3 {
        changed = false;
        let n = cleaned.len();
        for i in 0..n {
            let prev = cleaned[(i + n - 1) % n];
            let next = cleaned[(i + 1) % n];
            if is_collinear(&prev, &cleaned[i], &next, tolerance) {
                cleaned.remove(i);
                changed = true;
                break;
            }
        }
    }
    cleaned
}

/// A boundary stretch shared by two polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedEdge {
    /// Index of the start vertex of the shared edge in the first polygon.
    pub edge_a: usize,
    /// Index of the start vertex of the shared edge in the second polygon.
    pub edge_b: usize,
    /// Length of the common stretch.
    pub length: f64,
}

/// Length over which segment `b1`-`b2` runs along segment `a1`-`a2`.
fn collinear_overlap(a1: &Point, a2: &Point, b1: &Point, b2: &Point, tolerance: f64) -> f64 {
    let len = a1.distance_to(a2);
    if len <= tolerance {
        return 0.0;
    }
    if (cross(a1, a2, b1) / len).abs() > tolerance || (cross(a1, a2, b2) / len).abs() > tolerance {
        return 0.0;
    }
    let (ux, uy) = ((a2.x - a1.x) / len, (a2.y - a1.y) / len);
    let t1 = (b1.x - a1.x) * ux + (b1.y - a1.y) * uy;
    let t2 = (b2.x - a1.x) * ux + (b2.y - a1.y) * uy;
    let start = t1.min(t2).max(0.0);
    let end = t1.max(t2).min(len);
    (end - start).max(0.0)
}

/// Finds a boundary edge the two polygons have in common.
///
/// Edges count as shared when they are collinear within `tolerance` and run
/// alongside each other for more than `tolerance`. Polygons that only touch
/// at a vertex share no edge.
pub fn find_shared_edge(a: &[Point], b: &[Point], tolerance: f64) -> Option<SharedEdge> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }
    for i in 0..a.len() {
        let (a1, a2) = (&a[i], &a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            let (b1, b2) = (&b[j], &b[(j + 1) % b.len()]);
            let length = collinear_overlap(a1, a2, b1, b2, tolerance);
            if length > tolerance {
                return Some(SharedEdge {
                    edge_a: i,
                    edge_b: j,
                    length,
                });
            }
        }
    }
    None
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: &Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (&vertices[i], &vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Returns true if `p` is inside the polygon and farther than `tolerance`
/// from its boundary.
fn strictly_inside(p: &Point, vertices: &[Point], tolerance: f64) -> bool {
    if !point_in_polygon(p, vertices) {
        return false;
    }
    let n = vertices.len();
    (0..n).all(|i| distance_to_segment(p, &vertices[i], &vertices[(i + 1) % n]) > tolerance)
}

/// Returns true if the segments cross at a point interior to both.
fn segments_cross(a1: &Point, a2: &Point, b1: &Point, b2: &Point, tolerance: f64) -> bool {
    let len_a = a1.distance_to(a2);
    let len_b = b1.distance_to(b2);
    if len_a <= tolerance || len_b <= tolerance {
        return false;
    }
    let d1 = cross(a1, a2, b1) / len_a;
    let d2 = cross(a1, a2, b2) / len_a;
    let d3 = cross(b1, b2, a1) / len_b;
    let d4 = cross(b1, b2, a2) / len_b;
    let strict = |d: f64| d.abs() > tolerance;
    strict(d1)
        && strict(d2)
        && strict(d3)
        && strict(d4)
        && (d1 > 0.0) != (d2 > 0.0)
        && (d3 > 0.0) != (d4 > 0.0)
}

fn centroid(vertices: &[Point]) -> Point {
    let n = vertices.len() as f64;
    let (sx, sy) = vertices
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Returns true if the interiors of the two polygons intersect.
pub fn polygons_overlap(a: &[Point], b: &[Point], tolerance: f64) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    let (Some(ba), Some(bb)) = (Bounds::from_points(a), Bounds::from_points(b)) else {
        return false;
    };
    if !ba.intersects(&bb, -tolerance) {
        return false;
    }

    for i in 0..a.len() {
        let (a1, a2) = (&a[i], &a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            if segments_cross(a1, a2, &b[j], &b[(j + 1) % b.len()], tolerance) {
                return true;
            }
        }
    }

    let samples = |poly: &[Point]| -> Vec<Point> {
        let n = poly.len();
        let mut points = poly.to_vec();
        points.extend((0..n).map(|i| {
            let (p, q) = (&poly[i], &poly[(i + 1) % n]);
            Point::new((p.x + q.x) / 2.0, (p.y + q.y) / 2.0)
        }));
        points.push(centroid(poly));
        points
    };

    samples(a).iter().any(|p| strictly_inside(p, b, tolerance))
        || samples(b).iter().any(|p| strictly_inside(p, a, tolerance))
}

/// Returns true if the polygons share a boundary edge or overlap.
pub fn polygons_adjacent(a: &[Point], b: &[Point], tolerance: f64) -> bool {
    find_shared_edge(a, b, tolerance).is_some() || polygons_overlap(a, b, tolerance)
}

fn to_polyline(vertices: &[Point]) -> Polyline<f64> {
    let mut pline = Polyline::new();
    for p in vertices {
        pline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    pline.set_is_closed(true);
    pline
}

fn from_polyline(pline: &Polyline<f64>) -> Vec<Point> {
    (0..pline.vertex_count())
        .map(|i| {
            let v = pline.at(i);
            Point::new(v.x, v.y)
        })
        .collect()
}

/// Splits every edge of `ring` at the vertices of `other` that lie on it.
fn split_edges_at(ring: &[Point], other: &[Point], tolerance: f64) -> Vec<Point> {
    let n = ring.len();
    let mut out = Vec::with_capacity(n + other.len());
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        out.push(a);
        let len = a.distance_to(&b);
        if len <= tolerance {
            continue;
        }
        let mut on_edge: Vec<(f64, Point)> = other
            .iter()
            .filter(|p| {
                !points_equal(p, &a, tolerance)
                    && !points_equal(p, &b, tolerance)
                    && distance_to_segment(p, &a, &b) <= tolerance
            })
            .map(|p| (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len, *p))
            .collect();
        on_edge.sort_by(|l, r| l.0.total_cmp(&r.0));
        out.extend(on_edge.into_iter().map(|(_, p)| p));
    }
    out
}

/// Joins two counter-clockwise rings that touch along boundary edges.
///
/// Edges walked in opposite directions by the two rings are interior to the
/// union and cancel out; the remaining edges are chained back into rings.
/// Returns `None` unless exactly one outer ring is left.
fn stitch_union(a: &[Point], b: &[Point], tolerance: f64) -> Option<Vec<Point>> {
    let edges_of = |ring: &[Point]| -> Vec<(Point, Point)> {
        let n = ring.len();
        (0..n).map(|i| (ring[i], ring[(i + 1) % n])).collect()
    };
    let mut edges = edges_of(&split_edges_at(a, b, tolerance));
    edges.extend(edges_of(&split_edges_at(b, a, tolerance)));

    let mut keep = vec![true; edges.len()];
    for i in 0..edges.len() {
        if !keep[i] {
            continue;
        }
        let (p, q) = edges[i];
        let twin = (i + 1..edges.len()).find(|&j| {
            keep[j]
                && points_equal(&edges[j].0, &q, tolerance)
                && points_equal(&edges[j].1, &p, tolerance)
        });
        if let Some(j) = twin {
            keep[i] = false;
            keep[j] = false;
        }
    }
    let mut remaining: Vec<(Point, Point)> = edges
        .into_iter()
        .zip(keep)
        .filter_map(|(edge, kept)| kept.then_some(edge))
        .collect();

    let mut outer: Option<Vec<Point>> = None;
    while !remaining.is_empty() {
        let (start, mut end) = remaining.remove(0);
        let mut ring = vec![start];
        while !points_equal(&end, &start, tolerance) {
            let next = remaining
                .iter()
                .position(|(p, _)| points_equal(p, &end, tolerance))?;
            let (p, q) = remaining.remove(next);
            ring.push(p);
            end = q;
        }
        if signed_area(&ring) > tolerance * tolerance {
            if outer.is_some() {
                tracing::debug!("Stitched union left more than one outer ring");
                return None;
            }
            outer = Some(ring);
        } else {
            tracing::debug!(vertices = ring.len(), "Dropping hole from stitched union");
        }
    }
    outer
}

/// Unions two counter-clockwise rings whose interiors overlap.
fn overlap_union(a: &[Point], b: &[Point]) -> Option<Vec<Point>> {
    let result: BooleanResult<Polyline<f64>> =
        to_polyline(a).boolean(&to_polyline(b), BooleanOp::Or);
    if result.pos_plines.len() != 1 {
        tracing::debug!(
            pieces = result.pos_plines.len(),
            "Union did not produce a single polygon"
        );
        return None;
    }
    if !result.neg_plines.is_empty() {
        tracing::debug!(holes = result.neg_plines.len(), "Dropping holes from union");
    }
    let piece = result.pos_plines.into_iter().next()?;
    Some(from_polyline(&piece.pline))
}

/// Unions a set of polygons into a single polygon.
///
/// Polygons are folded in order. Overlapping pairs go through a polyline
/// boolean; pairs that only share boundary edges are stitched along those
/// edges. The result is cleaned of redundant vertices and ordered
/// counter-clockwise. Interior holes are dropped since regions have a single
/// boundary. Returns `None` when the inputs do not union into one connected
/// polygon.
pub fn merge_polygons(polygons: &[Vec<Point>], tolerance: f64) -> Option<Vec<Point>> {
    let mut rings = polygons
        .iter()
        .map(|p| clean_polygon_vertices(p, tolerance))
        .filter(|p| p.len() >= 3)
        .map(ensure_counter_clockwise);

    let mut merged = rings.next()?;
    for ring in rings {
        let joined = if polygons_overlap(&merged, &ring, tolerance) {
            overlap_union(&merged, &ring)?
        } else {
            stitch_union(&merged, &ring, tolerance)?
        };
        merged = clean_polygon_vertices(&joined, tolerance);
        if merged.len() < 3 {
            return None;
        }
        merged = ensure_counter_clockwise(merged);
    }

    Some(merged)
}

/// Outcome of cutting one polygon with another.
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    /// The clipper does not reach into the polygon's interior.
    Untouched,
    /// The clipper covers the whole polygon.
    Covered,
    /// The remaining pieces, each cleaned and counter-clockwise.
    Pieces(Vec<Vec<Point>>),
    /// The clipper lies strictly inside and would punch a hole.
    Hole,
}

/// Subtracts `clipper` from `polygon`.
pub fn subtract_polygon(polygon: &[Point], clipper: &[Point], tolerance: f64) -> Difference {
    let subject = ensure_counter_clockwise(clean_polygon_vertices(polygon, tolerance));
    let cutter = ensure_counter_clockwise(clean_polygon_vertices(clipper, tolerance));
    if subject.len() < 3 || cutter.len() < 3 || !polygons_overlap(&subject, &cutter, tolerance) {
        return Difference::Untouched;
    }

    let result: BooleanResult<Polyline<f64>> =
        to_polyline(&subject).boolean(&to_polyline(&cutter), BooleanOp::Not);
    if !result.neg_plines.is_empty() {
        return Difference::Hole;
    }
    let pieces: Vec<Vec<Point>> = result
        .pos_plines
        .iter()
        .map(|piece| clean_polygon_vertices(&from_polyline(&piece.pline), tolerance))
        .filter(|piece| piece.len() >= 3 && polygon_area(piece) > tolerance * tolerance)
        .map(ensure_counter_clockwise)
        .collect();
    if pieces.is_empty() {
        Difference::Covered
    } else {
        Difference::Pieces(pieces)
    }
}
