//! Sweep-hull Delaunay triangulation over unordered point sets
//!
//! Incremental construction on flat coordinate buffers: pick a seed triangle
//! near the bounding-box center, sort the remaining points by distance to its
//! circumcenter, then insert each point by locating a visible edge of the
//! advancing convex hull through an angular hash and fanning triangles out,
//! legalizing after every insertion. All triangles come out counter-clockwise.
//!
//! The output stays in index-buffer form (`triangles`, `halfedges`, `hull`);
//! [`DualGraph::from_point_set`](crate::dualgraph::DualGraph::from_point_set)
//! lifts it into the half-edge arena when graph traversal is needed.

use crate::config::BuildOptions;
use crate::point::Point;
use crate::predicates::{circumcenter, circumradius2, in_circumcircle, orientation};

/// Sentinel for "no adjacent half-edge" (hull boundary)
pub const EMPTY: usize = usize::MAX;

/// Capacity of the legalization stack; covers the flip cascades seen on
/// heavily cocircular inputs
const EDGE_STACK_CAP: usize = 512;

/// Next half-edge within the same triangle
#[inline]
pub fn next_halfedge(i: usize) -> usize {
    if i % 3 == 2 {
        i - 2
    } else {
        i + 1
    }
}

/// Previous half-edge within the same triangle
#[inline]
pub fn prev_halfedge(i: usize) -> usize {
    if i % 3 == 0 {
        i + 2
    } else {
        i - 1
    }
}

/// Flat-buffer result of the point-set triangulation
#[derive(Debug, Clone)]
pub struct SweepHull {
    /// Point indices, one triple per counter-clockwise triangle
    pub triangles: Vec<usize>,
    /// For the half-edge starting at `triangles[i]`: index of the opposite
    /// half-edge in the adjacent triangle, or [`EMPTY`] on the hull
    pub halfedges: Vec<usize>,
    /// Indices of the convex hull points, counter-clockwise
    pub hull: Vec<usize>,
}

impl SweepHull {
    /// Number of triangles
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Triangulate an unordered planar point set
///
/// Collinear input (no seed triangle with a finite circumradius exists)
/// short-circuits: the points are ordered along their dominant axis and
/// returned as a degenerate hull with zero triangles.
pub fn sweep_hull(points: &[Point], options: &BuildOptions) -> SweepHull {
    let Some((i0, i1, i2)) = find_seed_triangle(points) else {
        return collinear_fallback(points, options);
    };

    let n = points.len();
    let center = circumcenter(&points[i0], &points[i1], &points[i2]);
    let max_triangles = 2 * n - 5;

    let mut state = Sweep {
        triangles: Vec::with_capacity(max_triangles * 3),
        halfedges: Vec::with_capacity(max_triangles * 3),
    };
    state.add_triangle(i0, i1, i2, EMPTY, EMPTY, EMPTY);

    // insertion order is distance from the seed circumcenter, not input
    // order; this keeps the advancing hull numerically stable
    let mut dists: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, center.dist2(p)))
        .collect();
    dists.sort_unstable_by(|&(_, da), &(_, db)| da.total_cmp(&db));

    let mut hull = Hull::new(n, center, i0, i1, i2, points);

    for (k, &(i, _)) in dists.iter().enumerate() {
        let p = &points[i];

        // skip near-duplicates of the previously processed point
        if k > 0 && p.nearly_equals(&points[dists[k - 1].0], options.duplicate_epsilon) {
            continue;
        }
        // skip seed triangle points
        if i == i0 || i == i1 || i == i2 {
            continue;
        }

        let (mut e, walk_back) = hull.find_visible_edge(p, points);
        if e == EMPTY {
            continue; // likely a near-duplicate; nothing is visible
        }

        // first triangle from the new point
        let t = state.add_triangle(e, i, hull.next(e), EMPTY, EMPTY, hull.out(e));

        let out = state.legalize(t + 2, points, &mut hull);
        hull.set_out(i, out);
        hull.set_out(e, t);

        // walk forward along the hull, fanning triangles while the point
        // stays outside the next edge
        let mut next = hull.next(e);
        loop {
            let q = hull.next(next);
            if !edge_visible(p, &points[next], &points[q]) {
                break;
            }
            let t = state.add_triangle(next, i, q, hull.out(i), EMPTY, hull.out(next));
            let out = state.legalize(t + 2, points, &mut hull);
            hull.set_out(i, out);
            hull.remove(next);
            next = q;
        }

        // walk backward from the other side
        if walk_back {
            loop {
                let q = hull.prev(e);
                if !edge_visible(p, &points[q], &points[e]) {
                    break;
                }
                let t = state.add_triangle(q, i, e, EMPTY, hull.out(e), hull.out(q));
                state.legalize(t + 2, points, &mut hull);
                hull.set_out(q, t);
                hull.remove(e);
                e = q;
            }
        }

        hull.set_prev(i, e);
        hull.set_next(i, next);
        hull.set_prev(next, i);
        hull.set_next(e, i);
        hull.start = e;

        hull.hash_edge(p, i);
        hull.hash_edge(&points[e], e);
    }

    let mut hull_indices = Vec::new();
    let mut e = hull.start;
    loop {
        hull_indices.push(e);
        e = hull.next(e);
        if e == hull.start {
            break;
        }
    }

    state.triangles.shrink_to_fit();
    state.halfedges.shrink_to_fit();

    SweepHull {
        triangles: state.triangles,
        halfedges: state.halfedges,
        hull: hull_indices,
    }
}

/// Whether hull edge `a -> b` faces point `p`
///
/// The hull winds counter-clockwise, so an edge is visible from outside when
/// the turn `p -> a -> b` is strictly clockwise.
#[inline]
fn edge_visible(p: &Point, a: &Point, b: &Point) -> bool {
    orientation(p, a, b) < 0.0
}

struct Sweep {
    triangles: Vec<usize>,
    halfedges: Vec<usize>,
}

impl Sweep {
    fn add_triangle(&mut self, i0: usize, i1: usize, i2: usize, a: usize, b: usize, c: usize) -> usize {
        let t = self.triangles.len();

        self.triangles.push(i0);
        self.triangles.push(i1);
        self.triangles.push(i2);

        self.halfedges.push(a);
        self.halfedges.push(b);
        self.halfedges.push(c);

        self.link(a, t);
        self.link(b, t + 1);
        self.link(c, t + 2);
        t
    }

    #[inline]
    fn link(&mut self, edge: usize, twin: usize) {
        if edge != EMPTY {
            self.halfedges[edge] = twin;
        }
    }

    /// Restore the Delaunay condition around half-edge `a` by iterative
    /// flipping, using an explicit bounded stack instead of recursion
    fn legalize(&mut self, a: usize, points: &[Point], hull: &mut Hull) -> usize {
        let mut stack: Vec<usize> = Vec::with_capacity(EDGE_STACK_CAP);
        let mut a = a;
        let mut ar;

        loop {
            let b = self.halfedges[a];
            ar = prev_halfedge(a);

            if b == EMPTY {
                match stack.pop() {
                    Some(edge) => {
                        a = edge;
                        continue;
                    }
                    None => break,
                }
            }

            let al = next_halfedge(a);
            let bl = prev_halfedge(b);

            let p0 = self.triangles[ar];
            let pr = self.triangles[a];
            let pl = self.triangles[al];
            let p1 = self.triangles[bl];

            let illegal = in_circumcircle(&points[p0], &points[pr], &points[pl], &points[p1]);
            if illegal {
                self.triangles[a] = p1;
                self.triangles[b] = p0;

                let hbl = self.halfedges[bl];
                let har = self.halfedges[ar];

                // the flipped edge lay on the hull; repair the hull's
                // outgoing-edge bookkeeping
                if hbl == EMPTY {
                    hull.fix_out(bl, a);
                }

                self.link_pair(a, hbl);
                self.link_pair(b, har);
                self.link_pair(ar, bl);

                let br = next_halfedge(b);
                if stack.len() < EDGE_STACK_CAP {
                    stack.push(br);
                }
            } else {
                match stack.pop() {
                    Some(edge) => a = edge,
                    None => break,
                }
            }
        }
        ar
    }

    #[inline]
    fn link_pair(&mut self, a: usize, b: usize) {
        if a != EMPTY {
            self.halfedges[a] = b;
        }
        if b != EMPTY {
            self.halfedges[b] = a;
        }
    }
}

/// Edges of the advancing convex hull, with an angular hash for visible-edge
/// location
struct Hull {
    prev: Vec<usize>,
    next: Vec<usize>,
    out: Vec<usize>,
    hash: Vec<usize>,
    start: usize,
    center: Point,
}

impl Hull {
    fn new(n: usize, center: Point, i0: usize, i1: usize, i2: usize, points: &[Point]) -> Self {
        let hash_len = (n as f64).sqrt() as usize;

        let mut hull = Self {
            prev: vec![0; n],
            next: vec![0; n],
            out: vec![0; n],
            hash: vec![EMPTY; hash_len.max(1)],
            start: i0,
            center,
        };

        hull.set_next(i0, i1);
        hull.set_prev(i2, i1);
        hull.set_next(i1, i2);
        hull.set_prev(i0, i2);
        hull.set_next(i2, i0);
        hull.set_prev(i1, i0);

        hull.set_out(i0, 0);
        hull.set_out(i1, 1);
        hull.set_out(i2, 2);

        hull.hash_edge(&points[i0], i0);
        hull.hash_edge(&points[i1], i1);
        hull.hash_edge(&points[i2], i2);

        hull
    }

    #[inline]
    fn out(&self, point: usize) -> usize {
        self.out[point]
    }
    #[inline]
    fn set_out(&mut self, point: usize, halfedge: usize) {
        self.out[point] = halfedge;
    }

    #[inline]
    fn prev(&self, point: usize) -> usize {
        self.prev[point]
    }
    #[inline]
    fn set_prev(&mut self, point: usize, prev_point: usize) {
        self.prev[point] = prev_point;
    }

    #[inline]
    fn next(&self, point: usize) -> usize {
        self.next[point]
    }
    #[inline]
    fn set_next(&mut self, point: usize, next_point: usize) {
        self.next[point] = next_point;
    }

    #[inline]
    fn remove(&mut self, point: usize) {
        self.set_next(point, EMPTY); // mark as no longer on the hull
    }

    /// Pseudo-angle hash of the direction from the hash center to `p`
    fn hash_key(&self, p: &Point) -> usize {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;

        // monotone with the true angle, much cheaper than atan2
        let f = dx / (dx.abs() + dy.abs());
        let a = (if dy > 0.0 { 3.0 - f } else { 1.0 + f }) / 4.0;

        let len = self.hash.len();
        ((len as f64 * a).floor() as usize) % len
    }

    fn hash_edge(&mut self, p: &Point, i: usize) {
        let key = self.hash_key(p);
        self.hash[key] = i;
    }

    /// Locate a hull edge visible from `p`, starting from the angular hash
    fn find_visible_edge(&self, p: &Point, points: &[Point]) -> (usize, bool) {
        let mut start = 0;
        let key = self.hash_key(p);
        let len = self.hash.len();
        for j in 0..len {
            start = self.hash[(key + j) % len];
            if start != EMPTY && self.next(start) != EMPTY {
                break;
            }
        }
        start = self.prev(start);
        let mut e = start;

        while !edge_visible(p, &points[e], &points[self.next(e)]) {
            e = self.next(e);
            if e == start {
                return (EMPTY, false);
            }
        }
        (e, e == start)
    }

    /// Replace a stale outgoing-halfedge reference after a hull-adjacent flip
    fn fix_out(&mut self, old_edge: usize, new_edge: usize) {
        let mut e = self.start;
        loop {
            if self.out(e) == old_edge {
                self.set_out(e, new_edge);
                break;
            }
            e = self.next(e);
            if e == self.start {
                break;
            }
        }
    }
}

fn bbox_center(points: &[Point]) -> Point {
    let min_x = points.iter().fold(f64::INFINITY, |acc, p| acc.min(p.x));
    let min_y = points.iter().fold(f64::INFINITY, |acc, p| acc.min(p.y));
    let max_x = points.iter().fold(f64::NEG_INFINITY, |acc, p| acc.max(p.x));
    let max_y = points.iter().fold(f64::NEG_INFINITY, |acc, p| acc.max(p.y));
    Point::xy((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}

fn find_closest_point(points: &[Point], to: &Point) -> Option<usize> {
    let mut min_dist = f64::INFINITY;
    let mut best = 0;
    for (i, p) in points.iter().enumerate() {
        let d = to.dist2(p);
        if d > 0.0 && d < min_dist {
            best = i;
            min_dist = d;
        }
    }
    if min_dist == f64::INFINITY {
        None
    } else {
        Some(best)
    }
}

/// Pick the seed triangle: the point nearest the bounding-box center, its
/// nearest neighbor, and the point minimizing their common circumradius,
/// reordered counter-clockwise
fn find_seed_triangle(points: &[Point]) -> Option<(usize, usize, usize)> {
    if points.len() < 3 {
        return None;
    }

    let center = bbox_center(points);
    let i0 = find_closest_point(points, &center)?;
    let p0 = &points[i0];

    let i1 = find_closest_point(points, p0)?;
    let p1 = &points[i1];

    let mut min_radius = f64::INFINITY;
    let mut i2 = 0;
    for (i, p) in points.iter().enumerate() {
        if i == i0 || i == i1 {
            continue;
        }
        let r = circumradius2(p0, p1, p);
        if r < min_radius {
            i2 = i;
            min_radius = r;
        }
    }

    if min_radius == f64::INFINITY {
        // all collinear, no finite circumcircle exists
        None
    } else if orientation(p0, p1, &points[i2]) < 0.0 {
        Some((i0, i2, i1))
    } else {
        Some((i0, i1, i2))
    }
}

/// Degenerate path for fully collinear input: order the points along their
/// dominant axis and expose that order as the hull, with zero triangles
fn collinear_fallback(points: &[Point], options: &BuildOptions) -> SweepHull {
    let mut order: Vec<usize> = (0..points.len()).collect();

    let span_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
        - points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let span_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max)
        - points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);

    if span_x >= span_y {
        order.sort_by(|&a, &b| {
            points[a]
                .x
                .total_cmp(&points[b].x)
                .then(points[a].y.total_cmp(&points[b].y))
        });
    } else {
        order.sort_by(|&a, &b| {
            points[a]
                .y
                .total_cmp(&points[b].y)
                .then(points[a].x.total_cmp(&points[b].x))
        });
    }

    let mut hull = Vec::with_capacity(order.len());
    for &i in &order {
        let duplicate = hull
            .last()
            .map(|&prev: &usize| points[i].nearly_equals(&points[prev], options.duplicate_epsilon))
            .unwrap_or(false);
        if !duplicate {
            hull.push(i);
        }
    }

    SweepHull {
        triangles: Vec::new(),
        halfedges: Vec::new(),
        hull,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::random_points;

    fn options() -> BuildOptions {
        BuildOptions::default()
    }

    /// Every triangle CCW, every twin symmetric, every interior edge legal
    fn assert_delaunay(result: &SweepHull, points: &[Point]) {
        for t in 0..result.len() {
            let a = &points[result.triangles[3 * t]];
            let b = &points[result.triangles[3 * t + 1]];
            let c = &points[result.triangles[3 * t + 2]];
            assert!(orientation(a, b, c) > 0.0, "triangle {} not CCW", t);
        }
        for e in 0..result.halfedges.len() {
            let twin = result.halfedges[e];
            if twin == EMPTY {
                continue;
            }
            assert_eq!(result.halfedges[twin], e, "twin symmetry broken at {}", e);

            let t = 3 * (e / 3);
            let corners = [
                &points[result.triangles[t]],
                &points[result.triangles[t + 1]],
                &points[result.triangles[t + 2]],
            ];
            let apex = &points[result.triangles[prev_halfedge(twin)]];
            assert!(
                !in_circumcircle(corners[0], corners[1], corners[2], apex),
                "illegal edge {} survived legalization",
                e
            );
        }
    }

    #[test]
    fn test_grid_two_by_two() {
        let points = vec![
            Point::xy(0.0, 0.0),
            Point::xy(1.0, 0.0),
            Point::xy(0.0, 1.0),
            Point::xy(1.0, 1.0),
        ];
        let result = sweep_hull(&points, &options());
        assert_eq!(result.len(), 2);
        assert_eq!(result.hull.len(), 4);
        assert_delaunay(&result, &points);
    }

    #[test]
    fn test_collinear_fallback() {
        let points: Vec<Point> = (0..5).map(|i| Point::xy(i as f64, 0.0)).collect();
        let result = sweep_hull(&points, &options());
        assert!(result.is_empty());
        assert_eq!(result.hull, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fewer_than_three_points() {
        let points = vec![Point::xy(0.0, 0.0), Point::xy(1.0, 0.0)];
        let result = sweep_hull(&points, &options());
        assert!(result.is_empty());
        assert_eq!(result.hull.len(), 2);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut points = vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(0.0, 4.0),
            Point::xy(4.0, 4.0),
        ];
        points.push(points[1]);
        let result = sweep_hull(&points, &options());
        assert_eq!(result.len(), 2);
        assert_eq!(result.hull.len(), 4);
    }

    #[test]
    fn test_random_cloud_is_delaunay() {
        let points = random_points(200, 50.0, 1234);
        let result = sweep_hull(&points, &options());
        assert_delaunay(&result, &points);

        // Euler relation for a triangulated point set with no interior
        // duplicates: triangles = 2n - 2 - hull
        assert_eq!(result.len(), 2 * points.len() - 2 - result.hull.len());
    }

    #[test]
    fn test_hull_is_convex_ccw() {
        let points = random_points(100, 10.0, 99);
        let result = sweep_hull(&points, &options());
        let h = &result.hull;
        for i in 0..h.len() {
            let a = &points[h[i]];
            let b = &points[h[(i + 1) % h.len()]];
            let c = &points[h[(i + 2) % h.len()]];
            assert!(orientation(a, b, c) >= 0.0, "hull turns clockwise at {}", i);
        }
    }

    #[test]
    fn test_cocircular_grid() {
        // every 2x2 block is cocircular; legalization must still terminate
        // with a consistent mesh
        let mut points = Vec::new();
        for x in 0..6 {
            for y in 0..6 {
                points.push(Point::xy(x as f64, y as f64));
            }
        }
        let result = sweep_hull(&points, &options());
        assert_delaunay(&result, &points);
        assert_eq!(result.len(), 2 * points.len() - 2 - result.hull.len());
    }
}
