//! Clipped Voronoi diagrams
//!
//! Builds the Voronoi dual of a Delaunay triangulation and clips every cell
//! to an axis-aligned rectangle. Cell vertices are triangle circumcenters;
//! hull-adjacent sites additionally get two far rays along the outward
//! normals of their hull edges, so their unbounded cells survive clipping as
//! finite polygons. Every produced cell is convex, counter-clockwise, and a
//! simple closed polygon inside the clip rectangle.

use std::collections::HashMap;
use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::BuildOptions;
use crate::dualgraph::DualGraph;
use crate::error::{GeomError, Result};
use crate::point::{centroid_of, Point};
use crate::predicates::{circumcenter, orientation};
use crate::shape::Shape;
use crate::triangulation::{triangulate, Triangulation, TriangulationInput};

/// Axis-aligned clip rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClipRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ClipRect {
    /// # Errors
    ///
    /// Returns `InvalidInput` when either extent is empty or a bound is not
    /// finite.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return Err(GeomError::InvalidInput(
                "clip rect bounds must be finite".to_string(),
            ));
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(GeomError::InvalidInput(format!(
                "clip rect must have positive extent (got [{}, {}] x [{}, {}])",
                min_x, max_x, min_y, max_y
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Whether a point lies inside or on the boundary
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// The four corners in counter-clockwise order, starting at the minimum
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::xy(self.min_x, self.min_y),
            Point::xy(self.max_x, self.min_y),
            Point::xy(self.max_x, self.max_y),
            Point::xy(self.min_x, self.max_y),
        ]
    }
}

/// One clipped Voronoi cell, as a plain record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoronoiCell {
    /// The site that generated this cell
    pub site: Point,
    /// Boundary polygon, convex, counter-clockwise
    pub points: Vec<Point>,
    /// Arithmetic centroid of the boundary, for relaxation passes
    pub centroid: Point,
    /// Whether the site was caller-supplied rather than synthetic support
    pub is_original: bool,
}

/// A clipped Voronoi diagram over a set of sites
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    /// Cell shapes linked through twin half-edges where cells share an edge
    pub graph: DualGraph,
    /// Plain-record view of the cells, in site order
    pub cells: Vec<VoronoiCell>,
    /// Undirected edges of the generating Delaunay triangulation
    pub delaunay_edges: Vec<(Point, Point)>,
}

impl VoronoiDiagram {
    /// Build the clipped Voronoi diagram of an existing triangulation
    ///
    /// All sites are treated as caller-supplied. Sites whose cell lies
    /// entirely outside the clip rectangle are omitted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a clipped cell degenerates below 3 vertices
    /// in a way that violates the polygon contract; `Structural` errors from
    /// the dual graph propagate unchanged.
    pub fn build(
        triangulation: &Triangulation,
        rect: ClipRect,
        options: &BuildOptions,
    ) -> Result<Self> {
        let original = vec![true; triangulation.sites.len()];
        Self::build_cells(triangulation, &original, rect, options)
    }

    /// Triangulate `sites` plus `support_sites` and build the diagram
    ///
    /// Support sites participate in the triangulation like any other site
    /// but their cells are marked `is_original == false`. Useful for padding
    /// a domain so that the interesting cells are bounded by real neighbors
    /// instead of clip-rectangle corners.
    pub fn build_with_support(
        sites: &[Point],
        support_sites: &[Point],
        rect: ClipRect,
        options: &BuildOptions,
    ) -> Result<Self> {
        let mut all: Vec<Point> = Vec::with_capacity(sites.len() + support_sites.len());
        all.extend_from_slice(sites);
        all.extend_from_slice(support_sites);
        let mut original = vec![true; sites.len()];
        original.resize(all.len(), false);

        let triangulation = triangulate(TriangulationInput::PointSet(all), options)?;
        Self::build_cells(&triangulation, &original, rect, options)
    }

    fn build_cells(
        triangulation: &Triangulation,
        original: &[bool],
        rect: ClipRect,
        options: &BuildOptions,
    ) -> Result<Self> {
        let start = Instant::now();
        let sites = &triangulation.sites;
        let delaunay_edges = collect_delaunay_edges(&triangulation.graph);

        // site -> candidate cell vertices, indexed through exact coordinates
        let index: HashMap<[u64; 3], usize> = sites
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key(), i))
            .collect();
        let mut candidates: Vec<Vec<Point>> = vec![Vec::new(); sites.len()];

        if triangulation.graph.is_empty() {
            return Self::build_degenerate(sites, original, rect, start);
        }

        // "at infinity" stand-ins must dwarf both the diagram and the rect,
        // whatever their absolute coordinates
        let far_dist = options.far_ray_scale * diagram_extent(&triangulation.hull, &rect);

        let hull_centroid = centroid_of(&triangulation.hull);
        for node in triangulation.graph.nodes() {
            let p = &node.shape.points;
            let center = triangle_circumcenter(&p[0], &p[1], &p[2], &hull_centroid, far_dist);
            for corner in p {
                if let Some(&site) = index.get(&corner.key()) {
                    candidates[site].push(center);
                }
            }
        }

        // hull edges contribute a far ray to both endpoint sites
        let hull = &triangulation.hull;
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let ray = far_ray_point(&a, &b, far_dist);
            for endpoint in [&a, &b] {
                if let Some(&site) = index.get(&endpoint.key()) {
                    candidates[site].push(ray);
                }
            }
        }

        let mut graph = DualGraph::new();
        let mut cells = Vec::with_capacity(sites.len());
        for (i, mut verts) in candidates.into_iter().enumerate() {
            if verts.len() < 3 {
                continue;
            }
            sort_ccw(&mut verts);
            dedup_cyclic(&mut verts, options.duplicate_epsilon);
            if verts.len() < 3 {
                continue;
            }
            let clipped = clip_cell(&verts, &rect, options.duplicate_epsilon);
            if clipped.len() < 3 {
                continue;
            }
            let centroid = centroid_of(&clipped);
            let shape = Shape::cell(sites[i], original[i], clipped.clone())?;
            graph.insert_shape(shape);
            cells.push(VoronoiCell {
                site: sites[i],
                points: clipped,
                centroid,
                is_original: original[i],
            });
        }

        eprintln!(
            "[Voronoi] built {} cells from {} sites in {:?}",
            cells.len(),
            sites.len(),
            start.elapsed()
        );
        Ok(Self {
            graph,
            cells,
            delaunay_edges,
        })
    }

    /// Zero-triangle fallback: a site owns the whole clip rectangle iff it
    /// sits inside the rectangle and is the nearest site to every corner
    fn build_degenerate(
        sites: &[Point],
        original: &[bool],
        rect: ClipRect,
        start: Instant,
    ) -> Result<Self> {
        let mut graph = DualGraph::new();
        let mut cells = Vec::new();
        for (i, site) in sites.iter().enumerate() {
            if !rect.contains(site) {
                continue;
            }
            let owns_every_corner = rect.corners().iter().all(|corner| {
                sites
                    .iter()
                    .all(|other| site.dist2(corner) <= other.dist2(corner))
            });
            if !owns_every_corner {
                continue;
            }
            let points = rect.corners().to_vec();
            let centroid = centroid_of(&points);
            graph.insert_shape(Shape::cell(*site, original[i], points.clone())?);
            cells.push(VoronoiCell {
                site: *site,
                points,
                centroid,
                is_original: original[i],
            });
        }
        eprintln!(
            "[Voronoi] degenerate input: {} cells from {} sites in {:?}",
            cells.len(),
            sites.len(),
            start.elapsed()
        );
        Ok(Self {
            graph,
            cells,
            delaunay_edges: Vec::new(),
        })
    }
}

/// Diagonal of the bounding box covering the hull and the clip rectangle
///
/// Far rays and sliver stand-ins are scaled by this, so `far_ray_scale`
/// measures multiples of the diagram extent rather than absolute distance.
fn diagram_extent(hull: &[Point], rect: &ClipRect) -> f64 {
    let mut min_x = rect.min_x;
    let mut min_y = rect.min_y;
    let mut max_x = rect.max_x;
    let mut max_y = rect.max_y;
    for p in hull {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    ((max_x - min_x).powi(2) + (max_y - min_y).powi(2)).sqrt()
}

fn collect_delaunay_edges(graph: &DualGraph) -> Vec<(Point, Point)> {
    let mut edges = Vec::new();
    for e in 0..graph.edge_count() {
        match graph.edge(e).twin {
            // one record per undirected edge
            Some(t) if t < e => continue,
            _ => edges.push(graph.endpoints(e)),
        }
    }
    edges
}

/// Circumcenter with a near-degenerate fallback
///
/// A sliver triangle has a circumcenter far outside the point set or none at
/// all; treat it as "at infinity" by stepping off the hull barycenter along
/// the outward normal of the triangle's longest edge.
fn triangle_circumcenter(
    a: &Point,
    b: &Point,
    c: &Point,
    hull_centroid: &Point,
    far_dist: f64,
) -> Point {
    let longest2 = a.dist2(b).max(b.dist2(c)).max(c.dist2(a));
    let area2 = orientation(a, b, c);
    if area2.abs() > f64::EPSILON * longest2 {
        return circumcenter(a, b, c);
    }

    let (u, v) = longest_edge(a, b, c);
    let mid = Point::xy((u.x + v.x) * 0.5, (u.y + v.y) * 0.5);
    let d = v.to_dvec2() - u.to_dvec2();
    let n = glam::DVec2::new(d.y, -d.x).normalize_or_zero();
    // orient away from the hull interior
    let outward = mid.to_dvec2() - hull_centroid.to_dvec2();
    let n = if outward.dot(n) >= 0.0 { n } else { -n };
    Point::xy(mid.x + n.x * far_dist, mid.y + n.y * far_dist)
}

fn longest_edge<'a>(a: &'a Point, b: &'a Point, c: &'a Point) -> (&'a Point, &'a Point) {
    let ab = a.dist2(b);
    let bc = b.dist2(c);
    let ca = c.dist2(a);
    if ab >= bc && ab >= ca {
        (a, b)
    } else if bc >= ca {
        (b, c)
    } else {
        (c, a)
    }
}

/// Far endpoint of the unbounded Voronoi edge dual to hull edge `(a, b)`
///
/// The perpendicular bisector of a hull edge passes through its midpoint
/// along the outward normal; a point `far_dist` down that normal stands in
/// for the ray's endpoint at infinity.
fn far_ray_point(a: &Point, b: &Point, far_dist: f64) -> Point {
    let d = b.to_dvec2() - a.to_dvec2();
    let n = glam::DVec2::new(d.y, -d.x).normalize_or_zero();
    let mid_x = (a.x + b.x) * 0.5;
    let mid_y = (a.y + b.y) * 0.5;
    Point::xy(mid_x + n.x * far_dist, mid_y + n.y * far_dist)
}

/// Counter-clockwise angular sort around the arithmetic centroid
fn sort_ccw(points: &mut [Point]) {
    let c = centroid_of(points);
    points.sort_by(|a, b| {
        let ta = (a.y - c.y).atan2(a.x - c.x);
        let tb = (b.y - c.y).atan2(b.x - c.x);
        ta.total_cmp(&tb)
    });
}

/// Drop near-coincident consecutive vertices, including the wrap-around pair
fn dedup_cyclic(points: &mut Vec<Point>, epsilon: f64) {
    points.dedup_by(|a, b| a.nearly_equals(b, epsilon));
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if first.nearly_equals(&last, epsilon) {
            points.pop();
        } else {
            break;
        }
    }
}

/// Clip a convex counter-clockwise polygon to the rectangle
///
/// Each polygon edge is clipped with Liang-Barsky; whenever the polygon
/// leaves the rectangle and re-enters, the rectangle corners passed while
/// walking its boundary counter-clockwise from the exit to the entry point
/// are spliced in, so the result is again a simple closed polygon. A polygon
/// that swallows the rectangle whole yields the rectangle itself.
fn clip_cell(points: &[Point], rect: &ClipRect, epsilon: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len() + 4);
    let mut first_entry: Option<f64> = None;
    let mut last_exit: Option<f64> = None;

    let n = points.len();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        let Some((q0, q1, entered, exited)) = liang_barsky(a, b, rect) else {
            continue;
        };
        if entered {
            let entry_t = boundary_param(&q0, rect);
            if let Some(exit_t) = last_exit.take() {
                splice_corners(&mut out, rect, exit_t, entry_t);
            } else {
                first_entry = Some(entry_t);
            }
        }
        push_dedup(&mut out, q0, epsilon);
        push_dedup(&mut out, q1, epsilon);
        if exited {
            last_exit = Some(boundary_param(&q1, rect));
        }
    }

    // close the cycle across the wrap-around outside run
    if let (Some(exit_t), Some(entry_t)) = (last_exit, first_entry) {
        splice_corners(&mut out, rect, exit_t, entry_t);
    }

    if out.is_empty() {
        // no edge touches the rect: either fully outside, or the polygon
        // contains the whole rect
        if rect.corners().iter().all(|c| inside_convex(points, c)) {
            return rect.corners().to_vec();
        }
        return out;
    }

    dedup_cyclic(&mut out, epsilon);
    if out.len() < 3 {
        out.clear();
    }
    out
}

fn push_dedup(out: &mut Vec<Point>, p: Point, epsilon: f64) {
    if let Some(last) = out.last() {
        if last.nearly_equals(&p, epsilon) {
            return;
        }
    }
    out.push(p);
}

/// Whether `p` lies inside or on a convex counter-clockwise polygon
fn inside_convex(points: &[Point], p: &Point) -> bool {
    let n = points.len();
    (0..n).all(|i| orientation(&points[i], &points[(i + 1) % n], p) >= 0.0)
}

/// Liang-Barsky clip of segment `a -> b` against the rectangle
///
/// Returns the clipped endpoints plus whether the segment entered (was
/// clipped at its start) and exited (was clipped at its end), or `None` when
/// it misses the rectangle entirely. Clipped endpoints are computed from the
/// lexicographically smaller segment endpoint, so the two cells sharing an
/// undirected edge produce bitwise-identical boundary points and their
/// half-edges twin up.
fn liang_barsky(a: &Point, b: &Point, rect: &ClipRect) -> Option<(Point, Point, bool, bool)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let mut side0 = 0usize;
    let mut side1 = 0usize;

    let checks = [
        (-dx, a.x - rect.min_x),
        (dx, rect.max_x - a.x),
        (-dy, a.y - rect.min_y),
        (dy, rect.max_y - a.y),
    ];
    for (side, (p, q)) in checks.into_iter().enumerate() {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
                side0 = side;
            }
        } else {
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
                side1 = side;
            }
        }
    }

    let entered = t0 > 0.0;
    let exited = t1 < 1.0;
    let q0 = if entered { side_point(a, b, side0, rect) } else { *a };
    let q1 = if exited { side_point(a, b, side1, rect) } else { *b };
    Some((q0, q1, entered, exited))
}

/// Intersection of the undirected segment `(a, b)` with one rectangle side
///
/// Sides are numbered like the Liang-Barsky checks: 0 left, 1 right,
/// 2 bottom, 3 top. The fixed coordinate is taken from the rectangle
/// exactly, and the endpoints are ordered canonically before interpolating,
/// so the result does not depend on the segment's direction.
fn side_point(a: &Point, b: &Point, side: usize, rect: &ClipRect) -> Point {
    let (p, q) = if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) };
    match side {
        0 | 1 => {
            let x = if side == 0 { rect.min_x } else { rect.max_x };
            let t = (x - p.x) / (q.x - p.x);
            Point::xy(x, p.y + t * (q.y - p.y))
        }
        _ => {
            let y = if side == 2 { rect.min_y } else { rect.max_y };
            let t = (y - p.y) / (q.y - p.y);
            Point::xy(p.x + t * (q.x - p.x), y)
        }
    }
}

/// Position of a boundary point along the rectangle's counter-clockwise
/// perimeter, in [0, 4): bottom, right, top, left, corners at integers
fn boundary_param(p: &Point, rect: &ClipRect) -> f64 {
    let w = rect.max_x - rect.min_x;
    let h = rect.max_y - rect.min_y;
    let d_bottom = (p.y - rect.min_y).abs();
    let d_right = (rect.max_x - p.x).abs();
    let d_top = (rect.max_y - p.y).abs();
    let d_left = (p.x - rect.min_x).abs();

    let nearest = d_bottom.min(d_right).min(d_top).min(d_left);
    if nearest == d_bottom {
        (p.x - rect.min_x) / w
    } else if nearest == d_right {
        1.0 + (p.y - rect.min_y) / h
    } else if nearest == d_top {
        2.0 + (rect.max_x - p.x) / w
    } else {
        3.0 + (rect.max_y - p.y) / h
    }
}

/// Append the rectangle corners passed while walking counter-clockwise from
/// perimeter position `from` to `to`
fn splice_corners(out: &mut Vec<Point>, rect: &ClipRect, from: f64, to: f64) {
    let span = (to - from).rem_euclid(4.0);
    if span < 1e-12 {
        return;
    }
    let corners = rect.corners();
    let mut t = from.floor() + 1.0;
    while t - from < span {
        let corner = corners[(t.rem_euclid(4.0)) as usize % 4];
        out.push(corner);
        t += 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::random_points;

    fn rect(half: f64) -> ClipRect {
        ClipRect::new(-half, -half, half, half).unwrap()
    }

    /// Twice the signed area of a counter-clockwise polygon
    fn polygon_area(points: &[Point]) -> f64 {
        let n = points.len();
        let mut area = 0.0;
        for i in 0..n {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            area += a.x * b.y - b.x * a.y;
        }
        area * 0.5
    }

    #[test]
    fn test_clip_rect_validation() {
        assert!(ClipRect::new(0.0, 0.0, 1.0, 1.0).is_ok());
        assert!(ClipRect::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(ClipRect::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(ClipRect::new(0.0, f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_single_site_owns_the_whole_rect() {
        let diagram = VoronoiDiagram::build_with_support(
            &[Point::xy(1.0, 2.0)],
            &[],
            rect(8.0),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(diagram.cells.len(), 1);
        let cell = &diagram.cells[0];
        assert!(cell.is_original);
        assert_eq!(cell.points, rect(8.0).corners().to_vec());
        assert!((polygon_area(&cell.points) - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_outside_site_gets_no_degenerate_cell() {
        let diagram = VoronoiDiagram::build_with_support(
            &[Point::xy(100.0, 0.0)],
            &[],
            rect(8.0),
            &BuildOptions::default(),
        )
        .unwrap();
        assert!(diagram.cells.is_empty());
    }

    #[test]
    fn test_quadrant_cells() {
        // four symmetric sites split the rect into four equal quadrants
        let sites = vec![
            Point::xy(-5.0, -5.0),
            Point::xy(5.0, -5.0),
            Point::xy(5.0, 5.0),
            Point::xy(-5.0, 5.0),
        ];
        let diagram = VoronoiDiagram::build_with_support(
            &sites,
            &[],
            rect(10.0),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(diagram.cells.len(), 4);
        for cell in &diagram.cells {
            assert_eq!(cell.points.len(), 4);
            assert!((polygon_area(&cell.points) - 100.0).abs() < 1e-6);
            assert!(rect(10.0).contains(&cell.centroid));
        }
    }

    #[test]
    fn test_cells_partition_the_rect() {
        let sites = random_points(30, 8.0, 11);
        let diagram = VoronoiDiagram::build_with_support(
            &sites,
            &[],
            rect(9.0),
            &BuildOptions::default(),
        )
        .unwrap();

        let total: f64 = diagram.cells.iter().map(|c| polygon_area(&c.points)).sum();
        let rect_area = 18.0 * 18.0;
        assert!(
            (total - rect_area).abs() < 1e-6 * rect_area,
            "cells cover {} of {}",
            total,
            rect_area
        );

        // every cell is convex and counter-clockwise
        for cell in &diagram.cells {
            assert!(polygon_area(&cell.points) > 0.0);
            let n = cell.points.len();
            for i in 0..n {
                let a = &cell.points[i];
                let b = &cell.points[(i + 1) % n];
                let c = &cell.points[(i + 2) % n];
                assert!(orientation(a, b, c) >= 0.0, "cell is not convex");
            }
        }
    }

    #[test]
    fn test_partition_survives_large_coordinates() {
        // far rays scale with the diagram, so coordinates near the scale
        // factor itself must still leave no gaps along the hull
        let sites: Vec<Point> = random_points(30, 8.0, 11)
            .into_iter()
            .map(|p| Point::xy(p.x * 1.0e7, p.y * 1.0e7))
            .collect();
        let diagram = VoronoiDiagram::build_with_support(
            &sites,
            &[],
            rect(9.0e7),
            &BuildOptions::default(),
        )
        .unwrap();

        let total: f64 = diagram.cells.iter().map(|c| polygon_area(&c.points)).sum();
        let rect_area = 1.8e8 * 1.8e8;
        assert!(
            (total - rect_area).abs() < 1e-6 * rect_area,
            "cells cover {} of {}",
            total,
            rect_area
        );
    }

    fn hexagon() -> Vec<Point> {
        vec![
            Point::xy(4.0, 0.0),
            Point::xy(2.0, 3.0),
            Point::xy(-2.0, 3.0),
            Point::xy(-4.0, 0.0),
            Point::xy(-2.0, -3.0),
            Point::xy(2.0, -3.0),
        ]
    }

    #[test]
    fn test_polygon_boundary_diagram_covers_rect() {
        let triangulation = triangulate(
            TriangulationInput::PolygonBoundary(hexagon()),
            &BuildOptions::default(),
        )
        .unwrap();
        let diagram =
            VoronoiDiagram::build(&triangulation, rect(10.0), &BuildOptions::default()).unwrap();

        assert_eq!(diagram.cells.len(), 6);
        let total: f64 = diagram.cells.iter().map(|c| polygon_area(&c.points)).sum();
        assert!(
            (total - 400.0).abs() < 1e-6 * 400.0,
            "cells cover {} of 400",
            total
        );
    }

    #[test]
    fn test_skewed_polygon_boundary_produces_cells() {
        // hexagon lifted into the plane z = 0.3x + 0.7y + 1.1; its dual must
        // still resolve every boundary vertex to a site
        let boundary: Vec<Point> = hexagon()
            .into_iter()
            .map(|p| Point::new(p.x, p.y, 0.3 * p.x + 0.7 * p.y + 1.1))
            .collect();
        let triangulation = triangulate(
            TriangulationInput::PolygonBoundary(boundary),
            &BuildOptions::default(),
        )
        .unwrap();
        let diagram =
            VoronoiDiagram::build(&triangulation, rect(10.0), &BuildOptions::default()).unwrap();

        assert_eq!(diagram.cells.len(), 6);
        for cell in &diagram.cells {
            assert!(cell.points.len() >= 3);
            assert!(polygon_area(&cell.points) > 0.0);
        }
    }

    #[test]
    fn test_support_sites_are_marked_synthetic() {
        let sites = vec![Point::xy(0.0, 0.0)];
        let support = vec![
            Point::xy(-6.0, -6.0),
            Point::xy(6.0, -6.0),
            Point::xy(6.0, 6.0),
            Point::xy(-6.0, 6.0),
        ];
        let diagram = VoronoiDiagram::build_with_support(
            &sites,
            &support,
            rect(10.0),
            &BuildOptions::default(),
        )
        .unwrap();

        let originals: Vec<_> = diagram.cells.iter().filter(|c| c.is_original).collect();
        assert_eq!(originals.len(), 1);
        assert_eq!(originals[0].site, Point::xy(0.0, 0.0));
        assert!(diagram.cells.iter().any(|c| !c.is_original));
    }

    #[test]
    fn test_delaunay_edges_are_retained() {
        let sites = vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(0.0, 4.0),
        ];
        let triangulation = triangulate(
            TriangulationInput::PointSet(sites),
            &BuildOptions::default(),
        )
        .unwrap();
        let diagram =
            VoronoiDiagram::build(&triangulation, rect(10.0), &BuildOptions::default()).unwrap();
        // one triangle, three undirected edges
        assert_eq!(diagram.delaunay_edges.len(), 3);
    }

    #[test]
    fn test_neighboring_cells_share_twinned_edges() {
        let sites = vec![
            Point::xy(-5.0, -5.0),
            Point::xy(5.0, -5.0),
            Point::xy(5.0, 5.0),
            Point::xy(-5.0, 5.0),
        ];
        let diagram = VoronoiDiagram::build_with_support(
            &sites,
            &[],
            rect(10.0),
            &BuildOptions::default(),
        )
        .unwrap();
        // four quadrant cells meet pairwise along the axes
        let twinned = (0..diagram.graph.edge_count())
            .filter(|&e| diagram.graph.edge(e).twin.is_some())
            .count();
        assert!(twinned >= 8, "expected shared edges, found {}", twinned);
    }

    #[test]
    fn test_clip_keeps_interior_polygon_untouched() {
        let triangle = vec![
            Point::xy(-1.0, -1.0),
            Point::xy(1.0, -1.0),
            Point::xy(0.0, 1.0),
        ];
        let clipped = clip_cell(&triangle, &rect(5.0), 1e-12);
        assert_eq!(clipped, triangle);
    }

    #[test]
    fn test_clip_splices_rect_corners() {
        // huge triangle swallowing the rect from below
        let triangle = vec![
            Point::xy(-100.0, -1.0),
            Point::xy(100.0, -1.0),
            Point::xy(0.0, 200.0),
        ];
        let clipped = clip_cell(&triangle, &rect(5.0), 1e-12);
        assert!(clipped.len() >= 4);
        assert!((polygon_area(&clipped) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_swallowed_rect_returns_rect() {
        let huge = vec![
            Point::xy(-100.0, -100.0),
            Point::xy(100.0, -100.0),
            Point::xy(100.0, 100.0),
            Point::xy(-100.0, 100.0),
        ];
        let clipped = clip_cell(&huge, &rect(5.0), 1e-12);
        assert_eq!(clipped, rect(5.0).corners().to_vec());
    }

    #[test]
    fn test_clip_misses_entirely() {
        let far = vec![
            Point::xy(50.0, 50.0),
            Point::xy(60.0, 50.0),
            Point::xy(55.0, 60.0),
        ];
        assert!(clip_cell(&far, &rect(5.0), 1e-12).is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_cell_serde_round_trip() {
        let cell = VoronoiCell {
            site: Point::xy(1.0, 2.0),
            points: rect(3.0).corners().to_vec(),
            centroid: Point::xy(0.0, 0.0),
            is_original: true,
        };
        let json = serde_json::to_string(&cell).unwrap();
        let back: VoronoiCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }
}
