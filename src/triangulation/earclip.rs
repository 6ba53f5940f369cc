//! Ear-clipping triangulation of simple polygons, with Delaunay flipping
//!
//! Handles arbitrary simple (possibly concave) polygon boundaries: the
//! polygon is rotated into the canonical z = 0 plane, clipped into triangles
//! ear by ear, lifted into a half-edge dual graph, Delaunay-ized by flipping
//! illegal interior edges, and finally rotated back into its original plane.
//!
//! A simple polygon with `n` vertices always yields exactly `n - 2`
//! triangles; failing to find an ear while 3 or more vertices remain means
//! the boundary self-intersects.

use std::collections::{HashMap, VecDeque};

use crate::config::BuildOptions;
use crate::dualgraph::DualGraph;
use crate::error::{GeomError, Result};
use crate::point::{all_coplanar, newell_normal, PlaneRotation, Point};
use crate::predicates::{in_circumcircle, orientation};
use crate::shape::Shape;

/// Triangulate a simple polygon boundary into a Delaunay dual graph
///
/// Returns the graph together with the cleaned boundary (consecutive
/// duplicates removed, counter-clockwise, in the original plane).
///
/// # Errors
///
/// - `InvalidInput` for fewer than 3 distinct points, non-coplanar input,
///   collinear input, or a boundary that self-intersects (no ear found).
/// - `Structural` if legalization exceeds the configured flip ceiling.
pub fn triangulate_polygon(
    boundary: &[Point],
    options: &BuildOptions,
) -> Result<(DualGraph, Vec<Point>)> {
    let mut cleaned = dedup_cyclic(boundary);
    if cleaned.len() < 3 {
        return Err(GeomError::InvalidInput(format!(
            "polygon needs at least 3 distinct points (got {})",
            cleaned.len()
        )));
    }
    if !all_coplanar(&cleaned) {
        return Err(GeomError::InvalidInput(
            "polygon points are not coplanar".to_string(),
        ));
    }
    // normalize winding before rotating, so the rotation preserves it and
    // the returned boundary matches the triangle orientation
    if newell_normal(&cleaned).z < 0.0 {
        cleaned.reverse();
    }
    let Some(plane) = PlaneRotation::from_points(&cleaned) else {
        return Err(GeomError::InvalidInput(
            "polygon points are collinear".to_string(),
        ));
    };

    let mut flat: Vec<Point> = cleaned.iter().map(|&p| plane.apply(p)).collect();
    if signed_area(&flat) < 0.0 {
        flat.reverse();
    }

    let ears = clip_ears(&flat)?;

    let mut graph = DualGraph::new();
    for &(a, b, c) in &ears {
        graph.insert_shape(Shape::triangle(flat[a], flat[b], flat[c])?);
    }

    legalize(&mut graph, options)?;

    // inverting the rotation is not bitwise round-trip-exact; every graph
    // vertex is a boundary vertex, so snap it to the point it came from and
    // exact-coordinate lookups downstream keep working
    let back: HashMap<[u64; 3], Point> = cleaned
        .iter()
        .map(|&p| (plane.apply(p).key(), p))
        .collect();
    graph.map_points(|p| match back.get(&p.key()) {
        Some(&original) => original,
        None => plane.invert(p),
    });

    Ok((graph, cleaned))
}

/// Twice the signed area of a planar polygon (positive = counter-clockwise)
fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area
}

/// Remove duplicate consecutive vertices, including the wrap-around pair
fn dedup_cyclic(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Repeatedly clip ears off the vertex cycle until 3 vertices remain
///
/// An ear is a convex vertex whose triangle contains no other remaining
/// vertex (points on the triangle boundary block it too). Each clip restarts
/// the scan; O(n²) worst case, which is fine at the polygon sizes this
/// kernel targets.
fn clip_ears(points: &[Point]) -> Result<Vec<(usize, usize, usize)>> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);

    'clip: while remaining.len() > 3 {
        for i in 0..remaining.len() {
            let prev = remaining[(i + remaining.len() - 1) % remaining.len()];
            let cur = remaining[i];
            let next = remaining[(i + 1) % remaining.len()];

            if is_ear(points, &remaining, prev, cur, next) {
                triangles.push((prev, cur, next));
                remaining.remove(i);
                continue 'clip;
            }
        }
        return Err(GeomError::InvalidInput(
            "no ear found; polygon is not simple".to_string(),
        ));
    }

    let (a, b, c) = (remaining[0], remaining[1], remaining[2]);
    if orientation(&points[a], &points[b], &points[c]) <= 0.0 {
        return Err(GeomError::InvalidInput(
            "final triangle is degenerate; polygon is not simple".to_string(),
        ));
    }
    triangles.push((a, b, c));
    Ok(triangles)
}

fn is_ear(points: &[Point], remaining: &[usize], prev: usize, cur: usize, next: usize) -> bool {
    let a = &points[prev];
    let b = &points[cur];
    let c = &points[next];

    // convex turn only
    if orientation(a, b, c) <= 0.0 {
        return false;
    }

    // no other remaining vertex inside or on the candidate triangle
    for &j in remaining {
        if j == prev || j == cur || j == next {
            continue;
        }
        let p = &points[j];
        if orientation(a, b, p) >= 0.0
            && orientation(b, c, p) >= 0.0
            && orientation(c, a, p) >= 0.0
        {
            return false;
        }
    }
    true
}

/// Flip illegal interior edges until every edge satisfies the Delaunay
/// condition
///
/// Works off a queue of possibly-illegal edges: initially every interior
/// edge, then after each flip the four outer edges of the flipped
/// quadrilateral. Terminates because each flip strictly improves the
/// triangulation's minimum-angle ordering; the configured ceiling converts a
/// hypothetical oscillation on pathological input into a hard error instead
/// of a hang.
fn legalize(graph: &mut DualGraph, options: &BuildOptions) -> Result<()> {
    let mut queue: VecDeque<usize> = (0..graph.edge_count())
        .filter(|&e| graph.edge(e).twin.is_some())
        .collect();
    let mut queued = vec![false; graph.edge_count()];
    for &e in &queue {
        queued[e] = true;
    }

    let mut flips = 0usize;
    while let Some(e) = queue.pop_front() {
        queued[e] = false;
        let Some(twin) = graph.edge(e).twin else {
            continue;
        };

        if !edge_illegal(graph, e, twin) {
            continue;
        }

        graph.flip_edge(e);
        flips += 1;
        if flips > options.max_legalize_flips {
            return Err(GeomError::Structural(format!(
                "legalization exceeded {} flips; input is pathological",
                options.max_legalize_flips
            )));
        }

        // the four outer edges of the flipped quad may have become illegal
        for candidate in [e, graph.edge(e).next, twin, graph.edge(twin).next] {
            if graph.edge(candidate).twin.is_some() && !queued[candidate] {
                queued[candidate] = true;
                queue.push_back(candidate);
            }
        }
    }
    Ok(())
}

/// Whether the opposite vertex of `twin`'s triangle lies strictly inside the
/// circumcircle of `e`'s triangle
fn edge_illegal(graph: &DualGraph, e: usize, twin: usize) -> bool {
    let a = graph.edge(e).origin;
    let b = graph.edge(graph.edge(e).next).origin;
    let c = graph.edge(graph.edge(graph.edge(e).next).next).origin;

    let apex = graph
        .edge(graph.edge(graph.edge(twin).next).next)
        .origin;

    in_circumcircle(&a, &b, &c, &apex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::is_ccw;

    fn options() -> BuildOptions {
        BuildOptions::default()
    }

    fn assert_legal(graph: &DualGraph) {
        for e in 0..graph.edge_count() {
            if let Some(twin) = graph.edge(e).twin {
                assert!(!edge_illegal(graph, e, twin), "edge {} is illegal", e);
            }
        }
    }

    #[test]
    fn test_square_yields_two_legal_triangles() {
        let square = vec![
            Point::xy(-1.0, 1.0),
            Point::xy(1.0, 1.0),
            Point::xy(1.0, -1.0),
            Point::xy(-1.0, -1.0),
        ];
        let (graph, boundary) = triangulate_polygon(&square, &options()).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(boundary.len(), 4);
        assert_legal(&graph);
    }

    #[test]
    fn test_triangle_count_is_n_minus_2() {
        // concave "arrow" hexagon
        let polygon = vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(4.0, 4.0),
            Point::xy(2.0, 1.5),
            Point::xy(0.0, 4.0),
            Point::xy(-1.0, 2.0),
        ];
        let (graph, _) = triangulate_polygon(&polygon, &options()).unwrap();
        assert_eq!(graph.len(), polygon.len() - 2);
        assert_legal(&graph);

        for shape in graph.shapes() {
            let p = &shape.points;
            assert!(is_ccw(&p[0], &p[1], &p[2]));
        }
    }

    #[test]
    fn test_clockwise_input_is_normalized() {
        let square_cw = vec![
            Point::xy(0.0, 0.0),
            Point::xy(0.0, 2.0),
            Point::xy(2.0, 2.0),
            Point::xy(2.0, 0.0),
        ];
        let (graph, boundary) = triangulate_polygon(&square_cw, &options()).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(signed_area(&boundary) > 0.0);
    }

    #[test]
    fn test_tilted_polygon_round_trips() {
        // square living in the plane z = x
        let polygon = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 1.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let (graph, _) = triangulate_polygon(&polygon, &options()).unwrap();
        assert_eq!(graph.len(), 2);

        // every output vertex is bitwise one of the inputs, so site lookups
        // by exact coordinates work on the result
        for shape in graph.shapes() {
            for p in &shape.points {
                assert!(
                    polygon.iter().any(|q| q == p),
                    "vertex {:?} is not an input vertex",
                    p
                );
            }
        }
    }

    #[test]
    fn test_too_few_points() {
        let result = triangulate_polygon(
            &[Point::xy(0.0, 0.0), Point::xy(1.0, 0.0)],
            &options(),
        );
        assert!(matches!(result, Err(GeomError::InvalidInput(_))));
    }

    #[test]
    fn test_collinear_polygon_rejected() {
        let line: Vec<Point> = (0..4).map(|i| Point::xy(i as f64, i as f64)).collect();
        let result = triangulate_polygon(&line, &options());
        assert!(matches!(result, Err(GeomError::InvalidInput(_))));
    }

    #[test]
    fn test_non_coplanar_rejected() {
        let twisted = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let result = triangulate_polygon(&twisted, &options());
        assert!(matches!(result, Err(GeomError::InvalidInput(_))));
    }

    #[test]
    fn test_pinched_polygon_rejected() {
        // boundary visits (2,2) twice; every candidate ear is blocked
        let pinched = vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(2.0, 2.0),
            Point::xy(4.0, 4.0),
            Point::xy(0.0, 4.0),
            Point::xy(2.0, 2.0),
        ];
        let result = triangulate_polygon(&pinched, &options());
        assert!(matches!(result, Err(GeomError::InvalidInput(_))));
    }

    /// Convex quad whose ear-clip diagonal is not the Delaunay one, so
    /// legalization must flip exactly once
    fn flip_hungry_quad() -> Vec<Point> {
        vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(3.8, 0.35),
            Point::xy(0.5, 1.0),
        ]
    }

    #[test]
    fn test_legalization_flips_bad_diagonal() {
        let (graph, _) = triangulate_polygon(&flip_hungry_quad(), &options()).unwrap();
        assert_eq!(graph.len(), 2);
        assert_legal(&graph);

        // the surviving diagonal connects (0,0) and (3.8, 0.35)
        for shape in graph.shapes() {
            assert!(shape.points.contains(&Point::xy(0.0, 0.0)));
            assert!(shape.points.contains(&Point::xy(3.8, 0.35)));
        }
    }

    #[test]
    fn test_flip_ceiling_is_enforced() {
        let zero_headroom = BuildOptions {
            max_legalize_flips: 0,
            ..BuildOptions::default()
        };
        let result = triangulate_polygon(&flip_hungry_quad(), &zero_headroom);
        assert!(matches!(result, Err(GeomError::Structural(_))));
    }
}
