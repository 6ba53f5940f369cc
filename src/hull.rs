//! Convex hulls and enclosing spheres
//!
//! QuickHull over planar point sets, plus a minimum enclosing sphere for
//! arbitrary 3D point clouds. The sphere uses exact constructions for the
//! small and degenerate cases (pairs, collinear runs, single triangles) and
//! falls back to iterative Ritter expansion for general clouds; the fallback
//! is a close approximation, not an exact Welzl solver.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeomError, Result};
use crate::point::{all_collinear, Point};
use crate::predicates::orientation;

/// Planar convex hull via QuickHull, counter-clockwise
///
/// Only `x` and `y` participate; callers with tilted planar data rotate it
/// into the canonical plane first.
///
/// # Errors
///
/// Returns `InvalidInput` for fewer than 3 distinct points or an
/// all-collinear input.
///
/// # Example
///
/// ```
/// use planar_kernel::hull::convex_hull;
/// use planar_kernel::point::Point;
///
/// let points = vec![
///     Point::xy(0.0, 0.0),
///     Point::xy(2.0, 0.0),
///     Point::xy(1.0, 0.5), // interior
///     Point::xy(2.0, 2.0),
///     Point::xy(0.0, 2.0),
/// ];
/// let hull = convex_hull(&points).unwrap();
/// assert_eq!(hull.len(), 4);
/// ```
pub fn convex_hull(points: &[Point]) -> Result<Vec<Point>> {
    let distinct = distinct_points(points);
    if distinct.len() < 3 {
        return Err(GeomError::InvalidInput(format!(
            "convex hull needs at least 3 distinct points (got {})",
            distinct.len()
        )));
    }
    if all_collinear(&distinct) {
        return Err(GeomError::InvalidInput(
            "convex hull of collinear points is a segment".to_string(),
        ));
    }

    // extreme-x seed edge; ties broken by y so the seed is unique
    let mut a = distinct[0];
    let mut b = distinct[0];
    for &p in &distinct {
        if (p.x, p.y) < (a.x, a.y) {
            a = p;
        }
        if (p.x, p.y) > (b.x, b.y) {
            b = p;
        }
    }

    let below: Vec<Point> = distinct
        .iter()
        .copied()
        .filter(|p| orientation(&a, &b, p) < 0.0)
        .collect();
    let above: Vec<Point> = distinct
        .iter()
        .copied()
        .filter(|p| orientation(&b, &a, p) < 0.0)
        .collect();

    let mut hull = vec![a];
    expand(&a, &b, &below, &mut hull);
    hull.push(b);
    expand(&b, &a, &above, &mut hull);
    Ok(hull)
}

/// Append the hull points strictly between `a` and `b`, counter-clockwise,
/// drawn from `points` (all strictly right of the directed edge `a -> b`)
fn expand(a: &Point, b: &Point, points: &[Point], hull: &mut Vec<Point>) {
    let Some(farthest) = points
        .iter()
        .copied()
        .min_by(|p, q| orientation(a, b, p).total_cmp(&orientation(a, b, q)))
    else {
        return;
    };

    let outside_af: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| orientation(a, &farthest, p) < 0.0)
        .collect();
    let outside_fb: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| orientation(&farthest, b, p) < 0.0)
        .collect();

    expand(a, &farthest, &outside_af, hull);
    hull.push(farthest);
    expand(&farthest, b, &outside_fb, hull);
}

fn distinct_points(points: &[Point]) -> Vec<Point> {
    let mut seen: HashSet<[u64; 3]> = HashSet::with_capacity(points.len());
    let mut out = Vec::with_capacity(points.len());
    for &p in points {
        if seen.insert([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]) {
            out.push(p);
        }
    }
    out
}

/// A sphere in 3D
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sphere {
    pub center: Point,
    pub radius: f64,
}

impl Sphere {
    /// Whether a point lies inside or on the sphere, with slack for
    /// accumulated rounding
    pub fn contains(&self, p: &Point, tolerance: f64) -> bool {
        self.center.dist2(p) <= (self.radius + tolerance) * (self.radius + tolerance)
    }
}

/// Minimum enclosing sphere of a 3D point cloud
///
/// Exact for the degenerate shapes: a single point, a pair (diameter
/// sphere), collinear points (diameter of the extreme pair), and a triangle
/// (diameter of the longest edge when the triangle is right or obtuse,
/// circumsphere otherwise). Larger clouds use Ritter's expansion iterated to
/// a fixed point, which overshoots the optimum by a few percent at worst.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty slice.
pub fn min_enclosing_sphere(points: &[Point]) -> Result<Sphere> {
    let distinct = distinct_points(points);
    match distinct.len() {
        0 => Err(GeomError::InvalidInput(
            "enclosing sphere of an empty point set".to_string(),
        )),
        1 => Ok(Sphere {
            center: distinct[0],
            radius: 0.0,
        }),
        2 => Ok(diameter_sphere(&distinct[0], &distinct[1])),
        3 => Ok(triangle_sphere(&distinct[0], &distinct[1], &distinct[2])),
        _ if all_collinear(&distinct) => {
            let (a, b) = extreme_pair(&distinct);
            Ok(diameter_sphere(&a, &b))
        }
        _ => Ok(ritter_sphere(&distinct)),
    }
}

fn diameter_sphere(a: &Point, b: &Point) -> Sphere {
    let center = Point::new(
        (a.x + b.x) * 0.5,
        (a.y + b.y) * 0.5,
        (a.z + b.z) * 0.5,
    );
    Sphere {
        radius: a.dist2(b).sqrt() * 0.5,
        center,
    }
}

/// Endpoints of a collinear run: the pair farthest apart along the
/// dominant axis
fn extreme_pair(points: &[Point]) -> (Point, Point) {
    let min = points[0].to_dvec3();
    let max = points
        .iter()
        .fold(min, |acc, p| acc.max(p.to_dvec3()));
    let min = points.iter().fold(min, |acc, p| acc.min(p.to_dvec3()));
    let span = max - min;
    let key: fn(&Point) -> f64 = if span.x >= span.y && span.x >= span.z {
        |p| p.x
    } else if span.y >= span.z {
        |p| p.y
    } else {
        |p| p.z
    };
    let mut lo = points[0];
    let mut hi = points[0];
    for &p in points {
        if key(&p) < key(&lo) {
            lo = p;
        }
        if key(&p) > key(&hi) {
            hi = p;
        }
    }
    (lo, hi)
}

/// Minimal sphere through or around a single triangle
fn triangle_sphere(a: &Point, b: &Point, c: &Point) -> Sphere {
    let ab2 = a.dist2(b);
    let bc2 = b.dist2(c);
    let ca2 = c.dist2(a);

    // right or obtuse: the longest edge is a diameter
    if ab2 >= bc2 + ca2 {
        return diameter_sphere(a, b);
    }
    if bc2 >= ab2 + ca2 {
        return diameter_sphere(b, c);
    }
    if ca2 >= ab2 + bc2 {
        return diameter_sphere(c, a);
    }

    // acute: circumsphere in the triangle's own plane
    let av = a.to_dvec3();
    let ab = b.to_dvec3() - av;
    let ac = c.to_dvec3() - av;
    let n = ab.cross(ac);
    let n2 = n.length_squared();
    if n2 == 0.0 {
        // numerically flat; fall back to the longest edge
        let (u, v) = extreme_pair(&[*a, *b, *c]);
        return diameter_sphere(&u, &v);
    }
    let center = av + (ab.length_squared() * ac - ac.length_squared() * ab).cross(n) / (2.0 * n2);
    Sphere {
        center: Point::from_dvec3(center),
        radius: (center - av).length(),
    }
}

/// Ritter's approximate enclosing sphere, iterated until no point is left
/// outside
fn ritter_sphere(points: &[Point]) -> Sphere {
    // seed with a far pair: any point, its farthest, that one's farthest
    let p0 = &points[0];
    let p1 = farthest_from(points, p0);
    let p2 = farthest_from(points, &p1);
    let mut sphere = diameter_sphere(&p1, &p2);

    loop {
        let mut grew = false;
        for p in points {
            let d2 = sphere.center.dist2(p);
            if d2 <= sphere.radius * sphere.radius {
                continue;
            }
            // expand just enough: new sphere touches p and the old far side
            let d = d2.sqrt();
            let radius = (sphere.radius + d) * 0.5;
            let shift = (radius - sphere.radius) / d;
            let c = sphere.center.to_dvec3();
            let center = c + (p.to_dvec3() - c) * shift;
            sphere = Sphere {
                center: Point::from_dvec3(center),
                radius,
            };
            grew = true;
        }
        if !grew {
            return sphere;
        }
    }
}

fn farthest_from(points: &[Point], from: &Point) -> Point {
    let mut best = points[0];
    let mut best_d2 = from.dist2(&best);
    for &p in points {
        let d2 = from.dist2(&p);
        if d2 > best_d2 {
            best = p;
            best_d2 = d2;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::random_points;
    use crate::predicates::is_ccw;

    #[test]
    fn test_hull_of_square_with_interior_points() {
        let points = vec![
            Point::xy(0.0, 0.0),
            Point::xy(4.0, 0.0),
            Point::xy(4.0, 4.0),
            Point::xy(0.0, 4.0),
            Point::xy(2.0, 2.0),
            Point::xy(1.0, 3.0),
        ];
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Point::xy(2.0, 2.0)));
    }

    #[test]
    fn test_hull_is_ccw_and_contains_all_points() {
        let points = random_points(200, 50.0, 3);
        let hull = convex_hull(&points).unwrap();
        let n = hull.len();
        for i in 0..n {
            assert!(is_ccw(&hull[i], &hull[(i + 1) % n], &hull[(i + 2) % n]));
        }
        for p in &points {
            for i in 0..n {
                assert!(
                    orientation(&hull[i], &hull[(i + 1) % n], p) >= 0.0,
                    "point {:?} escapes the hull",
                    p
                );
            }
        }
    }

    #[test]
    fn test_hull_of_collinear_points_is_an_error() {
        let line: Vec<Point> = (0..5).map(|i| Point::xy(i as f64, 2.0 * i as f64)).collect();
        assert!(matches!(
            convex_hull(&line),
            Err(GeomError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_hull_of_duplicates_is_an_error() {
        let p = Point::xy(1.0, 1.0);
        assert!(convex_hull(&[p, p, p, p]).is_err());
    }

    #[test]
    fn test_sphere_of_pair_is_diameter() {
        let s = min_enclosing_sphere(&[Point::xy(-1.0, 0.0), Point::xy(3.0, 0.0)]).unwrap();
        assert_eq!(s.center, Point::xy(1.0, 0.0));
        assert!((s.radius - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_of_collinear_points_spans_the_extremes() {
        let line: Vec<Point> = (0..7).map(|i| Point::new(i as f64, 0.0, i as f64)).collect();
        let s = min_enclosing_sphere(&line).unwrap();
        assert!(s.center.nearly_equals(&Point::new(3.0, 0.0, 3.0), 1e-12));
        assert!((s.radius - (2.0 * 9.0f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_of_acute_triangle_is_circumsphere() {
        // right isoceles is the boundary case; nudge it acute
        let s = min_enclosing_sphere(&[
            Point::xy(-1.0, 0.0),
            Point::xy(1.0, 0.0),
            Point::xy(0.0, 1.5),
        ])
        .unwrap();
        // circumcenter on the y axis, equidistant from all three
        assert!(s.center.x.abs() < 1e-12);
        let d0 = s.center.dist2(&Point::xy(-1.0, 0.0)).sqrt();
        let d2 = s.center.dist2(&Point::xy(0.0, 1.5)).sqrt();
        assert!((d0 - s.radius).abs() < 1e-12);
        assert!((d2 - s.radius).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_of_obtuse_triangle_uses_longest_edge() {
        let s = min_enclosing_sphere(&[
            Point::xy(-2.0, 0.0),
            Point::xy(2.0, 0.0),
            Point::xy(0.0, 0.5),
        ])
        .unwrap();
        assert_eq!(s.center, Point::xy(0.0, 0.0));
        assert!((s.radius - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_encloses_random_cloud() {
        let points = random_points(300, 20.0, 9);
        let s = min_enclosing_sphere(&points).unwrap();
        for p in &points {
            assert!(s.contains(p, 1e-9), "point {:?} escapes the sphere", p);
        }
        // not wildly larger than the half-diagonal upper bound of the extent
        assert!(s.radius < 20.0 * 2.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_sphere_serde_round_trip() {
        let s = Sphere {
            center: Point::new(1.0, 2.0, 3.0),
            radius: 4.5,
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: Sphere = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
