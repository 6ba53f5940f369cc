//! Polygon shapes
//!
//! A shape is an ordered, cyclic sequence of points plus a stable identity.
//! Two variants exist: triangles (exactly 3 points, counter-clockwise) and
//! Voronoi cells (variable-length convex polygons carrying their generating
//! site). Edges are derived strictly from consecutive cyclic point pairs.

use crate::error::{GeomError, Result};
use crate::point::{centroid_of, Point};
use crate::predicates::is_ccw;

/// What a shape represents
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A triangle of a Delaunay triangulation
    Triangle,
    /// A convex Voronoi cell
    Cell {
        /// The site that generated this cell
        site: Point,
        /// Whether the site was caller-supplied rather than synthetic
        is_original: bool,
    },
}

/// An ordered, cyclic polygon with a per-graph identity
///
/// Ids are assigned sequentially by the owning [`DualGraph`](crate::dualgraph::DualGraph);
/// no identity survives across independent builds.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Insertion-order id within the owning graph
    pub id: usize,
    pub kind: ShapeKind,
    /// Boundary points, cyclic, no duplicate consecutive vertices
    pub points: Vec<Point>,
}

impl Shape {
    /// Create a counter-clockwise triangle
    ///
    /// The three points are reordered to counter-clockwise winding if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the corners are collinear or coincident.
    pub fn triangle(a: Point, b: Point, c: Point) -> Result<Self> {
        if a == b || b == c || c == a {
            return Err(GeomError::InvalidInput(
                "triangle with coincident corners".to_string(),
            ));
        }
        let points = if is_ccw(&a, &b, &c) {
            vec![a, b, c]
        } else if is_ccw(&a, &c, &b) {
            vec![a, c, b]
        } else {
            return Err(GeomError::InvalidInput(
                "triangle with collinear corners".to_string(),
            ));
        };
        Ok(Self {
            id: 0,
            kind: ShapeKind::Triangle,
            points,
        })
    }

    /// Create a Voronoi cell polygon
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for fewer than 3 points or duplicate
    /// consecutive vertices.
    pub fn cell(site: Point, is_original: bool, points: Vec<Point>) -> Result<Self> {
        if points.len() < 3 {
            return Err(GeomError::InvalidInput(format!(
                "cell polygon needs at least 3 points (got {})",
                points.len()
            )));
        }
        for i in 0..points.len() {
            if points[i] == points[(i + 1) % points.len()] {
                return Err(GeomError::InvalidInput(
                    "cell polygon with duplicate consecutive vertices".to_string(),
                ));
            }
        }
        Ok(Self {
            id: 0,
            kind: ShapeKind::Cell { site, is_original },
            points,
        })
    }

    /// Number of boundary edges (equals the number of points)
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.points.len()
    }

    /// Cyclic consecutive point pairs
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Arithmetic centroid of the boundary points
    #[inline]
    pub fn centroid(&self) -> Point {
        centroid_of(&self.points)
    }

    /// Whether the shape is a triangle
    #[inline]
    pub fn is_triangle(&self) -> bool {
        matches!(self.kind, ShapeKind::Triangle)
    }

    /// The generating site, for cell shapes
    #[inline]
    pub fn site(&self) -> Option<Point> {
        match self.kind {
            ShapeKind::Cell { site, .. } => Some(site),
            ShapeKind::Triangle => None,
        }
    }
}
