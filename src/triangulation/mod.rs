//! Delaunay triangulation entry point
//!
//! Two strategies share one output representation: simple polygon boundaries
//! go through ear clipping plus edge flipping ([`earclip`]), unordered point
//! sets go through an incremental sweep-hull ([`sweep`]). Callers tag their
//! input with [`TriangulationInput`] and get back a [`Triangulation`] either
//! way; the choice of algorithm is static, never guessed from the data.

pub mod earclip;
pub mod sweep;

use crate::config::BuildOptions;
use crate::dualgraph::DualGraph;
use crate::error::Result;
use crate::point::Point;

/// Input to [`triangulate`], tagged by interpretation
///
/// The same `Vec<Point>` means different things depending on the variant: a
/// boundary is an ordered cycle, a point set is an unordered cloud.
#[derive(Debug, Clone)]
pub enum TriangulationInput {
    /// Unordered point cloud; triangulated with the sweep-hull algorithm
    PointSet(Vec<Point>),
    /// Ordered simple polygon boundary; triangulated by ear clipping
    PolygonBoundary(Vec<Point>),
}

/// A Delaunay triangulation in dual-graph form
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// Triangle shapes linked through twin half-edges
    pub graph: DualGraph,
    /// Convex (point set) or boundary (polygon) hull, counter-clockwise
    pub hull: Vec<Point>,
    /// The vertices that generated the triangulation
    pub sites: Vec<Point>,
}

/// Triangulate tagged input into a Delaunay dual graph
///
/// A point set never fails: collinear or too-small inputs produce a
/// triangulation with zero triangles and the degenerate hull. A polygon
/// boundary is validated and can be rejected.
///
/// # Errors
///
/// For [`TriangulationInput::PolygonBoundary`]: `InvalidInput` for fewer
/// than 3 distinct points, non-coplanar, collinear, or self-intersecting
/// boundaries; `Structural` if legalization exceeds the configured flip
/// ceiling.
///
/// # Example
///
/// ```
/// use planar_kernel::config::BuildOptions;
/// use planar_kernel::point::Point;
/// use planar_kernel::triangulation::{triangulate, TriangulationInput};
///
/// let square = vec![
///     Point::xy(0.0, 0.0),
///     Point::xy(1.0, 0.0),
///     Point::xy(1.0, 1.0),
///     Point::xy(0.0, 1.0),
/// ];
/// let result = triangulate(
///     TriangulationInput::PolygonBoundary(square),
///     &BuildOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(result.graph.len(), 2);
/// ```
pub fn triangulate(input: TriangulationInput, options: &BuildOptions) -> Result<Triangulation> {
    match input {
        TriangulationInput::PointSet(points) => {
            let swept = sweep::sweep_hull(&points, options);
            let graph = DualGraph::from_point_set(&swept, &points);
            let hull = swept.hull.iter().map(|&i| points[i]).collect();
            Ok(Triangulation {
                graph,
                hull,
                sites: points,
            })
        }
        TriangulationInput::PolygonBoundary(boundary) => {
            let (graph, hull) = earclip::triangulate_polygon(&boundary, options)?;
            Ok(Triangulation {
                sites: hull.clone(),
                graph,
                hull,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeomError;
    use crate::point::random_points;

    #[test]
    fn test_point_set_dispatch() {
        let points = vec![
            Point::xy(0.0, 0.0),
            Point::xy(1.0, 0.0),
            Point::xy(0.0, 1.0),
            Point::xy(1.0, 1.0),
        ];
        let result = triangulate(
            TriangulationInput::PointSet(points),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(result.graph.len(), 2);
        assert_eq!(result.hull.len(), 4);
        assert_eq!(result.sites.len(), 4);
    }

    #[test]
    fn test_collinear_point_set_is_empty_not_an_error() {
        let line: Vec<Point> = (0..5).map(|i| Point::xy(i as f64, 0.0)).collect();
        let result = triangulate(
            TriangulationInput::PointSet(line),
            &BuildOptions::default(),
        )
        .unwrap();
        assert!(result.graph.is_empty());
        assert_eq!(result.hull.len(), 5);
    }

    #[test]
    fn test_collinear_boundary_is_an_error() {
        let line: Vec<Point> = (0..5).map(|i| Point::xy(i as f64, 0.0)).collect();
        let result = triangulate(
            TriangulationInput::PolygonBoundary(line),
            &BuildOptions::default(),
        );
        assert!(matches!(result, Err(GeomError::InvalidInput(_))));
    }

    #[test]
    fn test_both_paths_share_the_graph_shape() {
        let points = random_points(40, 10.0, 7);
        let result = triangulate(
            TriangulationInput::PointSet(points),
            &BuildOptions::default(),
        )
        .unwrap();
        // every triangle is reachable from the first over twin links
        assert_eq!(result.graph.traverse_ordered().len(), result.graph.len());
    }
}
