//! Robust planar Delaunay/Voronoi geometry kernel
//!
//! A standalone library for planar computational geometry: adaptive-precision
//! orientation and in-circle predicates, Delaunay triangulation of point sets
//! and simple polygon boundaries, clipped Voronoi diagrams, convex hulls with
//! enclosing spheres, and an R-tree spatial index over the results.
//!
//! # Quick Start
//!
//! ```rust
//! use planar_kernel::*;
//!
//! // Triangulate a point cloud
//! let sites = random_points(64, 10.0, 42);
//! let triangulation = triangulate(
//!     TriangulationInput::PointSet(sites),
//!     &BuildOptions::default(),
//! ).unwrap();
//! println!("{} Delaunay triangles", triangulation.graph.len());
//!
//! // Build its Voronoi diagram, clipped to a box
//! let rect = ClipRect::new(-12.0, -12.0, 12.0, 12.0).unwrap();
//! let diagram = VoronoiDiagram::build(&triangulation, rect, &BuildOptions::default()).unwrap();
//! println!("{} Voronoi cells", diagram.cells.len());
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for options and output records

// Modules
pub mod config;
pub mod dualgraph;
pub mod error;
pub mod hull;
pub mod point;
pub mod predicates;
pub mod rtree;
pub mod shape;
pub mod triangulation;
pub mod voronoi;

// Re-export core types for convenience
pub use config::{BuildOptions, BuildOptionsBuilder};
pub use dualgraph::{DualGraph, EdgeId, HalfEdge, Node, NodeId};
pub use error::{GeomError, Result};
pub use hull::{convex_hull, min_enclosing_sphere, Sphere};
pub use point::{centroid_of, jitter_points, random_points, PlaneRotation, Point};
pub use predicates::{circumcenter, in_circumcircle, is_ccw, orientation};
pub use rtree::{Aabb, RTree};
pub use shape::{Shape, ShapeKind};
pub use triangulation::{triangulate, Triangulation, TriangulationInput};
pub use voronoi::{ClipRect, VoronoiCell, VoronoiDiagram};
