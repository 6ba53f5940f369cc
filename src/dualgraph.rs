//! Half-edge dual graph
//!
//! Connectivity structure over a set of polygon shapes. Every boundary edge
//! of a shape owns one half-edge; half-edges of adjacent shapes sharing an
//! undirected edge are linked as twins. Nodes are connected purely through
//! twin links, never through an explicit adjacency list.
//!
//! Half-edges live in a flat arena and refer to each other by index
//! (`next`, `twin`) instead of managed references; the same numbering is
//! shared with the point-set triangulator's flat buffers, so both
//! triangulation strategies end up on one representation.

use crate::error::{GeomError, Result};
use crate::point::Point;
use crate::shape::Shape;
use crate::triangulation::sweep::{SweepHull, EMPTY};

/// Index of a half-edge in the graph arena
pub type EdgeId = usize;
/// Index of a node in the graph
pub type NodeId = usize;

/// One directed boundary segment of a shape
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// Origin vertex; the destination is the origin of `next`
    pub origin: Point,
    /// Next half-edge in the owning shape's cycle
    pub next: EdgeId,
    /// Matching half-edge of the adjacent shape, if any
    pub twin: Option<EdgeId>,
    /// The node owning this half-edge
    pub node: NodeId,
}

/// One shape plus its first half-edge and a cached centroid
#[derive(Debug, Clone)]
pub struct Node {
    pub shape: Shape,
    pub first_edge: EdgeId,
    pub centroid: Point,
}

/// Insertion-ordered collection of nodes linked by half-edge twins
#[derive(Debug, Clone, Default)]
pub struct DualGraph {
    nodes: Vec<Node>,
    edges: Vec<HalfEdge>,
}

impl DualGraph {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &HalfEdge {
        &self.edges[id]
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a shape by its insertion-order id
    ///
    /// # Errors
    ///
    /// Returns `ShapeNotFound` for an id outside the graph; callers treat
    /// that as a contract violation, not a retryable condition.
    pub fn shape(&self, id: usize) -> Result<&Shape> {
        self.nodes
            .get(id)
            .map(|n| &n.shape)
            .ok_or(GeomError::ShapeNotFound(id))
    }

    /// All shapes in insertion order
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.nodes.iter().map(|n| &n.shape)
    }

    /// Origin and destination of a half-edge
    #[inline]
    pub fn endpoints(&self, id: EdgeId) -> (Point, Point) {
        let e = &self.edges[id];
        (e.origin, self.edges[e.next].origin)
    }

    /// Insert a shape: build its half-edges, twin them against every
    /// existing node that shares an edge, and append the node
    ///
    /// Connection attempts stop early once all of the new shape's edges have
    /// found their twin; that is an optimization, not a correctness
    /// requirement.
    pub fn insert_shape(&mut self, mut shape: Shape) -> NodeId {
        let node_id = self.nodes.len();
        shape.id = node_id;
        let first_edge = self.build_edges(&shape, node_id);
        let centroid = shape.centroid();
        self.nodes.push(Node {
            shape,
            first_edge,
            centroid,
        });

        let wanted = self.nodes[node_id].shape.edge_count();
        for other in 0..node_id {
            self.connect(node_id, other);
            if self.matched_edge_count(node_id) == wanted {
                break;
            }
        }
        node_id
    }

    /// Wire twins between every pair of half-edges of `a` and `b` that share
    /// an undirected edge; returns whether any connection was made
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> bool {
        let mut connected = false;
        let a_edges = self.node_edge_ids(a);
        let b_edges = self.node_edge_ids(b);
        for &ea in &a_edges {
            if self.edges[ea].twin.is_some() {
                continue;
            }
            let (a0, a1) = self.endpoints(ea);
            for &eb in &b_edges {
                if self.edges[eb].twin.is_some() {
                    continue;
                }
                let (b0, b1) = self.endpoints(eb);
                // equal endpoints in either order
                if (a0 == b0 && a1 == b1) || (a0 == b1 && a1 == b0) {
                    self.edges[ea].twin = Some(eb);
                    self.edges[eb].twin = Some(ea);
                    connected = true;
                    break;
                }
            }
        }
        connected
    }

    /// Depth-first walk over twin links starting from the first node
    ///
    /// Visits each node exactly once; an empty graph yields an empty
    /// sequence.
    pub fn traverse_ordered(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![0];
        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            order.push(node);
            for edge in self.node_edge_ids(node) {
                if let Some(twin) = self.edges[edge].twin {
                    let neighbor = self.edges[twin].node;
                    if !visited[neighbor] {
                        stack.push(neighbor);
                    }
                }
            }
        }
        // disconnected remainder, in insertion order
        for node in 0..self.nodes.len() {
            if !visited[node] {
                order.push(node);
            }
        }
        order
    }

    /// Flip the diagonal shared by two triangles
    ///
    /// Rewires both triangles' point cycles so the shared edge connects the
    /// opposite vertex pair instead, relinks the twins of the four outer
    /// edges, and recomputes both cached centroids.
    ///
    /// ```text
    ///        pl                 pl
    ///       /  \               /| \
    ///      / A  \             / |  \
    ///   p0 ------ p1   =>  p0 A | B  p1
    ///      \ B  /             \ |  /
    ///       \  /               \| /
    ///        pr                 pr
    /// ```
    ///
    /// # Panics
    ///
    /// Panics when the edge has no twin (hull edges cannot be flipped) or
    /// when either incident shape is not a triangle. Both are programming
    /// errors in the caller.
    pub fn flip_edge(&mut self, a: EdgeId) {
        let b = self.edges[a]
            .twin
            .expect("flip_edge requires an interior edge with a twin");
        let node_a = self.edges[a].node;
        let node_b = self.edges[b].node;
        assert!(
            self.nodes[node_a].shape.edge_count() == 3
                && self.nodes[node_b].shape.edge_count() == 3,
            "flip_edge requires two triangles"
        );

        let al = self.edges[a].next;
        let ar = self.edges[al].next;
        let br = self.edges[b].next;
        let bl = self.edges[br].next;

        // apexes opposite the shared edge
        let p0 = self.edges[ar].origin;
        let p1 = self.edges[bl].origin;

        self.edges[a].origin = p1;
        self.edges[b].origin = p0;

        let har = self.edges[ar].twin;
        let hbl = self.edges[bl].twin;

        self.set_twin(a, hbl);
        self.set_twin(b, har);
        self.set_twin(ar, Some(bl));

        self.refresh_node(node_a);
        self.refresh_node(node_b);
    }

    /// Build a graph from the point-set triangulator's flat buffers
    ///
    /// The sweep half-edge numbering maps one-to-one onto the arena, so the
    /// conversion is a single pass with no edge matching.
    pub fn from_point_set(sweep: &SweepHull, points: &[Point]) -> Self {
        let triangle_count = sweep.triangles.len() / 3;
        let mut graph = Self {
            nodes: Vec::with_capacity(triangle_count),
            edges: Vec::with_capacity(sweep.triangles.len()),
        };
        for t in 0..triangle_count {
            let base = 3 * t;
            let corners = [
                points[sweep.triangles[base]],
                points[sweep.triangles[base + 1]],
                points[sweep.triangles[base + 2]],
            ];
            for k in 0..3 {
                let twin = match sweep.halfedges[base + k] {
                    EMPTY => None,
                    other => Some(other),
                };
                graph.edges.push(HalfEdge {
                    origin: corners[k],
                    next: base + (k + 1) % 3,
                    twin,
                    node: t,
                });
            }
            let shape = Shape {
                id: t,
                kind: crate::shape::ShapeKind::Triangle,
                points: corners.to_vec(),
            };
            let centroid = shape.centroid();
            graph.nodes.push(Node {
                shape,
                first_edge: base,
                centroid,
            });
        }
        graph
    }

    /// Half-edge ids of one node's cycle
    pub fn node_edge_ids(&self, node: NodeId) -> Vec<EdgeId> {
        let first = self.nodes[node].first_edge;
        let mut ids = Vec::with_capacity(self.nodes[node].shape.edge_count());
        let mut e = first;
        loop {
            ids.push(e);
            e = self.edges[e].next;
            if e == first {
                break;
            }
        }
        ids
    }

    /// Ids of half-edges with no twin (the boundary of the triangulated
    /// region)
    pub fn hull_edge_ids(&self) -> Vec<EdgeId> {
        (0..self.edges.len())
            .filter(|&e| self.edges[e].twin.is_none())
            .collect()
    }

    /// Apply a point transform to every vertex in the graph
    ///
    /// Used to rotate a canonical-plane triangulation back into its original
    /// plane; connectivity is untouched, centroids are recomputed.
    pub fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        for edge in &mut self.edges {
            edge.origin = f(edge.origin);
        }
        for node in &mut self.nodes {
            for p in &mut node.shape.points {
                *p = f(*p);
            }
            node.centroid = node.shape.centroid();
        }
    }

    fn build_edges(&mut self, shape: &Shape, node: NodeId) -> EdgeId {
        let first = self.edges.len();
        let n = shape.edge_count();
        for (i, &origin) in shape.points.iter().enumerate() {
            self.edges.push(HalfEdge {
                origin,
                next: first + (i + 1) % n,
                twin: None,
                node,
            });
        }
        first
    }

    fn matched_edge_count(&self, node: NodeId) -> usize {
        self.node_edge_ids(node)
            .iter()
            .filter(|&&e| self.edges[e].twin.is_some())
            .count()
    }

    fn set_twin(&mut self, edge: EdgeId, twin: Option<EdgeId>) {
        self.edges[edge].twin = twin;
        if let Some(t) = twin {
            self.edges[t].twin = Some(edge);
        }
    }

    /// Rebuild a node's shape points from its half-edge cycle and refresh
    /// the cached centroid
    fn refresh_node(&mut self, node: NodeId) {
        let ids = self.node_edge_ids(node);
        let points: Vec<Point> = ids.iter().map(|&e| self.edges[e].origin).collect();
        self.nodes[node].shape.points = points;
        self.nodes[node].centroid = self.nodes[node].shape.centroid();
    }
}
