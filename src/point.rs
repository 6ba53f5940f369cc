//! Point value type and planar helpers
//!
//! Points are immutable value data: geometry functions return new points
//! rather than mutating in place. The z component is carried through for 3D
//! callers (convex hull, minimum enclosing sphere) and is zero for planar
//! work.

use glam::{DQuat, DVec2, DVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3-component coordinate with value semantics
///
/// Equality is exact component-wise comparison. Algorithms never mutate a
/// point after construction; they replace it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a point from three coordinates
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a planar point (z = 0)
    #[inline]
    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    #[inline]
    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn to_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn from_dvec3(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist2(&self, other: &Point) -> f64 {
        (self.to_dvec3() - other.to_dvec3()).length_squared()
    }

    /// Whether both planar coordinates differ by at most `epsilon`
    #[inline]
    pub fn nearly_equals(&self, other: &Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }

    /// Bitwise coordinate key for exact-equality hashing
    #[inline]
    pub(crate) fn key(&self) -> [u64; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.z.to_bits()]
    }
}

/// Arithmetic average of a point set
///
/// Returns the origin for an empty slice.
pub fn centroid_of(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let sum: DVec3 = points.iter().map(|p| p.to_dvec3()).sum();
    Point::from_dvec3(sum / points.len() as f64)
}

/// Relative tolerance used by the degeneracy detectors
const DEGENERACY_TOL: f64 = 1e-9;

/// Polygon normal via Newell's method
///
/// Robust against concave boundaries; the result is unnormalized and has
/// near-zero length when the points are collinear or coincident.
pub fn newell_normal(points: &[Point]) -> DVec3 {
    let mut normal = DVec3::ZERO;
    let n = points.len();
    for i in 0..n {
        let a = points[i].to_dvec3();
        let b = points[(i + 1) % n].to_dvec3();
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Whether every point lies on one line (within relative tolerance)
pub fn all_collinear(points: &[Point]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let a = points[0].to_dvec3();
    // first point distinct from a spans the candidate line
    let Some(b) = points[1..]
        .iter()
        .map(|p| p.to_dvec3())
        .find(|p| (*p - a).length_squared() > 0.0)
    else {
        return true;
    };
    let dir = b - a;
    let scale = dir.length_squared().max(1.0);
    points.iter().all(|p| {
        let cross = dir.cross(p.to_dvec3() - a);
        cross.length_squared() <= DEGENERACY_TOL * DEGENERACY_TOL * scale * scale
    })
}

/// Whether every point lies on one plane (within relative tolerance)
///
/// Collinear point sets count as coplanar (every line lies in some plane).
pub fn all_coplanar(points: &[Point]) -> bool {
    if points.len() < 4 {
        return true;
    }
    let normal = newell_normal(points);
    if normal.length_squared() == 0.0 {
        return all_collinear(points);
    }
    let unit = normal.normalize();
    let origin = points[0].to_dvec3();
    let extent = points
        .iter()
        .map(|p| (p.to_dvec3() - origin).length())
        .fold(0.0_f64, f64::max)
        .max(1.0);
    points
        .iter()
        .all(|p| (p.to_dvec3() - origin).dot(unit).abs() <= DEGENERACY_TOL * extent)
}

/// Rotation that carries a polygon's plane onto the canonical z = 0 plane
///
/// Built from the polygon normal; remembers the plane's z offset so the
/// transform can be inverted exactly once results are computed.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRotation {
    rotation: DQuat,
    z_offset: f64,
}

impl PlaneRotation {
    /// Construct the rotation for a coplanar point set
    ///
    /// Returns `None` when no plane is spanned (collinear or coincident
    /// points).
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let normal = newell_normal(points);
        if normal.length_squared() == 0.0 {
            return None;
        }
        let rotation = DQuat::from_rotation_arc(normal.normalize(), DVec3::Z);
        let z_offset = (rotation * points[0].to_dvec3()).z;
        Some(Self { rotation, z_offset })
    }

    /// Rotate a point into the canonical plane (its z becomes exactly 0)
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let v = self.rotation * p.to_dvec3();
        Point::xy(v.x, v.y)
    }

    /// Rotate a canonical-plane point back to the original plane
    #[inline]
    pub fn invert(&self, p: Point) -> Point {
        let v = DVec3::new(p.x, p.y, self.z_offset);
        Point::from_dvec3(self.rotation.inverse() * v)
    }
}

/// Generate `count` deterministic random planar points in `[-extent, extent]²`
///
/// The same seed always produces the same point cloud.
pub fn random_points(count: usize, extent: f64, seed: u64) -> Vec<Point> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Point::xy(
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
            )
        })
        .collect()
}

/// Perturb each point by up to `magnitude` per planar axis, deterministically
///
/// The documented mitigation for collinear or otherwise degenerate inputs:
/// jitter, then re-triangulate. The kernel never applies this automatically.
pub fn jitter_points(points: &[Point], magnitude: f64, seed: u64) -> Vec<Point> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    points
        .iter()
        .map(|p| {
            Point::new(
                p.x + rng.gen_range(-magnitude..=magnitude),
                p.y + rng.gen_range(-magnitude..=magnitude),
                p.z,
            )
        })
        .collect()
}
