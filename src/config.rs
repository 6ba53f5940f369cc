//! Build options and validated builder
//!
//! Options shared by the triangulators and the Voronoi constructor.
//! All batch builds are deterministic for a given input and option set.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeomError, Result};

/// Options for triangulation and Voronoi construction
///
/// Use [`BuildOptionsBuilder`] to construct a validated instance, or
/// `BuildOptions::default()` for the recommended defaults.
///
/// # Example
///
/// ```rust
/// use planar_kernel::*;
///
/// let options = BuildOptionsBuilder::new()
///     .max_legalize_flips(50_000).unwrap()
///     .build().unwrap();
/// assert_eq!(options.max_legalize_flips, 50_000);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Hard ceiling on edge flips during Delaunay legalization
    ///
    /// Legalization terminates on its own for well-formed input (each flip
    /// strictly improves the minimum-angle ordering), but pathological
    /// symmetric inputs could in principle oscillate. Exceeding this ceiling
    /// aborts the build with [`GeomError::Structural`] rather than looping.
    pub max_legalize_flips: usize,

    /// Near-duplicate tolerance for point-set triangulation
    ///
    /// Points whose coordinates both differ by no more than this value from
    /// the previously inserted point are skipped during the sweep.
    pub duplicate_epsilon: f64,

    /// Scale factor for "at infinity" Voronoi geometry
    ///
    /// Far rays for unbounded hull cells, and the offset circumcenter
    /// fallback for near-collinear triangles, extend this many times the
    /// diagram extent before clipping. Must comfortably exceed 1.
    pub far_ray_scale: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_legalize_flips: 1_000_000,
            duplicate_epsilon: f64::EPSILON * 2.0,
            far_ray_scale: 1e6,
        }
    }
}

/// Builder for [`BuildOptions`] with validation
///
/// Defaults:
/// - max_legalize_flips: 1,000,000
/// - duplicate_epsilon: 2 * f64::EPSILON
/// - far_ray_scale: 1e6
#[derive(Debug, Clone)]
pub struct BuildOptionsBuilder {
    max_legalize_flips: usize,
    duplicate_epsilon: f64,
    far_ray_scale: f64,
}

impl BuildOptionsBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        let defaults = BuildOptions::default();
        Self {
            max_legalize_flips: defaults.max_legalize_flips,
            duplicate_epsilon: defaults.duplicate_epsilon,
            far_ray_scale: defaults.far_ray_scale,
        }
    }

    /// Set the legalization flip ceiling
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the ceiling is zero.
    pub fn max_legalize_flips(mut self, flips: usize) -> Result<Self> {
        if flips == 0 {
            return Err(GeomError::InvalidConfig(
                "legalization flip ceiling must be positive".to_string(),
            ));
        }
        self.max_legalize_flips = flips;
        Ok(self)
    }

    /// Set the near-duplicate tolerance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the tolerance is negative or not finite.
    pub fn duplicate_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(GeomError::InvalidConfig(format!(
                "duplicate epsilon must be finite and >= 0 (got {})",
                epsilon
            )));
        }
        self.duplicate_epsilon = epsilon;
        Ok(self)
    }

    /// Set the far-ray scale for unbounded Voronoi geometry
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the scale is not finite or <= 1.
    pub fn far_ray_scale(mut self, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 1.0 {
            return Err(GeomError::InvalidConfig(format!(
                "far ray scale must be finite and > 1 (got {})",
                scale
            )));
        }
        self.far_ray_scale = scale;
        Ok(self)
    }

    /// Build the options
    pub fn build(self) -> Result<BuildOptions> {
        Ok(BuildOptions {
            max_legalize_flips: self.max_legalize_flips,
            duplicate_epsilon: self.duplicate_epsilon,
            far_ray_scale: self.far_ray_scale,
        })
    }
}

impl Default for BuildOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
