//! Error types for the geometry kernel

use std::fmt;

/// Errors that can occur while building triangulations, diagrams, or indexes
#[derive(Debug, Clone)]
pub enum GeomError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Input points do not satisfy the operation's preconditions
    /// (too few distinct points, non-coplanar polygon, non-simple polygon)
    InvalidInput(String),
    /// A topological contract was violated mid-build
    /// (e.g. the legalization flip ceiling was exceeded)
    Structural(String),
    /// Requested shape ID does not exist in the graph or index
    ShapeNotFound(usize),
}

impl fmt::Display for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeomError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            GeomError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            GeomError::Structural(msg) => write!(f, "structural error: {}", msg),
            GeomError::ShapeNotFound(id) => write!(f, "shape not found: {}", id),
        }
    }
}

impl std::error::Error for GeomError {}

/// Result type alias for kernel operations
pub type Result<T> = std::result::Result<T, GeomError>;
