//! Errors raised by reference algebra misuse (§4.1, §7).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// `get`/`set` received an index tuple outside `shape`.
    OutOfBounds { axes: Vec<String>, shape: Vec<usize>, index: Vec<usize> },
    /// `slice`/`collapse` named an axis the reference doesn't have.
    UnknownAxis { axis: String, available: Vec<String> },
    /// `append`/`cross_product` operands disagree on a shared axis's size.
    ShapeMismatch { detail: String },
    /// An index tuple's length didn't match the reference's rank.
    RankMismatch { expected: usize, got: usize },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::OutOfBounds { axes, shape, index } => write!(
                f,
                "out-of-bounds index {:?} for shape {:?} on axes {:?}",
                index, shape, axes
            ),
            ReferenceError::UnknownAxis { axis, available } => write!(
                f,
                "unknown-axis '{}' (reference has axes {:?})",
                axis, available
            ),
            ReferenceError::ShapeMismatch { detail } => write!(f, "shape-mismatch: {}", detail),
            ReferenceError::RankMismatch { expected, got } => write!(
                f,
                "index tuple has {} entries, reference has rank {}",
                got, expected
            ),
        }
    }
}

impl std::error::Error for ReferenceError {}

pub type Result<T> = std::result::Result<T, ReferenceError>;
