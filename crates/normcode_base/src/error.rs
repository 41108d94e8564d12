//! A minimal located error type shared by every NormCode crate.
//!
//! The core has no source text to point into (plans arrive as already-parsed
//! JSON records), so the "location" is whatever the caller names it: a flow
//! index, a concept name, a cycle number. This is the common currency for
//! the `plan-validity` error kind and friends from the specification's
//! error-handling design.
//!
//! # Example
//!
//! ```
//! use normcode_base::{LocatedError, Result};
//!
//! fn lookup(name: &str) -> Result<i32> {
//!     Err(LocatedError::new(
//!         format!("unknown concept '{}'", name),
//!         name,
//!     ))
//! }
//!
//! let err = lookup("{digit sum}").unwrap_err();
//! assert!(err.to_string().contains("digit sum"));
//! ```

use std::fmt;

/// An error annotated with where in the plan it occurred.
///
/// Implements [`std::error::Error`] and [`fmt::Display`]. The display format
/// is: `{message} (at {location})`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedError {
    /// Human-readable error description.
    pub message: String,
    /// Flow index, concept name, or other identifier naming where the
    /// error occurred.
    pub location: String,
}

impl LocatedError {
    /// Creates an error with the given message and location.
    pub fn new(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.message, self.location)
    }
}

impl std::error::Error for LocatedError {}

/// Alias for `std::result::Result<T, LocatedError>`.
pub type Result<T> = std::result::Result<T, LocatedError>;
