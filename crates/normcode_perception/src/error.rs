//! Errors raised by the PerceptionRouter (§4.2, §7).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerceptionError {
    /// A `norm` the router has no registered handler for.
    UnknownNorm(String),
    /// A `file-location`/`prompt-location` read failed.
    Io(String),
    /// A `memorized-parameter` read found nothing under the given key.
    NoSuchParameter(String),
}

impl fmt::Display for PerceptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerceptionError::UnknownNorm(norm) => write!(f, "unknown-perception-norm: '{}'", norm),
            PerceptionError::Io(detail) => write!(f, "perception I/O error: {}", detail),
            PerceptionError::NoSuchParameter(key) => write!(f, "no memorized parameter for '{}'", key),
        }
    }
}

impl std::error::Error for PerceptionError {}

pub type Result<T> = std::result::Result<T, PerceptionError>;
