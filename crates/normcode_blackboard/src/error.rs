//! Errors raised by Blackboard misuse (§4.4, §7).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlackboardError {
    /// `register_identity` found both sides already holding distinct
    /// non-null references.
    IdentityConflict { alias: String, canonical: String },
    /// A loop-workspace operation named a concept that was never carried
    /// or produced by that loop.
    UnknownWorkspaceConcept { concept: String },
}

impl fmt::Display for BlackboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlackboardError::IdentityConflict { alias, canonical } => write!(
                f,
                "identity-conflict: '{}' and '{}' already hold distinct non-null references",
                alias, canonical
            ),
            BlackboardError::UnknownWorkspaceConcept { concept } => {
                write!(f, "workspace has no recorded history for concept '{}'", concept)
            }
        }
    }
}

impl std::error::Error for BlackboardError {}

pub type Result<T> = std::result::Result<T, BlackboardError>;
