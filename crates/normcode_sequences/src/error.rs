//! Errors a syntactic sequence can raise (§4.7, §7 *plan-validity*).

use normcode_blackboard::BlackboardError;
use normcode_reference::ReferenceError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceError {
    /// A named value/condition/loop-base concept has no reference yet.
    UnboundConcept { concept: String },
    /// An `$-` selector's shape doesn't match the source element it was
    /// applied to (e.g. `key` against a non-object, `index` out of range).
    SelectorMismatch { concept: String, detail: String },
    /// `$-` `unpack` produced differing member counts across positions.
    RaggedUnpack,
    /// A legacy/per-reference grouping step with no value concepts at all.
    EmptyGroup,
    Reference(ReferenceError),
    Blackboard(BlackboardError),
    /// Any other condition the plan itself should have prevented.
    PlanValidity(String),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::UnboundConcept { concept } => write!(f, "concept '{}' has no reference bound yet", concept),
            SequenceError::SelectorMismatch { concept, detail } => {
                write!(f, "selector applied to '{}' does not match its shape: {}", concept, detail)
            }
            SequenceError::RaggedUnpack => write!(f, "'$-' unpack produced a different member count at different positions"),
            SequenceError::EmptyGroup => write!(f, "grouping sequence has no value concepts to group"),
            SequenceError::Reference(e) => write!(f, "{}", e),
            SequenceError::Blackboard(e) => write!(f, "{}", e),
            SequenceError::PlanValidity(detail) => write!(f, "plan-validity: {}", detail),
        }
    }
}

impl std::error::Error for SequenceError {}

impl From<ReferenceError> for SequenceError {
    fn from(e: ReferenceError) -> Self {
        SequenceError::Reference(e)
    }
}

impl From<BlackboardError> for SequenceError {
    fn from(e: BlackboardError) -> Self {
        SequenceError::Blackboard(e)
    }
}

pub type Result<T> = std::result::Result<T, SequenceError>;
