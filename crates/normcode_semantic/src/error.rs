//! Errors a semantic sequence can raise (§4.8, §7 *plan-validity*,
//! *tool-call-error*).

use normcode_blackboard::BlackboardError;
use normcode_paradigm::ParadigmError;
use normcode_reference::ReferenceError;
use std::fmt;

#[derive(Debug, Clone)]
pub enum SemanticError {
    /// `function_concept` has no agent registered under that subject.
    UnknownAgent { subject: String },
    /// Paradigm resolution or composition failed.
    Paradigm(String),
    Reference(ReferenceError),
    Blackboard(BlackboardError),
    /// A `value_selectors` entry doesn't match the shape of the element it
    /// was applied to.
    SelectorMismatch { concept: String, detail: String },
    /// `unpack` produced differing member counts across positions.
    RaggedUnpack,
    /// TVA still had per-element tool-call failures after the retry budget
    /// (§7 *external-tool-error*) was exhausted.
    ActuationFailed { concept: String, failures: Vec<String> },
    /// The pipeline exceeded its per-sequence deadline (§7 *timeout*).
    Timeout,
    /// Any other condition the plan itself should have prevented.
    PlanValidity(String),
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::UnknownAgent { subject } => write!(f, "no agent registered for subject '{}'", subject),
            SemanticError::Paradigm(detail) => write!(f, "{}", detail),
            SemanticError::Reference(e) => write!(f, "{}", e),
            SemanticError::Blackboard(e) => write!(f, "{}", e),
            SemanticError::SelectorMismatch { concept, detail } => {
                write!(f, "selector applied to '{}' does not match its shape: {}", concept, detail)
            }
            SemanticError::RaggedUnpack => write!(f, "unpack produced a different member count at different positions"),
            SemanticError::ActuationFailed { concept, failures } => {
                write!(f, "'{}' failed after exhausting the retry budget: {}", concept, failures.join("; "))
            }
            SemanticError::Timeout => write!(f, "sequence exceeded its per-sequence deadline"),
            SemanticError::PlanValidity(detail) => write!(f, "plan-validity: {}", detail),
        }
    }
}

impl std::error::Error for SemanticError {}

impl From<ParadigmError> for SemanticError {
    fn from(e: ParadigmError) -> Self {
        SemanticError::Paradigm(e.to_string())
    }
}

impl From<ReferenceError> for SemanticError {
    fn from(e: ReferenceError) -> Self {
        SemanticError::Reference(e)
    }
}

impl From<BlackboardError> for SemanticError {
    fn from(e: BlackboardError) -> Self {
        SemanticError::Blackboard(e)
    }
}

pub type Result<T> = std::result::Result<T, SemanticError>;
