//! Errors the Orchestrator's cycle loop raises (§4.9, §7
//! *deadlock-detected*, *cycle-limit-exceeded*, *write-conflict*).

use normcode_model::FlowIndex;
use normcode_semantic::SemanticError;
use normcode_sequences::SequenceError;
use std::fmt;

/// One non-terminal inference left standing when a cycle made no progress,
/// together with the names of the dependencies still holding it back.
#[derive(Debug, Clone)]
pub struct BlockedInference {
    pub flow_index: FlowIndex,
    pub unmet: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum OrchestratorError {
    /// A cycle completed with no entry making progress while at least one
    /// inference remains non-terminal.
    Deadlock { cycle: u32, blocked: Vec<BlockedInference> },
    /// The run reached `max_cycles` without every inference reaching a
    /// terminal status.
    CycleLimitExceeded { max_cycles: u32 },
    /// Two entries ready in the same cycle target the same
    /// `concept_to_infer`; the plan does not define which should win.
    WriteConflict { concept_to_infer: String, flow_index: FlowIndex },
    /// A syntactic sequence (assigning/grouping/timing/looping) failed.
    Sequence(SequenceError),
    /// An imperative/judgement pipeline failed in a way not tolerated as a
    /// non-final failure (either the failing concept is `is_final`, or the
    /// error reflects a malformed plan rather than a retried tool call).
    Semantic(SemanticError),
    /// The cooperative cancellation flag was observed set between entries.
    Cancelled,
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::Deadlock { cycle, blocked } => {
                writeln!(f, "deadlock-detected: cycle {} made no progress with {} inference(s) still pending", cycle, blocked.len())?;
                for b in blocked {
                    writeln!(f, "  - {} blocked on: {}", b.flow_index, b.unmet.join(", "))?;
                }
                Ok(())
            }
            OrchestratorError::CycleLimitExceeded { max_cycles } => {
                write!(f, "cycle-limit-exceeded: run did not terminate within {} cycle(s)", max_cycles)
            }
            OrchestratorError::WriteConflict { concept_to_infer, flow_index } => write!(
                f,
                "write-conflict: inference {} targets '{}', already claimed by another ready inference this cycle",
                flow_index, concept_to_infer
            ),
            OrchestratorError::Sequence(e) => write!(f, "{}", e),
            OrchestratorError::Semantic(e) => write!(f, "{}", e),
            OrchestratorError::Cancelled => write!(f, "run cancelled"),
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl From<SequenceError> for OrchestratorError {
    fn from(e: SequenceError) -> Self {
        OrchestratorError::Sequence(e)
    }
}

impl From<SemanticError> for OrchestratorError {
    fn from(e: SemanticError) -> Self {
        OrchestratorError::Semantic(e)
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
