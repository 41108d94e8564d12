//! Concept/inference status (§3) and the unified key both are tracked
//! under.

use normcode_model::FlowIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    CompletedSkipped,
    Failed,
}

impl Status {
    /// §4.4 `is_concept_ready`: true iff completed or completed_skipped.
    pub fn is_ready(self) -> bool {
        matches!(self, Status::Completed | Status::CompletedSkipped)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::CompletedSkipped | Status::Failed)
    }
}

/// Status and filters are tracked per concept name or per inference flow
/// index; both share one map keyed by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Concept(String),
    Inference(FlowIndex),
}

impl From<FlowIndex> for Target {
    fn from(fi: FlowIndex) -> Self {
        Target::Inference(fi)
    }
}
