//! Syntactic sequences (§4.7): assigning, grouping, timing, looping. All
//! four share one pipeline skeleton — interpret working interpretation,
//! retrieve input references, perform the operation, write the output
//! reference, finalize — and none of them ever call an external tool; they
//! are the deterministic half of the runtime (§4.8's imperative/judgement
//! sequences are the other half, in `normcode-semantic`).

pub mod assigning;
pub mod error;
pub mod grouping;
pub mod looping;
pub mod retrieval;
pub mod timing;

pub use error::{Result, SequenceError};

use normcode_blackboard::Blackboard;
use normcode_model::{InferenceEntry, InferenceRepo, WorkingInterpretation};

/// Executes one non-loop, non-semantic inference entry per its
/// `working_interpretation`. Looping's multi-step state machine has its own
/// entry points in the `looping` module, since the Orchestrator — not this
/// dispatcher — decides which step of a loop applies on a given cycle.
pub fn run(entry: &InferenceEntry, repo: &InferenceRepo, blackboard: &mut Blackboard) -> Result<()> {
    match &entry.working_interpretation {
        WorkingInterpretation::Assigning(wi) => assigning::run(entry, wi, blackboard),
        WorkingInterpretation::Grouping(mode, wi) => grouping::run(entry, *mode, wi, blackboard),
        WorkingInterpretation::Timing(wi) => timing::run(entry, wi, blackboard),
        WorkingInterpretation::Looping(wi) => looping::start(&entry.flow_index, wi, repo, blackboard),
        WorkingInterpretation::Imperative(_) | WorkingInterpretation::Judgement(_) => Err(SequenceError::PlanValidity(
            "semantic sequences are dispatched through normcode-semantic, not normcode-sequences".to_string(),
        )),
    }
}
