//! Drives `normcode_sequences::looping`'s stateless state machine across
//! cycles (§4.9 "Loop re-execution"). The machine itself keeps no memory
//! between calls beyond whatever `Blackboard::workspace` holds, so the
//! Orchestrator tells "not started" from "mid-iteration" purely by whether
//! a workspace exists for the loop's `loop_index` — see
//! `normcode_sequences::looping`'s own integration test for the exact
//! start → bind → complete → bind/finish sequence this mirrors.

use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{FlowIndex, InferenceRepo, LoopingWI};
use normcode_sequences::{looping, Result};

/// Advances a `*.` loop entry by exactly one state-machine step, returning
/// whether anything changed this cycle.
///
/// `try_complete_iteration == true` is always followed, in the same call,
/// by either `finish` or `bind_iteration` — the loop never leaves a
/// completed-but-unbound iteration visible across a cycle boundary.
pub fn drive(loop_flow_index: &FlowIndex, wi: &LoopingWI, repo: &InferenceRepo, blackboard: &mut Blackboard) -> Result<bool> {
    if blackboard.workspace(wi.loop_index).is_none() {
        looping::start(loop_flow_index, wi, repo, blackboard)?;
        blackboard.set_status(Target::Inference(loop_flow_index.clone()), Status::InProgress);
        // An empty `LoopBaseConcept` has nothing to bind: go straight to
        // `finish` so each `ConceptToInfer` still gets a reference (with a
        // zero-sized `group_base` axis) rather than attempting to slice a
        // nonexistent element 0 (§8 "a loop over an empty base collection
        // completes immediately").
        if looping::is_exhausted(wi, blackboard)? {
            looping::finish(loop_flow_index, wi, blackboard)?;
        } else {
            looping::bind_iteration(loop_flow_index, wi, repo, blackboard)?;
        }
        return Ok(true);
    }

    if looping::try_complete_iteration(wi, blackboard)? {
        if looping::is_exhausted(wi, blackboard)? {
            looping::finish(loop_flow_index, wi, blackboard)?;
        } else {
            looping::bind_iteration(loop_flow_index, wi, repo, blackboard)?;
        }
        return Ok(true);
    }

    Ok(false)
}
