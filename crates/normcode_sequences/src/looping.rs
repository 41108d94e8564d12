//! `*.` / "every" (§4.7.4).
//!
//! The state machine is expressed as four independent steps; the
//! Orchestrator drives which one applies each cycle by observing workspace
//! and status state. None of these functions decide *when* to run — only
//! what happens once invoked.

use crate::error::{Result, SequenceError};
use crate::retrieval::require_reference;
use normcode_blackboard::{Blackboard, Status, Target, Workspace};
use normcode_model::{FlowIndex, InferenceRepo, LoopingWI};
use normcode_reference::Selector;

/// Flow indices, minus declared invariants, structurally inside this loop —
/// the set `start`/`bind_iteration` reset to pending each iteration boundary.
/// Invariant filtering happens inside `repo.loop_subtree` itself.
fn resettable_subtree(loop_flow_index: &FlowIndex, repo: &InferenceRepo) -> (Vec<FlowIndex>, Vec<String>) {
    let subtree = repo.loop_subtree(loop_flow_index);
    let concepts: Vec<String> = subtree.iter().filter_map(|fi| repo.get(fi)).map(|e| e.concept_to_infer.clone()).collect();
    (subtree, concepts)
}

/// §4.7.4 "start": seeds the workspace at iteration 0 and resets the loop
/// body's statuses.
pub fn start(loop_flow_index: &FlowIndex, wi: &LoopingWI, repo: &InferenceRepo, blackboard: &mut Blackboard) -> Result<()> {
    let loop_base = require_reference(blackboard, &wi.loop_base_concept)?.clone();
    let mut workspace = Workspace::start(loop_base);
    for concept in wi.in_loop_concept.keys() {
        let initial = require_reference(blackboard, concept)?.clone();
        workspace.seed_carry(concept, initial);
    }
    blackboard.start_workspace(wi.loop_index, workspace);

    let (subtree, concepts) = resettable_subtree(loop_flow_index, repo);
    blackboard.reset_subtree_to_pending(&subtree, &concepts);
    Ok(())
}

/// §4.7.4 "per-iteration": binds the current element and every carried
/// concept's distance-adjusted value, then resets the body again.
pub fn bind_iteration(loop_flow_index: &FlowIndex, wi: &LoopingWI, repo: &InferenceRepo, blackboard: &mut Blackboard) -> Result<()> {
    let iteration = blackboard
        .workspace(wi.loop_index)
        .ok_or_else(|| SequenceError::PlanValidity(format!("loop {} has no active workspace", loop_flow_index)))?
        .iteration;

    let loop_base = require_reference(blackboard, &wi.loop_base_concept)?.clone();
    let axis = loop_base
        .axes()
        .first()
        .ok_or_else(|| SequenceError::PlanValidity("loop_base_concept reference has no axes to iterate".to_string()))?
        .clone();
    let element_ref = loop_base.slice(&axis, Selector::Index(iteration))?;
    blackboard.set_reference(&wi.current_loop_base_concept, element_ref);
    blackboard.set_status(Target::Concept(wi.current_loop_base_concept.clone()), Status::Completed);

    for (concept, distance) in &wi.in_loop_concept {
        let workspace = blackboard.workspace(wi.loop_index).expect("checked above");
        let carried = workspace.carried_at(concept, *distance)?.clone();
        blackboard.set_reference(concept, carried);
        blackboard.set_status(Target::Concept(concept.clone()), Status::Completed);
    }

    let (subtree, concepts) = resettable_subtree(loop_flow_index, repo);
    blackboard.reset_subtree_to_pending(&subtree, &concepts);
    Ok(())
}

/// §4.7.4 "iteration complete": true once every `ConceptToInfer` is ready
/// under the current iteration's bindings; records each into the
/// accumulator and each carried concept's post-iteration value, then
/// advances.
pub fn try_complete_iteration(wi: &LoopingWI, blackboard: &mut Blackboard) -> Result<bool> {
    if !wi.concept_to_infer.iter().all(|c| blackboard.is_concept_ready(c)) {
        return Ok(false);
    }

    for concept in &wi.concept_to_infer {
        let r = require_reference(blackboard, concept)?.clone();
        let workspace = blackboard.workspace_mut(wi.loop_index).expect("workspace active during iteration");
        workspace.record_output(concept, r);
    }
    for concept in wi.in_loop_concept.keys() {
        let r = require_reference(blackboard, concept)?.clone();
        let workspace = blackboard.workspace_mut(wi.loop_index).expect("workspace active during iteration");
        workspace.record_carry(concept, r);
    }
    blackboard.workspace_mut(wi.loop_index).expect("workspace active during iteration").advance();
    Ok(true)
}

/// True once every element of `LoopBaseConcept` has been processed.
pub fn is_exhausted(wi: &LoopingWI, blackboard: &Blackboard) -> Result<bool> {
    let loop_base = require_reference(blackboard, &wi.loop_base_concept)?;
    let axis = loop_base.axes().first().ok_or_else(|| SequenceError::PlanValidity("loop_base_concept reference has no axes".to_string()))?;
    let workspace = blackboard
        .workspace(wi.loop_index)
        .ok_or_else(|| SequenceError::PlanValidity("loop has no active workspace".to_string()))?;
    Ok(workspace.iterations_completed() >= loop_base.axis_size(axis).unwrap_or(0))
}

/// §4.7.4 "loop complete": writes the accumulated per-iteration outputs and
/// marks the loop's own inference completed.
pub fn finish(loop_flow_index: &FlowIndex, wi: &LoopingWI, blackboard: &mut Blackboard) -> Result<()> {
    for concept in &wi.concept_to_infer {
        let workspace = blackboard.workspace(wi.loop_index).expect("workspace active until finish");
        let result = workspace.finalize_output(concept, &wi.group_base)?;
        blackboard.set_reference(concept, result);
        blackboard.set_status(Target::Concept(concept.clone()), Status::Completed);
    }
    blackboard.remove_workspace(wi.loop_index);
    blackboard.set_status(Target::Inference(loop_flow_index.clone()), Status::Completed);
    Ok(())
}
