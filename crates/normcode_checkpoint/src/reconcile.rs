//! Reconciliation between a loaded `resume` snapshot and the current plan's
//! `InferenceRepo`/`ConceptRepo` (§4.10 [ADDED] "Reconciliation modes").

use crate::environment::signature as environment_signature;
use crate::error::{CheckpointError, Result};
use crate::snapshot::{hash_inference, Snapshot};
use normcode_agent::Body;
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{ConceptRepo, FlowIndex, InferenceRepo};
use normcode_paradigm::ParadigmRegistry;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationMode {
    Patch,
    Overwrite,
    FillGaps,
}

impl ReconciliationMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "patch" => Some(ReconciliationMode::Patch),
            "overwrite" => Some(ReconciliationMode::Overwrite),
            "fill-gaps" | "fill_gaps" => Some(ReconciliationMode::FillGaps),
            _ => None,
        }
    }
}

/// Consumer edges for PATCH's transitive reset: an entry "depends on"
/// every entry whose `concept_to_infer` it reads through `value_concepts`/
/// `context_concepts`/`function_concept`, and on every one of its own
/// `supporting_children` (a parent cannot stay settled if a child it
/// needed gets reset).
fn dependents_by_flow_index(repo: &InferenceRepo) -> FxHashMap<FlowIndex, Vec<FlowIndex>> {
    let mut producer_of: FxHashMap<&str, FlowIndex> = FxHashMap::default();
    for entry in repo.iterate_sorted() {
        producer_of.insert(entry.concept_to_infer.as_str(), entry.flow_index.clone());
    }

    let mut dependents: FxHashMap<FlowIndex, Vec<FlowIndex>> = FxHashMap::default();
    for entry in repo.iterate_sorted() {
        let mut consumed = entry.value_concepts.clone();
        consumed.extend(entry.context_concepts.clone());
        consumed.push(entry.function_concept.clone());
        for concept in consumed {
            if let Some(producer) = producer_of.get(concept.as_str()) {
                if producer != &entry.flow_index {
                    dependents.entry(producer.clone()).or_default().push(entry.flow_index.clone());
                }
            }
        }
        for child in &entry.supporting_children {
            dependents.entry(child.clone()).or_default().push(entry.flow_index.clone());
        }
    }
    dependents
}

/// PATCH (default, §4.10): resets every inference whose `(working_interpretation,
/// function_concept)` hash differs from the snapshot's, plus the transitive
/// closure of everything that depends on it, to pending. Everything else —
/// including entries the snapshot never saw because the plan grew new ones —
/// loads verbatim from the snapshot, or starts pending if the snapshot has
/// no record of it.
pub fn patch(repo: &InferenceRepo, snapshot: &Snapshot) -> Result<Blackboard> {
    let mut blackboard = snapshot.restore_blackboard()?;
    let dependents = dependents_by_flow_index(repo);

    let mut changed: FxHashSet<FlowIndex> = FxHashSet::default();
    for entry in repo.iterate_sorted() {
        let current_hash = hash_inference(entry);
        let matches_snapshot = snapshot.inference_hashes.get(&entry.flow_index.to_string()).map(|h| h == &current_hash).unwrap_or(false);
        if !matches_snapshot {
            changed.insert(entry.flow_index.clone());
        }
    }

    let mut to_reset: FxHashSet<FlowIndex> = FxHashSet::default();
    let mut queue: Vec<FlowIndex> = changed.into_iter().collect();
    while let Some(fi) = queue.pop() {
        if !to_reset.insert(fi.clone()) {
            continue;
        }
        if let Some(more) = dependents.get(&fi) {
            queue.extend(more.iter().cloned());
        }
    }

    let concepts: Vec<String> = to_reset
        .iter()
        .filter_map(|fi| repo.get(fi).map(|entry| entry.concept_to_infer.clone()))
        .collect();
    let subtree: Vec<FlowIndex> = to_reset.into_iter().collect();
    blackboard.reset_subtree_to_pending(&subtree, &concepts);

    Ok(blackboard)
}

/// OVERWRITE (§4.10): loads the snapshot verbatim, refusing with
/// `ReconciliationRefused` (CLI exit code 5) if the current paradigm
/// registry and tool set differ from what produced the snapshot — a
/// mismatched environment makes the snapshot's references potentially
/// meaningless (e.g. a tool's output shape changed), so OVERWRITE is not
/// allowed to paper over that silently.
pub fn overwrite(snapshot: &Snapshot, recorded_signature: &str, paradigms: &ParadigmRegistry, body: &Body) -> Result<Blackboard> {
    let current_signature = environment_signature(paradigms, body);
    if current_signature != recorded_signature {
        return Err(CheckpointError::ReconciliationRefused {
            detail: "paradigm registry or tool set changed since this run's snapshot was taken".to_string(),
        });
    }
    snapshot.restore_blackboard()
}

/// FILL_GAPS (§4.10): fills in only the concepts and inferences the
/// *current* repos leave pending; anything the live blackboard already
/// has settled wins over the snapshot. Used to seed a fresh run's ground
/// data from an old run without discarding anything already computed in
/// this process (e.g. after `seed`).
pub fn fill_gaps(concepts: &ConceptRepo, repo: &InferenceRepo, live: &mut Blackboard, snapshot: &Snapshot) -> Result<()> {
    let restored = snapshot.restore_blackboard()?;

    for name in concepts.names() {
        if !live.is_concept_ready(name) {
            if restored.is_concept_ready(name) {
                if let Some(reference) = restored.get_reference(name) {
                    live.set_reference(name, reference.clone());
                }
                live.set_status(Target::Concept(name.to_string()), Status::Completed);
            }
        }
    }

    for entry in repo.iterate_sorted() {
        let target = Target::Inference(entry.flow_index.clone());
        if !live.is_inference_ready(&entry.flow_index) {
            let restored_status = restored.status(&target);
            if restored_status.is_ready() {
                live.set_status(target, restored_status);
            }
        }
    }

    Ok(())
}
