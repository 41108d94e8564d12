//! The `Snapshot` payload (§3 "Checkpoint snapshot", §4.10): a byte-exact,
//! JSON-serializable copy of everything the Blackboard holds at the end of
//! a cycle, plus a per-inference content hash used by PATCH reconciliation.
//!
//! None of `Reference`/`Element`/`Status`/`Target`/`IdentityTable`/
//! `Workspace` derive `serde::Serialize` — they are runtime algebra types,
//! not wire formats. Rather than add derives to crates this one only
//! consumes, every reference here goes through the same
//! `reference_from_nested`/`reference_to_nested` round trip the inputs
//! file and `ConceptRepo` already use (§6 "Inputs file"), and the rest of
//! the Blackboard's state is mirrored into small serde-derived shapes
//! local to this module.

use crate::error::{CheckpointError, Result};
use normcode_blackboard::{Blackboard, IdentityTable, Status, Target, Workspace};
use normcode_model::{reference_from_nested, reference_to_nested, InferenceEntry, InferenceRepo};
use normcode_reference::Reference;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedReference {
    pub axes: Vec<String>,
    pub data: serde_json::Value,
}

fn to_serialized(reference: &Reference) -> SerializedReference {
    // `reference_to_nested` collapses a singleton (sole axis `NONE_AXIS`) to
    // a bare scalar, and `reference_from_nested` only recognizes that shape
    // when `axes` is empty — an empty `axes` list is this format's spelling
    // of "singleton", not "no axes stored".
    let axes = if reference.axes() == [normcode_reference::NONE_AXIS] { Vec::new() } else { reference.axes().to_vec() };
    SerializedReference { axes, data: reference_to_nested(reference) }
}

fn from_serialized(s: &SerializedReference) -> Result<Reference> {
    Ok(reference_from_nested(&s.data, &s.axes)?)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SerializedStatus {
    Pending,
    InProgress,
    Completed,
    CompletedSkipped,
    Failed,
}

impl From<Status> for SerializedStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Pending => SerializedStatus::Pending,
            Status::InProgress => SerializedStatus::InProgress,
            Status::Completed => SerializedStatus::Completed,
            Status::CompletedSkipped => SerializedStatus::CompletedSkipped,
            Status::Failed => SerializedStatus::Failed,
        }
    }
}

impl From<SerializedStatus> for Status {
    fn from(s: SerializedStatus) -> Self {
        match s {
            SerializedStatus::Pending => Status::Pending,
            SerializedStatus::InProgress => Status::InProgress,
            SerializedStatus::Completed => Status::Completed,
            SerializedStatus::CompletedSkipped => Status::CompletedSkipped,
            SerializedStatus::Failed => Status::Failed,
        }
    }
}

/// `Target` mirrored as a plain enum over a dotted flow-index string,
/// since `FlowIndex` itself is not `Serialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SerializedTarget {
    Concept(String),
    Inference(String),
}

fn to_serialized_target(target: &Target) -> SerializedTarget {
    match target {
        Target::Concept(name) => SerializedTarget::Concept(name.clone()),
        Target::Inference(fi) => SerializedTarget::Inference(fi.to_string()),
    }
}

fn from_serialized_target(target: &SerializedTarget) -> Result<Target> {
    Ok(match target {
        SerializedTarget::Concept(name) => Target::Concept(name.clone()),
        SerializedTarget::Inference(raw) => Target::Inference(
            raw.parse().map_err(|e: normcode_model::FlowIndexParseError| CheckpointError::Serde(e.to_string()))?,
        ),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedWorkspace {
    pub loop_base: SerializedReference,
    pub iteration: usize,
    pub carried_history: BTreeMap<String, Vec<SerializedReference>>,
    pub accumulated: BTreeMap<String, Vec<SerializedReference>>,
}

fn to_serialized_workspace(ws: &Workspace) -> SerializedWorkspace {
    SerializedWorkspace {
        loop_base: to_serialized(&ws.loop_base),
        iteration: ws.iteration,
        carried_history: ws.carried_history().iter().map(|(k, v)| (k.clone(), v.iter().map(to_serialized).collect())).collect(),
        accumulated: ws.accumulated().iter().map(|(k, v)| (k.clone(), v.iter().map(to_serialized).collect())).collect(),
    }
}

fn from_serialized_workspace(s: &SerializedWorkspace) -> Result<Workspace> {
    let loop_base = from_serialized(&s.loop_base)?;
    let mut carried_history = FxHashMap::default();
    for (k, v) in &s.carried_history {
        carried_history.insert(k.clone(), v.iter().map(from_serialized).collect::<Result<Vec<_>>>()?);
    }
    let mut accumulated = FxHashMap::default();
    for (k, v) in &s.accumulated {
        accumulated.insert(k.clone(), v.iter().map(from_serialized).collect::<Result<Vec<_>>>()?);
    }
    Ok(Workspace::restore(loop_base, s.iteration, carried_history, accumulated))
}

/// Content hash of an inference's `(working_interpretation, function_concept)`
/// identity (§3, §4.10), used to detect which inferences changed between
/// the plan that produced a snapshot and the plan a `resume` was invoked
/// against. Hashes the `Debug` rendering of `working_interpretation`: the
/// derive is field-order-stable within one build, which is all PATCH
/// reconciliation needs (it only ever compares hashes produced by the same
/// binary run against the same binary run).
pub fn hash_inference(entry: &InferenceEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", entry.working_interpretation).as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.function_concept.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub statuses: Vec<(SerializedTarget, SerializedStatus)>,
    pub identity: BTreeMap<String, String>,
    pub workspaces: BTreeMap<u32, SerializedWorkspace>,
    pub references: BTreeMap<String, SerializedReference>,
    /// `flow_index` (dotted string) -> hex sha256 of
    /// `(working_interpretation, function_concept)`, as of the cycle this
    /// snapshot was taken.
    pub inference_hashes: BTreeMap<String, String>,
}

impl Snapshot {
    /// Captures the Blackboard's full live state plus a hash of every
    /// inference in `repo`, as of the end of a cycle.
    pub fn capture(repo: &InferenceRepo, blackboard: &Blackboard) -> Self {
        let statuses = blackboard.statuses().iter().map(|(t, s)| (to_serialized_target(t), (*s).into())).collect();
        let identity = blackboard.identity_table().entries().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let workspaces = blackboard.workspaces().iter().map(|(idx, ws)| (*idx, to_serialized_workspace(ws))).collect();
        let references = blackboard.references().iter().map(|(name, r)| (name.clone(), to_serialized(r))).collect();
        let inference_hashes = repo.iterate_sorted().map(|entry| (entry.flow_index.to_string(), hash_inference(entry))).collect();
        Snapshot { statuses, identity, workspaces, references, inference_hashes }
    }

    /// Rebuilds a `Blackboard` from this snapshot (timing flags and
    /// single-use filters are deliberately not persisted — they are
    /// recomputed by their owning timing inference, which PATCH always
    /// resets along with everything downstream of a changed plan).
    pub fn restore_blackboard(&self) -> Result<Blackboard> {
        let mut statuses = FxHashMap::default();
        for (target, status) in &self.statuses {
            statuses.insert(from_serialized_target(target)?, (*status).into());
        }
        let identity = IdentityTable::from_entries(self.identity.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        let mut workspaces = FxHashMap::default();
        for (idx, ws) in &self.workspaces {
            workspaces.insert(*idx, from_serialized_workspace(ws)?);
        }
        let mut references = FxHashMap::default();
        for (name, r) in &self.references {
            references.insert(name.clone(), from_serialized(r)?);
        }
        Ok(Blackboard::restore(statuses, identity, workspaces, references))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_blackboard::TimingFlags;
    use normcode_model::{AssigningWI, InferenceRecord};
    use normcode_reference::Element;
    use serde_json::json;

    fn repo() -> InferenceRepo {
        InferenceRepo::load(vec![InferenceRecord {
            flow_index: "1".to_string(),
            sequence_kind: "assigning".to_string(),
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{a}".to_string()],
            context_concepts: vec![],
            working_interpretation: json!({"marker": "="}),
            supporting_children: vec![],
        }])
        .unwrap()
    }

    #[test]
    fn capture_and_restore_round_trips_statuses_and_references() {
        let repo = repo();
        let mut bb = Blackboard::new();
        bb.set_reference("{a}", Reference::singleton(Element::Primitive(json!(3))));
        bb.set_status(normcode_blackboard::Target::Concept("{a}".to_string()), Status::Completed);
        bb.set_status(normcode_blackboard::Target::Inference("1".parse().unwrap()), Status::Completed);
        // Timing flags are intentionally not part of the snapshot.
        bb.set_timing_flags("1".parse().unwrap(), TimingFlags { timing_ready: true, to_be_skipped: false });

        let snapshot = Snapshot::capture(&repo, &bb);
        let restored = snapshot.restore_blackboard().unwrap();

        assert!(restored.is_concept_ready("{a}"));
        assert!(restored.is_inference_ready(&"1".parse().unwrap()));
        assert_eq!(restored.get_reference("{a}"), bb.get_reference("{a}"));
        assert_eq!(snapshot.inference_hashes.len(), 1);
    }

    #[test]
    fn identical_working_interpretations_hash_equal() {
        let entry_a = InferenceEntry {
            flow_index: "1".parse().unwrap(),
            sequence_kind: normcode_model::SequenceKind::Assigning,
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{a}".to_string()],
            context_concepts: vec![],
            working_interpretation: normcode_model::WorkingInterpretation::Assigning(AssigningWI::Identity),
            supporting_children: vec![],
        };
        let mut entry_b = entry_a.clone();
        entry_b.flow_index = "2".parse().unwrap();
        assert_eq!(hash_inference(&entry_a), hash_inference(&entry_b));

        entry_b.function_concept = "{other_op}".to_string();
        assert_ne!(hash_inference(&entry_a), hash_inference(&entry_b));
    }
}
