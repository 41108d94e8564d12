//! Checkpoint Store (§3, §4.10, §6): SQLite-backed run snapshots with
//! save/load/list/fork and PATCH/OVERWRITE/FILL_GAPS reconciliation against
//! a freshly loaded plan.

mod environment;
mod error;
mod reconcile;
mod snapshot;
mod store;

pub use environment::signature as environment_signature;
pub use error::{CheckpointError, Result};
pub use reconcile::{fill_gaps, overwrite, patch, ReconciliationMode};
pub use snapshot::{hash_inference, Snapshot};
pub use store::{RunInfo, Store};

use normcode_blackboard::Blackboard;
use normcode_model::{ConceptRepo, InferenceRepo};
use normcode_orchestrator::CheckpointSink;

/// Adapts `Store` to the Orchestrator's `CheckpointSink` seam (§4.9
/// "...and calls `save_snapshot(current_cycle)`"), so `Orchestrator::run`
/// never needs to know this crate exists. Holds the plan's `InferenceRepo`
/// because `Snapshot::capture` hashes every inference's current
/// `(working_interpretation, function_concept)` for later PATCH diffing —
/// the repo is immutable for the run's duration, so borrowing it once at
/// construction is enough.
pub struct StoreSink<'a> {
    store: &'a Store,
    run_id: String,
    repo: &'a InferenceRepo,
}

impl<'a> StoreSink<'a> {
    pub fn new(store: &'a Store, run_id: impl Into<String>, repo: &'a InferenceRepo) -> Self {
        StoreSink { store, run_id: run_id.into(), repo }
    }
}

impl<'a> CheckpointSink for StoreSink<'a> {
    fn save_snapshot(&mut self, cycle: u32, _concepts: &ConceptRepo, blackboard: &Blackboard) -> std::result::Result<(), String> {
        let snapshot = Snapshot::capture(self.repo, blackboard);
        self.store.save_snapshot(&self.run_id, cycle, &snapshot).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_model::InferenceRecord;
    use serde_json::json;

    fn repo() -> InferenceRepo {
        InferenceRepo::load(vec![InferenceRecord {
            flow_index: "1".to_string(),
            sequence_kind: "assigning".to_string(),
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec![],
            context_concepts: vec![],
            working_interpretation: json!({"marker": "."}),
            supporting_children: vec![],
        }])
        .unwrap()
    }

    #[test]
    fn store_sink_persists_snapshots_the_store_can_reload() {
        let repo = repo();
        let store = Store::open_in_memory().unwrap();
        store.create_run("run-a", None, None, "sig").unwrap();
        let concepts = ConceptRepo::default();
        let blackboard = Blackboard::new();

        let mut sink = StoreSink::new(&store, "run-a", &repo);
        sink.save_snapshot(1, &concepts, &blackboard).unwrap();

        let (cycle, _snapshot) = store.load_snapshot("run-a", None).unwrap();
        assert_eq!(cycle, 1);
    }
}
