//! The Blackboard (§3, §4.4): the sole authoritative tracker of concept and
//! inference status, identity aliasing, loop workspaces, and per-parent
//! timing filters.
//!
//! Every status mutation in the runtime goes through one `Blackboard`
//! instance. Sequences never touch a `Status` map directly; they call
//! `set_status`/`register_identity`/`inject_filter` here, and the
//! Orchestrator is the only caller that reads across the whole map (to
//! find ready entries).

mod error;
mod identity;
mod status;
mod timing;
mod workspace;

pub use error::{BlackboardError, Result};
pub use identity::IdentityTable;
pub use status::{Status, Target};
pub use timing::TimingFlags;
pub use workspace::Workspace;

use normcode_model::FlowIndex;
use normcode_reference::Reference;
use rustc_hash::FxHashMap;

/// Authoritative status tracker for every concept and inference (§3, §4.4).
#[derive(Debug, Default)]
pub struct Blackboard {
    statuses: FxHashMap<Target, Status>,
    identity: IdentityTable,
    workspaces: FxHashMap<u32, Workspace>,
    filters: FxHashMap<FlowIndex, Vec<bool>>,
    references: FxHashMap<String, Reference>,
    timing_flags: FxHashMap<FlowIndex, TimingFlags>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `name` through the identity union-find before reading
    /// status; this is what makes two aliased names share one status by
    /// construction (Invariant 4, Alias coherence).
    fn canonical(&mut self, name: &str) -> String {
        self.identity.find(name)
    }

    pub fn status(&self, target: &Target) -> Status {
        let key = match target {
            Target::Concept(name) => Target::Concept(self.identity.find_immutable(name)),
            Target::Inference(fi) => Target::Inference(fi.clone()),
        };
        self.statuses.get(&key).copied().unwrap_or(Status::Pending)
    }

    /// Sets a target's status. Monotonicity (Invariant 1) is the caller's
    /// responsibility at the Orchestrator/sequence boundary — a loop reset
    /// is the one sanctioned exception and goes through
    /// `reset_subtree_to_pending`, not this method directly, so ordinary
    /// callers never need to special-case it.
    pub fn set_status(&mut self, target: Target, status: Status) {
        let key = match target {
            Target::Concept(name) => Target::Concept(self.canonical(&name)),
            Target::Inference(fi) => Target::Inference(fi),
        };
        self.statuses.insert(key, status);
    }

    /// §4.4 `is_concept_ready`: true iff completed or completed_skipped.
    pub fn is_concept_ready(&self, name: &str) -> bool {
        self.status(&Target::Concept(name.to_string())).is_ready()
    }

    pub fn is_inference_ready(&self, flow_index: &FlowIndex) -> bool {
        self.status(&Target::Inference(flow_index.clone())).is_ready()
    }

    pub fn get_reference(&self, name: &str) -> Option<&Reference> {
        let canonical = self.identity.find_immutable(name);
        self.references.get(&canonical)
    }

    pub fn set_reference(&mut self, name: &str, reference: Reference) {
        let canonical = self.canonical(name);
        self.references.insert(canonical, reference);
    }

    /// §4.4 `register_identity`: atomically merges two concept names into
    /// one shared reference and status set. Fails *identity-conflict* if
    /// both sides already hold distinct non-null references.
    pub fn register_identity(&mut self, alias: &str, canonical: &str) -> Result<()> {
        let alias_root = self.identity.find(alias);
        let canonical_root = self.identity.find(canonical);

        if alias_root != canonical_root {
            let alias_ref = self.references.get(&alias_root).cloned();
            let canonical_ref = self.references.get(&canonical_root).cloned();
            if let (Some(a), Some(c)) = (&alias_ref, &canonical_ref) {
                if a != c {
                    return Err(BlackboardError::IdentityConflict {
                        alias: alias.to_string(),
                        canonical: canonical.to_string(),
                    });
                }
            }

            let merged_status = match (self.statuses.remove(&Target::Concept(alias_root.clone())), self.statuses.remove(&Target::Concept(canonical_root.clone()))) {
                (Some(a), Some(c)) if a.is_ready() || c.is_ready() => {
                    if a.is_ready() {
                        a
                    } else {
                        c
                    }
                }
                (Some(s), None) | (None, Some(s)) => s,
                (Some(a), Some(_)) => a,
                (None, None) => Status::Pending,
            };

            let merged_ref = alias_ref.or(canonical_ref);

            self.identity.union(alias, canonical);
            let root = self.identity.find(canonical);
            self.statuses.insert(Target::Concept(root.clone()), merged_status);
            if let Some(r) = merged_ref {
                self.references.insert(root, r);
            }
        }
        Ok(())
    }

    /// §4.4 `inject_filter`: a timing step's `FOR_EACH` verdict mask,
    /// keyed by the parent inference it gates (§4.7.3, §4.8 TIA).
    pub fn inject_filter(&mut self, parent_flow_index: FlowIndex, mask: Vec<bool>) {
        self.filters.insert(parent_flow_index, mask);
    }

    /// §4.4 `consume_filter`: removes and returns the injected mask, if
    /// any — consumed exactly once by the parent's IR step.
    pub fn consume_filter(&mut self, parent_flow_index: &FlowIndex) -> Option<Vec<bool>> {
        self.filters.remove(parent_flow_index)
    }

    /// §4.7.3: a timing step's verdict on its parent inference, read by
    /// `Ready(entry)` rule (d) and by skip propagation.
    pub fn set_timing_flags(&mut self, parent_flow_index: FlowIndex, flags: TimingFlags) {
        self.timing_flags.insert(parent_flow_index, flags);
    }

    pub fn timing_flags(&self, parent_flow_index: &FlowIndex) -> Option<TimingFlags> {
        self.timing_flags.get(parent_flow_index).copied()
    }

    pub fn workspace(&self, loop_index: u32) -> Option<&Workspace> {
        self.workspaces.get(&loop_index)
    }

    pub fn workspace_mut(&mut self, loop_index: u32) -> Option<&mut Workspace> {
        self.workspaces.get_mut(&loop_index)
    }

    pub fn start_workspace(&mut self, loop_index: u32, workspace: Workspace) {
        self.workspaces.insert(loop_index, workspace);
    }

    pub fn remove_workspace(&mut self, loop_index: u32) -> Option<Workspace> {
        self.workspaces.remove(&loop_index)
    }

    /// §4.9 "Loop re-execution": resets every inference in `subtree` to
    /// pending, the one sanctioned exception to monotonic status (Invariant
    /// 1). Concepts produced by those inferences are reset to pending too,
    /// so their consumers correctly re-block.
    pub fn reset_subtree_to_pending(&mut self, subtree: &[FlowIndex], concepts: &[String]) {
        for fi in subtree {
            self.statuses.insert(Target::Inference(fi.clone()), Status::Pending);
        }
        for name in concepts {
            let root = self.canonical(name);
            self.statuses.insert(Target::Concept(root), Status::Pending);
        }
    }

    /// Snapshot accessors used by `normcode-checkpoint` (§3 "Checkpoint
    /// snapshot"): a byte-exact copy needs the raw status map and identity
    /// table, not just the derived `status()`/`is_concept_ready()` views.
    pub fn statuses(&self) -> &FxHashMap<Target, Status> {
        &self.statuses
    }

    pub fn identity_table(&self) -> &IdentityTable {
        &self.identity
    }

    pub fn references(&self) -> &FxHashMap<String, Reference> {
        &self.references
    }

    pub fn workspaces(&self) -> &FxHashMap<u32, Workspace> {
        &self.workspaces
    }

    /// Rebuilds a `Blackboard` from its constituent parts (used by
    /// checkpoint restore).
    pub fn restore(
        statuses: FxHashMap<Target, Status>,
        identity: IdentityTable,
        workspaces: FxHashMap<u32, Workspace>,
        references: FxHashMap<String, Reference>,
    ) -> Self {
        Blackboard { statuses, identity, workspaces, filters: FxHashMap::default(), references, timing_flags: FxHashMap::default() }
    }
}
