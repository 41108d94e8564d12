//! The seam `normcode-checkpoint` implements to receive end-of-cycle
//! snapshots (§4.9 "...and calls `save_snapshot(current_cycle)`").
//!
//! Defined here, rather than in `normcode-checkpoint`, so the Orchestrator
//! never depends on the checkpoint crate directly — the CLI is the one
//! place that wires a concrete `CheckpointSink` into `Orchestrator::run`.

use normcode_blackboard::Blackboard;
use normcode_model::ConceptRepo;

pub trait CheckpointSink {
    /// Persists the run's state as of the end of `cycle`. A failure here
    /// is logged and does not abort the run — resumability is best-effort,
    /// not a correctness requirement of plan execution.
    fn save_snapshot(&mut self, cycle: u32, concepts: &ConceptRepo, blackboard: &Blackboard) -> std::result::Result<(), String>;
}
