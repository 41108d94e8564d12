//! Per-loop workspace state (§3 "Workspace (per loop)", §4.7.4).

use crate::error::{BlackboardError, Result};
use normcode_reference::Reference;
use rustc_hash::FxHashMap;

/// State for one active loop instance: the base collection being iterated,
/// the current iteration index, carried-state history (for `InLoopConcept`
/// distance lookups), and per-iteration accumulated outputs.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub loop_base: Reference,
    pub iteration: usize,
    carried_history: FxHashMap<String, Vec<Reference>>,
    accumulated: FxHashMap<String, Vec<Reference>>,
}

impl Workspace {
    /// Starts a fresh workspace at iteration 0 over `loop_base` (§4.7.4
    /// "start").
    pub fn start(loop_base: Reference) -> Self {
        Workspace { loop_base, iteration: 0, carried_history: FxHashMap::default(), accumulated: FxHashMap::default() }
    }

    /// Seeds a carried concept's pre-loop (distance-0) value.
    pub fn seed_carry(&mut self, concept: &str, initial: Reference) {
        self.carried_history.insert(concept.to_string(), vec![initial]);
    }

    /// The reference bound to `concept` `distance` iterations back from
    /// the current one; distance 0 is the pre-loop initial value.
    pub fn carried_at(&self, concept: &str, distance: u32) -> Result<&Reference> {
        let history = self
            .carried_history
            .get(concept)
            .ok_or_else(|| BlackboardError::UnknownWorkspaceConcept { concept: concept.to_string() })?;
        let index = (self.iteration).saturating_sub(distance as usize).min(history.len().saturating_sub(1));
        Ok(&history[index])
    }

    /// Records the value `concept` carried out of the just-finished
    /// iteration, extending its history.
    pub fn record_carry(&mut self, concept: &str, reference: Reference) {
        self.carried_history.entry(concept.to_string()).or_default().push(reference);
    }

    /// Records one iteration's output for a `ConceptToInfer` target
    /// (§4.7.4 "iteration complete").
    pub fn record_output(&mut self, concept_to_infer: &str, reference: Reference) {
        self.accumulated.entry(concept_to_infer.to_string()).or_default().push(reference);
    }

    pub fn advance(&mut self) {
        self.iteration += 1;
    }

    pub fn iterations_completed(&self) -> usize {
        self.iteration
    }

    /// Snapshot accessors used by `normcode-checkpoint`, mirroring
    /// `Blackboard`'s own statuses()/identity_table()/references() seam:
    /// a byte-exact snapshot needs the raw carry/accumulation histories,
    /// not just the derived `carried_at`/`finalize_output` views.
    pub fn carried_history(&self) -> &FxHashMap<String, Vec<Reference>> {
        &self.carried_history
    }

    pub fn accumulated(&self) -> &FxHashMap<String, Vec<Reference>> {
        &self.accumulated
    }

    /// Rebuilds a `Workspace` from its constituent parts (checkpoint restore).
    pub fn restore(
        loop_base: Reference,
        iteration: usize,
        carried_history: FxHashMap<String, Vec<Reference>>,
        accumulated: FxHashMap<String, Vec<Reference>>,
    ) -> Self {
        Workspace { loop_base, iteration, carried_history, accumulated }
    }

    /// Builds the final accumulated reference for `concept_to_infer` by
    /// appending every recorded per-iteration output along a new axis
    /// named `group_base` (§4.7.4 "loop complete", Invariant 5).
    pub fn finalize_output(&self, concept_to_infer: &str, group_base: &str) -> Result<Reference> {
        // No entry at all means the loop never ran a single iteration (an
        // empty `LoopBaseConcept`, §8 "a loop over an empty base collection
        // completes immediately") — that is the same zero-sized-axis result
        // as an entry recorded with no outputs, not a missing-concept error.
        let empty = Vec::new();
        let outputs = self.accumulated.get(concept_to_infer).unwrap_or(&empty);
        if outputs.is_empty() {
            return Ok(Reference::new(vec![group_base.to_string()], vec![0], vec![]).expect("empty shape is valid"));
        }
        let unsqueeze_err = |e: normcode_reference::ReferenceError| BlackboardError::UnknownWorkspaceConcept {
            concept: format!("{}: {}", concept_to_infer, e),
        };
        let mut result = outputs[0].unsqueeze(group_base).map_err(unsqueeze_err)?;
        for out in &outputs[1..] {
            let unsqueezed = out.unsqueeze(group_base).map_err(unsqueeze_err)?;
            result = result.append(&unsqueezed, group_base).map_err(unsqueeze_err)?;
        }
        Ok(result)
    }
}
