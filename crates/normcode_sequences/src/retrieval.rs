//! Small helpers shared by every sequence kind.

use crate::error::{Result, SequenceError};
use normcode_blackboard::Blackboard;
use normcode_reference::Reference;

/// Reads `concept`'s current reference, failing *plan-validity* if it has
/// none (every caller here only asks for a concept the Ready(entry) check
/// has already confirmed is bound).
pub fn require_reference<'a>(blackboard: &'a Blackboard, concept: &str) -> Result<&'a Reference> {
    blackboard.get_reference(concept).ok_or_else(|| SequenceError::UnboundConcept { concept: concept.to_string() })
}

/// True iff every element of `reference` is the skip marker — the
/// non-skip-only test `$.` specification uses to judge "valid" candidates.
pub fn is_all_skip(reference: &Reference) -> bool {
    reference.iter_index_tuples().all(|idx| reference.get(&idx).map(|e| e.is_skip()).unwrap_or(false))
}
