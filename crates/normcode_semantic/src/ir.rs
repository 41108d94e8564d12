//! IR (§4.8): retrieves every value reference and, if a timing step
//! upstream left a `FOR_EACH` verdict mask for this inference, consumes it
//! and renders whichever value axis it matches in length down to skip at
//! the non-matching positions.

use crate::error::{Result, SemanticError};
use normcode_blackboard::Blackboard;
use normcode_model::InferenceEntry;
use normcode_reference::{Element, Reference};

fn require_reference<'a>(blackboard: &'a Blackboard, concept: &str) -> Result<&'a Reference> {
    blackboard.get_reference(concept).ok_or_else(|| SemanticError::PlanValidity(format!("concept '{}' has no reference bound yet", concept)))
}

/// Applies `mask` to the first axis, across `refs`, whose size matches the
/// mask's length. An inference with no axis of that length is a
/// plan-validity error — the timing step and its gated inference are
/// supposed to share the axis being filtered. Non-matching positions are
/// set to `Element::Skip` in place — the axis keeps its original size so a
/// filtered reference still aligns with its siblings under `append`/
/// `cross_product` (§8 "non-matching positions rendered as skip").
fn apply_mask(refs: &mut [(String, Reference)], mask: &[bool]) -> Result<()> {
    let axis_name = refs
        .iter()
        .find_map(|(_, r)| r.axes().iter().find(|a| r.axis_size(a) == Some(mask.len())).cloned())
        .ok_or_else(|| SemanticError::PlanValidity("FOR_EACH filter mask length matches no value axis".to_string()))?;

    for (_, r) in refs.iter_mut() {
        if let Some(pos) = r.axis_position(&axis_name) {
            for idx in r.iter_index_tuples() {
                if !mask[idx[pos]] {
                    r.set(&idx, Element::Skip)?;
                }
            }
        }
    }
    Ok(())
}

/// Retrieves `entry.value_concepts` in `entry`'s declared order, applying
/// any pending filter for this inference's flow index.
pub fn retrieve(entry: &InferenceEntry, blackboard: &mut Blackboard) -> Result<Vec<(String, Reference)>> {
    let mut resolved: Vec<(String, Reference)> =
        entry.value_concepts.iter().map(|name| Ok((name.clone(), require_reference(blackboard, name)?.clone()))).collect::<Result<_>>()?;

    if let Some(mask) = blackboard.consume_filter(&entry.flow_index) {
        apply_mask(&mut resolved, &mask)?;
    }
    Ok(resolved)
}
