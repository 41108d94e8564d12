//! Skip propagation (§4.9): when a timing sub-step marks its structural
//! parent `to_be_skipped`, that parent and its whole descendant subtree
//! complete as `completed_skipped` without ever running, each writing an
//! all-skip singleton reference rather than inheriting a sibling's shape.

use crate::logger::Logger;
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{InferenceEntry, InferenceRepo};
use normcode_reference::{Element, Reference};

/// Marks `root` and every descendant entry `completed_skipped`, writing an
/// `Element::Skip` singleton reference for each `concept_to_infer`.
///
/// There is no general way to recover the tensor shape a completed sibling
/// would have produced, so every skipped concept gets the same
/// shapeless singleton placeholder; consumers only ever need to detect
/// `Element::is_skip`, never its shape (documented in DESIGN.md).
pub fn skip_subtree(logger: &dyn Logger, root: &InferenceEntry, repo: &InferenceRepo, blackboard: &mut Blackboard) {
    logger.info(&format!("skip propagation: {} and its subtree marked completed_skipped", root.flow_index));

    let mut targets: Vec<&InferenceEntry> = vec![root];
    for entry in repo.iterate_sorted() {
        if entry.flow_index.is_descendant_of(&root.flow_index) {
            targets.push(entry);
        }
    }

    for entry in targets {
        let status = blackboard.status(&Target::Inference(entry.flow_index.clone()));
        if status.is_terminal() {
            continue;
        }
        blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::CompletedSkipped);
        blackboard.set_reference(&entry.concept_to_infer, Reference::singleton(Element::Skip));
        blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::CompletedSkipped);
    }
}
