//! `@:'`/`@:!`/`@.` (§4.7.3).
//!
//! A timing inference's own `Ready(entry)` gate is the ordinary value-concept
//! rule applied to its `condition` concept, so by the time `run` is called
//! the condition is already completed — the decision table's "condition
//! completed: no" rows describe the state *before* this inference is ready,
//! not an outcome this function ever produces.

use crate::error::{Result, SequenceError};
use crate::retrieval::require_reference;
use normcode_blackboard::{Blackboard, Status, Target, TimingFlags};
use normcode_model::{FlowIndex, InferenceEntry, TimingMarker, TimingWI};
use normcode_reference::Element;

/// A timing step's flags are written onto its structural parent — the
/// inference one flow-index segment shallower, matching indentation-nested
/// placement in the syntactic tree.
fn parent_of(flow_index: &FlowIndex) -> Option<FlowIndex> {
    let segments = flow_index.segments();
    if segments.len() <= 1 {
        return None;
    }
    Some(FlowIndex::new(segments[..segments.len() - 1].to_vec()))
}

pub fn run(entry: &InferenceEntry, wi: &TimingWI, blackboard: &mut Blackboard) -> Result<()> {
    let parent = parent_of(&entry.flow_index)
        .ok_or_else(|| SequenceError::PlanValidity(format!("timing inference {} has no structural parent", entry.flow_index)))?;

    let condition = require_reference(blackboard, &wi.condition)?.clone();

    let (flags, mask) = if condition.len() > 1 {
        let mut mask = Vec::with_capacity(condition.len());
        let mut any_true = false;
        for idx in condition.iter_index_tuples() {
            let v = element_bool(condition.get(&idx)?);
            any_true |= v;
            mask.push(v);
        }
        (decide(wi.marker, any_true), Some(mask))
    } else {
        let v = element_bool(condition.get(&[0])?);
        (decide(wi.marker, v), None)
    };

    if !flags.to_be_skipped {
        if let Some(mask) = mask {
            blackboard.inject_filter(parent.clone(), mask);
        }
    }

    blackboard.set_timing_flags(parent, flags);
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    Ok(())
}

fn element_bool(element: &Element) -> bool {
    element.as_primitive().and_then(|v| v.as_bool()).unwrap_or(false)
}

/// The decision table's "condition completed: yes" rows (§4.7.3).
fn decide(marker: TimingMarker, result: bool) -> TimingFlags {
    match marker {
        TimingMarker::After => TimingFlags { timing_ready: true, to_be_skipped: false },
        TimingMarker::If => TimingFlags { timing_ready: true, to_be_skipped: !result },
        TimingMarker::IfBang => TimingFlags { timing_ready: true, to_be_skipped: result },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_model::SequenceKind;
    use normcode_reference::Reference;
    use serde_json::json;

    fn entry(flow_index: &str, wi: TimingWI) -> InferenceEntry {
        InferenceEntry {
            flow_index: flow_index.parse::<FlowIndex>().unwrap(),
            sequence_kind: SequenceKind::Timing,
            concept_to_infer: "{unused}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec![wi.condition.clone()],
            context_concepts: vec![],
            working_interpretation: normcode_model::WorkingInterpretation::Timing(wi),
            supporting_children: vec![],
        }
    }

    fn wi_of(entry: &InferenceEntry) -> &TimingWI {
        match &entry.working_interpretation {
            normcode_model::WorkingInterpretation::Timing(wi) => wi,
            _ => unreachable!(),
        }
    }

    #[test]
    fn if_marker_skips_on_false_condition() {
        let mut bb = Blackboard::new();
        bb.set_reference("{cond}", Reference::singleton(Element::Primitive(json!(false))));
        let e = entry("1.2.1", TimingWI { marker: TimingMarker::If, condition: "{cond}".to_string() });
        run(&e, wi_of(&e), &mut bb).unwrap();
        let flags = bb.timing_flags(&"1.2".parse().unwrap()).unwrap();
        assert!(flags.timing_ready);
        assert!(flags.to_be_skipped);
    }

    #[test]
    fn if_bang_inverts_the_skip_decision() {
        let mut bb = Blackboard::new();
        bb.set_reference("{cond}", Reference::singleton(Element::Primitive(json!(true))));
        let e = entry("1.2.1", TimingWI { marker: TimingMarker::IfBang, condition: "{cond}".to_string() });
        run(&e, wi_of(&e), &mut bb).unwrap();
        let flags = bb.timing_flags(&"1.2".parse().unwrap()).unwrap();
        assert!(flags.to_be_skipped);
    }

    #[test]
    fn after_is_always_ready_and_never_skipped() {
        let mut bb = Blackboard::new();
        bb.set_reference("{cond}", Reference::singleton(Element::Primitive(json!(false))));
        let e = entry("1.2.1", TimingWI { marker: TimingMarker::After, condition: "{cond}".to_string() });
        run(&e, wi_of(&e), &mut bb).unwrap();
        let flags = bb.timing_flags(&"1.2".parse().unwrap()).unwrap();
        assert!(flags.timing_ready);
        assert!(!flags.to_be_skipped);
    }

    #[test]
    fn for_each_mask_is_injected_as_a_filter_when_passing() {
        let mut bb = Blackboard::new();
        bb.set_reference(
            "{cond}",
            Reference::new(vec!["n".into()], vec![2], vec![Element::Primitive(json!(true)), Element::Primitive(json!(false))]).unwrap(),
        );
        let e = entry("1.2.1", TimingWI { marker: TimingMarker::If, condition: "{cond}".to_string() });
        run(&e, wi_of(&e), &mut bb).unwrap();
        let parent: FlowIndex = "1.2".parse().unwrap();
        assert_eq!(bb.consume_filter(&parent), Some(vec![true, false]));
    }
}
