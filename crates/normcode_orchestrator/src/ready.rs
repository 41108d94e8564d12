//! `Ready(entry)` (§4.9): the four-rule readiness test the cycle loop
//! consults before executing a `Pending` entry.

use normcode_blackboard::Blackboard;
use normcode_model::{AssigningWI, InferenceEntry, WorkingInterpretation};

/// True iff every upstream dependency `entry` needs is satisfied:
///
/// (a) every `supporting_children` inference is `completed`/`completed_skipped`;
/// (b) `function_concept` is concept-ready;
/// (c) every `value_concepts` entry is concept-ready, except `$.`
///     (`AssigningWI::Specification`), which needs only one;
/// (d) if a timing sub-step gates this entry's own flow index, its
///     `timing_ready` flag is set.
pub fn is_ready(entry: &InferenceEntry, blackboard: &Blackboard) -> bool {
    if !entry.supporting_children.iter().all(|child| blackboard.is_inference_ready(child)) {
        return false;
    }

    if !blackboard.is_concept_ready(&entry.function_concept) {
        return false;
    }

    let values_ready = match &entry.working_interpretation {
        WorkingInterpretation::Assigning(AssigningWI::Specification) => {
            entry.value_concepts.iter().any(|c| blackboard.is_concept_ready(c))
        }
        _ => entry.value_concepts.iter().all(|c| blackboard.is_concept_ready(c)),
    };
    if !values_ready {
        return false;
    }

    if let Some(flags) = blackboard.timing_flags(&entry.flow_index) {
        if !flags.timing_ready {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_blackboard::{Status, Target, TimingFlags};
    use normcode_model::FlowIndex;

    fn entry(flow_index: &str, wi: WorkingInterpretation, values: Vec<&str>) -> InferenceEntry {
        InferenceEntry {
            flow_index: flow_index.parse::<FlowIndex>().unwrap(),
            sequence_kind: normcode_model::SequenceKind::Assigning,
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: values.into_iter().map(str::to_string).collect(),
            context_concepts: vec![],
            working_interpretation: wi,
            supporting_children: vec![],
        }
    }

    #[test]
    fn blocks_until_function_concept_ready() {
        let e = entry("1", WorkingInterpretation::Assigning(AssigningWI::Identity), vec!["{a}"]);
        let bb = Blackboard::new();
        assert!(!is_ready(&e, &bb));
    }

    #[test]
    fn ready_once_all_dependencies_satisfied() {
        let e = entry("1", WorkingInterpretation::Assigning(AssigningWI::Identity), vec!["{a}"]);
        let mut bb = Blackboard::new();
        bb.set_status(Target::Concept("{op}".to_string()), Status::Completed);
        bb.set_status(Target::Concept("{a}".to_string()), Status::Completed);
        assert!(is_ready(&e, &bb));
    }

    #[test]
    fn specification_needs_only_one_ready_value_concept() {
        let e = entry("1", WorkingInterpretation::Assigning(AssigningWI::Specification), vec!["{a}", "{b}", "{c}"]);
        let mut bb = Blackboard::new();
        bb.set_status(Target::Concept("{op}".to_string()), Status::Completed);
        bb.set_status(Target::Concept("{b}".to_string()), Status::Completed);
        assert!(is_ready(&e, &bb));
    }

    #[test]
    fn blocks_on_unready_timing_gate() {
        let e = entry("1", WorkingInterpretation::Assigning(AssigningWI::Identity), vec!["{a}"]);
        let mut bb = Blackboard::new();
        bb.set_status(Target::Concept("{op}".to_string()), Status::Completed);
        bb.set_status(Target::Concept("{a}".to_string()), Status::Completed);
        bb.set_timing_flags(e.flow_index.clone(), TimingFlags { timing_ready: false, to_be_skipped: false });
        assert!(!is_ready(&e, &bb));
    }
}
