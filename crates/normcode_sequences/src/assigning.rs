//! `$=`/`$%`/`$.`/`$+`/`$-` (§4.7.1).

use crate::error::{Result, SequenceError};
use crate::retrieval::{is_all_skip, require_reference};
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{reference_from_nested, AssigningWI, DerelationSelector, InferenceEntry};
use normcode_reference::{Element, Reference};

/// Runs one `assigning` inference to completion, mutating `blackboard` in
/// place and marking the inference's own status.
pub fn run(entry: &InferenceEntry, wi: &AssigningWI, blackboard: &mut Blackboard) -> Result<()> {
    match wi {
        AssigningWI::Identity => run_identity(entry, blackboard),
        AssigningWI::Abstraction { face_value, axis_names } => run_abstraction(entry, face_value, axis_names, blackboard),
        AssigningWI::Specification => run_specification(entry, blackboard),
        AssigningWI::Continuation { by_axes } => run_continuation(entry, by_axes, blackboard),
        AssigningWI::Derelation { selector } => run_derelation(entry, selector, blackboard),
    }
}

/// `$=`: no reference is written; the two names share one canonical
/// reference and status from this point on.
fn run_identity(entry: &InferenceEntry, blackboard: &mut Blackboard) -> Result<()> {
    let canonical = entry
        .value_concepts
        .first()
        .ok_or_else(|| SequenceError::PlanValidity("'$=' requires one value concept to alias to".to_string()))?;
    blackboard.register_identity(&entry.concept_to_infer, canonical)?;
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    Ok(())
}

fn run_abstraction(entry: &InferenceEntry, face_value: &serde_json::Value, axis_names: &[String], blackboard: &mut Blackboard) -> Result<()> {
    let reference = reference_from_nested(face_value, axis_names).map_err(|e| SequenceError::PlanValidity(e.to_string()))?;
    blackboard.set_reference(&entry.concept_to_infer, reference);
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::Completed);
    Ok(())
}

/// `$.`: first valid (ready, non-skip-only) candidate wins; with none, the
/// destination's own current reference is copied unchanged. If the
/// destination has never held a reference either, this writes an all-skip
/// singleton and completes `completed_skipped` rather than blocking forever
/// — a candidate-less specification can still participate in skip
/// propagation downstream.
fn run_specification(entry: &InferenceEntry, blackboard: &mut Blackboard) -> Result<()> {
    let mut chosen: Option<Reference> = None;
    for candidate in &entry.value_concepts {
        if !blackboard.is_concept_ready(candidate) {
            continue;
        }
        if let Some(r) = blackboard.get_reference(candidate) {
            if !is_all_skip(r) {
                chosen = Some(r.clone());
                break;
            }
        }
    }

    let (reference, status) = match chosen {
        Some(r) => (r, Status::Completed),
        None => match blackboard.get_reference(&entry.concept_to_infer) {
            Some(existing) => (existing.clone(), Status::Completed),
            None => (Reference::singleton(Element::Skip), Status::CompletedSkipped),
        },
    };

    blackboard.set_reference(&entry.concept_to_infer, reference);
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), status);
    blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), status);
    Ok(())
}

/// `$+`: appends the source into the destination along each listed axis,
/// creating it if the destination has none yet (the first accumulation in a
/// loop).
fn run_continuation(entry: &InferenceEntry, by_axes: &[String], blackboard: &mut Blackboard) -> Result<()> {
    let source_name = entry
        .value_concepts
        .first()
        .ok_or_else(|| SequenceError::PlanValidity("'$+' requires one value concept as source".to_string()))?;
    let source = require_reference(blackboard, source_name)?.clone();

    let mut result = match blackboard.get_reference(&entry.concept_to_infer) {
        Some(existing) => existing.clone(),
        None => source.clone(),
    };
    if blackboard.get_reference(&entry.concept_to_infer).is_some() {
        for axis in by_axes {
            result = result.append(&source, axis)?;
        }
    }

    blackboard.set_reference(&entry.concept_to_infer, result);
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::Completed);
    Ok(())
}

/// `$-`: applies one selector elementwise over the source reference. `index`
/// and `key` preserve shape; `unpack` spreads every position's collection
/// into a freshly appended trailing axis, so every position must unpack to
/// the same member count.
fn run_derelation(entry: &InferenceEntry, selector: &DerelationSelector, blackboard: &mut Blackboard) -> Result<()> {
    let source_name = entry
        .value_concepts
        .first()
        .ok_or_else(|| SequenceError::PlanValidity("'$-' requires one value concept as source".to_string()))?;
    let source = require_reference(blackboard, source_name)?.clone();

    let result = match selector {
        DerelationSelector::Index(i) => map_elementwise(&source, source_name, |e| e.index(*i))?,
        DerelationSelector::Key(k) => map_elementwise(&source, source_name, |e| e.key(k))?,
        DerelationSelector::Unpack => unpack_into_new_axis(&source)?,
    };

    blackboard.set_reference(&entry.concept_to_infer, result);
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::Completed);
    Ok(())
}

fn map_elementwise(source: &Reference, source_name: &str, f: impl Fn(&Element) -> Option<Element>) -> Result<Reference> {
    let mut tensor = Vec::with_capacity(source.len());
    for idx in source.iter_index_tuples() {
        let element = source.get(&idx)?;
        let selected = f(element).ok_or_else(|| SequenceError::SelectorMismatch {
            concept: source_name.to_string(),
            detail: format!("{:?}", element),
        })?;
        tensor.push(selected);
    }
    Ok(Reference::new(source.axes().to_vec(), source.shape().to_vec(), tensor)?)
}

fn unpack_into_new_axis(source: &Reference) -> Result<Reference> {
    let mut per_position: Vec<Vec<Element>> = Vec::with_capacity(source.len());
    for idx in source.iter_index_tuples() {
        let members = source.get(&idx)?.unpack().ok_or_else(|| SequenceError::SelectorMismatch {
            concept: "<unpack source>".to_string(),
            detail: "element cannot be unpacked".to_string(),
        })?;
        per_position.push(members);
    }
    let width = per_position.first().map(|m| m.len()).unwrap_or(0);
    if per_position.iter().any(|m| m.len() != width) {
        return Err(SequenceError::RaggedUnpack);
    }

    let mut axes = source.axes().to_vec();
    axes.push("_unpacked".to_string());
    let mut shape = source.shape().to_vec();
    shape.push(width);

    let mut tensor = Vec::with_capacity(per_position.len() * width);
    for members in &per_position {
        tensor.extend(members.iter().cloned());
    }
    Ok(Reference::new(axes, shape, tensor)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_model::{FlowIndex, SequenceKind, WorkingInterpretation};
    use serde_json::json;

    fn entry(flow_index: &str, concept_to_infer: &str, value_concepts: Vec<&str>, wi: AssigningWI) -> InferenceEntry {
        InferenceEntry {
            flow_index: flow_index.parse::<FlowIndex>().unwrap(),
            sequence_kind: SequenceKind::Assigning,
            concept_to_infer: concept_to_infer.to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: value_concepts.into_iter().map(str::to_string).collect(),
            context_concepts: vec![],
            working_interpretation: WorkingInterpretation::Assigning(wi),
            supporting_children: vec![],
        }
    }

    fn wi_of(entry: &InferenceEntry) -> &AssigningWI {
        match &entry.working_interpretation {
            WorkingInterpretation::Assigning(wi) => wi,
            _ => unreachable!(),
        }
    }

    #[test]
    fn identity_merges_status_and_reference() {
        let mut bb = Blackboard::new();
        bb.set_reference("{canonical}", Reference::singleton(Element::Primitive(json!(5))));
        bb.set_status(Target::Concept("{canonical}".into()), Status::Completed);
        let e = entry("1.1", "{alias}", vec!["{canonical}"], AssigningWI::Identity);
        run(&e, wi_of(&e), &mut bb).unwrap();
        assert!(bb.is_concept_ready("{alias}"));
        assert_eq!(bb.get_reference("{alias}"), bb.get_reference("{canonical}"));
    }

    #[test]
    fn abstraction_materializes_face_value() {
        let mut bb = Blackboard::new();
        let e = entry(
            "1.1",
            "{out}",
            vec![],
            AssigningWI::Abstraction { face_value: json!([1, 2]), axis_names: vec!["n".to_string()] },
        );
        run(&e, wi_of(&e), &mut bb).unwrap();
        assert_eq!(bb.get_reference("{out}").unwrap().shape(), &[2]);
    }

    #[test]
    fn specification_skips_non_ready_candidate_and_picks_next() {
        let mut bb = Blackboard::new();
        bb.set_reference("{b}", Reference::singleton(Element::Primitive(json!("chosen"))));
        bb.set_status(Target::Concept("{b}".into()), Status::Completed);
        let e = entry("1.1", "{out}", vec!["{a}", "{b}"], AssigningWI::Specification);
        run(&e, wi_of(&e), &mut bb).unwrap();
        assert_eq!(bb.get_reference("{out}").unwrap().get(&[0]).unwrap(), &Element::Primitive(json!("chosen")));
    }

    #[test]
    fn specification_with_no_candidates_and_no_prior_value_is_skipped() {
        let mut bb = Blackboard::new();
        let e = entry("1.1", "{out}", vec![], AssigningWI::Specification);
        run(&e, wi_of(&e), &mut bb).unwrap();
        assert_eq!(bb.status(&Target::Inference("1.1".parse().unwrap())), Status::CompletedSkipped);
    }

    #[test]
    fn continuation_appends_along_declared_axis() {
        let mut bb = Blackboard::new();
        bb.set_reference("{out}", Reference::new(vec!["iter".into()], vec![1], vec![Element::Primitive(json!(1))]).unwrap());
        bb.set_reference("{next}", Reference::new(vec!["iter".into()], vec![1], vec![Element::Primitive(json!(2))]).unwrap());
        let e = entry("1.1", "{out}", vec!["{next}"], AssigningWI::Continuation { by_axes: vec!["iter".to_string()] });
        run(&e, wi_of(&e), &mut bb).unwrap();
        assert_eq!(bb.get_reference("{out}").unwrap().axis_size("iter"), Some(2));
    }

    #[test]
    fn derelation_index_selects_elementwise() {
        let mut bb = Blackboard::new();
        bb.set_reference("{pair}", Reference::singleton(Element::Primitive(json!([10, 20]))));
        let e = entry("1.1", "{out}", vec!["{pair}"], AssigningWI::Derelation { selector: DerelationSelector::Index(-1) });
        run(&e, wi_of(&e), &mut bb).unwrap();
        assert_eq!(bb.get_reference("{out}").unwrap().get(&[0]).unwrap(), &Element::Primitive(json!(20)));
    }

    #[test]
    fn derelation_unpack_appends_new_axis() {
        let mut bb = Blackboard::new();
        bb.set_reference("{list}", Reference::singleton(Element::Primitive(json!([1, 2, 3]))));
        let e = entry("1.1", "{out}", vec!["{list}"], AssigningWI::Derelation { selector: DerelationSelector::Unpack });
        run(&e, wi_of(&e), &mut bb).unwrap();
        let out = bb.get_reference("{out}").unwrap();
        assert_eq!(out.axis_size("_unpacked"), Some(3));
    }
}
