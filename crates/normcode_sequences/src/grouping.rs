//! `&[{}]`/`&[#]` (§4.7.2), legacy and per-reference modes.

use crate::error::{Result, SequenceError};
use crate::retrieval::require_reference;
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{GroupingMode, GroupingWI, InferenceEntry};
use normcode_reference::Reference;

pub fn run(entry: &InferenceEntry, mode: GroupingMode, wi: &GroupingWI, blackboard: &mut Blackboard) -> Result<()> {
    if entry.value_concepts.is_empty() {
        return Err(SequenceError::EmptyGroup);
    }
    let annotate = matches!(mode, GroupingMode::In);

    let result = match wi {
        GroupingWI::Legacy { by_axis_concepts, protect_axes } => run_legacy(entry, by_axis_concepts, protect_axes, annotate, blackboard)?,
        GroupingWI::PerReference { by_axes, create_axis } => run_per_reference(entry, by_axes, create_axis, annotate, blackboard)?,
    };

    blackboard.set_reference(&entry.concept_to_infer, result);
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::Completed);
    Ok(())
}

/// Cross-products every value reference (optionally annotating each with its
/// own concept name first so `&[{}]` tuples carry `{concept_name: element}`
/// members), then collapses every axis in `by_axis_concepts` except those
/// named in `protect_axes`.
fn run_legacy(entry: &InferenceEntry, by_axis_concepts: &[String], protect_axes: &[String], annotate: bool, blackboard: &Blackboard) -> Result<Reference> {
    let resolved: Vec<Reference> = entry
        .value_concepts
        .iter()
        .map(|name| {
            let r = require_reference(blackboard, name)?;
            Ok(if annotate { r.annotate(name) } else { r.clone() })
        })
        .collect::<Result<_>>()?;
    let refs: Vec<&Reference> = resolved.iter().collect();
    let combined = Reference::cross_product(&refs)?;

    let to_collapse: Vec<String> = by_axis_concepts.iter().filter(|a| !protect_axes.contains(a)).cloned().collect();
    if to_collapse.is_empty() {
        return Ok(combined);
    }
    Ok(combined.collapse(&to_collapse, None)?)
}

/// Collapses each value reference's own `by_axes` independently (so inputs
/// with different native shapes can be combined) and concatenates the
/// results along a freshly created `create_axis`.
fn run_per_reference(entry: &InferenceEntry, by_axes: &[String], create_axis: &str, annotate: bool, blackboard: &Blackboard) -> Result<Reference> {
    let mut acc: Option<Reference> = None;
    for name in &entry.value_concepts {
        let r = require_reference(blackboard, name)?;
        let r = if annotate { r.annotate(name) } else { r.clone() };
        let relevant_axes: Vec<String> = by_axes.iter().filter(|a| r.axis_position(a).is_some()).cloned().collect();
        let collapsed = if relevant_axes.is_empty() { r.unsqueeze(create_axis)? } else { r.collapse(&relevant_axes, Some(create_axis.to_string()))? };
        acc = Some(match acc {
            None => collapsed,
            Some(prev) => prev.append(&collapsed, create_axis)?,
        });
    }
    Ok(acc.expect("checked non-empty value_concepts above"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_model::{FlowIndex, SequenceKind, WorkingInterpretation};
    use normcode_reference::Element;
    use serde_json::json;

    fn entry(value_concepts: Vec<&str>, mode: GroupingMode, wi: GroupingWI) -> InferenceEntry {
        InferenceEntry {
            flow_index: "1.1".parse::<FlowIndex>().unwrap(),
            sequence_kind: SequenceKind::Grouping,
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: value_concepts.into_iter().map(str::to_string).collect(),
            context_concepts: vec![],
            working_interpretation: WorkingInterpretation::Grouping(mode, wi),
            supporting_children: vec![],
        }
    }

    fn wi_of(entry: &InferenceEntry) -> (GroupingMode, &GroupingWI) {
        match &entry.working_interpretation {
            WorkingInterpretation::Grouping(m, wi) => (*m, wi),
            _ => unreachable!(),
        }
    }

    #[test]
    fn legacy_across_collapses_listed_axis() {
        let mut bb = Blackboard::new();
        bb.set_reference("{a}", Reference::new(vec!["n".into()], vec![2], vec![Element::Primitive(json!(1)), Element::Primitive(json!(2))]).unwrap());
        let e = entry(
            vec!["{a}"],
            GroupingMode::Across,
            GroupingWI::Legacy { by_axis_concepts: vec!["n".to_string()], protect_axes: vec![] },
        );
        let (mode, wi) = wi_of(&e);
        run(&e, mode, wi, &mut bb).unwrap();
        let out = bb.get_reference("{out}").unwrap();
        assert_eq!(out.rank(), 1);
        assert_eq!(out.axes(), &[normcode_reference::NONE_AXIS.to_string()]);
    }

    #[test]
    fn legacy_in_annotates_with_concept_name() {
        let mut bb = Blackboard::new();
        bb.set_reference("{a}", Reference::singleton(Element::Primitive(json!(1))));
        let e = entry(
            vec!["{a}"],
            GroupingMode::In,
            GroupingWI::Legacy { by_axis_concepts: vec![], protect_axes: vec![] },
        );
        let (mode, wi) = wi_of(&e);
        run(&e, mode, wi, &mut bb).unwrap();
        let out = bb.get_reference("{out}").unwrap();
        match out.get(&[0]).unwrap() {
            Element::Tuple(members) => match &members[0] {
                Element::Primitive(serde_json::Value::Object(map)) => assert!(map.contains_key("{a}")),
                other => panic!("expected annotated object, got {:?}", other),
            },
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn per_reference_concatenates_along_create_axis() {
        let mut bb = Blackboard::new();
        bb.set_reference("{a}", Reference::new(vec!["x".into()], vec![2], vec![Element::Primitive(json!(1)), Element::Primitive(json!(2))]).unwrap());
        bb.set_reference("{b}", Reference::new(vec!["y".into()], vec![3], vec![Element::Primitive(json!(3)), Element::Primitive(json!(4)), Element::Primitive(json!(5))]).unwrap());
        let e = entry(
            vec!["{a}", "{b}"],
            GroupingMode::Across,
            GroupingWI::PerReference { by_axes: vec!["x".to_string(), "y".to_string()], create_axis: "combined".to_string() },
        );
        let (mode, wi) = wi_of(&e);
        run(&e, mode, wi, &mut bb).unwrap();
        let out = bb.get_reference("{out}").unwrap();
        assert_eq!(out.axis_size("combined"), Some(5));
    }

    #[test]
    fn empty_value_concepts_is_plan_validity_error() {
        let mut bb = Blackboard::new();
        let e = entry(vec![], GroupingMode::Across, GroupingWI::Legacy { by_axis_concepts: vec![], protect_axes: vec![] });
        let (mode, wi) = wi_of(&e);
        assert!(matches!(run(&e, mode, wi, &mut bb), Err(SequenceError::EmptyGroup)));
    }
}
