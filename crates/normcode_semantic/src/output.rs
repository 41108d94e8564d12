//! OR (§4.8, §4.6): writes the pipeline's final reference to the
//! Blackboard under `concept_to_infer`, expanding a list-shaped paradigm
//! output into its own axis when `create_axis_on_list_output` is set
//! (the default) — otherwise the list is kept as a single element in
//! place, mirroring how `mvp::unpack_into_new_axis` introduces an axis
//! for an explicit `unpack` selector.

use crate::error::{Result, SemanticError};
use normcode_blackboard::Blackboard;
use normcode_reference::{Element, Reference};
use serde_json::Value;

fn as_list(element: &Element) -> Option<&Vec<Value>> {
    match element.as_primitive() {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Expands a uniformly list-shaped reference into a new trailing axis
/// named `_list_<concept>`. A reference with no list-shaped elements is
/// returned unchanged; one with *some* list elements and some not is a
/// plan-validity error, since the new axis would be ragged.
fn expand_list_axis(reference: &Reference, concept: &str) -> Result<Reference> {
    let mut widths = Vec::with_capacity(reference.len());
    for idx in reference.iter_index_tuples() {
        let element = reference.get(&idx)?;
        widths.push(as_list(element).map(|l| l.len()));
    }

    if widths.iter().all(Option::is_none) {
        return Ok(reference.clone());
    }
    let width = match widths.iter().flatten().next() {
        Some(w) => *w,
        None => return Ok(reference.clone()),
    };
    if widths.iter().any(|w| *w != Some(width)) {
        return Err(SemanticError::PlanValidity(format!(
            "paradigm output for '{}' mixes list-shaped and scalar elements",
            concept
        )));
    }

    let mut axes = reference.axes().to_vec();
    axes.push(format!("_list_{}", concept));
    let mut shape = reference.shape().to_vec();
    shape.push(width);

    let mut tensor = Vec::with_capacity(reference.len() * width);
    for idx in reference.iter_index_tuples() {
        let element = reference.get(&idx)?;
        match as_list(element) {
            Some(items) => tensor.extend(items.iter().cloned().map(Element::Primitive)),
            None if element.is_skip() => tensor.extend(std::iter::repeat(Element::Skip).take(width)),
            None => {
                return Err(SemanticError::PlanValidity(format!(
                    "paradigm output for '{}' mixes list-shaped and scalar elements",
                    concept
                )))
            }
        }
    }
    Ok(Reference::new(axes, shape, tensor)?)
}

/// Builds the reference to be stored for `concept_to_infer`.
pub fn build(output: &Reference, concept_to_infer: &str, create_axis_on_list_output: bool) -> Result<Reference> {
    if create_axis_on_list_output {
        expand_list_axis(output, concept_to_infer)
    } else {
        Ok(output.clone())
    }
}

/// Writes the built reference to the Blackboard.
pub fn store(blackboard: &mut Blackboard, concept_to_infer: &str, reference: Reference) {
    blackboard.set_reference(concept_to_infer, reference);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_output_passes_through_unchanged() {
        let r = Reference::singleton(Element::Primitive(json!(42)));
        let out = build(&r, "{c}", true).unwrap();
        assert_eq!(out.shape(), r.shape());
    }

    #[test]
    fn list_output_gains_a_named_axis_when_enabled() {
        let r = Reference::singleton(Element::Primitive(json!([1, 2, 3])));
        let out = build(&r, "{c}", true).unwrap();
        assert_eq!(out.axis_size("_list_{c}"), Some(3));
    }

    #[test]
    fn list_output_stays_in_place_when_disabled() {
        let r = Reference::singleton(Element::Primitive(json!([1, 2, 3])));
        let out = build(&r, "{c}", false).unwrap();
        assert_eq!(out.get(&[0]).unwrap(), &Element::Primitive(json!([1, 2, 3])));
    }

    #[test]
    fn mixed_list_and_scalar_is_rejected() {
        let r = Reference::new(
            vec!["n".into()],
            vec![2],
            vec![Element::Primitive(json!([1, 2])), Element::Primitive(json!(5))],
        )
        .unwrap();
        assert!(build(&r, "{c}", true).is_err());
    }

    #[test]
    fn store_writes_into_blackboard() {
        let mut bb = Blackboard::new();
        let r = Reference::singleton(Element::Primitive(json!(1)));
        store(&mut bb, "{c}", r.clone());
        assert_eq!(bb.get_reference("{c}").unwrap().get(&[0]).unwrap(), &Element::Primitive(json!(1)));
    }
}
