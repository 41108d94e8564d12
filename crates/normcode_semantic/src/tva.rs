//! TVA (§4.8): applies the functional reference's callable elementwise to
//! the assembled value tensor.
//!
//! Walks the cross product itself rather than calling
//! `normcode_reference::Reference::cross_action` directly, because a
//! failed element call must become a skip *at that position* plus a
//! recorded error for the retry policy (§7) — `cross_action` aborts the
//! whole reference on the first `CallError` instead.

use crate::error::{Result, SemanticError};
use normcode_reference::{Element, Reference};

/// One element's call failure, kept for the retry policy and for whatever
/// the caller attaches to the inference's failure record.
#[derive(Debug, Clone)]
pub struct ElementFailure {
    pub index: Vec<usize>,
    pub detail: String,
}

pub struct Actuation {
    pub reference: Reference,
    pub failures: Vec<ElementFailure>,
}

/// `mvp::assemble` always wraps the assembled value element in a
/// single-member `Element::Tuple`, even when selecting from one value
/// concept, so a masked (§4.8 FOR_EACH) position's `Element::Skip` never
/// arrives bare — it's nested one level down. Check both shapes.
fn values_contain_skip(value_el: &Element) -> bool {
    match value_el {
        Element::Skip => true,
        Element::Tuple(members) => members.iter().any(Element::is_skip),
        _ => false,
    }
}

pub fn actuate(functions_ref: &Reference, values_ref: &Reference) -> Result<Actuation> {
    let combined = Reference::cross_product(&[functions_ref, values_ref])?;
    let mut tensor = Vec::with_capacity(combined.len());
    let mut failures = Vec::new();

    for idx in combined.iter_index_tuples() {
        let pair = combined.get(&idx)?.as_tuple().expect("cross_product always emits Tuple elements");
        let (func_el, value_el) = (&pair[0], &pair[1]);

        if func_el.is_skip() || values_contain_skip(value_el) {
            tensor.push(Element::Skip);
            continue;
        }
        let callable = match func_el {
            Element::Callable(c) => c,
            other => {
                return Err(SemanticError::PlanValidity(format!(
                    "functional reference element is not callable: {:?}",
                    other
                )))
            }
        };
        let args: Vec<Element> = match value_el {
            Element::Tuple(members) => members.clone(),
            other => vec![other.clone()],
        };
        match callable.call(&args) {
            Ok(result) => tensor.push(result),
            Err(e) => {
                failures.push(ElementFailure { index: idx.clone(), detail: e.to_string() });
                tensor.push(Element::Skip);
            }
        }
    }

    let reference = Reference::new(combined.axes().to_vec(), combined.shape().to_vec(), tensor)?;
    Ok(Actuation { reference, failures })
}
