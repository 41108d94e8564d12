//! MVP (§4.8): applies each concept's `value_selectors` entry *before*
//! cross-producting the value references into one combined call-argument
//! tensor, so every selector's output naturally participates in the
//! resulting shape.
//!
//! `Index`/`Key` are shape-preserving elementwise transforms (the same
//! technique `normcode-sequences`' `$-` derelation uses). `Unpack`
//! introduces a new trailing axis named `_unpack_<concept>` so an unpacked
//! collection's members become their own dimension instead of colliding
//! with another concept's axis of the same size. `Branch` is a perceptual
//! sign: each `Sign` element is synchronously transmuted through the
//! `PerceptionRouter` before the selector-transformed reference joins the
//! cross product.

use crate::error::{Result, SemanticError};
use normcode_model::ValueSelector;
use normcode_perception::{PerceptionRouter, Transmuted};
use normcode_reference::{Element, Reference};
use rustc_hash::FxHashMap;

fn map_elementwise(source: &Reference, concept: &str, f: impl Fn(&Element) -> Option<Element>) -> Result<Reference> {
    let mut tensor = Vec::with_capacity(source.len());
    for idx in source.iter_index_tuples() {
        let element = source.get(&idx)?;
        let selected = f(element).ok_or_else(|| SemanticError::SelectorMismatch { concept: concept.to_string(), detail: format!("{:?}", element) })?;
        tensor.push(selected);
    }
    Ok(Reference::new(source.axes().to_vec(), source.shape().to_vec(), tensor)?)
}

fn unpack_into_new_axis(source: &Reference, concept: &str) -> Result<Reference> {
    let mut per_position: Vec<Vec<Element>> = Vec::with_capacity(source.len());
    for idx in source.iter_index_tuples() {
        let members = source.get(&idx)?.unpack().ok_or_else(|| SemanticError::SelectorMismatch { concept: concept.to_string(), detail: "element cannot be unpacked".to_string() })?;
        per_position.push(members);
    }
    let width = per_position.first().map(|m| m.len()).unwrap_or(0);
    if per_position.iter().any(|m| m.len() != width) {
        return Err(SemanticError::RaggedUnpack);
    }

    let mut axes = source.axes().to_vec();
    axes.push(format!("_unpack_{}", concept));
    let mut shape = source.shape().to_vec();
    shape.push(width);

    let mut tensor = Vec::with_capacity(per_position.len() * width);
    for members in &per_position {
        tensor.extend(members.iter().cloned());
    }
    Ok(Reference::new(axes, shape, tensor)?)
}

/// Synchronously transmutes every `Sign` element of `source` through
/// `perception`, bridging with the same `block_in_place`/`block_on`
/// pattern the Paradigm Composer uses for its own sync/async seam — sound
/// for the same reason: the Orchestrator always runs on a multi-thread
/// Tokio runtime.
fn branch_transmute(source: &Reference, concept: &str, perception: &PerceptionRouter) -> Result<Reference> {
    let mut tensor = Vec::with_capacity(source.len());
    for idx in source.iter_index_tuples() {
        let element = source.get(&idx)?.clone();
        let transmuted = match &element {
            Element::Skip => Element::Skip,
            Element::Sign(sign) => {
                let sign = sign.clone();
                let perception_value = tokio::task::block_in_place(|| {
                    tokio::runtime::Handle::current().block_on(perception.transmute(&sign.norm, &sign.id, &sign.signifier))
                })
                .map_err(|e| SemanticError::SelectorMismatch { concept: concept.to_string(), detail: e.to_string() })?;
                match perception_value {
                    Transmuted::Value(v) => Element::Primitive(v),
                    Transmuted::Script(handle) => Element::Primitive(serde_json::Value::String(handle.signifier)),
                }
            }
            other => other.clone(),
        };
        tensor.push(transmuted);
    }
    Ok(Reference::new(source.axes().to_vec(), source.shape().to_vec(), tensor)?)
}

/// Applies `selectors` to each `(concept, reference)` pair named by
/// `value_order`, then cross-products the result into one combined
/// reference whose elements are `Tuple`s in `value_order`'s order — the
/// shape `normcode-reference::cross_action` expects, though TVA here
/// walks it with its own loop rather than calling `cross_action` directly.
pub fn assemble(value_order: &[String], resolved: &[(String, Reference)], selectors: &FxHashMap<String, ValueSelector>, perception: &PerceptionRouter) -> Result<Reference> {
    let mut selected = Vec::with_capacity(value_order.len());
    for concept in value_order {
        let (_, reference) = resolved
            .iter()
            .find(|(name, _)| name == concept)
            .ok_or_else(|| SemanticError::PlanValidity(format!("value_order names '{}' but it was not retrieved", concept)))?;

        let transformed = match selectors.get(concept) {
            None => reference.clone(),
            Some(ValueSelector::Index(i)) => map_elementwise(reference, concept, |e| e.index(*i))?,
            Some(ValueSelector::Key(k)) => map_elementwise(reference, concept, |e| e.key(k))?,
            Some(ValueSelector::Unpack) => unpack_into_new_axis(reference, concept)?,
            Some(ValueSelector::Branch { .. }) => branch_transmute(reference, concept, perception)?,
        };
        selected.push(transformed);
    }

    let refs: Vec<&Reference> = selected.iter().collect();
    Ok(Reference::cross_product(&refs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use normcode_perception::{InMemoryStore, InMemoryVfs};
    use normcode_reference::PerceptualSign;
    use serde_json::json;
    use std::sync::Arc;

    fn router() -> PerceptionRouter {
        PerceptionRouter::with_defaults(Arc::new(InMemoryVfs::new()), Arc::new(InMemoryStore::new()))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn no_selector_passes_reference_through() {
        let resolved = vec![("{a}".to_string(), Reference::singleton(Element::Primitive(json!(1))))];
        let out = assemble(&["{a}".to_string()], &resolved, &FxHashMap::default(), &router()).unwrap();
        assert_eq!(out.get(&[0]).unwrap(), &Element::Tuple(vec![Element::Primitive(json!(1))]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn index_selector_is_applied_before_cross_product() {
        let resolved = vec![("{pair}".to_string(), Reference::singleton(Element::Primitive(json!([10, 20]))))];
        let mut selectors = FxHashMap::default();
        selectors.insert("{pair}".to_string(), ValueSelector::Index(0));
        let out = assemble(&["{pair}".to_string()], &resolved, &selectors, &router()).unwrap();
        assert_eq!(out.get(&[0]).unwrap(), &Element::Tuple(vec![Element::Primitive(json!(10))]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unpack_selector_introduces_concept_named_axis() {
        let resolved = vec![("{list}".to_string(), Reference::singleton(Element::Primitive(json!([1, 2, 3]))))];
        let mut selectors = FxHashMap::default();
        selectors.insert("{list}".to_string(), ValueSelector::Unpack);
        let out = assemble(&["{list}".to_string()], &resolved, &selectors, &router()).unwrap();
        assert_eq!(out.axis_size("_unpack_{list}"), Some(3));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn branch_selector_transmutes_perceptual_signs() {
        let sign = PerceptualSign { norm: "literal".to_string(), id: "x1".to_string(), signifier: "hello".to_string() };
        let resolved = vec![("{branch}".to_string(), Reference::singleton(Element::Sign(sign)))];
        let mut selectors = FxHashMap::default();
        selectors.insert("{branch}".to_string(), ValueSelector::Branch { path: json!(null), content: json!(null) });
        let out = assemble(&["{branch}".to_string()], &resolved, &selectors, &router()).unwrap();
        assert_eq!(out.get(&[0]).unwrap(), &Element::Tuple(vec![Element::Primitive(json!("hello"))]));
    }
}
