//! Converts the `reference_data`/`reference_axes` (and inputs file
//! `data`/`axes`) JSON shape into a [`Reference`] and back.

use crate::error::ModelError;
use normcode_reference::{Element, PerceptualSign, Reference};
use serde_json::Value;

/// A leaf that looks like `%{norm}id(signifier)` is parsed as a sign; any
/// other string (including one that merely starts with `%{`) is kept as a
/// literal primitive, since the nested-list format carries no separate
/// "this leaf is a sign" marker.
fn element_from_leaf(v: &Value) -> Element {
    if let Value::String(s) = v {
        if let Ok(sign) = PerceptualSign::parse(s) {
            return Element::Sign(sign);
        }
    }
    Element::Primitive(v.clone())
}

fn element_to_leaf(e: &Element) -> Value {
    match e {
        Element::Primitive(v) => v.clone(),
        Element::Sign(s) => Value::String(s.format()),
        Element::Skip => Value::Null,
        Element::Tuple(_) | Element::Callable(_) => Value::Null,
    }
}

/// Measures the size of each declared axis by descending through nested
/// arrays, then flattens leaves in row-major order.
pub fn reference_from_nested(data: &Value, axes: &[String]) -> Result<Reference, ModelError> {
    if axes.is_empty() {
        if data.is_array() {
            return Err(ModelError::single(
                "a reference with no declared axes must have a scalar leaf, not a list",
            ));
        }
        return Ok(Reference::singleton(element_from_leaf(data)));
    }

    let mut shape = Vec::with_capacity(axes.len());
    let mut cursor = data;
    for axis in axes {
        let arr = cursor.as_array().ok_or_else(|| {
            ModelError::single(format!(
                "reference data does not nest deep enough for axis '{}'",
                axis
            ))
        })?;
        shape.push(arr.len());
        cursor = arr.first().unwrap_or(&Value::Null);
    }

    let mut tensor = Vec::with_capacity(shape.iter().product());
    flatten_into(data, axes.len(), &mut tensor)?;

    let expected: usize = shape.iter().product();
    if tensor.len() != expected {
        return Err(ModelError::single(format!(
            "reference data is ragged: axes {:?} imply shape {:?} ({} elements) but found {}",
            axes, shape, expected, tensor.len()
        )));
    }

    Reference::new(axes.to_vec(), shape, tensor).map_err(|e| ModelError::single(e.to_string()))
}

fn flatten_into(node: &Value, remaining_depth: usize, out: &mut Vec<Element>) -> Result<(), ModelError> {
    if remaining_depth == 0 {
        out.push(element_from_leaf(node));
        return Ok(());
    }
    let arr = node
        .as_array()
        .ok_or_else(|| ModelError::single("reference data is ragged: expected a nested list here"))?;
    for child in arr {
        flatten_into(child, remaining_depth - 1, out)?;
    }
    Ok(())
}

/// Rebuilds the nested-list JSON shape from a reference (used by the CLI's
/// status/inspection output and by checkpoint-free debugging).
pub fn reference_to_nested(reference: &Reference) -> Value {
    fn build(reference: &Reference, axis: usize, prefix: &mut Vec<usize>) -> Value {
        if axis == reference.shape().len() {
            return element_to_leaf(reference.get(prefix).expect("index built from shape"));
        }
        let size = reference.shape()[axis];
        let mut items = Vec::with_capacity(size);
        for i in 0..size {
            prefix.push(i);
            items.push(build(reference, axis + 1, prefix));
            prefix.pop();
        }
        Value::Array(items)
    }
    if reference.axes() == [normcode_reference::NONE_AXIS] {
        return element_to_leaf(reference.get(&[0]).expect("singleton has one element"));
    }
    let mut prefix = Vec::new();
    build(reference, 0, &mut prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_singleton_from_scalar() {
        let r = reference_from_nested(&json!(42), &[]).unwrap();
        assert_eq!(r.shape(), &[1]);
    }

    #[test]
    fn builds_matrix_from_nested_list() {
        let data = json!([["123", "98"]]);
        let r = reference_from_nested(&data, &["number_pair".to_string(), "number".to_string()]).unwrap();
        assert_eq!(r.shape(), &[1, 2]);
        assert_eq!(r.get(&[0, 0]).unwrap().as_primitive().unwrap(), &json!("123"));
    }

    #[test]
    fn rejects_ragged_data() {
        let data = json!([["a"], ["b", "c"]]);
        let err = reference_from_nested(&data, &["row".to_string(), "col".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn roundtrips_through_nested() {
        let data = json!([["123", "98"]]);
        let r = reference_from_nested(&data, &["number_pair".to_string(), "number".to_string()]).unwrap();
        assert_eq!(reference_to_nested(&r), data);
    }

    #[test]
    fn parses_embedded_perceptual_sign() {
        let data = json!("%{literal}a1(hello)");
        let r = reference_from_nested(&data, &[]).unwrap();
        assert!(r.get(&[0]).unwrap().as_sign().is_some());
    }
}
