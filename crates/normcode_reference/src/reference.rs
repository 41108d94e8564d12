//! The Reference: a fully-specified, densely-populated named-axis tensor.
//!
//! See §3/§4.1. A [`Reference`] is the sole medium of inter-step
//! communication in the runtime: every concept's data, once materialized,
//! lives in one of these.

use crate::element::{CallError, Element};
use crate::error::{ReferenceError, Result};
use std::fmt;

/// Reserved axis name for singleton references.
pub const NONE_AXIS: &str = "_none_axis";

/// A densely populated multi-dimensional array of [`Element`]s, addressed
/// by an ordered list of named axes.
///
/// Storage is row-major: the last axis varies fastest. Axis names are
/// unique within a reference and case-sensitive; axis order is part of the
/// reference's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    axes: Vec<String>,
    shape: Vec<usize>,
    tensor: Vec<Element>,
}

/// A selector used by [`Reference::slice`].
///
/// `Index` removes the named axis, keeping the single selected position.
/// `Mask` keeps the axis but restricts it to the positions where the mask
/// is `true` — this is how a timing-step truth mask (§4.7.3, §4.8 TIA
/// `FOR_EACH`) narrows a downstream reference without collapsing its rank.
#[derive(Debug, Clone)]
pub enum Selector {
    Index(usize),
    Mask(Vec<bool>),
}

fn strides_for(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1].max(1);
    }
    strides
}

/// Cartesian product of `0..n` for each `n` in `shape`, in row-major order
/// (matching tensor storage order).
fn index_tuples(shape: &[usize]) -> Vec<Vec<usize>> {
    if shape.is_empty() {
        return vec![vec![]];
    }
    let total: usize = shape.iter().product();
    let strides = strides_for(shape);
    let mut out = Vec::with_capacity(total);
    for flat in 0..total {
        let mut idx = vec![0usize; shape.len()];
        let mut rem = flat;
        for (axis, stride) in strides.iter().enumerate() {
            idx[axis] = rem / stride;
            rem %= stride;
        }
        out.push(idx);
    }
    out
}

impl Reference {
    /// Builds a reference, validating that `axes`/`shape` agree in length,
    /// axis names are unique, and `tensor.len()` equals the shape product.
    pub fn new(axes: Vec<String>, shape: Vec<usize>, tensor: Vec<Element>) -> Result<Self> {
        if axes.len() != shape.len() {
            return Err(ReferenceError::ShapeMismatch {
                detail: format!("{} axes but {} shape entries", axes.len(), shape.len()),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for a in &axes {
            if !seen.insert(a.clone()) {
                return Err(ReferenceError::ShapeMismatch {
                    detail: format!("duplicate axis name '{}'", a),
                });
            }
        }
        let expected: usize = shape.iter().product();
        if tensor.len() != expected {
            return Err(ReferenceError::ShapeMismatch {
                detail: format!("shape {:?} implies {} elements, got {}", shape, expected, tensor.len()),
            });
        }
        Ok(Reference { axes, shape, tensor })
    }

    /// A `(1,)`-shaped reference on `_none_axis` holding a single element.
    pub fn singleton(element: Element) -> Self {
        Reference {
            axes: vec![NONE_AXIS.to_string()],
            shape: vec![1],
            tensor: vec![element],
        }
    }

    pub fn axes(&self) -> &[String] {
        &self.axes
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }

    pub fn axis_position(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a == name)
    }

    pub fn axis_size(&self, name: &str) -> Option<usize> {
        self.axis_position(name).map(|p| self.shape[p])
    }

    fn flat_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.axes.len() {
            return Err(ReferenceError::RankMismatch { expected: self.axes.len(), got: index.len() });
        }
        let strides = strides_for(&self.shape);
        let mut flat = 0;
        for (i, (&ix, &sz)) in index.iter().zip(self.shape.iter()).enumerate() {
            if ix >= sz {
                return Err(ReferenceError::OutOfBounds {
                    axes: self.axes.clone(),
                    shape: self.shape.clone(),
                    index: index.to_vec(),
                });
            }
            flat += ix * strides[i];
        }
        Ok(flat)
    }

    pub fn get(&self, index: &[usize]) -> Result<&Element> {
        let flat = self.flat_index(index)?;
        Ok(&self.tensor[flat])
    }

    pub fn set(&mut self, index: &[usize], element: Element) -> Result<()> {
        let flat = self.flat_index(index)?;
        self.tensor[flat] = element;
        Ok(())
    }

    /// All index tuples in row-major (tensor storage) order.
    pub fn iter_index_tuples(&self) -> impl Iterator<Item = Vec<usize>> {
        index_tuples(&self.shape).into_iter()
    }

    /// Removes `axis_name`, keeping either the single position named by an
    /// `Index` selector, or the positions passed by a `Mask` selector
    /// (which keeps the axis, shrunk to the number of `true` entries).
    pub fn slice(&self, axis_name: &str, selector: Selector) -> Result<Reference> {
        let pos = self.axis_position(axis_name).ok_or_else(|| ReferenceError::UnknownAxis {
            axis: axis_name.to_string(),
            available: self.axes.clone(),
        })?;

        match selector {
            Selector::Index(i) => {
                if i >= self.shape[pos] {
                    return Err(ReferenceError::OutOfBounds {
                        axes: self.axes.clone(),
                        shape: self.shape.clone(),
                        index: vec![i],
                    });
                }
                let mut new_axes = self.axes.clone();
                let mut new_shape = self.shape.clone();
                new_axes.remove(pos);
                new_shape.remove(pos);
                let squeezed_to_singleton = new_shape.is_empty();
                if squeezed_to_singleton {
                    new_axes.push(NONE_AXIS.to_string());
                    new_shape.push(1);
                }
                let mut tensor = Vec::new();
                for idx in index_tuples(&new_shape) {
                    let remaining = if squeezed_to_singleton { &[] } else { idx.as_slice() };
                    let source_index = insert_at(remaining, pos, i);
                    tensor.push(self.get(&source_index)?.clone());
                }
                Reference::new(new_axes, new_shape, tensor)
            }
            Selector::Mask(mask) => {
                if mask.len() != self.shape[pos] {
                    return Err(ReferenceError::ShapeMismatch {
                        detail: format!(
                            "mask has {} entries but axis '{}' has size {}",
                            mask.len(),
                            axis_name,
                            self.shape[pos]
                        ),
                    });
                }
                let kept: Vec<usize> = mask.iter().enumerate().filter(|(_, &b)| b).map(|(i, _)| i).collect();
                let mut new_shape = self.shape.clone();
                new_shape[pos] = kept.len();
                let mut tensor = Vec::with_capacity(new_shape.iter().product());
                for idx in index_tuples(&new_shape) {
                    let mut source_index = idx.clone();
                    source_index[pos] = kept[idx[pos]];
                    tensor.push(self.get(&source_index)?.clone());
                }
                Reference::new(self.axes.clone(), new_shape, tensor)
            }
        }
    }

    /// Concatenates `other` along `along_axis`. If `along_axis` is absent
    /// from `self`, it is introduced with size 1 before concatenation.
    /// Both operands must agree on every other axis's size.
    pub fn append(&self, other: &Reference, along_axis: &str) -> Result<Reference> {
        let base = match self.axis_position(along_axis) {
            Some(_) => self.clone(),
            None => self.unsqueeze(along_axis)?,
        };

        let base_pos = base.axis_position(along_axis).expect("just unsqueezed or already present");
        let other_pos = other.axis_position(along_axis).ok_or_else(|| ReferenceError::ShapeMismatch {
            detail: format!("append source reference has no axis '{}'", along_axis),
        })?;

        for axis in &base.axes {
            if axis == along_axis {
                continue;
            }
            let base_sz = base.axis_size(axis);
            let other_sz = other.axis_size(axis);
            if base_sz != other_sz {
                return Err(ReferenceError::ShapeMismatch {
                    detail: format!(
                        "append operands disagree on axis '{}': {:?} vs {:?}",
                        axis, base_sz, other_sz
                    ),
                });
            }
        }
        if base.axes.len() != other.axes.len() {
            return Err(ReferenceError::ShapeMismatch {
                detail: "append operands have different axis sets".to_string(),
            });
        }

        let base_sz = base.shape[base_pos];
        let other_sz = other.shape[other_pos];
        let mut new_shape = base.shape.clone();
        new_shape[base_pos] = base_sz + other_sz;

        let mut tensor = Vec::with_capacity(new_shape.iter().product());
        for idx in index_tuples(&new_shape) {
            let along = idx[base_pos];
            if along < base_sz {
                tensor.push(base.get(&idx)?.clone());
            } else {
                let mut other_idx = idx.clone();
                other_idx[base_pos] = along - base_sz;
                // `other`'s axis order may differ from `base`'s; remap by name.
                let remapped = remap_index(&base.axes, &other.axes, &other_idx, base_pos, along_axis, along - base_sz)?;
                tensor.push(other.get(&remapped)?.clone());
            }
        }
        Reference::new(base.axes.clone(), new_shape, tensor)
    }

    /// Introduces `axis_name` with size 1, without touching any data.
    pub fn unsqueeze(&self, axis_name: &str) -> Result<Reference> {
        if self.axis_position(axis_name).is_some() {
            return Ok(self.clone());
        }
        let mut axes = self.axes.clone();
        let mut shape = self.shape.clone();
        axes.push(axis_name.to_string());
        shape.push(1);
        Reference::new(axes, shape, self.tensor.clone())
    }

    /// Aligns operands by shared axis names and introduces all distinct
    /// axes as independent dimensions. Each output element is a `Tuple` of
    /// the aligned operand elements, in operand order.
    ///
    /// `NONE_AXIS` never contributes a dimension of its own: a singleton
    /// operand broadcasts against whatever real axes the other operands
    /// carry instead of appending a phantom size-1 axis. Only when every
    /// operand is a singleton does the result stay on `NONE_AXIS`.
    pub fn cross_product(refs: &[&Reference]) -> Result<Reference> {
        let mut combined_axes: Vec<String> = Vec::new();
        let mut combined_shape: Vec<usize> = Vec::new();
        for r in refs {
            for (name, &size) in r.axes.iter().zip(r.shape.iter()) {
                if name == NONE_AXIS {
                    continue;
                }
                if let Some(pos) = combined_axes.iter().position(|a| a == name) {
                    if combined_shape[pos] != size {
                        return Err(ReferenceError::ShapeMismatch {
                            detail: format!(
                                "axis '{}' has conflicting sizes {} and {} across cross_product operands",
                                name, combined_shape[pos], size
                            ),
                        });
                    }
                } else {
                    combined_axes.push(name.clone());
                    combined_shape.push(size);
                }
            }
        }
        if combined_axes.is_empty() {
            combined_axes.push(NONE_AXIS.to_string());
            combined_shape.push(1);
        }

        let mut tensor = Vec::with_capacity(combined_shape.iter().product());
        for idx in index_tuples(&combined_shape) {
            let mut members = Vec::with_capacity(refs.len());
            for r in refs {
                let mut sub_index = Vec::with_capacity(r.axes.len());
                for name in &r.axes {
                    if name == NONE_AXIS {
                        sub_index.push(0);
                        continue;
                    }
                    let pos = combined_axes.iter().position(|a| a == name).expect("axis registered above");
                    sub_index.push(idx[pos]);
                }
                members.push(r.get(&sub_index)?.clone());
            }
            tensor.push(Element::Tuple(members));
        }
        Reference::new(combined_axes, combined_shape, tensor)
    }

    /// Elementwise applies each `Callable` element of `functions_ref` to the
    /// aligned tuple of `values_ref`. A skip in either operand propagates
    /// to the output; a non-callable, non-skip function element is an
    /// error.
    pub fn cross_action(functions_ref: &Reference, values_ref: &Reference) -> std::result::Result<Reference, CrossActionError> {
        let combined = Reference::cross_product(&[functions_ref, values_ref])?;
        let mut tensor = Vec::with_capacity(combined.len());
        for element in combined.tensor.iter() {
            let pair = element.as_tuple().expect("cross_product always emits Tuple elements");
            let (func_el, value_el) = (&pair[0], &pair[1]);
            if func_el.is_skip() || value_el.is_skip() {
                tensor.push(Element::Skip);
                continue;
            }
            match func_el {
                Element::Callable(callable) => {
                    let args: Vec<Element> = match value_el {
                        Element::Tuple(members) => members.clone(),
                        other => vec![other.clone()],
                    };
                    tensor.push(callable.call(&args)?);
                }
                _ => {
                    return Err(CrossActionError::NotCallable);
                }
            }
        }
        Ok(Reference::new(combined.axes, combined.shape, tensor)?)
    }

    /// Removes `axes` by flattening them. With `create_axis`, the
    /// flattened dimension becomes a new axis of that name; without it,
    /// each remaining position collapses to a `Tuple` of the removed
    /// positions' elements (row-major over the listed axes).
    pub fn collapse(&self, axes: &[String], create_axis: Option<String>) -> Result<Reference> {
        for a in axes {
            if self.axis_position(a).is_none() {
                return Err(ReferenceError::UnknownAxis { axis: a.clone(), available: self.axes.clone() });
            }
        }
        let remaining_axes: Vec<String> = self.axes.iter().filter(|a| !axes.contains(a)).cloned().collect();
        let remaining_shape: Vec<usize> = remaining_axes.iter().map(|a| self.axis_size(a).unwrap()).collect();
        let collapsed_shape: Vec<usize> = axes.iter().map(|a| self.axis_size(a).unwrap()).collect();
        let collapsed_size: usize = collapsed_shape.iter().product::<usize>().max(1);

        let remaining_positions: Vec<usize> = remaining_axes.iter().map(|a| self.axis_position(a).unwrap()).collect();
        let collapsed_positions: Vec<usize> = axes.iter().map(|a| self.axis_position(a).unwrap()).collect();

        match create_axis {
            Some(name) => {
                let mut new_axes = remaining_axes.clone();
                new_axes.push(name);
                let mut new_shape = remaining_shape.clone();
                new_shape.push(collapsed_size);
                let mut tensor = Vec::with_capacity(new_shape.iter().product());
                for rem_idx in index_tuples(&remaining_shape) {
                    for col_idx in index_tuples(&collapsed_shape) {
                        let source = compose_index(self.rank(), &remaining_positions, &rem_idx, &collapsed_positions, &col_idx);
                        tensor.push(self.get(&source)?.clone());
                    }
                }
                Reference::new(new_axes, new_shape, tensor)
            }
            None => {
                let new_axes = if remaining_axes.is_empty() { vec![NONE_AXIS.to_string()] } else { remaining_axes.clone() };
                let new_shape = if remaining_shape.is_empty() { vec![1] } else { remaining_shape.clone() };
                let mut tensor = Vec::with_capacity(new_shape.iter().product());
                for rem_idx in index_tuples(&remaining_shape) {
                    let mut bucket = Vec::with_capacity(collapsed_size);
                    for col_idx in index_tuples(&collapsed_shape) {
                        let source = compose_index(self.rank(), &remaining_positions, &rem_idx, &collapsed_positions, &col_idx);
                        bucket.push(self.get(&source)?.clone());
                    }
                    tensor.push(Element::Tuple(bucket));
                }
                Reference::new(new_axes, new_shape, tensor)
            }
        }
    }

    /// Wraps every element as a single-key mapping `{name: element}`.
    pub fn annotate(&self, name: &str) -> Reference {
        let tensor = self.tensor.iter().map(|e| e.annotate(name)).collect();
        Reference { axes: self.axes.clone(), shape: self.shape.clone(), tensor }
    }
}

fn insert_at(idx: &[usize], pos: usize, value: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(idx.len() + 1);
    out.extend_from_slice(&idx[..pos.min(idx.len())]);
    out.push(value);
    out.extend_from_slice(&idx[pos.min(idx.len())..]);
    out
}

fn compose_index(
    rank: usize,
    remaining_positions: &[usize],
    remaining_idx: &[usize],
    collapsed_positions: &[usize],
    collapsed_idx: &[usize],
) -> Vec<usize> {
    let mut out = vec![0usize; rank];
    for (p, v) in remaining_positions.iter().zip(remaining_idx.iter()) {
        out[*p] = *v;
    }
    for (p, v) in collapsed_positions.iter().zip(collapsed_idx.iter()) {
        out[*p] = *v;
    }
    out
}

fn remap_index(
    base_axes: &[String],
    other_axes: &[String],
    other_idx_placeholder: &[usize],
    base_pos: usize,
    along_axis: &str,
    along_value: usize,
) -> Result<Vec<usize>> {
    let mut out = vec![0usize; other_axes.len()];
    for (base_i, base_name) in base_axes.iter().enumerate() {
        let value = if base_i == base_pos || base_name == along_axis {
            along_value
        } else {
            other_idx_placeholder[base_i]
        };
        let other_pos = other_axes
            .iter()
            .position(|a| a == base_name)
            .ok_or_else(|| ReferenceError::UnknownAxis { axis: base_name.clone(), available: other_axes.to_vec() })?;
        out[other_pos] = value;
    }
    Ok(out)
}

/// Error from [`Reference::cross_action`]: either reference-algebra misuse
/// or a failed callable invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossActionError {
    Reference(ReferenceError),
    Call(CallError),
    NotCallable,
}

impl fmt::Display for CrossActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossActionError::Reference(e) => write!(f, "{}", e),
            CrossActionError::Call(e) => write!(f, "{}", e),
            CrossActionError::NotCallable => write!(f, "functions_ref element is not callable"),
        }
    }
}

impl std::error::Error for CrossActionError {}

impl From<ReferenceError> for CrossActionError {
    fn from(e: ReferenceError) -> Self {
        CrossActionError::Reference(e)
    }
}

impl From<CallError> for CrossActionError {
    fn from(e: CallError) -> Self {
        CrossActionError::Call(e)
    }
}
