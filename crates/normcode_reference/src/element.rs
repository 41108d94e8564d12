//! The tagged element type every [`Reference`](crate::Reference) is built
//! from.
//!
//! Per the specification's call to replace "heterogeneous tensors" with a
//! tagged element type: an element is always exactly one of a primitive
//! JSON-shaped value, a perceptual sign, the distinguished skip marker, or
//! (transiently, only inside the Paradigm Composer's functional reference)
//! a callable. Operations that reshape a [`Reference`] never need to
//! inspect what's inside a primitive; they only ever branch on which
//! variant they're holding.

use crate::sign::PerceptualSign;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Error produced by invoking a [`Callable`] element during `cross_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError(pub String);

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CallError {}

/// A paradigm, compiled down to a plain Rust closure over aligned argument
/// elements. Held only inside the functional reference produced by MFP
/// (§4.8); never written to a concept's stored reference and never
/// serialized into a checkpoint.
#[derive(Clone)]
pub struct Callable(pub Arc<dyn Fn(&[Element]) -> Result<Element, CallError> + Send + Sync>);

impl Callable {
    pub fn new(f: impl Fn(&[Element]) -> Result<Element, CallError> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Element]) -> Result<Element, CallError> {
        (self.0)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable(..)")
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One cell of a [`Reference`](crate::Reference)'s tensor.
///
/// `Tuple` is produced only by `cross_product`/`cross_action` as an
/// intermediate aligned-operand value; it never appears in a concept's
/// loaded or persisted reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A JSON-shaped primitive: string, number, bool, object, or array.
    Primitive(Value),
    /// An opaque perceptual sign, transmuted only on explicit request.
    Sign(PerceptualSign),
    /// The distinguished "no data at this position" marker.
    Skip,
    /// An aligned tuple of operand elements, produced by `cross_product`.
    Tuple(Vec<Element>),
    /// A compiled paradigm callable, produced only by MFP.
    Callable(Callable),
}

impl Element {
    pub fn is_skip(&self) -> bool {
        matches!(self, Element::Skip)
    }

    pub fn as_primitive(&self) -> Option<&Value> {
        match self {
            Element::Primitive(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sign(&self) -> Option<&PerceptualSign> {
        match self {
            Element::Sign(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Element]> {
        match self {
            Element::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// Selects one member by position from an array primitive or a tuple.
    /// Negative indices count from the end. `Skip` propagates unchanged;
    /// any other shape (or an out-of-range index) yields `None`.
    pub fn index(&self, i: i64) -> Option<Element> {
        if self.is_skip() {
            return Some(Element::Skip);
        }
        let normalize = |len: usize| -> Option<usize> {
            let len = len as i64;
            let idx = if i < 0 { len + i } else { i };
            (idx >= 0 && idx < len).then_some(idx as usize)
        };
        match self {
            Element::Primitive(Value::Array(arr)) => normalize(arr.len()).map(|idx| Element::Primitive(arr[idx].clone())),
            Element::Tuple(members) => normalize(members.len()).map(|idx| members[idx].clone()),
            _ => None,
        }
    }

    /// Selects one member by key from an object primitive. `Skip`
    /// propagates unchanged; any other shape yields `None`.
    pub fn key(&self, k: &str) -> Option<Element> {
        if self.is_skip() {
            return Some(Element::Skip);
        }
        match self {
            Element::Primitive(Value::Object(map)) => map.get(k).cloned().map(Element::Primitive),
            _ => None,
        }
    }

    /// Spreads an array primitive or tuple into its members, for assembling
    /// multiple call arguments from one collection element. `Skip` spreads
    /// to a single-element `[Skip]`; any other shape yields `None`.
    pub fn unpack(&self) -> Option<Vec<Element>> {
        match self {
            Element::Skip => Some(vec![Element::Skip]),
            Element::Primitive(Value::Array(arr)) => Some(arr.iter().cloned().map(Element::Primitive).collect()),
            Element::Tuple(members) => Some(members.clone()),
            _ => None,
        }
    }

    /// Wraps this element as a single-key mapping `{name: element}`.
    ///
    /// Non-primitive elements (signs, skip, tuples, callables) are wrapped
    /// by converting them to their textual form first, since a dictionary
    /// value in the data model is a JSON value.
    pub fn annotate(&self, name: &str) -> Element {
        let value = match self {
            Element::Primitive(v) => v.clone(),
            Element::Sign(s) => Value::String(s.format()),
            Element::Skip => Value::Null,
            Element::Tuple(_) | Element::Callable(_) => Value::Null,
        };
        let mut map = serde_json::Map::new();
        map.insert(name.to_string(), value);
        Element::Primitive(Value::Object(map))
    }
}

impl From<Value> for Element {
    fn from(v: Value) -> Self {
        Element::Primitive(v)
    }
}

impl From<PerceptualSign> for Element {
    fn from(s: PerceptualSign) -> Self {
        Element::Sign(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_detection() {
        assert!(Element::Skip.is_skip());
        assert!(!Element::Primitive(Value::Bool(true)).is_skip());
    }

    #[test]
    fn index_supports_negative_positions() {
        let el = Element::Primitive(Value::from(vec![1, 2, 3]));
        assert_eq!(el.index(-1), Some(Element::Primitive(Value::from(3))));
        assert_eq!(el.index(5), None);
    }

    #[test]
    fn index_and_key_propagate_skip() {
        assert_eq!(Element::Skip.index(0), Some(Element::Skip));
        assert_eq!(Element::Skip.key("x"), Some(Element::Skip));
    }

    #[test]
    fn unpack_spreads_array_into_members() {
        let el = Element::Primitive(Value::from(vec![1, 2]));
        assert_eq!(el.unpack(), Some(vec![Element::Primitive(Value::from(1)), Element::Primitive(Value::from(2))]));
    }

    #[test]
    fn annotate_wraps_primitive() {
        let el = Element::Primitive(Value::from(5));
        let annotated = el.annotate("{count}");
        match annotated {
            Element::Primitive(Value::Object(map)) => {
                assert_eq!(map.get("{count}"), Some(&Value::from(5)));
            }
            _ => panic!("expected object"),
        }
    }
}
