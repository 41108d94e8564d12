//! Multi-dimensional named-axis tensor algebra over NormCode concept data.
//!
//! A [`Reference`] is the one shape every concept's materialized data
//! takes: an ordered list of named axes, a shape, and a dense tensor of
//! [`Element`]s. The algebra defined here — `get`/`set`, `slice`,
//! `append`, `cross_product`, `cross_action`, `collapse`, `annotate` — is
//! the full vocabulary the semantic sequences (IWI/IR/MFP/MVP/TVA/TIA/
//! OR/OWI) and the Paradigm Composer use to move data between concepts.

mod element;
mod error;
mod reference;
mod sign;

pub use element::{CallError, Callable, Element};
pub use error::{ReferenceError, Result};
pub use reference::{CrossActionError, Reference, Selector, NONE_AXIS};
pub use sign::{PerceptualSign, SignParseError};
