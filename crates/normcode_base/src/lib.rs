#![cfg_attr(docsrs, feature(doc_cfg))]

//! # normcode-base
//!
//! Pure structural atoms shared across the NormCode runtime core.
//!
//! This crate provides the foundational types every other crate builds on:
//!
//! - [`Interner`]/[`Symbol`] — String interning for O(1) equality, used to
//!   key concept names and flow indices without re-hashing strings on every
//!   lookup.
//! - [`LocatedError`]/[`Result`] — Errors annotated with where in the plan
//!   (flow index, concept name) they occurred.
//!
//! # Design Principles
//!
//! This crate has **no knowledge of plan semantics or I/O**. It provides
//! only generic, reusable infrastructure that higher-level crates build
//! upon.
//!
//! # Example
//!
//! ```
//! use normcode_base::Interner;
//!
//! let mut interner = Interner::new();
//! let sym = interner.intern("{digit sum}");
//! assert_eq!(interner.resolve(sym), "{digit sum}");
//! ```

pub mod intern;
pub mod error;

pub use intern::{Interner, Symbol, SymbolEq};
pub use error::{LocatedError, Result};
