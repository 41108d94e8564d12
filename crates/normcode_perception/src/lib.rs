//! PerceptionRouter (§4.2): resolves perceptual signs — opaque pointers of
//! the form `%{norm}id(signifier)` — to concrete data on demand.
//!
//! Transmutation is deferred until a semantic step explicitly requests it
//! (§4.8 MVP). This crate owns the pluggable norm registry plus the two
//! I/O seams (`Vfs`, `MemoryStore`) norms read through.

mod error;
mod memory;
mod router;
mod vfs;

pub use error::{PerceptionError, Result};
pub use memory::{InMemoryStore, MemoryStore};
pub use router::{PerceptionNorm, PerceptionRouter, ScriptHandle, Transmuted};
pub use vfs::{InMemoryVfs, NativeVfs, Vfs};
