//! Paradigm Composer (§4.6): compiles a declarative paradigm specification
//! plus runtime values into a callable via vertical (setup) then horizontal
//! (runtime) composition. This is the only place in the core permitted to
//! call external models or execute user-supplied scripts, and it does so
//! exclusively through `normcode-agent`'s `Tool` trait.

mod composer;
mod error;
mod registry;
mod spec;

pub use composer::ParadigmComposer;
pub use error::{ParadigmError, Result};
pub use registry::ParadigmRegistry;
pub use spec::{ArgRef, HorizontalStep, ParadigmSpec, VerticalStep};
