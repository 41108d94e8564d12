//! Agent / Body (§4.5): the capability container every semantic sequence
//! invokes through. `Tool` is the seam where the core touches the outside
//! world; `Body` is a named registry of tools; `Agent` binds a `Body` to
//! the Subject concept that names it, plus an `AgentFrame` choosing
//! interpretation mode.

mod agent;
mod body;
mod error;
mod tool;

pub use agent::{Agent, AgentFrame, AgentRegistry, InterpretationMode};
pub use body::Body;
pub use error::{Result, ToolError};
pub use tool::{Tool, UnconfiguredTool};
