//! Errors raised by `Tool` invocation (§4.5, §7 `external-tool-error`).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The Body has no tool registered under the requested name.
    NotFound { name: String },
    /// The tool's `method` is not one it supports.
    UnsupportedMethod { tool: String, method: String },
    /// The tool raised an error while executing `method`.
    Invocation { tool: String, method: String, detail: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound { name } => write!(f, "no tool registered under '{}'", name),
            ToolError::UnsupportedMethod { tool, method } => {
                write!(f, "tool '{}' does not support method '{}'", tool, method)
            }
            ToolError::Invocation { tool, method, detail } => {
                write!(f, "external-tool-error: {}.{}: {}", tool, method, detail)
            }
        }
    }
}

impl std::error::Error for ToolError {}

pub type Result<T> = std::result::Result<T, ToolError>;
