//! `Tool`: the capability unit a `Body` registers by name (§4.5).
//!
//! A tool is a named bundle of methods the Paradigm Composer's horizontal
//! plan steps (`h_*`) invoke by name. `Tool::invoke` returning an error is
//! the seam the semantic sequences' TVA stage wraps in the `external-tool-
//! error` retry policy (§7) — invocation is the only place in the core
//! permitted to touch an external model, filesystem, or script runtime
//! (besides PerceptionRouter transmutation, which is a distinct seam).

use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's own name, used only for error messages.
    fn name(&self) -> &str;

    /// Invokes `method` with positional `args`, returning the method's
    /// result value.
    async fn invoke(&self, method: &str, args: &[Value]) -> Result<Value>;
}

/// A tool that always fails `UnsupportedMethod`; used by the CLI to
/// register an unconfigured slot (e.g. no LLM credentials present) so the
/// Body has a complete set of the four required kinds without silently
/// ignoring paradigm specs that reference them.
pub struct UnconfiguredTool {
    name: String,
}

impl UnconfiguredTool {
    pub fn new(name: impl Into<String>) -> Self {
        UnconfiguredTool { name: name.into() }
    }
}

#[async_trait]
impl Tool for UnconfiguredTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, method: &str, _args: &[Value]) -> Result<Value> {
        Err(ToolError::Invocation {
            tool: self.name.clone(),
            method: method.to_string(),
            detail: "tool is registered but not configured".to_string(),
        })
    }
}
