//! `Body`: a registry of named tools (§4.5): `llm`, `file_system`,
//! `script_executor`, `user_input`, `prompt_tool`, `perception_router`.

use crate::error::{Result, ToolError};
use crate::tool::Tool;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct Body {
    tools: FxHashMap<String, Arc<dyn Tool>>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, tool: Arc<dyn Tool>) {
        self.tools.insert(name.into(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Every registered tool name, for the Orchestrator's environment
    /// signature (§4.10 OVERWRITE mismatch check).
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub async fn invoke(&self, tool: &str, method: &str, args: &[Value]) -> Result<Value> {
        let handle = self.get(tool).ok_or_else(|| ToolError::NotFound { name: tool.to_string() })?;
        handle.invoke(method, args).await
    }
}
