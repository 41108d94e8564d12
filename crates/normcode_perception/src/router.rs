//! PerceptionRouter: resolves a perceptual sign's `norm` to a transmutation
//! procedure that produces an in-memory value from its `signifier` (§4.2).
//!
//! The registry is owned by the router instance and injected at
//! Orchestrator construction (§9 "Global settings... no process-wide
//! mutable state"), so norms are genuinely pluggable per run.

use crate::error::{PerceptionError, Result};
use crate::memory::MemoryStore;
use crate::vfs::Vfs;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An opaque handle to a script, returned by the `script-location` norm.
/// Execution is deferred to whichever `Tool` in the Agent's Body claims the
/// `script_executor` role — the core never executes it (§4.2, §4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHandle {
    pub signifier: String,
}

/// The result of transmuting a perceptual sign: either a concrete value, or
/// (for `script-location`) a handle whose execution is deferred.
#[derive(Debug, Clone, PartialEq)]
pub enum Transmuted {
    Value(Value),
    Script(ScriptHandle),
}

impl Transmuted {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Transmuted::Value(v) => Some(v),
            Transmuted::Script(_) => None,
        }
    }
}

/// One pluggable perception norm: a transmutation procedure from signifier
/// to value. Implementations must be idempotent and side-effect-free apart
/// from the I/O described in §4.2.
#[async_trait]
pub trait PerceptionNorm: Send + Sync {
    async fn transmute(&self, id: &str, signifier: &str) -> Result<Transmuted>;
}

struct FileLocation(Arc<dyn Vfs>);

#[async_trait]
impl PerceptionNorm for FileLocation {
    async fn transmute(&self, _id: &str, signifier: &str) -> Result<Transmuted> {
        Ok(Transmuted::Value(Value::String(self.0.read_to_string(signifier).await?)))
    }
}

struct PromptLocation(Arc<dyn Vfs>);

#[async_trait]
impl PerceptionNorm for PromptLocation {
    async fn transmute(&self, _id: &str, signifier: &str) -> Result<Transmuted> {
        Ok(Transmuted::Value(Value::String(self.0.read_to_string(signifier).await?)))
    }
}

struct ScriptLocation;

#[async_trait]
impl PerceptionNorm for ScriptLocation {
    async fn transmute(&self, _id: &str, signifier: &str) -> Result<Transmuted> {
        Ok(Transmuted::Script(ScriptHandle { signifier: signifier.to_string() }))
    }
}

struct MemorizedParameter(Arc<dyn MemoryStore>);

#[async_trait]
impl PerceptionNorm for MemorizedParameter {
    async fn transmute(&self, _id: &str, signifier: &str) -> Result<Transmuted> {
        let value = self.0.get(signifier).await.ok_or_else(|| PerceptionError::NoSuchParameter(signifier.to_string()))?;
        Ok(Transmuted::Value(value))
    }
}

struct Literal;

#[async_trait]
impl PerceptionNorm for Literal {
    async fn transmute(&self, _id: &str, signifier: &str) -> Result<Transmuted> {
        Ok(Transmuted::Value(Value::String(signifier.to_string())))
    }
}

/// Maps a `norm` name to its transmutation procedure. Unknown norms yield
/// `unknown-perception-norm`.
pub struct PerceptionRouter {
    norms: HashMap<String, Box<dyn PerceptionNorm>>,
}

impl PerceptionRouter {
    pub fn new() -> Self {
        PerceptionRouter { norms: HashMap::new() }
    }

    /// Registers the five norms required by §4.2, wired to the given VFS
    /// and memory store.
    pub fn with_defaults(vfs: Arc<dyn Vfs>, memory: Arc<dyn MemoryStore>) -> Self {
        let mut router = PerceptionRouter::new();
        router.register("file-location", Box::new(FileLocation(vfs.clone())));
        router.register("prompt-location", Box::new(PromptLocation(vfs)));
        router.register("script-location", Box::new(ScriptLocation));
        router.register("memorized-parameter", Box::new(MemorizedParameter(memory)));
        router.register("literal", Box::new(Literal));
        router
    }

    pub fn register(&mut self, norm: impl Into<String>, handler: Box<dyn PerceptionNorm>) {
        self.norms.insert(norm.into(), handler);
    }

    /// Transmutes a sign by looking up its norm and calling the handler
    /// with the sign's `id` and `signifier`.
    pub async fn transmute(&self, norm: &str, id: &str, signifier: &str) -> Result<Transmuted> {
        let handler = self.norms.get(norm).ok_or_else(|| PerceptionError::UnknownNorm(norm.to_string()))?;
        handler.transmute(id, signifier).await
    }
}

impl Default for PerceptionRouter {
    fn default() -> Self {
        Self::new()
    }
}
