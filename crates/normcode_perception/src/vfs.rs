//! Minimal filesystem abstraction the `file-location`/`prompt-location`
//! norms read through, so the router is testable without real disk I/O
//! (§4.2 [ADDED]).

use crate::error::{PerceptionError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[async_trait]
pub trait Vfs: Send + Sync {
    async fn read_to_string(&self, path: &str) -> Result<String>;
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Reads through `tokio::fs`, rooted at `base_dir`.
pub struct NativeVfs {
    base_dir: PathBuf,
}

impl NativeVfs {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        NativeVfs { base_dir: base_dir.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = PathBuf::from(path);
        if p.is_absolute() {
            p
        } else {
            self.base_dir.join(p)
        }
    }
}

#[async_trait]
impl Vfs for NativeVfs {
    async fn read_to_string(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|e| PerceptionError::Io(format!("{}: {}", path, e)))
    }

    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path))
            .await
            .map_err(|e| PerceptionError::Io(format!("{}: {}", path, e)))
    }
}

/// In-memory VFS for unit tests and for norms that resolve against a
/// preloaded set of documents rather than the real filesystem.
#[derive(Default)]
pub struct InMemoryVfs {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryVfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.lock().await.insert(path.into(), contents.into());
    }
}

#[async_trait]
impl Vfs for InMemoryVfs {
    async fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path).await?;
        String::from_utf8(bytes).map_err(|e| PerceptionError::Io(e.to_string()))
    }

    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| PerceptionError::Io(format!("no such file '{}' in InMemoryVfs", path)))
    }
}
