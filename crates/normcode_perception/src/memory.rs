//! `memorized-parameter` backing store (§4.2): a generic persisted-value
//! key/value interface, not necessarily a filesystem fact. The CLI wires
//! this to the same checkpoint database environment so memorized
//! parameters survive resume (SPEC_FULL.md §4.2).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value);
}

/// In-process store; sufficient for a single run's lifetime. A
/// database-backed store can be substituted without touching
/// `PerceptionRouter`.
#[derive(Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        self.values.lock().await.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn stores_and_retrieves() {
        let store = InMemoryStore::new();
        store.set("k", json!(42)).await;
        assert_eq!(store.get("k").await, Some(json!(42)));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("missing").await, None);
    }
}
