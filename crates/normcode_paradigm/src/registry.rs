//! The paradigm registry: every `*.json` file under `NORMCODE_PARADIGM_DIR`,
//! keyed by its own `paradigm_id` field (§4.6, SPEC_FULL.md §4.6).

use crate::error::{ParadigmError, Result};
use crate::spec::ParadigmSpec;
use rustc_hash::FxHashMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct ParadigmRegistry {
    specs: FxHashMap<String, ParadigmSpec>,
}

impl ParadigmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: ParadigmSpec) {
        self.specs.insert(spec.paradigm_id.clone(), spec);
    }

    pub fn get(&self, paradigm_id: &str) -> Result<&ParadigmSpec> {
        self.specs.get(paradigm_id).ok_or_else(|| ParadigmError::NotFound { paradigm_id: paradigm_id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every loaded `paradigm_id`, for the Orchestrator's environment
    /// signature (§4.10 OVERWRITE mismatch check).
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// Loads every `*.json` file directly under `dir`. A file whose
    /// `paradigm_id` collides with one already loaded is an error — two
    /// specs silently shadowing each other would make a resumed run
    /// non-reproducible.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut registry = ParadigmRegistry::new();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ParadigmError::RegistryLoad { detail: format!("{}: {}", dir.display(), e) })?;
        for entry in entries {
            let entry = entry.map_err(|e| ParadigmError::RegistryLoad { detail: e.to_string() })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ParadigmError::RegistryLoad { detail: format!("{}: {}", path.display(), e) })?;
            let spec: ParadigmSpec = serde_json::from_str(&text)
                .map_err(|e| ParadigmError::RegistryLoad { detail: format!("{}: {}", path.display(), e) })?;
            if registry.specs.contains_key(&spec.paradigm_id) {
                return Err(ParadigmError::RegistryLoad {
                    detail: format!("duplicate paradigm_id '{}' (from {})", spec.paradigm_id, path.display()),
                });
            }
            registry.insert(spec);
        }
        Ok(registry)
    }
}
