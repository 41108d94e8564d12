//! Concept definitions and the repository that stores them alongside their
//! (possibly still-pending) references.

use crate::error::{ModelError, Result};
use crate::nested::reference_from_nested;
use normcode_reference::Reference;
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// One of the seven kinds a concept may declare (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptKind {
    Object,
    Proposition,
    Relation,
    Subject,
    FunctionalImperative,
    FunctionalJudgement,
    SyntacticOperator,
}

impl ConceptKind {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "object" => ConceptKind::Object,
            "proposition" => ConceptKind::Proposition,
            "relation" => ConceptKind::Relation,
            "subject" => ConceptKind::Subject,
            "functional-imperative" => ConceptKind::FunctionalImperative,
            "functional-judgement" => ConceptKind::FunctionalJudgement,
            "syntactic-operator" => ConceptKind::SyntacticOperator,
            _ => return None,
        })
    }
}

/// A concept's definition: everything about it except its (mutable)
/// reference, which `ConceptRepo` stores separately.
#[derive(Debug, Clone)]
pub struct Concept {
    pub name: String,
    pub kind: ConceptKind,
    pub is_ground: bool,
    pub is_final: bool,
    pub natural_name: Option<String>,
}

/// The on-disk shape of one concept repository record (§6).
#[derive(Debug, Deserialize)]
pub struct ConceptRecord {
    pub concept_name: String,
    pub kind: String,
    #[serde(default)]
    pub is_ground: bool,
    #[serde(default)]
    pub is_final: bool,
    pub reference_data: Option<serde_json::Value>,
    #[serde(default)]
    pub reference_axes: Vec<String>,
    pub natural_name: Option<String>,
}

/// Typed store of concept definitions and their references.
///
/// Lookups by name are raw: callers resolve identity aliases through the
/// Blackboard's union-find *before* calling in, so this repository never
/// needs to know about aliasing.
#[derive(Debug, Default)]
pub struct ConceptRepo {
    definitions: FxHashMap<String, Concept>,
    references: FxHashMap<String, Reference>,
}

impl ConceptRepo {
    pub fn load(records: Vec<ConceptRecord>) -> Result<Self> {
        let mut repo = ConceptRepo::default();
        let mut problems = Vec::new();

        for record in records {
            if record.concept_name.is_empty() {
                problems.push("concept record has an empty concept_name".to_string());
                continue;
            }
            if repo.definitions.contains_key(&record.concept_name) {
                problems.push(format!("duplicate concept_name '{}'", record.concept_name));
                continue;
            }
            let kind = match ConceptKind::parse(&record.kind) {
                Some(k) => k,
                None => {
                    problems.push(format!("concept '{}' has unknown kind '{}'", record.concept_name, record.kind));
                    continue;
                }
            };

            let reference = match &record.reference_data {
                Some(data) => match reference_from_nested(data, &record.reference_axes) {
                    Ok(r) => Some(r),
                    Err(e) => {
                        problems.push(format!("concept '{}': {}", record.concept_name, e));
                        None
                    }
                },
                None => None,
            };

            if record.is_ground && reference.is_none() {
                problems.push(format!("ground concept '{}' has no reference_data", record.concept_name));
            }

            let concept = Concept {
                name: record.concept_name.clone(),
                kind,
                is_ground: record.is_ground,
                is_final: record.is_final,
                natural_name: record.natural_name,
            };
            repo.definitions.insert(record.concept_name.clone(), concept);
            if let Some(r) = reference {
                repo.references.insert(record.concept_name, r);
            }
        }

        if let Some(err) = ModelError::from_problems(problems) {
            return Err(err);
        }
        Ok(repo)
    }

    pub fn declare(&mut self, concept: Concept) {
        self.definitions.insert(concept.name.clone(), concept);
    }

    pub fn concept(&self, name: &str) -> Option<&Concept> {
        self.definitions.get(name)
    }

    pub fn get_reference(&self, name: &str) -> Option<&Reference> {
        self.references.get(name)
    }

    pub fn set_reference(&mut self, name: &str, reference: Reference) -> Result<()> {
        if !self.definitions.contains_key(name) {
            return Err(ModelError::single(format!("set_reference on undeclared concept '{}'", name)));
        }
        self.references.insert(name.to_string(), reference);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(|s| s.as_str())
    }
}
