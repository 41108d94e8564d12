//! Typed `ConceptRepo`/`InferenceRepo` stores loaded from a plan's JSON
//! files (§3, §4.3, §6).
//!
//! Both repositories are immutable with respect to *definitions* once
//! loaded; only `ConceptRepo`'s references and the Blackboard's statuses
//! mutate during a run.

mod concept;
mod error;
mod flow_index;
mod inference;
mod nested;
mod repo;

pub use concept::{Concept, ConceptKind, ConceptRecord, ConceptRepo};
pub use error::{ModelError, Result};
pub use flow_index::{FlowIndex, FlowIndexParseError};
pub use inference::{
    AssertionCondition, AssigningWI, DerelationSelector, GroupingMode, GroupingWI, InferenceEntry, InferenceRecord,
    LoopingWI, Quantifier, SemanticWI, SequenceKind, TimingMarker, TimingWI, ValueSelector, WorkingInterpretation,
};
pub use nested::{reference_from_nested, reference_to_nested};
pub use repo::InferenceRepo;

/// The inputs file shape (§6): a JSON mapping from ground-concept name to
/// `{ "data": <nested list>, "axes": [<axis names>] }`.
#[derive(Debug, serde::Deserialize)]
pub struct InputRecord {
    pub data: serde_json::Value,
    #[serde(default)]
    pub axes: Vec<String>,
}

pub type InputsFile = rustc_hash::FxHashMap<String, InputRecord>;

/// Applies an inputs file to an already-loaded `ConceptRepo`, writing each
/// ground concept's reference (§3 "Ground concepts are populated at load").
pub fn apply_inputs(repo: &mut ConceptRepo, inputs: InputsFile) -> Result<()> {
    let mut problems = Vec::new();
    for (name, input) in inputs {
        match reference_from_nested(&input.data, &input.axes) {
            Ok(reference) => {
                if let Err(e) = repo.set_reference(&name, reference) {
                    problems.push(e.to_string());
                }
            }
            Err(e) => problems.push(format!("input '{}': {}", name, e)),
        }
    }
    if let Some(err) = ModelError::from_problems(problems) {
        return Err(err);
    }
    Ok(())
}
