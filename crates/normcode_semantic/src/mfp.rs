//! MFP (§4.8): resolves the Agent named by `function_concept` and the
//! `ParadigmSpec` named by the working interpretation's `paradigm`, then
//! compiles the two into one callable Φ via the Paradigm Composer.

use crate::error::{Result, SemanticError};
use normcode_agent::AgentRegistry;
use normcode_model::InferenceEntry;
use normcode_paradigm::{ParadigmComposer, ParadigmRegistry};
use normcode_perception::PerceptionRouter;
use normcode_reference::Callable;

pub async fn resolve(
    entry: &InferenceEntry,
    paradigm_id: &str,
    agents: &AgentRegistry,
    paradigms: &ParadigmRegistry,
    perception: &PerceptionRouter,
) -> Result<Callable> {
    let agent = agents.resolve(&entry.function_concept).ok_or_else(|| SemanticError::UnknownAgent { subject: entry.function_concept.clone() })?;
    let spec = paradigms.get(paradigm_id)?;
    let composer = ParadigmComposer::new();
    Ok(composer.compose(spec, agent, perception).await?)
}
