//! Imperative and judgement sequences (§4.8): the IWI/IR/MFP/MVP/TVA/TIA/
//! OR/OWI pipeline. Unlike the syntactic sequences in `normcode-sequences`,
//! this is the only place the runtime calls an external model or script —
//! everything upstream (MFP, MVP) only *prepares* the call; TVA is where it
//! happens.

pub mod error;
pub mod ir;
pub mod mfp;
pub mod mvp;
pub mod output;
pub mod tia;
pub mod tva;

pub use error::{Result, SemanticError};

use normcode_agent::AgentRegistry;
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{InferenceEntry, SemanticWI, WorkingInterpretation};
use normcode_paradigm::ParadigmRegistry;
use normcode_perception::PerceptionRouter;
use std::time::Duration;

/// Constructor-injected dependencies a semantic sequence needs — the
/// registries resolved once at Orchestrator construction (§4.9), plus the
/// retry policy (§7 *external-tool-error*, *timeout*).
pub struct SemanticContext<'a> {
    pub agents: &'a AgentRegistry,
    pub paradigms: &'a ParadigmRegistry,
    pub perception: &'a PerceptionRouter,
    pub retry_budget: u32,
    pub sequence_timeout: Duration,
}

impl<'a> SemanticContext<'a> {
    pub fn new(agents: &'a AgentRegistry, paradigms: &'a ParadigmRegistry, perception: &'a PerceptionRouter) -> Self {
        Self { agents, paradigms, perception, retry_budget: 3, sequence_timeout: Duration::from_secs(60) }
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_sequence_timeout(mut self, timeout: Duration) -> Self {
        self.sequence_timeout = timeout;
        self
    }
}

/// Dispatches one imperative or judgement inference per its
/// `working_interpretation`. Every other `WorkingInterpretation` variant
/// belongs to `normcode-sequences`.
pub async fn run(entry: &InferenceEntry, ctx: &SemanticContext<'_>, blackboard: &mut Blackboard) -> Result<()> {
    match &entry.working_interpretation {
        WorkingInterpretation::Imperative(wi) => run_pipeline(entry, wi, false, ctx, blackboard).await,
        WorkingInterpretation::Judgement(wi) => run_pipeline(entry, wi, true, ctx, blackboard).await,
        _ => Err(SemanticError::PlanValidity(
            "syntactic sequences are dispatched through normcode-sequences, not normcode-semantic".to_string(),
        )),
    }
}

/// One attempt through MVP→TVA→(TIA). Re-run in full on every retry, since
/// a flaky tool may succeed on a later attempt with the same arguments.
async fn attempt(
    entry: &InferenceEntry,
    wi: &SemanticWI,
    is_judgement: bool,
    resolved: &[(String, normcode_reference::Reference)],
    functions_ref: &normcode_reference::Reference,
    ctx: &SemanticContext<'_>,
) -> Result<(normcode_reference::Reference, Vec<tva::ElementFailure>)> {
    let values_ref = mvp::assemble(&wi.value_order, resolved, &wi.value_selectors, ctx.perception)?;
    let actuation = tva::actuate(functions_ref, &values_ref)?;

    if !is_judgement {
        return Ok((actuation.reference, actuation.failures));
    }
    let condition = wi.assertion_condition.as_ref().ok_or_else(|| {
        SemanticError::PlanValidity("judgement sequence is missing its assertion_condition".to_string())
    })?;
    let verdict = tia::assert_truth(&actuation.reference, condition)?;
    Ok((verdict, actuation.failures))
}

async fn run_pipeline(entry: &InferenceEntry, wi: &SemanticWI, is_judgement: bool, ctx: &SemanticContext<'_>, blackboard: &mut Blackboard) -> Result<()> {
    // IR
    let resolved = ir::retrieve(entry, blackboard)?;

    // MFP — resolved once; a failed external call in TVA is retried, but a
    // missing agent or paradigm is a plan error, not a flaky one.
    let functions_ref = tokio::time::timeout(ctx.sequence_timeout, mfp::resolve(entry, &wi.paradigm, ctx.agents, ctx.paradigms, ctx.perception))
        .await
        .map_err(|_| SemanticError::Timeout)??;
    let functions_ref = normcode_reference::Reference::singleton(normcode_reference::Element::Callable(functions_ref));

    // MVP→TVA→(TIA), retried as one unit per §7 *external-tool-error*.
    let mut last_failures: Vec<tva::ElementFailure> = Vec::new();
    let mut outcome = None;
    for remaining in (0..=ctx.retry_budget).rev() {
        let result = tokio::time::timeout(ctx.sequence_timeout, attempt(entry, wi, is_judgement, &resolved, &functions_ref, ctx))
            .await
            .map_err(|_| SemanticError::Timeout)??;
        if result.1.is_empty() {
            outcome = Some(result.0);
            break;
        }
        last_failures = result.1;
        if remaining > 0 {
            let attempt_index = ctx.retry_budget - remaining;
            tokio::time::sleep(backoff(attempt_index)).await;
        }
    }

    let final_reference = match outcome {
        Some(r) => r,
        None => {
            blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Failed);
            blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::Failed);
            return Err(SemanticError::ActuationFailed {
                concept: entry.concept_to_infer.clone(),
                failures: last_failures.into_iter().map(|f| f.detail).collect(),
            });
        }
    };

    // OR
    let stored = output::build(&final_reference, &entry.concept_to_infer, wi.create_axis_on_list_output)?;
    output::store(blackboard, &entry.concept_to_infer, stored);

    // OWI
    blackboard.set_status(Target::Inference(entry.flow_index.clone()), Status::Completed);
    blackboard.set_status(Target::Concept(entry.concept_to_infer.clone()), Status::Completed);
    Ok(())
}

fn backoff(attempt_index: u32) -> Duration {
    Duration::from_millis(100u64.saturating_mul(1u64 << attempt_index.min(10)))
}
