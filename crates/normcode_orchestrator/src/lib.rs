//! The Orchestrator (§4.9): the dependency-driven cycle scheduler that
//! walks an `InferenceRepo` in flow-index order, executes every entry
//! whose dependencies are satisfied, and repeats until every inference
//! reaches a terminal status, a cycle makes no progress (deadlock), or
//! `max_cycles` is exceeded.
//!
//! Each cycle is one pass over `repo.iterate_sorted()`. A `Pending` entry
//! runs once `Ready(entry)` holds; a `Looping` entry is reconsidered on
//! every cycle while `InProgress`, since its own state machine (not
//! `Ready`) decides whether this cycle advances it. Within a cycle, ready
//! entries are currently dispatched sequentially in flow-index order —
//! see `run_cycle`'s doc comment for why real intra-cycle parallelism is
//! deferred, and DESIGN.md for the write-conflict check that stands in
//! for it.

mod checkpoint_sink;
mod error;
mod loop_step;
mod logger;
mod ready;
mod skip;

pub use checkpoint_sink::CheckpointSink;
pub use error::{BlockedInference, OrchestratorError, Result};
pub use logger::{LogLevel, Logger, StderrLogger};

use normcode_agent::AgentRegistry;
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{ConceptRepo, InferenceEntry, InferenceRepo, WorkingInterpretation};
use normcode_paradigm::ParadigmRegistry;
use normcode_perception::PerceptionRouter;
use normcode_semantic::{SemanticContext, SemanticError};
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub cycles_run: u32,
}

pub struct Orchestrator {
    agents: AgentRegistry,
    paradigms: ParadigmRegistry,
    perception: PerceptionRouter,
    max_cycles: u32,
    retry_budget: u32,
    sequence_timeout: Duration,
    logger: Box<dyn Logger>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(agents: AgentRegistry, paradigms: ParadigmRegistry, perception: PerceptionRouter, max_cycles: u32) -> Self {
        Orchestrator {
            agents,
            paradigms,
            perception,
            max_cycles,
            retry_budget: 3,
            sequence_timeout: Duration::from_secs(60),
            logger: Box::new(StderrLogger::default()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_sequence_timeout(mut self, timeout: Duration) -> Self {
        self.sequence_timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// A clone of the cooperative cancellation flag; setting it from
    /// another thread (e.g. a Ctrl-C handler) halts the run between
    /// entries with `OrchestratorError::Cancelled`.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Seeds the Blackboard from a loaded `ConceptRepo`'s ground and
    /// otherwise-pre-populated references (§3 "Ground concepts are
    /// populated at load"): the Blackboard, not the `ConceptRepo`, is the
    /// live store every sequence reads and writes during a run.
    pub fn seed(&self, concepts: &ConceptRepo, blackboard: &mut Blackboard) {
        for name in concepts.names() {
            if let Some(reference) = concepts.get_reference(name) {
                blackboard.set_reference(name, reference.clone());
                blackboard.set_status(Target::Concept(name.to_string()), Status::Completed);
            }
        }
    }

    /// Runs cycles until completion, deadlock, or the cycle limit.
    /// `checkpoint`, if given, receives a snapshot after every cycle.
    pub async fn run(
        &self,
        concepts: &ConceptRepo,
        repo: &InferenceRepo,
        blackboard: &mut Blackboard,
        checkpoint: Option<&mut dyn CheckpointSink>,
    ) -> Result<RunReport> {
        self.run_from(0, concepts, repo, blackboard, checkpoint).await
    }

    /// Like `run`, but numbers cycles (and `max_cycles`) starting from
    /// `start_cycle` rather than 0 — the CLI's `resume` uses this so a
    /// resumed run's checkpoint cycle numbers continue the original run's
    /// rather than restarting, and so `max_cycles` bounds the run's total
    /// length rather than just the resumed tail.
    pub async fn run_from(
        &self,
        start_cycle: u32,
        concepts: &ConceptRepo,
        repo: &InferenceRepo,
        blackboard: &mut Blackboard,
        mut checkpoint: Option<&mut dyn CheckpointSink>,
    ) -> Result<RunReport> {
        let ctx = SemanticContext::new(&self.agents, &self.paradigms, &self.perception)
            .with_retry_budget(self.retry_budget)
            .with_sequence_timeout(self.sequence_timeout);

        let mut cycle: u32 = start_cycle;
        loop {
            if all_terminal(repo, blackboard) {
                self.logger.info(&format!("run complete after {} cycle(s)", cycle));
                return Ok(RunReport { cycles_run: cycle });
            }
            if cycle >= self.max_cycles {
                self.logger.error(&format!("cycle-limit-exceeded at {} cycle(s)", self.max_cycles));
                return Err(OrchestratorError::CycleLimitExceeded { max_cycles: self.max_cycles });
            }
            if self.cancel.load(Ordering::SeqCst) {
                return Err(OrchestratorError::Cancelled);
            }

            let progress = self.run_cycle(cycle, concepts, repo, &ctx, blackboard).await?;

            if let Some(sink) = checkpoint.as_deref_mut() {
                if let Err(detail) = sink.save_snapshot(cycle, concepts, blackboard) {
                    self.logger.warn(&format!("checkpoint save failed at cycle {}: {}", cycle, detail));
                }
            }

            cycle += 1;
            if !progress {
                let blocked = blocked_report(repo, blackboard);
                self.logger.error(&format!("deadlock-detected after cycle {}", cycle));
                return Err(OrchestratorError::Deadlock { cycle, blocked });
            }
        }
    }

    /// One pass over the waitlist. Ready entries run sequentially, in
    /// flow-index order, even though SPEC_FULL's concurrency model allows
    /// entries with disjoint `concept_to_infer` targets to dispatch onto
    /// bounded tokio tasks: `normcode_semantic::run` takes `&mut
    /// Blackboard` for the whole pipeline duration (it reads at IR and
    /// writes at OWI under one continuous borrow), so truly parallel
    /// dispatch needs that crate's `run` split into a read-only prepare
    /// phase and a separate apply phase first. That split is out of scope
    /// for this pass (documented in DESIGN.md); the write-conflict check
    /// below still rejects plans that would race under a parallel
    /// scheduler, so tightening this loop later does not change behavior
    /// for any plan that runs cleanly today.
    async fn run_cycle(
        &self,
        cycle: u32,
        concepts: &ConceptRepo,
        repo: &InferenceRepo,
        ctx: &SemanticContext<'_>,
        blackboard: &mut Blackboard,
    ) -> Result<bool> {
        let mut progress = false;
        let mut batch_targets: FxHashSet<String> = FxHashSet::default();

        for entry in repo.iterate_sorted() {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(OrchestratorError::Cancelled);
            }

            let flow_index = entry.flow_index.clone();
            let status = blackboard.status(&Target::Inference(flow_index.clone()));
            let is_loop = matches!(entry.working_interpretation, WorkingInterpretation::Looping(_));

            if status.is_terminal() {
                continue;
            }
            if status == Status::InProgress && !is_loop {
                continue;
            }

            if status == Status::Pending {
                if let Some(flags) = blackboard.timing_flags(&flow_index) {
                    if flags.to_be_skipped {
                        skip::skip_subtree(self.logger.as_ref(), entry, repo, blackboard);
                        progress = true;
                        continue;
                    }
                }
                if !ready::is_ready(entry, blackboard) {
                    continue;
                }
            }

            if !is_loop && !batch_targets.insert(entry.concept_to_infer.clone()) {
                return Err(OrchestratorError::WriteConflict { concept_to_infer: entry.concept_to_infer.clone(), flow_index });
            }

            self.logger.debug(&format!("cycle {}: executing {}", cycle, flow_index));
            if self.execute_entry(entry, concepts, repo, ctx, blackboard).await? {
                progress = true;
            }
        }

        Ok(progress)
    }

    async fn execute_entry(
        &self,
        entry: &InferenceEntry,
        concepts: &ConceptRepo,
        repo: &InferenceRepo,
        ctx: &SemanticContext<'_>,
        blackboard: &mut Blackboard,
    ) -> Result<bool> {
        match &entry.working_interpretation {
            WorkingInterpretation::Looping(wi) => Ok(loop_step::drive(&entry.flow_index, wi, repo, blackboard)?),
            WorkingInterpretation::Imperative(_) | WorkingInterpretation::Judgement(_) => {
                match normcode_semantic::run(entry, ctx, blackboard).await {
                    Ok(()) => Ok(true),
                    Err(e @ (SemanticError::ActuationFailed { .. } | SemanticError::Timeout)) => {
                        let is_final = concepts.concept(&entry.concept_to_infer).map(|c| c.is_final).unwrap_or(false);
                        if is_final {
                            Err(OrchestratorError::Semantic(e))
                        } else {
                            self.logger.warn(&format!(
                                "inference {} failed on non-final concept '{}': {} (other branches may still complete)",
                                entry.flow_index, entry.concept_to_infer, e
                            ));
                            Ok(true)
                        }
                    }
                    Err(e) => Err(OrchestratorError::Semantic(e)),
                }
            }
            _ => {
                normcode_sequences::run(entry, repo, blackboard)?;
                Ok(true)
            }
        }
    }
}

fn all_terminal(repo: &InferenceRepo, blackboard: &Blackboard) -> bool {
    repo.iterate_sorted().all(|e| blackboard.status(&Target::Inference(e.flow_index.clone())).is_terminal())
}

fn blocked_report(repo: &InferenceRepo, blackboard: &Blackboard) -> Vec<BlockedInference> {
    repo.iterate_sorted()
        .filter(|e| !blackboard.status(&Target::Inference(e.flow_index.clone())).is_terminal())
        .map(|e| {
            let mut unmet = Vec::new();
            for child in &e.supporting_children {
                if !blackboard.is_inference_ready(child) {
                    unmet.push(format!("inference {}", child));
                }
            }
            if !blackboard.is_concept_ready(&e.function_concept) {
                unmet.push(e.function_concept.clone());
            }
            for value in &e.value_concepts {
                if !blackboard.is_concept_ready(value) {
                    unmet.push(value.clone());
                }
            }
            BlockedInference { flow_index: e.flow_index.clone(), unmet }
        })
        .collect()
}
