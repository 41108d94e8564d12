//! Argument parsing and command dispatch for `normcode` (§6 "CLI surface").
//!
//! Four subcommands: `run` loads a plan and drives it to completion;
//! `resume` reconciles a checkpoint against a (possibly changed) plan and
//! continues; `fork` branches a run's history at a given cycle; `list-runs`
//! reports what's in a checkpoint database.

use clap::{Parser, Subcommand};
use normcode_agent::{Agent, AgentRegistry, Body, UnconfiguredTool};
use normcode_blackboard::Blackboard;
use normcode_checkpoint::{environment_signature, CheckpointError, ReconciliationMode, Store, StoreSink};
use normcode_model::{apply_inputs, ConceptRecord, ConceptRepo, InferenceRecord, InferenceRepo, InputsFile};
use normcode_orchestrator::{LogLevel, Orchestrator, OrchestratorError, StderrLogger};
use normcode_paradigm::ParadigmRegistry;
use normcode_perception::{InMemoryStore, NativeVfs, PerceptionRouter};
use normcode_semantic::SemanticError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "normcode")]
#[command(about = "Runs, resumes, forks, and inspects NormCode plan executions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a plan and run it to completion (or deadlock/cycle-limit).
    Run {
        /// Concept repository file (JSON array of concept records).
        #[arg(long)]
        concepts: PathBuf,
        /// Inference repository file (JSON array of inference records).
        #[arg(long)]
        inferences: PathBuf,
        /// Inputs file (JSON map of ground-concept name to data/axes).
        #[arg(long)]
        inputs: Option<PathBuf>,
        /// Checkpoint database path. `NORMCODE_DB_PATH` if unset.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Run id to register this run under. Generated if unset.
        #[arg(long)]
        run_id: Option<String>,
        /// Paradigm registry directory. `NORMCODE_PARADIGM_DIR` if unset.
        #[arg(long)]
        paradigm_dir: Option<PathBuf>,
        /// Cycle ceiling. `NORMCODE_MAX_CYCLES` if unset, else 1000.
        #[arg(long)]
        max_cycles: Option<u32>,
        /// External-tool retry budget. `NORMCODE_RETRY_BUDGET` if unset, else 3.
        #[arg(long)]
        retry_budget: Option<u32>,
        /// Minimum log level (off|error|warn|info|debug). `NORMCODE_LOG` if unset, else info.
        #[arg(long)]
        log: Option<String>,
    },

    /// Reconcile a checkpointed run against its plan and continue.
    Resume {
        #[arg(long)]
        concepts: PathBuf,
        #[arg(long)]
        inferences: PathBuf,
        #[arg(long)]
        inputs: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
        /// Run to resume. Defaults to the most recently created run.
        #[arg(long)]
        run_id: Option<String>,
        /// Snapshot cycle to resume from. Defaults to the latest snapshot.
        #[arg(long)]
        cycle: Option<u32>,
        /// Reconciliation mode: patch (default), overwrite, or fill-gaps.
        #[arg(long, default_value = "patch")]
        mode: String,
        #[arg(long)]
        paradigm_dir: Option<PathBuf>,
        #[arg(long)]
        max_cycles: Option<u32>,
        #[arg(long)]
        retry_budget: Option<u32>,
        #[arg(long)]
        log: Option<String>,
    },

    /// Branch a run's history at a given cycle into a new, independent run.
    Fork {
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long = "from-run")]
        from_run: String,
        /// Cycle to fork from. Defaults to the source run's latest snapshot.
        #[arg(long)]
        cycle: Option<u32>,
    },

    /// List every run registered in a checkpoint database.
    ListRuns {
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Debug)]
enum CliError {
    Io { path: PathBuf, detail: String },
    Parse { path: PathBuf, detail: String },
    Model(normcode_model::ModelError),
    Paradigm(normcode_paradigm::ParadigmError),
    Checkpoint(CheckpointError),
    Orchestrator(OrchestratorError),
    BadMode(String),
    NoRuns,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, detail } => write!(f, "{}: {}", path.display(), detail),
            CliError::Parse { path, detail } => write!(f, "{}: {}", path.display(), detail),
            CliError::Model(e) => write!(f, "{}", e),
            CliError::Paradigm(e) => write!(f, "{}", e),
            CliError::Checkpoint(e) => write!(f, "{}", e),
            CliError::Orchestrator(e) => write!(f, "{}", e),
            CliError::BadMode(m) => write!(f, "unknown reconciliation mode '{}' (expected patch, overwrite, or fill-gaps)", m),
            CliError::NoRuns => write!(f, "checkpoint database has no runs"),
        }
    }
}

impl From<normcode_model::ModelError> for CliError {
    fn from(e: normcode_model::ModelError) -> Self {
        CliError::Model(e)
    }
}

impl From<normcode_paradigm::ParadigmError> for CliError {
    fn from(e: normcode_paradigm::ParadigmError) -> Self {
        CliError::Paradigm(e)
    }
}

impl From<CheckpointError> for CliError {
    fn from(e: CheckpointError) -> Self {
        CliError::Checkpoint(e)
    }
}

impl From<OrchestratorError> for CliError {
    fn from(e: OrchestratorError) -> Self {
        CliError::Orchestrator(e)
    }
}

/// Maps a terminal error to the process exit code in §6/§7. Successful
/// runs return 0 from `run_cli` directly and never reach this function.
fn exit_code(err: &CliError) -> i32 {
    match err {
        CliError::Io { .. } | CliError::Parse { .. } | CliError::Model(_) => 2,
        CliError::Paradigm(_) => 2,
        CliError::BadMode(_) | CliError::NoRuns => 2,
        CliError::Checkpoint(CheckpointError::ReconciliationRefused { .. }) => 5,
        CliError::Checkpoint(_) => 3,
        CliError::Orchestrator(OrchestratorError::Semantic(SemanticError::ActuationFailed { .. })) => 4,
        CliError::Orchestrator(OrchestratorError::Semantic(SemanticError::Timeout)) => 4,
        CliError::Orchestrator(_) => 3,
    }
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Io { path: path.to_path_buf(), detail: e.to_string() })?;
    serde_json::from_str(&text).map_err(|e| CliError::Parse { path: path.to_path_buf(), detail: e.to_string() })
}

fn read_inputs(path: &Path) -> Result<InputsFile, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Io { path: path.to_path_buf(), detail: e.to_string() })?;
    serde_json::from_str(&text).map_err(|e| CliError::Parse { path: path.to_path_buf(), detail: e.to_string() })
}

fn env_or(flag: Option<String>, var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(var).ok())
}

fn resolve_log_level(flag: Option<String>) -> LogLevel {
    env_or(flag, "NORMCODE_LOG").and_then(|raw| LogLevel::parse(&raw)).unwrap_or(LogLevel::Info)
}

fn resolve_max_cycles(flag: Option<u32>) -> u32 {
    flag.or_else(|| std::env::var("NORMCODE_MAX_CYCLES").ok().and_then(|v| v.parse().ok())).unwrap_or(1000)
}

fn resolve_retry_budget(flag: Option<u32>) -> u32 {
    flag.or_else(|| std::env::var("NORMCODE_RETRY_BUDGET").ok().and_then(|v| v.parse().ok())).unwrap_or(3)
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("NORMCODE_DB_PATH").ok().map(PathBuf::from)).unwrap_or_else(|| PathBuf::from("normcode.db"))
}

fn resolve_paradigm_dir(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| std::env::var("NORMCODE_PARADIGM_DIR").ok().map(PathBuf::from))
}

/// Every tool kind `Body` expects a slot for (§4.5); unconfigured here
/// since tool credentials are delegated entirely to the Body's own tools
/// and this binary never parses them (§6 "Environment variables").
fn default_body() -> Body {
    let mut body = Body::new();
    for name in ["llm", "file_system", "script_executor", "user_input", "prompt_tool", "perception_router"] {
        body.register(name, Arc::new(UnconfiguredTool::new(name)));
    }
    body
}

fn default_agents() -> AgentRegistry {
    let mut agents = AgentRegistry::new();
    agents.set_default(Agent::new("<default>", default_body()));
    agents
}

fn load_paradigms(dir: Option<&Path>) -> Result<ParadigmRegistry, CliError> {
    match dir {
        Some(dir) => Ok(ParadigmRegistry::load_dir(dir)?),
        None => Ok(ParadigmRegistry::new()),
    }
}

fn generate_run_id() -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("run-{}", nanos)
}

fn build_orchestrator(paradigms: ParadigmRegistry, max_cycles: u32, retry_budget: u32, log_level: LogLevel) -> Orchestrator {
    let perception = PerceptionRouter::with_defaults(Arc::new(NativeVfs::new(std::env::current_dir().unwrap_or_default())), Arc::new(InMemoryStore::new()));
    Orchestrator::new(default_agents(), paradigms, perception, max_cycles)
        .with_retry_budget(retry_budget)
        .with_logger(Box::new(StderrLogger::new(log_level)))
}

async fn cmd_run(
    concepts_path: PathBuf,
    inferences_path: PathBuf,
    inputs_path: Option<PathBuf>,
    db: Option<PathBuf>,
    run_id: Option<String>,
    paradigm_dir: Option<PathBuf>,
    max_cycles: Option<u32>,
    retry_budget: Option<u32>,
    log: Option<String>,
) -> Result<(), CliError> {
    let concept_records: Vec<ConceptRecord> = read_json_array(&concepts_path)?;
    let inference_records: Vec<InferenceRecord> = read_json_array(&inferences_path)?;
    let mut concepts = ConceptRepo::load(concept_records)?;
    let repo = InferenceRepo::load(inference_records)?;
    if let Some(inputs_path) = &inputs_path {
        apply_inputs(&mut concepts, read_inputs(inputs_path)?)?;
    }

    let log_level = resolve_log_level(log);
    let max_cycles = resolve_max_cycles(max_cycles);
    let retry_budget = resolve_retry_budget(retry_budget);
    let paradigm_dir = resolve_paradigm_dir(paradigm_dir);
    let paradigms = load_paradigms(paradigm_dir.as_deref())?;

    let store = Store::open(resolve_db_path(db))?;
    let run_id = run_id.unwrap_or_else(generate_run_id);
    let signature = environment_signature(&paradigms, default_agents().resolve("<default>").map(|a| &a.body).expect("default agent set"));
    store.create_run(&run_id, None, None, &signature)?;

    let orchestrator = build_orchestrator(paradigms, max_cycles, retry_budget, log_level);
    let mut blackboard = Blackboard::new();
    orchestrator.seed(&concepts, &mut blackboard);

    let mut sink = StoreSink::new(&store, run_id.clone(), &repo);
    let report = orchestrator.run(&concepts, &repo, &mut blackboard, Some(&mut sink)).await?;
    println!("run '{}' complete after {} cycle(s)", run_id, report.cycles_run);
    Ok(())
}

async fn cmd_resume(
    concepts_path: PathBuf,
    inferences_path: PathBuf,
    inputs_path: Option<PathBuf>,
    db: Option<PathBuf>,
    run_id: Option<String>,
    cycle: Option<u32>,
    mode: String,
    paradigm_dir: Option<PathBuf>,
    max_cycles: Option<u32>,
    retry_budget: Option<u32>,
    log: Option<String>,
) -> Result<(), CliError> {
    let mode = ReconciliationMode::parse(&mode).ok_or_else(|| CliError::BadMode(mode.clone()))?;

    let store = Store::open(resolve_db_path(db))?;
    let run_id = match run_id {
        Some(id) => id,
        None => store.list_runs()?.into_iter().max_by_key(|r| r.created_at).map(|r| r.run_id).ok_or(CliError::NoRuns)?,
    };

    let concept_records: Vec<ConceptRecord> = read_json_array(&concepts_path)?;
    let inference_records: Vec<InferenceRecord> = read_json_array(&inferences_path)?;
    let mut concepts = ConceptRepo::load(concept_records)?;
    let repo = InferenceRepo::load(inference_records)?;
    if let Some(inputs_path) = &inputs_path {
        apply_inputs(&mut concepts, read_inputs(inputs_path)?)?;
    }

    let paradigm_dir = resolve_paradigm_dir(paradigm_dir);
    let paradigms = load_paradigms(paradigm_dir.as_deref())?;
    let agents = default_agents();
    let body = &agents.resolve("<default>").expect("default agent set").body;

    let (snapshot_cycle, snapshot) = store.load_snapshot(&run_id, cycle)?;

    let mut blackboard = match mode {
        ReconciliationMode::Patch => {
            let mut bb = normcode_checkpoint::patch(&repo, &snapshot)?;
            // Re-seed any ground concepts the plan added since the
            // snapshot was taken; PATCH's diff only covers inferences
            // already present at snapshot time.
            seed_missing(&mut bb, &concepts);
            bb
        }
        ReconciliationMode::Overwrite => {
            let info = store.run_info(&run_id)?;
            normcode_checkpoint::overwrite(&snapshot, &info.environment_signature, &paradigms, body)?
        }
        ReconciliationMode::FillGaps => {
            let mut bb = Blackboard::new();
            let orchestrator_seed = build_orchestrator(ParadigmRegistry::new(), 0, 0, LogLevel::Off);
            orchestrator_seed.seed(&concepts, &mut bb);
            normcode_checkpoint::fill_gaps(&concepts, &repo, &mut bb, &snapshot)?;
            bb
        }
    };

    let log_level = resolve_log_level(log);
    let max_cycles = resolve_max_cycles(max_cycles);
    let retry_budget = resolve_retry_budget(retry_budget);
    let orchestrator = build_orchestrator(paradigms, max_cycles, retry_budget, log_level);

    let mut sink = StoreSink::new(&store, run_id.clone(), &repo);
    let report = orchestrator.run_from(snapshot_cycle + 1, &concepts, &repo, &mut blackboard, Some(&mut sink)).await?;
    println!("run '{}' resumed from cycle {}, complete after {} cycle(s)", run_id, snapshot_cycle, report.cycles_run);
    Ok(())
}

/// Seeds ground concepts the live blackboard doesn't yet have a reference
/// for, without disturbing anything `patch`/`fill_gaps` already restored.
fn seed_missing(blackboard: &mut Blackboard, concepts: &ConceptRepo) {
    for name in concepts.names() {
        if blackboard.get_reference(name).is_none() {
            if let Some(reference) = concepts.get_reference(name) {
                blackboard.set_reference(name, reference.clone());
                blackboard.set_status(normcode_blackboard::Target::Concept(name.to_string()), normcode_blackboard::Status::Completed);
            }
        }
    }
}

fn cmd_fork(db: Option<PathBuf>, from_run: String, cycle: Option<u32>) -> Result<(), CliError> {
    let store = Store::open(resolve_db_path(db))?;
    let cycle = match cycle {
        Some(c) => c,
        None => store.load_snapshot(&from_run, None)?.0,
    };
    let new_run_id = store.fork(&from_run, cycle)?;
    println!("forked '{}' at cycle {} into '{}'", from_run, cycle, new_run_id);
    Ok(())
}

fn cmd_list_runs(db: Option<PathBuf>) -> Result<(), CliError> {
    let store = Store::open(resolve_db_path(db))?;
    for run in store.list_runs()? {
        println!(
            "{}\tparent={}\tparent_cycle={}\tcreated_at={}",
            run.run_id,
            run.parent_run_id.as_deref().unwrap_or("-"),
            run.parent_cycle.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            run.created_at
        );
    }
    Ok(())
}

/// Parses arguments, dispatches the subcommand, and returns the process
/// exit code (§6, §7). A clap parse failure exits with code 1 before this
/// function is ever reached — `Cli::parse()` itself calls `process::exit`.
pub fn run_cli() -> i32 {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("normcode: failed to start async runtime: {}", e);
            return 3;
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Run { concepts, inferences, inputs, db, run_id, paradigm_dir, max_cycles, retry_budget, log } => {
                cmd_run(concepts, inferences, inputs, db, run_id, paradigm_dir, max_cycles, retry_budget, log).await
            }
            Commands::Resume { concepts, inferences, inputs, db, run_id, cycle, mode, paradigm_dir, max_cycles, retry_budget, log } => {
                cmd_resume(concepts, inferences, inputs, db, run_id, cycle, mode, paradigm_dir, max_cycles, retry_budget, log).await
            }
            Commands::Fork { db, from_run, cycle } => cmd_fork(db, from_run, cycle),
            Commands::ListRuns { db } => cmd_list_runs(db),
        }
    });

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("normcode: {}", e);
            exit_code(&e)
        }
    }
}
