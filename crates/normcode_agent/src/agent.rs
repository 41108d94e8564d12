//! Agent: a Body plus an AgentFrame, bound to the Subject concept naming it
//! (§4.5). Inferences execute in the context of the Agent named by their
//! enclosing Subject; different inferences within one plan may use
//! different Agents.

use crate::body::Body;

/// How an Agent selects sequence variants and interprets a paradigm
/// specification. Currently exactly one variant exists (§4.5): the enum is
/// written to admit future variants without changing callers that match on
/// it exhaustively today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretationMode {
    Composition,
}

#[derive(Debug, Clone)]
pub struct AgentFrame {
    pub mode: InterpretationMode,
}

impl Default for AgentFrame {
    fn default() -> Self {
        AgentFrame { mode: InterpretationMode::Composition }
    }
}

#[derive(Clone)]
pub struct Agent {
    /// The Subject concept name denoting this agent.
    pub subject: String,
    pub body: Body,
    pub frame: AgentFrame,
}

impl Agent {
    pub fn new(subject: impl Into<String>, body: Body) -> Self {
        Agent { subject: subject.into(), body, frame: AgentFrame::default() }
    }
}

/// Looks up the Agent bound to an inference's enclosing Subject. Plans may
/// bind different Agents to different Subjects; a single default Agent
/// satisfies most loaded plans that name only one.
#[derive(Default)]
pub struct AgentRegistry {
    agents: rustc_hash::FxHashMap<String, Agent>,
    default: Option<Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&mut self, agent: Agent) {
        self.default = Some(agent);
    }

    pub fn register(&mut self, subject: impl Into<String>, agent: Agent) {
        self.agents.insert(subject.into(), agent);
    }

    pub fn resolve(&self, subject: &str) -> Option<&Agent> {
        self.agents.get(subject).or(self.default.as_ref())
    }

    /// Every registered Agent, including the default if set, for the
    /// Orchestrator's environment signature (§4.10 OVERWRITE mismatch
    /// check).
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values().chain(self.default.as_ref())
    }
}
