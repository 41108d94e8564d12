//! Errors raised while resolving or running a paradigm (§4.6, §7).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParadigmError {
    /// The registry has no spec file under this `paradigm_id`.
    NotFound { paradigm_id: String },
    /// A `v_setup` step's tool was missing or its setup invocation failed.
    SetupFailed { detail: String },
    /// An `h_plan` step referenced a tool not present on the Agent's Body.
    UnknownTool { tool: String },
    /// Loading the paradigm directory failed (bad JSON, I/O error).
    RegistryLoad { detail: String },
}

impl fmt::Display for ParadigmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParadigmError::NotFound { paradigm_id } => write!(f, "paradigm-not-found: '{}'", paradigm_id),
            ParadigmError::SetupFailed { detail } => write!(f, "paradigm vertical setup failed: {}", detail),
            ParadigmError::UnknownTool { tool } => write!(f, "paradigm step references unknown tool '{}'", tool),
            ParadigmError::RegistryLoad { detail } => write!(f, "failed to load paradigm registry: {}", detail),
        }
    }
}

impl std::error::Error for ParadigmError {}

pub type Result<T> = std::result::Result<T, ParadigmError>;
