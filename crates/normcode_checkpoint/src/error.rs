//! Errors raised while saving, loading, or reconciling checkpoints (§4.10,
//! §7 *reconciliation-refused*).

use std::fmt;

#[derive(Debug)]
pub enum CheckpointError {
    Sqlite(String),
    Serde(String),
    Model(String),
    RunNotFound { run_id: String },
    SnapshotNotFound { run_id: String, cycle: Option<u32> },
    /// OVERWRITE mode with a mismatched environment signature (§4.10,
    /// CLI exit code 5).
    ReconciliationRefused { detail: String },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Sqlite(detail) => write!(f, "checkpoint store error: {}", detail),
            CheckpointError::Serde(detail) => write!(f, "checkpoint payload (de)serialization failed: {}", detail),
            CheckpointError::Model(detail) => write!(f, "checkpoint payload rebuild failed: {}", detail),
            CheckpointError::RunNotFound { run_id } => write!(f, "no run '{}' in checkpoint store", run_id),
            CheckpointError::SnapshotNotFound { run_id, cycle: Some(cycle) } => {
                write!(f, "no snapshot at cycle {} for run '{}'", cycle, run_id)
            }
            CheckpointError::SnapshotNotFound { run_id, cycle: None } => write!(f, "run '{}' has no snapshots", run_id),
            CheckpointError::ReconciliationRefused { detail } => write!(f, "reconciliation-refused: {}", detail),
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<rusqlite::Error> for CheckpointError {
    fn from(e: rusqlite::Error) -> Self {
        CheckpointError::Sqlite(e.to_string())
    }
}

impl From<serde_json::Error> for CheckpointError {
    fn from(e: serde_json::Error) -> Self {
        CheckpointError::Serde(e.to_string())
    }
}

impl From<normcode_model::ModelError> for CheckpointError {
    fn from(e: normcode_model::ModelError) -> Self {
        CheckpointError::Model(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
