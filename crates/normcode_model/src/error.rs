//! The single error kind this crate raises: `plan-validity` (§7).
//!
//! Schema problems are collected rather than reported fail-fast, so a user
//! loading a malformed plan sees every problem in one pass.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    pub problems: Vec<String>,
}

impl ModelError {
    pub fn single(problem: impl Into<String>) -> Self {
        ModelError { problems: vec![problem.into()] }
    }

    pub fn from_problems(problems: Vec<String>) -> Option<Self> {
        if problems.is_empty() {
            None
        } else {
            Some(ModelError { problems })
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "plan-validity: {} problem(s) found", self.problems.len())?;
        for p in &self.problems {
            writeln!(f, "  - {}", p)?;
        }
        Ok(())
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
