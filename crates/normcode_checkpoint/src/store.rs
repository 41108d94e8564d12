//! SQLite-backed persistence for runs and their snapshots (§4.10
//! "Checkpoint Store", §6 "Checkpoint database").
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE runs (
//!     run_id TEXT PRIMARY KEY,
//!     parent_run_id TEXT,
//!     parent_cycle INTEGER,
//!     created_at INTEGER NOT NULL,
//!     environment_signature TEXT NOT NULL
//! );
//! CREATE TABLE snapshots (
//!     run_id TEXT NOT NULL,
//!     cycle INTEGER NOT NULL,
//!     payload_blob BLOB NOT NULL,
//!     PRIMARY KEY (run_id, cycle)
//! );
//! ```

use crate::error::{CheckpointError, Result};
use crate::snapshot::Snapshot;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub parent_run_id: Option<String>,
    pub parent_cycle: Option<u32>,
    pub created_at: i64,
    pub environment_signature: String,
}

pub struct Store {
    conn: Connection,
}

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                parent_run_id TEXT,
                parent_cycle INTEGER,
                created_at INTEGER NOT NULL,
                environment_signature TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS snapshots (
                run_id TEXT NOT NULL,
                cycle INTEGER NOT NULL,
                payload_blob BLOB NOT NULL,
                PRIMARY KEY (run_id, cycle)
            );",
        )?;
        Ok(Store { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE runs (
                run_id TEXT PRIMARY KEY,
                parent_run_id TEXT,
                parent_cycle INTEGER,
                created_at INTEGER NOT NULL,
                environment_signature TEXT NOT NULL
            );
            CREATE TABLE snapshots (
                run_id TEXT NOT NULL,
                cycle INTEGER NOT NULL,
                payload_blob BLOB NOT NULL,
                PRIMARY KEY (run_id, cycle)
            );",
        )?;
        Ok(Store { conn })
    }

    /// Registers a new run, fresh or forked. Idempotent for a given
    /// `run_id`: `resume` calls this on every invocation, not just the
    /// first.
    pub fn create_run(
        &self,
        run_id: &str,
        parent_run_id: Option<&str>,
        parent_cycle: Option<u32>,
        environment_signature: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO runs (run_id, parent_run_id, parent_cycle, created_at, environment_signature)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, parent_run_id, parent_cycle, now_unix(), environment_signature],
        )?;
        Ok(())
    }

    pub fn run_info(&self, run_id: &str) -> Result<RunInfo> {
        self.conn
            .query_row(
                "SELECT run_id, parent_run_id, parent_cycle, created_at, environment_signature
                 FROM runs WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(RunInfo {
                        run_id: row.get(0)?,
                        parent_run_id: row.get(1)?,
                        parent_cycle: row.get::<_, Option<i64>>(2)?.map(|c| c as u32),
                        created_at: row.get(3)?,
                        environment_signature: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| CheckpointError::RunNotFound { run_id: run_id.to_string() })
    }

    pub fn list_runs(&self) -> Result<Vec<RunInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, parent_run_id, parent_cycle, created_at, environment_signature
             FROM runs ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RunInfo {
                run_id: row.get(0)?,
                parent_run_id: row.get(1)?,
                parent_cycle: row.get::<_, Option<i64>>(2)?.map(|c| c as u32),
                created_at: row.get(3)?,
                environment_signature: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(CheckpointError::from)
    }

    /// §4.9 "...and calls `save_snapshot(current_cycle)`". Overwrites any
    /// existing snapshot at the same `(run_id, cycle)`, which only happens
    /// if a cycle is re-checkpointed after a crash recovery replay.
    pub fn save_snapshot(&self, run_id: &str, cycle: u32, snapshot: &Snapshot) -> Result<()> {
        let payload = serde_json::to_vec(snapshot)?;
        self.conn.execute(
            "INSERT INTO snapshots (run_id, cycle, payload_blob) VALUES (?1, ?2, ?3)
             ON CONFLICT(run_id, cycle) DO UPDATE SET payload_blob = excluded.payload_blob",
            params![run_id, cycle, payload],
        )?;
        Ok(())
    }

    /// Loads the snapshot at `cycle`, or the latest one if `cycle` is
    /// `None` (§6 `resume` with no explicit `--cycle`).
    pub fn load_snapshot(&self, run_id: &str, cycle: Option<u32>) -> Result<(u32, Snapshot)> {
        let row: Option<(u32, Vec<u8>)> = match cycle {
            Some(cycle) => self
                .conn
                .query_row(
                    "SELECT cycle, payload_blob FROM snapshots WHERE run_id = ?1 AND cycle = ?2",
                    params![run_id, cycle],
                    |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT cycle, payload_blob FROM snapshots WHERE run_id = ?1 ORDER BY cycle DESC LIMIT 1",
                    params![run_id],
                    |row| Ok((row.get::<_, i64>(0)? as u32, row.get(1)?)),
                )
                .optional()?,
        };
        let (cycle, payload) = row.ok_or_else(|| CheckpointError::SnapshotNotFound { run_id: run_id.to_string(), cycle })?;
        let snapshot: Snapshot = serde_json::from_slice(&payload)?;
        Ok((cycle, snapshot))
    }

    /// §4.10 `fork(source_run_id, source_cycle)`: registers a new run whose
    /// `parent_run_id`/`parent_cycle` point at the source, and copies the
    /// source's snapshot row forward under the new `run_id` at the same
    /// cycle, so the forked run can `resume` immediately without first
    /// replaying the parent.
    pub fn fork(&self, source_run_id: &str, source_cycle: u32) -> Result<String> {
        let source = self.run_info(source_run_id)?;
        let (cycle, snapshot) = self.load_snapshot(source_run_id, Some(source_cycle))?;
        let new_run_id = format!("{}-fork-{}", source_run_id, now_unix_nanos());
        self.create_run(&new_run_id, Some(source_run_id), Some(cycle), &source.environment_signature)?;
        self.save_snapshot(&new_run_id, cycle, &snapshot)?;
        Ok(new_run_id)
    }
}

fn now_unix_nanos() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0)
}
