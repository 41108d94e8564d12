//! `normcode` — standalone binary entry point.
//!
//! # Exit codes
//!
//! - `0` success
//! - `1` argument-parse error (clap)
//! - `2` plan-validity error
//! - `3` runtime error (deadlock, cycle-limit, write-conflict)
//! - `4` external-tool error, retry budget exhausted
//! - `5` reconciliation-refused (OVERWRITE environment mismatch)

fn main() {
    std::process::exit(normcode_cli::run_cli());
}
