//! Integration test suite for the NormCode runtime core.
//!
//! This crate exists only to run integration tests from the `tests/`
//! directory. All actual test code lives in `tests/*.rs` files.
//!
//! # Test organization
//!
//! | File | Scenario |
//! |------|----------|
//! | `scenario_specification_fallback` | `$.` falls back to the first completed candidate |
//! | `scenario_timing_skip_propagation` | a gated subtree completes `completed_skipped` |
//! | `scenario_loop_with_carry` | a loop accumulates per-iteration output and carries state forward |
//! | `scenario_base10_addition` | a digit-pair loop with carry realizes multi-digit addition |
//! | `scenario_nested_loop` | an inner loop restarts fresh each outer iteration while the outer carries an accumulator |
//! | `scenario_for_each_mask_propagation` | a `FOR_EACH` judgement's mask is consumed by a downstream `@:'`, skip-filling the non-matching position in place |
//! | `scenario_deadlock_detection` | a failed producer leaves its consumer permanently blocked |
//! | `scenario_resume_patch_after_change` | PATCH resume resets only the changed inference and its dependents |
//! | `boundary_properties` | snapshot round-trip, PATCH idempotence, fork independence |
