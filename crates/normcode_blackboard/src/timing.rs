//! Timing flags a `@:'`/`@:!`/`@.` step writes onto its parent inference
//! (§4.7.3).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingFlags {
    pub timing_ready: bool,
    pub to_be_skipped: bool,
}
