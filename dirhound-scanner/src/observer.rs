use crate::error::ProbeFailure;
use crate::result::ProbeResult;
use std::fmt;

/// Lifecycle of a single scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Loading,
    Running,
    Draining,
    Completed,
    Cancelled,
}

impl ScanPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, ScanPhase::Completed | ScanPhase::Cancelled)
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Loading => "loading",
            ScanPhase::Running => "running",
            ScanPhase::Draining => "draining",
            ScanPhase::Completed => "completed",
            ScanPhase::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Side channel for live progress. Called from worker tasks, so
/// implementations must be cheap and must not block.
pub trait ScanObserver: Send + Sync {
    fn on_phase(&self, _phase: ScanPhase) {}

    /// A candidate is about to be sent.
    fn on_probe(&self, _url: &str) {}

    fn on_match(&self, _result: &ProbeResult) {}

    /// A candidate gave up after its last attempt.
    fn on_failure(&self, _url: &str, _failure: &ProbeFailure) {}
}

pub struct NoopObserver;

impl ScanObserver for NoopObserver {}
