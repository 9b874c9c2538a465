use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::ledger::CombinationResult;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    /// No combination is running: before the first, between two, or while
    /// rejected ones are pulled.
    #[default]
    Idle,
    /// A combination has started and is not finalized yet.
    CombinationActive,
    /// The last combination is done; nothing more will run.
    Finished,
}

/// Counters and flags of one run, owned by its controller.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Combinations finalized as passed.
    pub pass_count: u64,
    /// Combinations finalized as failed.
    pub fail_count: u64,
    /// 1-based index of the latest yielded combination, skipped ones included.
    pub combination_index: u64,
    /// When the run started.
    pub started: Instant,
    /// The active combination already failed; later failures do not count.
    pub has_combination_failed: bool,
    /// Current lifecycle phase.
    pub phase: RunPhase,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            pass_count: 0,
            fail_count: 0,
            combination_index: 0,
            started: Instant::now(),
            has_combination_failed: false,
            phase: RunPhase::Idle,
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a fresh run; restarts the clock.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// A combination is running.
    pub fn is_active(&self) -> bool {
        self.phase == RunPhase::CombinationActive
    }

    /// Count a combination pulled from the engine and return its index.
    pub fn record_yield(&mut self) -> u64 {
        self.combination_index += 1;
        self.combination_index
    }

    pub fn activate(&mut self) {
        self.has_combination_failed = false;
        self.phase = RunPhase::CombinationActive;
    }

    /// Flag the active combination as failed. Returns true the first time.
    pub fn mark_failed(&mut self) -> bool {
        !std::mem::replace(&mut self.has_combination_failed, true)
    }

    /// Close the active combination and count its outcome.
    pub fn finalize(&mut self) -> CombinationResult {
        self.phase = RunPhase::Idle;
        if self.has_combination_failed {
            self.fail_count += 1;
            CombinationResult::Failed
        } else {
            self.pass_count += 1;
            CombinationResult::Passed
        }
    }

    pub fn finish(&mut self) {
        self.phase = RunPhase::Finished;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_count_once_per_combination() {
        let mut state = RunState::new();
        assert_eq!(state.record_yield(), 1);
        state.activate();
        assert!(state.mark_failed());
        assert!(!state.mark_failed());
        assert_eq!(state.finalize(), CombinationResult::Failed);
        assert_eq!(state.fail_count, 1);

        assert_eq!(state.record_yield(), 2);
        state.activate();
        assert!(!state.has_combination_failed);
        assert_eq!(state.finalize(), CombinationResult::Passed);
        assert_eq!(state.pass_count, 1);
    }

    #[test]
    fn test_phases() {
        let mut state = RunState::new();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(!state.is_active());

        state.activate();
        assert_eq!(state.phase, RunPhase::CombinationActive);
        assert!(state.is_active());

        state.finalize();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(!state.is_active());

        state.finish();
        assert_eq!(state.phase, RunPhase::Finished);

        state.reset();
        assert_eq!(state.phase, RunPhase::Idle);
        assert_eq!(state.combination_index, 0);
    }
}
