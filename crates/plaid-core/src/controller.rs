//! Test-case lifecycle.
//!
//! A [`Controller`] owns one [`CombinatorialTestCase`], builds an engine from
//! the dimensions it declares and drives it one combination at a time:
//! pull, let the test accept or reject, run, finalize. Each combination is a
//! future awaited on the current task, so the event loop keeps turning while
//! a combination waits on input or rendering.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use plaid_engine::{CombinatorialEngine, EngineError};
use plaid_ir::parse::ParseError;
use plaid_ir::{Combination, Dimension, DimensionError};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, HarnessConfig};
use crate::ledger::{CombinationResult, Ledger};
use crate::report::{self, FailureRecord, RunReport};
use crate::state::RunState;

/// Failures outside any single combination. These end the run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("test setup failed: {0}")]
    Setup(String),

    #[error("combination specification error: {0}")]
    Spec(#[from] ParseError),

    #[error("dimension error: {0}")]
    Dimension(#[from] DimensionError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("test teardown failed: {0}")]
    Teardown(String),
}

/// A verification failure inside one combination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CombinationFailure {
    pub message: String,
}

impl CombinationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// `Err` with `message` unless `condition` holds.
    pub fn verify(condition: bool, message: impl Into<String>) -> Result<(), Self> {
        if condition {
            Ok(())
        } else {
            Err(Self::new(message))
        }
    }
}

impl From<String> for CombinationFailure {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for CombinationFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// What a running combination can see and report.
#[derive(Debug)]
pub struct CombinationContext<'a> {
    index: u64,
    total: u64,
    combination: &'a Combination,
    failures: Vec<String>,
}

impl<'a> CombinationContext<'a> {
    pub fn new(index: u64, total: u64, combination: &'a Combination) -> Self {
        Self {
            index,
            total,
            combination,
            failures: Vec::new(),
        }
    }

    /// 1-based index of this combination.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Size of the full combination space.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn combination(&self) -> &'a Combination {
        self.combination
    }

    /// Record a failure and keep going. Any number of these fail the
    /// combination once.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(index = self.index, %message, "verification failed");
        self.failures.push(message);
    }

    pub fn has_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    fn into_failures(self) -> Vec<String> {
        self.failures
    }
}

/// Hooks a concrete combinatorial test implements.
#[allow(async_fn_in_trait)]
pub trait CombinatorialTestCase {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Dimensions spanning the combination space, asked for once per run.
    fn dimensions(&mut self) -> Result<Vec<Dimension>, HarnessError>;

    /// Take in a combination before it runs. Returning false skips it.
    fn read_combination(&mut self, _combination: &Combination) -> bool {
        true
    }

    async fn run_combination(
        &mut self,
        ctx: &mut CombinationContext<'_>,
    ) -> Result<(), CombinationFailure>;

    /// Called once after the last combination.
    fn test_case_finished(&mut self) -> Result<(), HarnessError> {
        Ok(())
    }
}

/// Receives each combination log line as it starts.
pub type ProgressDisplay = Box<dyn FnMut(&str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Drives one test case through its combination space.
pub struct Controller<T> {
    test: T,
    config: HarnessConfig,
    state: RunState,
    ledger: Ledger,
    failures: Vec<FailureRecord>,
    display: Option<ProgressDisplay>,
}

impl<T: CombinatorialTestCase> Controller<T> {
    pub fn new(test: T, config: HarnessConfig) -> Self {
        Self {
            test,
            config,
            state: RunState::new(),
            ledger: Ledger::new(),
            failures: Vec::new(),
            display: None,
        }
    }

    pub fn with_display(mut self, display: ProgressDisplay) -> Self {
        self.display = Some(display);
        self
    }

    pub fn test(&self) -> &T {
        &self.test
    }

    pub fn test_mut(&mut self) -> &mut T {
        &mut self.test
    }

    pub fn into_test(self) -> T {
        self.test
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Run every combination and report.
    ///
    /// Combination failures, including panics and timeouts, land in the
    /// report. Only setup and teardown failures come back as `Err`.
    pub async fn run(&mut self) -> Result<RunReport, HarnessError> {
        self.state.reset();
        self.ledger = Ledger::new();
        self.failures.clear();

        let test_name = self.test.name().to_string();
        info!(test = %test_name, strategy = ?self.config.strategy, "starting combinatorial test case");

        let dimensions = self.test.dimensions()?;
        let mut engine = CombinatorialEngine::with_strategy(dimensions, self.config.strategy.build())?;
        let total = engine.total_count();
        let mut combination = Combination::new();

        self.skip_leading(&mut engine, &mut combination);

        let mut stopped_at = None;
        while let Some(index) = self.pull_next(&mut engine, &mut combination) {
            if self.run_one(index, total, &combination).await == Flow::Stop {
                warn!(index, "stopping on first failure, later combinations are not enumerated");
                stopped_at = Some(index);
                break;
            }
        }

        self.state.finish();
        self.test.test_case_finished()?;

        let (passed, failed, skipped) = RunReport::tally(&self.ledger);
        let report = RunReport {
            test_name,
            strategy: engine.strategy_name().to_string(),
            total_combinations: total,
            yielded: engine.yielded(),
            passed,
            failed,
            skipped,
            stopped_at,
            elapsed_secs: self.state.elapsed().as_secs_f64(),
            ledger: self.ledger.clone(),
            failures: self.failures.clone(),
        };
        for line in report.summary_block().lines() {
            info!("{line}");
        }
        Ok(report)
    }

    fn skip_leading(&mut self, engine: &mut CombinatorialEngine, combination: &mut Combination) {
        for _ in 0..self.config.skip_count {
            if !engine.next(combination) {
                break;
            }
            let index = self.state.record_yield();
            info!(index, "skipping combination by configuration");
            self.ledger.push(CombinationResult::Skipped);
        }
    }

    /// Next combination the test accepts; rejected ones are recorded as
    /// skipped on the way.
    fn pull_next(
        &mut self,
        engine: &mut CombinatorialEngine,
        combination: &mut Combination,
    ) -> Option<u64> {
        loop {
            if !engine.next(combination) {
                return None;
            }
            let index = self.state.record_yield();
            if self.test.read_combination(combination) {
                return Some(index);
            }
            info!(index, "combination rejected by test, skipping");
            self.ledger.push(CombinationResult::Skipped);
        }
    }

    async fn run_one(&mut self, index: u64, total: u64, combination: &Combination) -> Flow {
        self.state.activate();
        let line = report::combination_log_line(index, total, self.state.elapsed(), combination);
        info!("{line}");
        if !self.config.hide_combination_log {
            if let Some(display) = self.display.as_mut() {
                display(&line);
            }
        }

        let limit = self.config.combination_timeout();
        let started = Instant::now();
        let mut ctx = CombinationContext::new(index, total, combination);
        let outcome = {
            let run = AssertUnwindSafe(self.test.run_combination(&mut ctx)).catch_unwind();
            match limit {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(outcome) => outcome,
                    Err(_) => Ok(Err(CombinationFailure::new(format!(
                        "timed out after {}s",
                        limit.as_secs()
                    )))),
                },
                None => run.await,
            }
        };

        let mut messages = ctx.into_failures();
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => messages.push(failure.message),
            Err(payload) => messages.push(format!("panicked: {}", panic_message(&*payload))),
        }
        for message in &messages {
            if self.state.mark_failed() {
                error!(index, %message, "combination failed");
            } else {
                debug!(index, %message, "further failure in combination");
            }
        }

        let result = self.state.finalize();
        self.ledger.push(result);
        info!(index, %result, elapsed_ms = started.elapsed().as_millis() as u64, "combination finished");

        if result != CombinationResult::Failed {
            return Flow::Continue;
        }
        self.failures.push(FailureRecord {
            index,
            combination: combination.to_string(),
            messages,
        });
        if self.config.stop_on_failure {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Log lines of every combination a run would reach, without running any.
/// Leading `skip_count` combinations are marked as skipped.
pub fn preview(
    dimensions: Vec<Dimension>,
    config: &HarnessConfig,
) -> Result<Vec<String>, HarnessError> {
    let mut engine = CombinatorialEngine::with_strategy(dimensions, config.strategy.build())?;
    let total = engine.total_count();
    let started = Instant::now();
    let mut combination = Combination::new();
    let mut lines = Vec::new();
    while engine.next(&mut combination) {
        let index = engine.yielded();
        let mut line = report::combination_log_line(index, total, started.elapsed(), &combination);
        if index <= config.skip_count {
            line.push_str("\n    (skipped)");
        }
        lines.push(line);
    }
    Ok(lines)
}
