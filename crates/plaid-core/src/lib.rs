//! Lifecycle controller, result ledger and reporting for combinatorial
//! test cases.

pub mod config;
pub mod controller;
pub mod ledger;
pub mod logging;
pub mod report;
pub mod state;

pub use config::{Arguments, ConfigError, HarnessConfig};
pub use controller::{
    CombinationContext, CombinationFailure, CombinatorialTestCase, Controller, HarnessError,
};
pub use ledger::{CombinationResult, Ledger};
pub use report::{FailureRecord, RunReport};
pub use state::{RunPhase, RunState};
