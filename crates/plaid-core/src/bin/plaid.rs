//! Dry-run preview of a combination space.
//!
//! ```text
//! plaid <spec.json> [/Test=Name] [/Strategy=pairwise] [/Seed=N] [/SkipCount=N]
//! ```

use std::process::ExitCode;

use plaid_core::controller::preview;
use plaid_core::{logging, Arguments, HarnessConfig, HarnessError};
use plaid_ir::parse::{parse_spec, parse_spec_for_test};

const USAGE: &str =
    "usage: plaid <spec.json> [/Test=Name] [/Strategy=pairwise] [/Seed=N] [/SkipCount=N]";

fn main() -> ExitCode {
    logging::init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), HarnessError> {
    let args = Arguments::from_process();
    let Some(path) = args.positional().first() else {
        return Err(HarnessError::Setup(USAGE.to_string()));
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| HarnessError::Setup(format!("cannot read {path}: {e}")))?;
    let spec = match args.test_name() {
        Some(test) => parse_spec_for_test(&json, test)?,
        None => parse_spec(&json)?,
    };
    let config = HarnessConfig::from_arguments(&args)?;

    let lines = preview(spec.into_dimensions()?, &config)?;
    for line in &lines {
        println!("{line}");
    }
    println!("{} combinations", lines.len());
    Ok(())
}
