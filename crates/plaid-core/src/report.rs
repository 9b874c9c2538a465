//! Combination log lines and the end-of-run report.

use std::time::Duration;

use plaid_ir::Combination;
use serde::Serialize;

use crate::ledger::{CombinationResult, Ledger};

pub const SUMMARY_START: &str = "===== Combination summary =====";
pub const SUMMARY_END: &str = "===== End of combination summary =====";

/// `hh:mm:ss.mmm`; hours keep counting past 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    let secs = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        millis % 1000
    )
}

/// Header line plus one `Name  : value` line per dimension, names padded to
/// the widest one.
pub fn combination_log_line(
    index: u64,
    total: u64,
    elapsed: Duration,
    combination: &Combination,
) -> String {
    let mut out = format!(
        "Combination {index} of {total} [elapsed {}]",
        format_elapsed(elapsed)
    );
    let width = combination.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, value) in combination.iter() {
        out.push_str(&format!("\n    {name:<width$} : {value}"));
    }
    out
}

/// Evidence for one failed combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    /// 1-based index of the failed combination.
    pub index: u64,
    /// `Name=value, ...` of the failed combination.
    pub combination: String,
    /// Every failure reported while the combination ran, in order.
    pub messages: Vec<String>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Name of the test case that ran.
    pub test_name: String,
    /// Enumeration strategy (`exhaustive` or `pairwise`).
    pub strategy: String,
    /// Size of the full combination space.
    pub total_combinations: u64,
    /// Combinations pulled from the engine, skipped ones included.
    pub yielded: u64,
    /// Combinations that ran without failure.
    pub passed: u64,
    /// Combinations that failed, timed out or panicked.
    pub failed: u64,
    /// Combinations skipped by configuration or rejected by the test.
    pub skipped: u64,
    /// Index of the failed combination the run stopped at. Nothing after it
    /// was enumerated.
    pub stopped_at: Option<u64>,
    /// Wall-clock duration of the run in seconds.
    pub elapsed_secs: f64,
    /// Outcome per yielded combination, in index order.
    pub ledger: Ledger,
    /// Evidence for each failed combination.
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Marks the unenumerated tail after a stop on failure.
    pub fn not_run_line(&self) -> Option<String> {
        self.stopped_at.map(|index| format!("NotRun: after {index}"))
    }

    pub fn summary_block(&self) -> String {
        let mut lines = vec![SUMMARY_START.to_string()];
        lines.extend(self.ledger.summary_lines());
        lines.extend(self.not_run_line());
        lines.push(SUMMARY_END.to_string());
        lines.push(format!(
            "Passed: {}, Failed: {}, Skipped: {}",
            self.passed, self.failed, self.skipped
        ));
        lines.push(if self.is_success() {
            format!("Test case '{}' passed", self.test_name)
        } else if let Some(index) = self.stopped_at {
            format!(
                "Test case '{}' failed: stopped at combination {index} of {}",
                self.test_name, self.total_combinations
            )
        } else {
            format!(
                "Test case '{}' failed: {} of {} combinations failed",
                self.test_name, self.failed, self.yielded
            )
        });
        lines.join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn tally(ledger: &Ledger) -> (u64, u64, u64) {
        (
            ledger.count(CombinationResult::Passed),
            ledger.count(CombinationResult::Failed),
            ledger.count(CombinationResult::Skipped),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CombinationResult::*;

    fn report(results: &[CombinationResult], stopped_at: Option<u64>) -> RunReport {
        let mut ledger = Ledger::new();
        for &r in results {
            ledger.push(r);
        }
        let (passed, failed, skipped) = RunReport::tally(&ledger);
        RunReport {
            test_name: "Wrapping".to_string(),
            strategy: "exhaustive".to_string(),
            total_combinations: 10,
            yielded: ledger.len() as u64,
            passed,
            failed,
            skipped,
            stopped_at,
            elapsed_secs: 0.5,
            ledger,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "00:00:00.000");
        assert_eq!(format_elapsed(Duration::from_millis(3_723_045)), "01:02:03.045");
        assert_eq!(format_elapsed(Duration::from_secs(90_000)), "25:00:00.000");
    }

    #[test]
    fn test_combination_log_line_pads_names() {
        let mut c = Combination::new();
        c.insert("Wrap", true);
        c.insert("FontSize", 12);
        let line = combination_log_line(3, 8, Duration::from_millis(1500), &c);
        assert_eq!(
            line,
            "Combination 3 of 8 [elapsed 00:00:01.500]\n    Wrap     : true\n    FontSize : 12"
        );
    }

    #[test]
    fn test_summary_block_passing_run() {
        let block = report(&[Skipped, Passed, Passed], None).summary_block();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                SUMMARY_START,
                "Passed: 2-3",
                "Skipped: 1",
                SUMMARY_END,
                "Passed: 2, Failed: 0, Skipped: 1",
                "Test case 'Wrapping' passed",
            ]
        );
    }

    #[test]
    fn test_summary_block_marks_stop() {
        let r = report(&[Passed, Failed], Some(2));
        assert_eq!(r.not_run_line().as_deref(), Some("NotRun: after 2"));
        let block = r.summary_block();
        assert!(block.contains("Failed: 2\nNotRun: after 2\n"));
        assert!(block.ends_with("stopped at combination 2 of 10"));
        assert_eq!(report(&[Passed], None).not_run_line(), None);
    }

    #[test]
    fn test_report_json() {
        let json = report(&[Passed], None).to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["test_name"], "Wrapping");
        assert_eq!(v["ledger"], serde_json::json!(["Passed"]));
        assert!(v["stopped_at"].is_null());
    }
}
