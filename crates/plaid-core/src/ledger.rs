//! Per-combination outcomes and their range summary.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombinationResult {
    Skipped,
    Passed,
    Failed,
}

impl CombinationResult {
    /// Order of the summary lines.
    pub const SUMMARY_ORDER: [CombinationResult; 3] = [
        CombinationResult::Passed,
        CombinationResult::Skipped,
        CombinationResult::Failed,
    ];
}

impl fmt::Display for CombinationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CombinationResult::Skipped => "Skipped",
            CombinationResult::Passed => "Passed",
            CombinationResult::Failed => "Failed",
        })
    }
}

/// Append-only record of outcomes. Entry `i` belongs to combination `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    results: Vec<CombinationResult>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CombinationResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[CombinationResult] {
        &self.results
    }

    /// Outcome of the combination with the given 1-based index.
    pub fn get(&self, index: u64) -> Option<CombinationResult> {
        let slot = usize::try_from(index.checked_sub(1)?).ok()?;
        self.results.get(slot).copied()
    }

    pub fn count(&self, kind: CombinationResult) -> u64 {
        self.results.iter().filter(|&&r| r == kind).count() as u64
    }

    /// Maximal runs of `kind` as 1-based inclusive ranges.
    pub fn ranges(&self, kind: CombinationResult) -> Vec<RangeInclusive<u64>> {
        let mut out = Vec::new();
        let mut start: Option<u64> = None;
        for (i, &r) in self.results.iter().enumerate() {
            let index = i as u64 + 1;
            match (r == kind, start) {
                (true, None) => start = Some(index),
                (false, Some(s)) => {
                    out.push(s..=index - 1);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            out.push(s..=self.results.len() as u64);
        }
        out
    }

    /// One `Kind: ranges` line per kind present, in summary order.
    pub fn summary_lines(&self) -> Vec<String> {
        CombinationResult::SUMMARY_ORDER
            .iter()
            .filter_map(|&kind| {
                let ranges = self.ranges(kind);
                (!ranges.is_empty()).then(|| format!("{kind}: {}", format_ranges(&ranges)))
            })
            .collect()
    }
}

/// `1-5,7,10-12`; a single-index range prints the index alone.
pub fn format_ranges(ranges: &[RangeInclusive<u64>]) -> String {
    ranges
        .iter()
        .map(|r| {
            if r.start() == r.end() {
                r.start().to_string()
            } else {
                format!("{}-{}", r.start(), r.end())
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
