use std::collections::HashSet;
use std::fmt;

use plaid_ir::{Combination, Dimension};

use crate::filter::{self, FilterError, FilterExpr};
use crate::strategy::{Exhaustive, Strategy};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("dimension at position {position} has no name")]
    UnnamedDimension { position: usize },

    #[error("dimension '{0}' is defined more than once")]
    DuplicateDimension(String),

    #[error("invalid filter on value {value} of dimension '{dimension}': {source}")]
    Filter {
        dimension: String,
        value: usize,
        #[source]
        source: FilterError,
    },
}

/// Callback consulted after value filters: receives the candidate and
/// whether the filters accepted it, returns the final verdict.
pub type FilteringHook = Box<dyn FnMut(&Combination, bool) -> bool>;

/// Produces combinations of dimension values one at a time.
///
/// The engine never materializes the combination space: the strategy walks
/// value-index tuples lazily and the engine turns each accepted tuple into a
/// [`Combination`]. Two engines built from the same dimensions and strategy
/// yield the same sequence.
pub struct CombinatorialEngine {
    dimensions: Vec<Dimension>,
    filters: Vec<Vec<Option<FilterExpr>>>,
    strategy: Box<dyn Strategy>,
    filtering: Option<FilteringHook>,
    current: Option<Vec<usize>>,
    yielded: u64,
}

impl CombinatorialEngine {
    /// Engine over the full cross-product of `dimensions`.
    pub fn from_dimensions(dimensions: Vec<Dimension>) -> Result<Self, EngineError> {
        Self::with_strategy(dimensions, Box::new(Exhaustive::new()))
    }

    pub fn with_strategy(
        dimensions: Vec<Dimension>,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        for (position, d) in dimensions.iter().enumerate() {
            if d.name().trim().is_empty() {
                return Err(EngineError::UnnamedDimension { position });
            }
            if !seen.insert(d.name()) {
                return Err(EngineError::DuplicateDimension(d.name().to_string()));
            }
        }

        let names: Vec<&str> = dimensions.iter().map(Dimension::name).collect();
        let filters = dimensions
            .iter()
            .map(|d| {
                d.filters()
                    .iter()
                    .enumerate()
                    .map(|(value, f)| {
                        f.as_deref()
                            .map(|f| filter::compile(f, &names))
                            .transpose()
                            .map_err(|source| EngineError::Filter {
                                dimension: d.name().to_string(),
                                value,
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dimensions,
            filters,
            strategy,
            filtering: None,
            current: None,
            yielded: 0,
        })
    }

    /// Install a callback that can veto (or rescue) combinations after the
    /// value filters ran.
    pub fn set_filtering_hook(&mut self, hook: FilteringHook) {
        self.filtering = Some(hook);
    }

    /// Advance to the next combination and write it into `combination`.
    ///
    /// Returns false once the space is exhausted. With no dimensions, or a
    /// dimension without values, there is nothing to yield.
    pub fn next(&mut self, combination: &mut Combination) -> bool {
        if self.dimensions.is_empty() || self.dimensions.iter().any(Dimension::is_empty) {
            return false;
        }

        let radices: Vec<usize> = self.dimensions.iter().map(Dimension::len).collect();
        let dimensions = &self.dimensions;
        let filters = &self.filters;
        let filtering = &mut self.filtering;
        let mut accept = |indexes: &[usize]| {
            let mut acceptable = indexes
                .iter()
                .zip(filters)
                .all(|(&i, slots)| slots[i].as_ref().map_or(true, |f| f.eval(indexes)));
            if let Some(hook) = filtering.as_mut() {
                acceptable = hook(&populate(dimensions, indexes), acceptable);
            }
            if !acceptable {
                tracing::trace!(?indexes, "combination filtered out");
            }
            acceptable
        };

        match self.strategy.advance(&radices, &mut accept) {
            Some(indexes) => {
                *combination = populate(&self.dimensions, &indexes);
                self.current = Some(indexes);
                self.yielded += 1;
                true
            }
            None => false,
        }
    }

    /// Size of the full combination space: the product of every dimension's
    /// value count. Zero when there are no dimensions or one is empty.
    pub fn total_count(&self) -> u64 {
        if self.dimensions.is_empty() {
            return 0;
        }
        self.dimensions
            .iter()
            .fold(1u64, |acc, d| acc.saturating_mul(d.len() as u64))
    }

    /// Multi-line `Name: [value]` description of the current combination,
    /// `[none]` before the first call to [`next`](Self::next).
    pub fn describe_state(&self) -> String {
        let Some(indexes) = &self.current else {
            return "[none]".to_string();
        };
        let mut out = String::new();
        for (d, &i) in self.dimensions.iter().zip(indexes) {
            out.push_str(&format!("{}: [{}]\n", d.name(), d.values()[i]));
        }
        out
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of combinations yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }
}

impl fmt::Debug for CombinatorialEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinatorialEngine")
            .field("dimensions", &self.dimensions)
            .field("strategy", &self.strategy.name())
            .field("yielded", &self.yielded)
            .finish()
    }
}

fn populate(dimensions: &[Dimension], indexes: &[usize]) -> Combination {
    let mut combination = Combination::new();
    for (d, &i) in dimensions.iter().zip(indexes) {
        combination.insert(d.name(), d.values()[i].clone());
    }
    combination
}
