use std::collections::BTreeSet;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of greedy candidates built per pairwise combination.
const PAIRWISE_CANDIDATES: usize = 8;

/// Decides which value-index tuples the engine visits, and in what order.
///
/// `radices[d]` is the number of values on dimension `d` (never zero; the
/// engine short-circuits empty spaces). `accept` applies the engine's
/// filters; a strategy must only return tuples it accepted.
pub trait Strategy {
    fn advance(
        &mut self,
        radices: &[usize],
        accept: &mut dyn FnMut(&[usize]) -> bool,
    ) -> Option<Vec<usize>>;

    /// Name of this strategy (for logs and reports).
    fn name(&self) -> &str;
}

/// Which strategy to build, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Exhaustive,
    Pairwise {
        seed: u64,
    },
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Exhaustive => Box::new(Exhaustive::new()),
            StrategyKind::Pairwise { seed } => Box::new(Pairwise::new(seed)),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    /// Parses `exhaustive` or `pairwise`; the pairwise seed defaults to 42
    /// and is set separately.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exhaustive" | "all" => Ok(StrategyKind::Exhaustive),
            "pairwise" | "allpairs" => Ok(StrategyKind::Pairwise { seed: 42 }),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// Full cross-product in odometer order: the first dimension varies fastest.
#[derive(Debug, Default)]
pub struct Exhaustive {
    indexes: Vec<usize>,
    started: bool,
    done: bool,
}

impl Exhaustive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the odometer; false once every position has wrapped.
    fn increment(&mut self, radices: &[usize]) -> bool {
        for (index, radix) in self.indexes.iter_mut().zip(radices) {
            *index += 1;
            if *index < *radix {
                return true;
            }
            *index = 0;
        }
        false
    }
}

impl Strategy for Exhaustive {
    fn advance(
        &mut self,
        radices: &[usize],
        accept: &mut dyn FnMut(&[usize]) -> bool,
    ) -> Option<Vec<usize>> {
        if self.done || radices.is_empty() || radices.contains(&0) {
            self.done = true;
            return None;
        }

        loop {
            if self.started {
                if !self.increment(radices) {
                    self.done = true;
                    return None;
                }
            } else {
                self.indexes = vec![0; radices.len()];
                self.started = true;
            }

            if accept(&self.indexes) {
                return Some(self.indexes.clone());
            }
        }
    }

    fn name(&self) -> &str {
        "exhaustive"
    }
}

/// (dimension, value, dimension, value) with the first dimension lower.
type Pair = (usize, usize, usize, usize);

/// Greedy all-pairs covering subset.
///
/// Each yielded combination covers at least one value pair not covered
/// before, so enumeration terminates. Pairs that no acceptable combination
/// can contain are dropped. The seed makes tie-breaking reproducible.
pub struct Pairwise {
    rng: ChaCha8Rng,
    uncovered: BTreeSet<Pair>,
    single: Option<Exhaustive>,
    initialized: bool,
}

impl Pairwise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            uncovered: BTreeSet::new(),
            single: None,
            initialized: false,
        }
    }

    fn initialize(&mut self, radices: &[usize]) {
        self.initialized = true;
        if radices.len() < 2 {
            // No pairs to cover; every value once is the whole space.
            self.single = Some(Exhaustive::new());
            return;
        }
        for d1 in 0..radices.len() {
            for d2 in (d1 + 1)..radices.len() {
                for v1 in 0..radices[d1] {
                    for v2 in 0..radices[d2] {
                        self.uncovered.insert((d1, v1, d2, v2));
                    }
                }
            }
        }
    }

    fn new_pairs(&self, candidate: &[usize]) -> usize {
        let mut count = 0;
        for d1 in 0..candidate.len() {
            for d2 in (d1 + 1)..candidate.len() {
                if self
                    .uncovered
                    .contains(&(d1, candidate[d1], d2, candidate[d2]))
                {
                    count += 1;
                }
            }
        }
        count
    }

    /// Fix the seed pair, then fill the other dimensions in shuffled order,
    /// each with the value covering the most uncovered pairs so far.
    fn build_candidate(&mut self, radices: &[usize], seed_pair: Pair) -> Vec<usize> {
        let (d1, v1, d2, v2) = seed_pair;
        let mut candidate: Vec<Option<usize>> = vec![None; radices.len()];
        candidate[d1] = Some(v1);
        candidate[d2] = Some(v2);

        let mut order: Vec<usize> = (0..radices.len()).filter(|&d| d != d1 && d != d2).collect();
        order.shuffle(&mut self.rng);

        for d in order {
            let mut best_gain = 0;
            let mut best_values = Vec::new();
            for v in 0..radices[d] {
                let gain = candidate
                    .iter()
                    .enumerate()
                    .filter_map(|(other, value)| value.map(|value| (other, value)))
                    .filter(|&(other, value)| {
                        let pair = if other < d {
                            (other, value, d, v)
                        } else {
                            (d, v, other, value)
                        };
                        self.uncovered.contains(&pair)
                    })
                    .count();
                if gain > best_gain || best_values.is_empty() {
                    if gain > best_gain {
                        best_values.clear();
                    }
                    best_gain = gain;
                    best_values.push(v);
                } else if gain == best_gain {
                    best_values.push(v);
                }
            }
            let pick = best_values[self.rng.gen_range(0..best_values.len())];
            candidate[d] = Some(pick);
        }

        candidate.into_iter().map(|v| v.unwrap_or(0)).collect()
    }

    /// Scan every completion of the seed pair for one the filters accept.
    fn search_completion(
        radices: &[usize],
        seed_pair: Pair,
        accept: &mut dyn FnMut(&[usize]) -> bool,
    ) -> Option<Vec<usize>> {
        let (d1, v1, d2, v2) = seed_pair;
        let free: Vec<usize> = (0..radices.len()).filter(|&d| d != d1 && d != d2).collect();
        let mut candidate = vec![0; radices.len()];
        candidate[d1] = v1;
        candidate[d2] = v2;

        loop {
            if accept(&candidate) {
                return Some(candidate);
            }
            let mut stepped = false;
            for &d in &free {
                candidate[d] += 1;
                if candidate[d] < radices[d] {
                    stepped = true;
                    break;
                }
                candidate[d] = 0;
            }
            if !stepped {
                return None;
            }
        }
    }

    fn cover(&mut self, candidate: &[usize]) {
        for d1 in 0..candidate.len() {
            for d2 in (d1 + 1)..candidate.len() {
                self.uncovered
                    .remove(&(d1, candidate[d1], d2, candidate[d2]));
            }
        }
    }
}

impl Strategy for Pairwise {
    fn advance(
        &mut self,
        radices: &[usize],
        accept: &mut dyn FnMut(&[usize]) -> bool,
    ) -> Option<Vec<usize>> {
        if radices.is_empty() || radices.contains(&0) {
            return None;
        }
        if !self.initialized {
            self.initialize(radices);
        }
        if let Some(single) = self.single.as_mut() {
            return single.advance(radices, accept);
        }

        while let Some(seed_pair) = self.uncovered.first().copied() {
            let mut best: Option<(Vec<usize>, usize)> = None;
            for _ in 0..PAIRWISE_CANDIDATES {
                let candidate = self.build_candidate(radices, seed_pair);
                let gain = self.new_pairs(&candidate);
                if best.as_ref().is_some_and(|(_, g)| *g >= gain) {
                    continue;
                }
                if accept(&candidate) {
                    best = Some((candidate, gain));
                }
            }

            let chosen = match best {
                Some((candidate, _)) => Some(candidate),
                None => Self::search_completion(radices, seed_pair, accept),
            };

            match chosen {
                Some(candidate) => {
                    self.cover(&candidate);
                    return Some(candidate);
                }
                None => {
                    tracing::debug!(?seed_pair, "pair cannot appear in any accepted combination");
                    self.uncovered.remove(&seed_pair);
                }
            }
        }

        None
    }

    fn name(&self) -> &str {
        "pairwise"
    }
}
