//! Lazy enumeration of combinations over named value dimensions.

pub mod engine;
pub mod filter;
pub mod strategy;

pub use engine::{CombinatorialEngine, EngineError, FilteringHook};
pub use strategy::{Exhaustive, Pairwise, Strategy, StrategyKind};
