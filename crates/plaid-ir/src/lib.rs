pub mod parse;
pub mod types;

pub use types::{Combination, Dimension, DimensionError, Value};
