//! JSON combination specifications.
//!
//! A specification is either a single block:
//!
//! ```json
//! { "dimensions": [ { "name": "Wrap", "values": [true, false] } ] }
//! ```
//!
//! or an object keyed by test name whose entries are such blocks. A value may
//! be a bare literal or `{ "value": ..., "filter": "..." }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Dimension, DimensionError, Value};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no combinations defined for test '{0}'")]
    TestNotFound(String),

    #[error("document holds per-test blocks ({available}); select one by test name")]
    TestNameRequired { available: String },

    #[error("invalid dimension: {0}")]
    Dimension(#[from] DimensionError),
}

/// A value entry as written in a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Filtered {
        value: Value,
        #[serde(default)]
        filter: Option<String>,
    },
    Plain(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionSpec {
    pub name: String,
    #[serde(default)]
    pub values: Vec<ValueSpec>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombinationSpec {
    pub dimensions: Vec<DimensionSpec>,
}

impl CombinationSpec {
    pub fn into_dimensions(self) -> Result<Vec<Dimension>, ParseError> {
        self.dimensions
            .into_iter()
            .map(|d| {
                let (values, filters) = d
                    .values
                    .into_iter()
                    .map(|v| match v {
                        ValueSpec::Filtered { value, filter } => (value, filter),
                        ValueSpec::Plain(value) => (value, None),
                    })
                    .unzip();
                Ok(Dimension::with_filters(d.name, values, filters)?)
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpecDocument {
    Single(CombinationSpec),
    PerTest(BTreeMap<String, CombinationSpec>),
}

/// Parse a single-block specification. A per-test document is rejected
/// since it needs a test name to pick a block.
pub fn parse_spec(json: &str) -> Result<CombinationSpec, ParseError> {
    match serde_json::from_str::<SpecDocument>(json)? {
        SpecDocument::Single(spec) => Ok(spec),
        SpecDocument::PerTest(tests) => Err(ParseError::TestNameRequired {
            available: tests.into_keys().collect::<Vec<_>>().join(", "),
        }),
    }
}

/// Parse a specification and select the block for `test_name`.
///
/// A single-block document applies to every test.
pub fn parse_spec_for_test(json: &str, test_name: &str) -> Result<CombinationSpec, ParseError> {
    match serde_json::from_str::<SpecDocument>(json)? {
        SpecDocument::Single(spec) => Ok(spec),
        SpecDocument::PerTest(mut tests) => tests
            .remove(test_name)
            .ok_or_else(|| ParseError::TestNotFound(test_name.to_string())),
    }
}
