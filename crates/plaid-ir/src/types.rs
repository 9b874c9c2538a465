use std::fmt;

use serde::{Deserialize, Serialize};

/// A single candidate value on a dimension axis.
///
/// Values are only inspected for display and for equality, so the set of
/// kinds is closed: anything a test wants to combine is expressed as one of
/// these (an enum-like choice is a `Text` label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Identifier form used in file names and log keys: empty text becomes
    /// `EMPTY_STRING`, spaces and backslashes become underscores.
    pub fn identifier(&self) -> String {
        match self {
            Value::Text(s) if s.is_empty() => "EMPTY_STRING".to_string(),
            other => other.to_string().replace([' ', '\\'], "_"),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DimensionError {
    #[error("dimension '{name}' has {values} values but {filters} filters")]
    FilterCountMismatch {
        name: String,
        values: usize,
        filters: usize,
    },
}

/// A named axis with an ordered list of candidate values.
///
/// Each value may carry a filter expression restricting the combinations
/// it takes part in. Dimensions do not change once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    values: Vec<Value>,
    filters: Vec<Option<String>>,
}

impl Dimension {
    pub fn new<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let filters = vec![None; values.len()];
        Self {
            name: name.into(),
            values,
            filters,
        }
    }

    /// Build a dimension whose values carry filter expressions, one slot per
    /// value (`None` for unfiltered values).
    pub fn with_filters(
        name: impl Into<String>,
        values: Vec<Value>,
        filters: Vec<Option<String>>,
    ) -> Result<Self, DimensionError> {
        let name = name.into();
        if values.len() != filters.len() {
            return Err(DimensionError::FilterCountMismatch {
                name,
                values: values.len(),
                filters: filters.len(),
            });
        }
        // Blank filters mean "no filter".
        let filters = filters
            .into_iter()
            .map(|f| f.filter(|s| !s.trim().is_empty()))
            .collect();
        Ok(Self {
            name,
            values,
            filters,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn filters(&self) -> &[Option<String>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One selected value per dimension, kept in dimension order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Combination {
    entries: Vec<(String, Value)>,
}

impl Combination {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set the value for a dimension, replacing any previous selection.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_normalization() {
        assert_eq!(Value::from("").identifier(), "EMPTY_STRING");
        assert_eq!(Value::from("a b\\c").identifier(), "a_b_c");
        assert_eq!(Value::Int(-3).identifier(), "-3");
        assert_eq!(Value::Float(2.5).identifier(), "2.5");
        assert_eq!(Value::Bool(true).identifier(), "true");
    }

    #[test]
    fn test_value_deserializes_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Bool(true),
                Value::Int(3),
                Value::Float(2.5),
                Value::Text("x".to_string())
            ]
        );
    }

    #[test]
    fn test_filter_count_mismatch() {
        let err = Dimension::with_filters("Wrap", vec![Value::Bool(true)], vec![]).unwrap_err();
        assert!(err.to_string().contains("Wrap"));
    }

    #[test]
    fn test_blank_filters_are_dropped() {
        let d = Dimension::with_filters(
            "Size",
            vec![Value::Int(1), Value::Int(2)],
            vec![Some("  ".to_string()), Some("Wrap==0".to_string())],
        )
        .unwrap();
        assert_eq!(d.filters()[0], None);
        assert_eq!(d.filters()[1].as_deref(), Some("Wrap==0"));
    }

    #[test]
    fn test_combination_insert_replaces_slot() {
        let mut c = Combination::new();
        c.insert("A", Value::Int(1));
        c.insert("B", Value::from("x"));
        c.insert("A", Value::Int(2));
        assert_eq!(c.len(), 2);
        assert_eq!(c.get_int("A"), Some(2));
        assert_eq!(c.get_text("B"), Some("x"));
        assert_eq!(c.to_string(), "A=2, B=x");
    }

    #[test]
    fn test_typed_getters_reject_other_kinds() {
        let mut c = Combination::new();
        c.insert("Flag", Value::Bool(false));
        assert_eq!(c.get_bool("Flag"), Some(false));
        assert_eq!(c.get_int("Flag"), None);
        assert_eq!(c.get_text("Missing"), None);
    }
}
