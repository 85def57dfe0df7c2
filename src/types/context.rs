//! Run-scoped key/value state threaded through a run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context variables: an open string-keyed mapping visible to dynamic
/// instructions and to tools that declare the dependency.
///
/// Writable only through tool-output merges; merging is last-writer-wins in
/// the order tool results are processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextVariables(Map<String, Value>);

impl ContextVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a value as a string slice, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merge `other` into `self`, overwriting existing keys.
    pub fn merge(&mut self, other: ContextVariables) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ContextVariables {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ContextVariables {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<ContextVariables> for Value {
    fn from(ctx: ContextVariables) -> Self {
        Value::Object(ctx.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_last_writer_wins() {
        let mut a = ContextVariables::new();
        a.insert("k", "old");
        a.insert("keep", 1);

        let mut b = ContextVariables::new();
        b.insert("k", "new");

        a.merge(b);
        assert_eq!(a.get_str("k"), Some("new"));
        assert_eq!(a.get("keep"), Some(&Value::from(1)));
    }
}
