//! Lazily decoded tool-call arguments.

use serde_json::{Map, Value};

use crate::error::{MurmurError, Result};

/// Decoded arguments for one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolArguments(Value);

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Decode a raw argument payload as sent by the backend.
    ///
    /// An empty payload decodes to an empty object (several backends emit
    /// nothing at all for zero-argument calls).
    pub fn from_raw(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self(Value::Object(Map::new())));
        }
        let object: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Self(Value::Object(object)))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Deserialize the whole argument object into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.0.clone())?)
    }

    /// Required string argument.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(key, "string"))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Required integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.0
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| missing(key, "integer"))
    }

    /// Required number argument.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.0
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| missing(key, "number"))
    }

    /// Required boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.0
            .get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| missing(key, "boolean"))
    }
}

fn missing(key: &str, kind: &str) -> MurmurError {
    MurmurError::ToolExecution {
        tool_name: String::new(),
        message: format!("missing or invalid {kind} argument '{key}'"),
    }
}
