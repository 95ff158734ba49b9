//! Render data assembled at runtime.

use crate::error::{Result, TemplateError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// A JSON object passed to templates as their render context.
///
/// Any `Serialize` value can be rendered; `ViewData` exists for hosts that build
/// the context piece by piece, such as the command line.
///
/// # Examples
///
/// ```
/// use viewset::ViewData;
///
/// let data = ViewData::new()
///     .with("title", "Home")
///     .with("count", 3);
/// assert_eq!(data.get("title").and_then(|v| v.as_str()), Some("Home"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewData {
    values: Map<String, Value>,
}

impl ViewData {
    /// Creates empty render data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value` in place, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether no values have been set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Loads render data from a JSON file holding a single object.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidData`] if the file cannot be read, is not
    /// JSON, or its top-level value is not an object.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TemplateError::InvalidData(format!("{}: {e}", path.display())))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| TemplateError::InvalidData(format!("{}: {e}", path.display())))?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(TemplateError::InvalidData(format!(
                "{}: expected a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Applies a `key=value` assignment.
    ///
    /// The value is parsed as JSON when possible (`count=3`, `tags=["a"]`) and
    /// kept as a plain string otherwise (`title=Home`).
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidData`] if there is no `=` or the key is empty.
    pub fn set_assignment(&mut self, assignment: &str) -> Result<()> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| TemplateError::InvalidData(format!("expected key=value: {assignment}")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TemplateError::InvalidData(format!(
                "empty key in assignment: {assignment}"
            )));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.insert(key, value);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
