//! Data context bound to a render.
//!
//! A [`Context`] is a flat map of names to JSON values. Every name becomes a
//! `$variable` inside the executing template; nested data is reached through
//! member access (`$user.name`) and indexing (`$items[0]`).

use serde::Serialize;
use serde_json::{Map, Value};

/// Flat name → value mapping visible to an executing template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value that converts directly into JSON.
    ///
    /// ```rust
    /// use vellum::core::Context;
    ///
    /// let mut ctx = Context::new();
    /// ctx.insert("name", "Amy");
    /// ctx.insert("count", 3);
    /// assert_eq!(ctx.len(), 2);
    /// ```
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert any serializable value.
    pub fn insert_serialized<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Build a context from a JSON object. Any other JSON value is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self {
                values,
            }),
            _ => None,
        }
    }

    /// Parse a context from a JSON object literal.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
            .ok_or_else(|| anyhow::anyhow!("Template data must be a JSON object"))
    }

    /// Look up a value by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no names are bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another context into this one; entries in `other` win.
    pub fn extend(&mut self, other: Context) {
        self.values.extend(other.values);
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Consume the context into its underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values,
        }
    }
}
