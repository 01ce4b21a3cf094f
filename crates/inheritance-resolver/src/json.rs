//! JSON documents and the default deep-merge policy
//!
//! Objects merge key by key, arrays from later documents are appended, and
//! any other value from a later document replaces the earlier one.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::resolver::{InheritanceResolver, Inheritable};

/// A named JSON object that may inherit from other documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    pub name: String,
    #[serde(default)]
    pub inherits: Vec<String>,
    /// Every other field of the document
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl JsonDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherits: Vec::new(),
            body: Map::new(),
        }
    }

    pub fn with_inherits(mut self, inherits: &[&str]) -> Self {
        self.inherits = inherits.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Inheritable for JsonDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn inherits(&self) -> &[String] {
        &self.inherits
    }
}

/// Merge `overlay` into `base`
pub fn merge_json(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => merge_object(base, overlay),
        (Value::Array(base), Value::Array(overlay)) => base.extend(overlay.iter().cloned()),
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Merge the fields of `overlay` into `base`
pub fn merge_object(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_json(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

impl InheritanceResolver<JsonDocument> {
    /// Deep-merge every document body, base documents first
    pub fn resolve_json(&self) -> Result<Map<String, Value>> {
        self.resolve(Map::new(), |mut acc, document| {
            merge_object(&mut acc, &document.body);
            Ok::<_, Infallible>(acc)
        })
    }
}

/// Parse, order and merge a set of JSON documents
pub fn resolve_documents(documents: Vec<JsonDocument>) -> Result<Map<String, Value>> {
    InheritanceResolver::new(documents)?.resolve_json()
}
