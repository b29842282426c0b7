use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// The capabilities the engine needs from a source record: a stable
/// identity and named textual fields. Where documents come from (database
/// rows, parsed feeds, files) is the caller's business.
pub trait Document {
    fn id(&self) -> &str;

    /// The textual value of a named field, if the document carries one.
    fn field(&self, name: &str) -> Option<&str>;
}

/// An owned document backed by a field map. This is the shape the CLI
/// ingests from JSON and the one tests use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build a record from a JSON object: `id` must be a non-empty string,
    /// every other string-valued member becomes a field. Non-string members
    /// are ignored, matching the indexer's textual-fields-only contract.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_document("expected a JSON object"))?;
        let id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if id.is_empty() {
            return Err(Error::invalid_document("missing or empty 'id'"));
        }
        let mut record = Record::new(id);
        for (name, member) in obj {
            if name == "id" {
                continue;
            }
            if let Some(text) = member.as_str() {
                record.fields.insert(name.clone(), text.to_string());
            }
        }
        Ok(record)
    }
}

impl Document for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
