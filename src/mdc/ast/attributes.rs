//! Ordered attribute storage shared by containers, spans, and sections.
//!
//! Attribute order matters twice: authors expect `preserveOrder` output to
//! match what they wrote, and the serializer needs a stable sorted order
//! otherwise. A plain `HashMap` gives neither, so entries live in an
//! insertion-ordered vector and the emission order is picked at render time.

use serde::{Deserialize, Serialize};

/// A single attribute value.
///
/// MDC attribute payloads are strings at the syntax level; booleans come from
/// the `{flag}` shorthand and structured values from JSON-valued bound
/// attributes or programmatically built trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Shorthand boolean (`{flag}` parses to `true`).
    Bool(bool),
    /// Literal string value, the common case.
    String(String),
    /// Structured value carried as JSON.
    Json(serde_json::Value),
}

impl AttrValue {
    /// String form used when rendering the value into an attribute block.
    pub fn display_string(&self) -> String {
        match self {
            AttrValue::Bool(value) => value.to_string(),
            AttrValue::String(value) => value.clone(),
            AttrValue::Json(value) => value.to_string(),
        }
    }

    /// Returns the literal string when this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// Insertion-ordered `key -> AttrValue` map.
///
/// Inserting an existing key replaces the value in place, keeping the
/// original position so round-trips do not reshuffle authored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts or replaces a value, preserving the position of existing keys.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries sorted by key, for the default (non-preserving) emission order.
    pub fn sorted(&self) -> Vec<(&str, &AttrValue)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    /// Moves every entry of `other` into this map, replacing duplicates.
    pub fn extend_from(&mut self, other: AttributeMap) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }
}
