//! Records: one logical row keyed by field name.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// An ordered mapping from field key to [`Value`].
///
/// Field order is insertion order. Drivers always populate every bound field
/// (missing source data becomes [`Value::Null`]), so a record carries the full
/// field set regardless of which columns are displayed.
///
/// ```
/// use datagrid_source::{Record, Value};
///
/// let record = Record::new()
///     .with("id", 1)
///     .with("first_name", "Ada");
///
/// assert_eq!(record.get("first_name"), Some(&Value::from("Ada")));
/// assert_eq!(record.value("missing"), &Value::Null);
/// assert_eq!(record.field_names().collect::<Vec<_>>(), ["id", "first_name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

static NULL: Value = Value::Null;

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field, replacing the value in place if the key already exists.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Returns the value of a field, if the record has it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Returns the value of a field, or `Null` when the field is missing.
    pub fn value(&self, field: &str) -> &Value {
        self.get(field).unwrap_or(&NULL)
    }

    /// Returns `true` if the record has the field.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Iterates field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reshapes the record to exactly `fields`, in that order.
    ///
    /// Fields not present become `Null`; fields not listed are dropped.
    pub fn project(&self, fields: &[String]) -> Record {
        Record {
            fields: fields
                .iter()
                .map(|field| (field.clone(), self.value(field).clone()))
                .collect(),
        }
    }

    /// Converts a JSON object into a record.
    ///
    /// Non-object values become a single `value` field.
    pub fn from_json(value: &serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => Record {
                fields: map
                    .iter()
                    .map(|(key, val)| (key.clone(), Value::from_json(val)))
                    .collect(),
            },
            other => Record::new().with("value", Value::from_json(other)),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
