//! In-memory array driver.

use serde::Serialize;

use crate::error::{Result, SourceError};
use crate::filter::{matches_all, Filter};
use crate::record::Record;
use crate::source::{slice_range, Capabilities, DataSource, FetchRequest};

const DRIVER: &str = "array";

/// Rows held in memory: records, JSON arrays, or any serializable collection.
///
/// Sorting and paging are emulated by the binding; the row count is known.
///
/// ```
/// use datagrid_source::{ArraySource, DataSource};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Person { id: u32, first_name: String }
///
/// let people = vec![
///     Person { id: 1, first_name: "Ada".into() },
///     Person { id: 2, first_name: "Grace".into() },
/// ];
///
/// let source = ArraySource::from_serialize(&people).unwrap();
/// assert_eq!(source.fields(), ["id", "first_name"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArraySource {
    fields: Vec<String>,
    rows: Vec<Record>,
}

impl ArraySource {
    /// Creates a source from records.
    ///
    /// The field set is the union of every record's fields, in order of first
    /// appearance; records lacking a field get `Null` for it.
    pub fn new(records: Vec<Record>) -> Self {
        let mut fields: Vec<String> = Vec::new();
        for record in &records {
            for name in record.field_names() {
                if !fields.iter().any(|f| f == name) {
                    fields.push(name.to_string());
                }
            }
        }
        ArraySource::with_fields(records, fields)
    }

    /// Creates a source with an explicit field list.
    pub fn with_fields(records: Vec<Record>, fields: Vec<String>) -> Self {
        let rows = records.iter().map(|r| r.project(&fields)).collect();
        ArraySource { fields, rows }
    }

    /// Creates a source from a JSON array of objects.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Array(items) => {
                Ok(ArraySource::new(items.iter().map(Record::from_json).collect()))
            }
            other => Err(SourceError::unavailable(
                DRIVER,
                format!("expected an array of rows, got {}", json_kind(other)),
            )),
        }
    }

    /// Creates a source from any serializable collection of structs or maps.
    pub fn from_serialize<T: Serialize>(items: &[T]) -> Result<Self> {
        let value = serde_json::to_value(items).map_err(|e| SourceError::unavailable(DRIVER, e))?;
        ArraySource::from_json(&value)
    }

    /// Restricts the source to `fields`, in that order.
    pub fn select(self, fields: &[String]) -> Result<Self> {
        self.check_fields(fields.iter().map(String::as_str))?;
        Ok(ArraySource::with_fields(self.rows, fields.to_vec()))
    }

    /// Keeps only rows matching every filter.
    pub fn filter(mut self, filters: &[Filter]) -> Result<Self> {
        self.check_fields(filters.iter().map(|f| f.field.as_str()))?;
        self.rows.retain(|row| matches_all(filters, row));
        Ok(self)
    }

    fn check_fields<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<()> {
        match names.find(|name| !self.fields.iter().any(|f| f == name)) {
            Some(missing) => Err(SourceError::invalid_field(DRIVER, missing)),
            None => Ok(()),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a bool",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl DataSource for ArraySource {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            count: true,
            ..Capabilities::NONE
        }
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn count(&mut self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Record>> {
        Ok(slice_range(self.rows.clone(), request.range))
    }
}
