//! Output columns and the column registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use datagrid_source::{Dir, Record, Value};
use tracing::debug;

use crate::format::Format;

/// Caller-supplied cell transform: receives the cell value and its whole row.
pub type Transform = Arc<dyn Fn(&Value, &Record) -> String + Send + Sync>;

/// One output column.
///
/// ```
/// use datagrid_render::{Column, Format};
/// use datagrid_source::{Dir, Record};
///
/// let age = Column::new("age")
///     .label("Age")
///     .sortable(true)
///     .default_dir(Dir::Desc)
///     .format(Format::number(1));
///
/// let row = Record::new().with("age", 36);
/// assert_eq!(age.cell(&row), "36.0");
/// assert_eq!(Column::new("email").cell(&row), "");
/// ```
#[derive(Clone)]
pub struct Column {
    /// Record field this column shows. Unique within a registry.
    pub field: String,
    /// Header text.
    pub label: String,
    pub format: Option<Format>,
    pub sortable: bool,
    /// Direction applied on the first click of an unsorted column.
    pub default_dir: Dir,
    /// Extra display attributes (HTML attributes, widget properties).
    pub attributes: BTreeMap<String, String>,
    pub transform: Option<Transform>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("label", &self.label)
            .field("format", &self.format)
            .field("sortable", &self.sortable)
            .field("default_dir", &self.default_dir)
            .field("attributes", &self.attributes)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Column {
    /// A sortable column labelled with its field name.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Column {
            label: field.clone(),
            field,
            format: None,
            sortable: true,
            default_dir: Dir::Asc,
            attributes: BTreeMap::new(),
            transform: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn default_dir(mut self, dir: Dir) -> Self {
        self.default_dir = dir;
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Value, &Record) -> String + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Display text for this column's cell in `record`.
    ///
    /// The transform wins over the format rule. Missing fields render empty.
    pub fn cell(&self, record: &Record) -> String {
        let value = record.value(&self.field);
        if let Some(transform) = &self.transform {
            return transform(value, record);
        }
        match &self.format {
            Some(format) if !value.is_null() => format.apply(value).unwrap_or_else(|| value.to_string()),
            _ => value.to_string(),
        }
    }

    /// Whether the cell is a plain number (no formatting applied).
    pub fn is_raw_number(&self, record: &Record) -> bool {
        self.transform.is_none() && self.format.is_none() && record.value(&self.field).is_number()
    }
}

/// The ordered set of output columns.
///
/// Field keys are unique: adding a column for a field already present
/// replaces it in place. Columns created by [`generate`](Self::generate)
/// are remembered as generated and never block explicit columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
    generated: Vec<bool>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        ColumnRegistry::default()
    }

    /// Adds a column, replacing any column with the same field.
    pub fn add(&mut self, column: Column) {
        match self.position(&column.field) {
            Some(i) => {
                debug!(field = %column.field, "replaced column");
                self.columns[i] = column;
                self.generated[i] = false;
            }
            None => {
                self.columns.push(column);
                self.generated.push(false);
            }
        }
    }

    /// Removes the column for `field`, keeping the others in order.
    pub fn drop_column(&mut self, field: &str) -> Option<Column> {
        let i = self.position(field)?;
        self.generated.remove(i);
        Some(self.columns.remove(i))
    }

    /// Generates one sortable column per field, labelled with the field name.
    ///
    /// Does nothing if any column was added explicitly. Returns the number of
    /// columns generated.
    pub fn generate<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) -> usize {
        if self.has_explicit() {
            return 0;
        }
        let mut added = 0;
        for field in fields {
            if self.position(field).is_none() {
                self.columns.push(Column::new(field));
                self.generated.push(true);
                added += 1;
            }
        }
        added
    }

    /// Drops every generated column.
    pub fn clear_generated(&mut self) {
        let mut flags = std::mem::take(&mut self.generated).into_iter();
        self.columns.retain(|_| !flags.next().unwrap_or(false));
        self.generated = vec![false; self.columns.len()];
    }

    pub fn has_explicit(&self) -> bool {
        self.generated.iter().any(|g| !g)
    }

    pub fn is_generated(&self, field: &str) -> bool {
        self.position(field).map_or(false, |i| self.generated[i])
    }

    pub fn get(&self, field: &str) -> Option<&Column> {
        self.position(field).map(|i| &self.columns[i])
    }

    /// Default direction for `field` if it names a sortable column.
    pub fn sortable(&self, field: &str) -> Option<Dir> {
        self.get(field).filter(|c| c.sortable).map(|c| c.default_dir)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }
}
