//! SQL driver over SQLite.
//!
//! The caller's query is wrapped as a sub-select so sorting, limiting,
//! filtering and counting can all be pushed down:
//!
//! ```text
//! SELECT "id", "name" FROM (<query>) AS datagrid_source
//!     [WHERE "age" >= ?] [ORDER BY "name" ASC NULLS LAST, "id"] [LIMIT ? OFFSET ?]
//! ```
//!
//! The remaining selected columns follow the sort column in `ORDER BY`, so
//! rows with equal sort values keep one order from page to page.

use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::filter::Filter;
use crate::ordering::Dir;
use crate::record::Record;
use crate::source::{Capabilities, DataSource, FetchRequest};
use crate::value::{Number, Value};

const DRIVER: &str = "sql";

/// Query parameters for [`SqlSource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlOptions {
    /// The row query. Any `SELECT` the database accepts as a sub-select.
    pub query: String,
    /// Optional query returning the row count as its single column.
    /// Defaults to `SELECT COUNT(*)` over the wrapped query.
    pub count_query: Option<String>,
}

impl SqlOptions {
    pub fn new(query: impl Into<String>) -> Self {
        SqlOptions {
            query: query.into(),
            count_query: None,
        }
    }

    pub fn count_query(mut self, query: impl Into<String>) -> Self {
        self.count_query = Some(query.into());
        self
    }
}

/// A SQL result set. Owns its connection; dropping the source closes it.
///
/// ```
/// use datagrid_source::{DataSource, SqlOptions, SqlSource};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE t (id INTEGER, name TEXT); INSERT INTO t VALUES (1, 'a');")
///     .unwrap();
///
/// let mut source = SqlSource::new(conn, SqlOptions::new("SELECT id, name FROM t")).unwrap();
/// assert_eq!(source.fields(), ["id", "name"]);
/// assert_eq!(source.count().unwrap(), 1);
/// ```
pub struct SqlSource {
    conn: Connection,
    query: String,
    count_query: Option<String>,
    fields: Vec<String>,
    filters: Vec<Filter>,
}

impl std::fmt::Debug for SqlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlSource")
            .field("query", &self.query)
            .field("fields", &self.fields)
            .field("filters", &self.filters)
            .finish()
    }
}

impl SqlSource {
    /// Binds a query on an open connection.
    ///
    /// The query is prepared once to learn its column names; a malformed
    /// query fails here with [`SourceError::Unavailable`].
    pub fn new(conn: Connection, options: SqlOptions) -> Result<Self> {
        let query = options.query.trim().trim_end_matches(';').trim().to_string();
        if query.is_empty() {
            return Err(SourceError::unavailable(DRIVER, "no query given"));
        }
        let fields = {
            let stmt = conn.prepare(&query)?;
            stmt.column_names().into_iter().map(str::to_string).collect()
        };
        debug!(query = %query, "prepared sql source");
        Ok(SqlSource {
            conn,
            query,
            count_query: options.count_query,
            fields,
            filters: Vec::new(),
        })
    }

    /// Opens a database file and binds a query on it.
    pub fn open(path: impl AsRef<Path>, options: SqlOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        SqlSource::new(conn, options)
    }

    /// Restricts the selected columns to `fields`, in that order.
    pub fn select(mut self, fields: &[String]) -> Result<Self> {
        self.check_fields(fields.iter().map(String::as_str))?;
        self.fields = fields.to_vec();
        Ok(self)
    }

    /// Adds filters, translated into a parameterized `WHERE`.
    ///
    /// A caller-supplied `count_query` cannot see these filters and is
    /// ignored once any are set.
    pub fn filter(mut self, filters: &[Filter]) -> Result<Self> {
        self.check_fields(filters.iter().map(|f| f.field.as_str()))?;
        self.filters.extend_from_slice(filters);
        Ok(self)
    }

    fn check_fields<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<()> {
        match names.find(|name| !self.fields.iter().any(|f| f == name)) {
            Some(missing) => Err(SourceError::invalid_field(DRIVER, missing)),
            None => Ok(()),
        }
    }

    fn from_clause(&self, params: &mut Vec<SqlValue>) -> String {
        let mut sql = format!("FROM ({}) AS datagrid_source", self.query);
        for (i, filter) in self.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("{} {} ?", quote_ident(&filter.field), filter.op.sql()));
            params.push(to_sql(&filter.sql_param()));
        }
        sql
    }
}

impl DataSource for SqlSource {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn count(&mut self) -> Result<usize> {
        let mut params = Vec::new();
        let sql = match &self.count_query {
            Some(query) if self.filters.is_empty() => query.clone(),
            _ => format!("SELECT COUNT(*) {}", self.from_clause(&mut params)),
        };
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Record>> {
        let mut params = Vec::new();
        let columns = self
            .fields
            .iter()
            .map(|f| quote_ident(f))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} {}", columns, self.from_clause(&mut params));

        if let Some(order) = request.order {
            // Nulls go last ascending and first descending, matching the
            // in-memory comparator.
            let nulls = match order.dir {
                Dir::Asc => "NULLS LAST",
                Dir::Desc => "NULLS FIRST",
            };
            sql.push_str(&format!(
                " ORDER BY {} {} {}",
                quote_ident(&order.field),
                order.dir.as_str(),
                nulls
            ));
            for field in self.fields.iter().filter(|f| **f != order.field) {
                sql.push_str(&format!(", {}", quote_ident(field)));
            }
        }
        if let Some(range) = request.range {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(SqlValue::Integer(i64::try_from(range.limit).unwrap_or(i64::MAX)));
            params.push(SqlValue::Integer(i64::try_from(range.offset).unwrap_or(i64::MAX)));
        }

        debug!(sql = %sql, "running sql fetch");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, field) in self.fields.iter().enumerate() {
                record.insert(field.clone(), from_sql(row.get_ref(i)?));
            }
            records.push(record);
        }
        Ok(records)
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(Number::I64(i)) => SqlValue::Integer(*i),
        Value::Number(Number::U64(u)) => match i64::try_from(*u) {
            Ok(i) => SqlValue::Integer(i),
            Err(_) => SqlValue::Real(*u as f64),
        },
        Value::Number(Number::F64(f)) => SqlValue::Real(*f),
        Value::Timestamp(ts) => SqlValue::Integer(ts.as_millis()),
        Value::String(s) => SqlValue::Text(s.clone()),
    }
}
