//! Table-mapping driver.
//!
//! A [`TableMapper`] is a foreign table object with its own named queries.
//! [`TableMapperSource`] looks up one of them, merges the caller's filter and
//! order overrides into it, and pushes sort, range and count through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::filter::{matches_all, Filter};
use crate::ordering::{sort_records, OrderBy};
use crate::record::Record;
use crate::source::{slice_range, Capabilities, DataSource, FetchRequest, Range};

const DRIVER: &str = "mapper";

/// A query understood by a [`TableMapper`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappedQuery {
    /// Conditions ANDed together.
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    /// Columns to return; `None` returns all of them.
    pub fields: Option<Vec<String>>,
}

impl MappedQuery {
    pub fn new() -> Self {
        MappedQuery::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// A foreign table-mapping object.
pub trait TableMapper {
    /// All column names of the mapped table.
    fn columns(&self) -> &[String];

    /// Looks up a named query. Unknown names return `None`.
    fn named_query(&self, name: &str) -> Option<MappedQuery>;

    /// Runs a query, returning rows in `range`.
    fn select(&mut self, query: &MappedQuery, range: Option<Range>) -> Result<Vec<Record>>;

    /// Counts the rows a query matches.
    fn count(&mut self, query: &MappedQuery) -> Result<usize>;
}

impl<M: TableMapper + ?Sized> TableMapper for Box<M> {
    fn columns(&self) -> &[String] {
        (**self).columns()
    }

    fn named_query(&self, name: &str) -> Option<MappedQuery> {
        (**self).named_query(name)
    }

    fn select(&mut self, query: &MappedQuery, range: Option<Range>) -> Result<Vec<Record>> {
        (**self).select(query, range)
    }

    fn count(&mut self, query: &MappedQuery) -> Result<usize> {
        (**self).count(query)
    }
}

/// How to drive a [`TableMapper`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    /// Named query to start from; `None` selects everything.
    pub query: Option<String>,
    /// Extra filters, ANDed onto the named query's.
    pub filters: Vec<Filter>,
    /// Replaces the named query's order. A requested grid sort wins over both.
    pub order: Option<OrderBy>,
}

/// Binds a [`TableMapper`] as a data source.
pub struct TableMapperSource {
    mapper: Box<dyn TableMapper>,
    query: MappedQuery,
    fields: Vec<String>,
}

impl std::fmt::Debug for TableMapperSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableMapperSource")
            .field("query", &self.query)
            .field("fields", &self.fields)
            .finish()
    }
}

impl TableMapperSource {
    /// Resolves the named query and merges the overrides.
    ///
    /// Fails with [`SourceError::Unavailable`] for an unknown query name and
    /// with [`SourceError::InvalidField`] if an override or the query's field
    /// list names a column the mapper does not have.
    pub fn new(mapper: impl TableMapper + 'static, options: MapperOptions) -> Result<Self> {
        let mut query = match &options.query {
            Some(name) => mapper.named_query(name).ok_or_else(|| {
                SourceError::unavailable(DRIVER, format!("no named query '{}'", name))
            })?,
            None => MappedQuery::default(),
        };
        query.filters.extend(options.filters);
        if options.order.is_some() {
            query.order = options.order;
        }

        let columns = mapper.columns();
        let fields = query.fields.clone().unwrap_or_else(|| columns.to_vec());
        let referenced = fields
            .iter()
            .map(String::as_str)
            .chain(query.filters.iter().map(|f| f.field.as_str()))
            .chain(query.order.iter().map(|o| o.field.as_str()));
        for name in referenced {
            if !columns.iter().any(|c| c == name) {
                return Err(SourceError::invalid_field(DRIVER, name));
            }
        }

        debug!(query = ?options.query, filters = query.filters.len(), "bound table mapper");
        Ok(TableMapperSource {
            mapper: Box::new(mapper),
            query,
            fields,
        })
    }

    /// Restricts the returned columns to `fields`, in that order.
    pub fn select(mut self, fields: &[String]) -> Result<Self> {
        if let Some(missing) = fields.iter().find(|f| !self.fields.contains(f)) {
            return Err(SourceError::invalid_field(DRIVER, missing.clone()));
        }
        self.fields = fields.to_vec();
        self.query.fields = Some(self.fields.clone());
        Ok(self)
    }

    /// The merged query this source runs.
    pub fn query(&self) -> &MappedQuery {
        &self.query
    }
}

impl DataSource for TableMapperSource {
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
        self.mapper.count(&self.query)
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Record>> {
        let mut query = self.query.clone();
        if let Some(order) = request.order {
            query.order = Some(order.clone());
        }
        let rows = self.mapper.select(&query, request.range)?;
        Ok(rows.iter().map(|r| r.project(&self.fields)).collect())
    }
}

// =============================================================================
// MemoryTable
// =============================================================================

/// An in-memory [`TableMapper`] with registered named queries.
///
/// ```
/// use datagrid_source::{Filter, MappedQuery, MemoryTable, Record, TableMapper};
///
/// let mut table = MemoryTable::new(vec![
///     Record::new().with("id", 1).with("active", true),
///     Record::new().with("id", 2).with("active", false),
/// ])
/// .named("active", MappedQuery::new().filter(Filter::eq("active", true)));
///
/// let active = table.named_query("active").unwrap();
/// assert_eq!(table.count(&active).unwrap(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Record>,
    queries: BTreeMap<String, MappedQuery>,
}

impl MemoryTable {
    pub fn new(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        MemoryTable {
            columns,
            rows,
            queries: BTreeMap::new(),
        }
    }

    /// Registers a named query.
    pub fn named(mut self, name: impl Into<String>, query: MappedQuery) -> Self {
        self.queries.insert(name.into(), query);
        self
    }
}

impl TableMapper for MemoryTable {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn named_query(&self, name: &str) -> Option<MappedQuery> {
        self.queries.get(name).cloned()
    }

    fn select(&mut self, query: &MappedQuery, range: Option<Range>) -> Result<Vec<Record>> {
        let mut rows: Vec<Record> = self
            .rows
            .iter()
            .filter(|row| matches_all(&query.filters, row))
            .cloned()
            .collect();
        if let Some(order) = &query.order {
            sort_records(&mut rows, order);
        }
        let fields = query.fields.as_deref().unwrap_or(&self.columns);
        let rows = rows.iter().map(|r| r.project(fields)).collect();
        Ok(slice_range(rows, range))
    }

    fn count(&mut self, query: &MappedQuery) -> Result<usize> {
        Ok(self
            .rows
            .iter()
            .filter(|row| matches_all(&query.filters, row))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Op;
    use crate::value::Value;

    fn table() -> MemoryTable {
        MemoryTable::new(vec![
            Record::new().with("id", 1).with("team", "red").with("score", 10),
            Record::new().with("id", 2).with("team", "blue").with("score", 30),
            Record::new().with("id", 3).with("team", "red").with("score", 20),
            Record::new().with("id", 4).with("team", "red").with("score", 5),
        ])
        .named(
            "red",
            MappedQuery::new()
                .filter(Filter::eq("team", "red"))
                .order(OrderBy::asc("score")),
        )
    }

    fn ids(rows: &[Record]) -> Vec<String> {
        rows.iter().map(|r| r.value("id").to_string()).collect()
    }

    #[test]
    fn named_query_filters_and_orders() {
        let options = MapperOptions {
            query: Some("red".into()),
            ..MapperOptions::default()
        };
        let mut source = TableMapperSource::new(table(), options).unwrap();
        assert_eq!(source.count().unwrap(), 3);
        assert_eq!(ids(&source.fetch(&FetchRequest::all()).unwrap()), ["4", "1", "3"]);
    }

    #[test]
    fn overrides_merge_into_named_query() {
        let options = MapperOptions {
            query: Some("red".into()),
            filters: vec![Filter::new("score", Op::Gte, 10)],
            order: Some(OrderBy::desc("score")),
        };
        let mut source = TableMapperSource::new(table(), options).unwrap();
        assert_eq!(source.count().unwrap(), 2);
        assert_eq!(ids(&source.fetch(&FetchRequest::all()).unwrap()), ["3", "1"]);
    }

    #[test]
    fn requested_sort_wins() {
        let options = MapperOptions {
            query: Some("red".into()),
            ..MapperOptions::default()
        };
        let mut source = TableMapperSource::new(table(), options).unwrap();
        let order = OrderBy::desc("id");
        let rows = source
            .fetch(&FetchRequest {
                order: Some(&order),
                range: Some(Range { offset: 1, limit: 1 }),
            })
            .unwrap();
        assert_eq!(ids(&rows), ["3"]);
    }

    #[test]
    fn unknown_query_and_field_fail() {
        let unknown = MapperOptions {
            query: Some("green".into()),
            ..MapperOptions::default()
        };
        assert!(!TableMapperSource::new(table(), unknown).unwrap_err().is_invalid_field());

        let bad_filter = MapperOptions {
            filters: vec![Filter::eq("colour", "red")],
            ..MapperOptions::default()
        };
        assert!(TableMapperSource::new(table(), bad_filter).unwrap_err().is_invalid_field());
    }

    #[test]
    fn select_projects_rows() {
        let mut source = TableMapperSource::new(table(), MapperOptions::default())
            .unwrap()
            .select(&["score".to_string()])
            .unwrap();
        let rows = source.fetch(&FetchRequest::all()).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].value("score"), &Value::from(10));
    }
}
