//! Datagrid sources - records, sort/page state and data source drivers.
//!
//! This crate is the data half of a datagrid: it knows how to pull one page
//! of ordered records out of very different sources while keeping sorting
//! and paging semantics identical across them. It provides:
//!
//! - An owned record model: [`Record`] maps field names to scalar [`Value`]s
//! - Single-column sort state ([`SortState`]) and 1-indexed paging ([`PageState`])
//! - The [`DataSource`] driver contract with a [`Capabilities`] descriptor
//! - Four drivers: in-memory arrays, SQL queries, XML documents, table mappers
//! - [`Binding`], which pushes sort and limit down when a driver can and
//!   emulates them in memory when it cannot
//!
//! # Quick Start
//!
//! ```rust
//! use datagrid_source::{ArraySource, Binding, Dir, PageState, Record, SortState};
//!
//! let rows = vec![
//!     Record::new().with("id", 1).with("first_name", "Ada").with("age", 36),
//!     Record::new().with("id", 2).with("first_name", "Grace").with("age", 85),
//!     Record::new().with("id", 3).with("first_name", "Linus").with("age", 28),
//! ];
//!
//! let mut binding = Binding::new(ArraySource::new(rows));
//! let window = binding
//!     .fetch(&SortState::by("age", Dir::Desc), PageState::new(1, 2))
//!     .unwrap();
//!
//! assert_eq!(window.len(), 2);
//! assert_eq!(window.total(), 3);
//! assert_eq!(window.records()[0].value("first_name").to_string(), "Grace");
//! ```
//!
//! # Windows
//!
//! A [`RecordWindow`] is exactly one page: at most `size` records, the total
//! row count of the unbounded set and the zero-based index of its first row.
//! Requests past the last page are clamped to the last page, never rejected:
//!
//! ```text
//! total = 5, size = 4
//! page 1  -> start 0, len 4
//! page 2  -> start 4, len 1
//! page 99 -> clamped to page 2
//! ```
//!
//! # Ordering
//!
//! In-memory sorting is stable, so ties keep source order and re-sorting is
//! idempotent. `Null` sorts last ascending. Numeric strings compare as
//! numbers. See [`compare_values`] for the full rules.

mod binding;
pub mod drivers;
mod error;
mod filter;
mod ordering;
mod page;
mod record;
mod source;
mod value;

// Re-export public API
pub use binding::Binding;
pub use drivers::{
    ArraySource, MappedQuery, MapperOptions, MemoryTable, SqlOptions, SqlSource, TableMapper,
    TableMapperSource, XmlOptions, XmlSource,
};
pub use error::{Result, SourceError};
pub use filter::{matches_all, Filter, Op};
pub use ordering::{compare_values, sort_records, Dir, OrderBy, ParseDirError, SortState};
pub use page::{PageState, RecordWindow};
pub use record::Record;
pub use source::{Capabilities, DataSource, FetchRequest, Range};
pub use value::{Number, Timestamp, Value};
