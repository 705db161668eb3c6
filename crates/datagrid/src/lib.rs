//! # Datagrid - Tabular Data, Any Source, Any Output
//!
//! `datagrid` renders rows from heterogeneous sources into heterogeneous
//! outputs while handling column projection, sorting and pagination the same
//! way for all of them.
//!
//! ## Core Concepts
//!
//! - [`DataGrid`]: the orchestrator. Bind a source, describe the columns,
//!   render.
//! - Sources, selected by [`DriverKind`]: in-memory records or JSON arrays,
//!   SQL queries (SQLite), XML documents, and [`TableMapper`] objects.
//! - Renderers, selected by [`RendererConfig`]: HTML tables, XUL list
//!   widgets, CSV, XML, SpreadsheetML workbooks and templates; plus the
//!   form and pager fill targets.
//! - Sort and page state come from an explicit override, the incoming
//!   [`RequestContext`] or the configured default, in that order. Every
//!   sort and page link a renderer emits parses back to the state it
//!   encodes.
//!
//! ## Quick Start
//!
//! ```rust
//! use datagrid::{BindOptions, Column, DataGrid, Dir, GridConfig, Record, RendererConfig, RequestContext};
//!
//! let rows = vec![
//!     Record::new().with("id", 1).with("first_name", "Ada").with("age", 36),
//!     Record::new().with("id", 2).with("first_name", "Grace").with("age", 85),
//!     Record::new().with("id", 3).with("first_name", "Linus").with("age", 28),
//! ];
//!
//! let mut grid = DataGrid::with_config(GridConfig::default().page_size(2)).unwrap();
//! grid.bind(rows, &BindOptions::default()).unwrap();
//! grid.add_column(Column::new("first_name").label("Name"));
//! grid.add_column(Column::new("age").label("Age").default_dir(Dir::Desc));
//!
//! let request = RequestContext::from_url("/people?orderBy=age&direction=DESC");
//! let html = grid.render(&RendererConfig::named("html").unwrap(), &request).unwrap();
//! let html = html.text().unwrap();
//!
//! assert!(html.contains("<td>Grace</td><td>85</td>"));
//! assert!(!html.contains("Linus")); // page 2
//! ```
//!
//! ## Configuration
//!
//! [`GridConfig`], [`BindOptions`] and [`RendererConfig`] deserialize from
//! YAML. See [`GridConfig::from_yaml`].
//!
//! ## Logging
//!
//! The crates log through [`tracing`](https://docs.rs/tracing): binds,
//! snapshots and fetched windows at `debug`, dropped request parameters at
//! `warn`. No subscriber is installed.

mod config;
mod error;
mod grid;
mod registry;

pub use config::{BindOptions, GridConfig, SortConfig};
pub use error::{GridError, Result};
pub use grid::DataGrid;
pub use registry::{DriverKind, FillTarget, RendererConfig, RendererKind, SourceInput};

// Sources
pub use datagrid_source::drivers;
pub use datagrid_source::{
    ArraySource, Binding, Capabilities, DataSource, Dir, FetchRequest, Filter, MappedQuery,
    MapperOptions, MemoryTable, Number, Op, OrderBy, PageState, Range, Record, RecordWindow,
    SortState, SourceError, SqlOptions, SqlSource, TableMapper, TableMapperSource, Timestamp,
    Value, XmlOptions, XmlSource,
};

// Rendering
pub use datagrid_render::{fill, renderers, template};
pub use datagrid_render::{
    Column, ColumnRegistry, CsvOptions, Form, FormElement, FormOptions, FormTarget, Format,
    FormatRule, HtmlOptions, LineEnding, LinkBuilder, LinkKind, ListWidgetOptions, MarkupOptions,
    OutputDestination, Pager, PagerLink, PagerOptions, PagerTarget, ParamNames, RenderError,
    RenderOutput, Renderer, RendererCapabilities, RequestContext, SpreadsheetOptions,
    TemplateOptions, UrlFormat,
};
