//! Driver and renderer registries, keyed by closed enums.
//!
//! Drivers and renderers are chosen by [`DriverKind`] and [`RendererKind`].
//! Both parse from their names, and an unknown name fails with
//! [`GridError::UnknownDriver`] or [`GridError::UnknownRenderer`] instead of
//! falling through to a default.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use datagrid_render::{
    CsvOptions, CsvRenderer, FormOptions, FormTarget, HtmlOptions, HtmlRenderer,
    ListWidgetOptions, ListWidgetRenderer, MarkupOptions, PagerOptions, PagerTarget, Renderer,
    SpreadsheetOptions, SpreadsheetRenderer, TemplateOptions, TemplateRenderer, XmlRenderer,
};
use datagrid_source::{
    ArraySource, Binding, Record, SourceError, SqlSource, TableMapper, TableMapperSource,
    XmlSource,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BindOptions;
use crate::error::{GridError, Result};

// =============================================================================
// Drivers
// =============================================================================

/// Data source driver variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Array,
    Sql,
    Xml,
    TableMapper,
}

impl DriverKind {
    pub const ALL: [DriverKind; 4] = [
        DriverKind::Array,
        DriverKind::Sql,
        DriverKind::Xml,
        DriverKind::TableMapper,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DriverKind::Array => "array",
            DriverKind::Sql => "sql",
            DriverKind::Xml => "xml",
            DriverKind::TableMapper => "table_mapper",
        }
    }

    /// Picks the driver for an input.
    ///
    /// Paths are told apart by extension: `.xml` documents go to the XML
    /// driver and `.db`, `.sqlite` or `.sqlite3` files to the SQL driver.
    pub fn detect(input: &SourceInput) -> Result<DriverKind> {
        match input {
            SourceInput::Records(_) | SourceInput::Json(_) => Ok(DriverKind::Array),
            SourceInput::Connection(_) => Ok(DriverKind::Sql),
            SourceInput::Document(_) => Ok(DriverKind::Xml),
            SourceInput::Mapper(_) => Ok(DriverKind::TableMapper),
            SourceInput::Path(path) => detect_path(path),
        }
    }
}

fn detect_path(path: &Path) -> Result<DriverKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("xml") => Ok(DriverKind::Xml),
        Some("db" | "sqlite" | "sqlite3") => Ok(DriverKind::Sql),
        _ => Err(GridError::UnknownDriver(path.display().to_string())),
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase().replace('-', "_");
        DriverKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| GridError::UnknownDriver(s.to_string()))
    }
}

/// What a grid can be bound to.
pub enum SourceInput {
    /// In-memory rows.
    Records(Vec<Record>),
    /// A JSON array of objects.
    Json(serde_json::Value),
    /// An open database; the query comes from [`BindOptions::sql`].
    Connection(Connection),
    /// An XML document held in memory.
    Document(String),
    /// A database or XML file.
    Path(PathBuf),
    Mapper(Box<dyn TableMapper>),
}

impl fmt::Debug for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceInput::Records(rows) => f.debug_tuple("Records").field(&rows.len()).finish(),
            SourceInput::Json(_) => f.write_str("Json"),
            SourceInput::Connection(_) => f.write_str("Connection"),
            SourceInput::Document(doc) => f.debug_tuple("Document").field(&doc.len()).finish(),
            SourceInput::Path(path) => f.debug_tuple("Path").field(path).finish(),
            SourceInput::Mapper(_) => f.write_str("Mapper"),
        }
    }
}

impl SourceInput {
    pub fn mapper(mapper: impl TableMapper + 'static) -> Self {
        SourceInput::Mapper(Box::new(mapper))
    }

    fn describe(&self) -> &'static str {
        match self {
            SourceInput::Records(_) => "records",
            SourceInput::Json(_) => "json",
            SourceInput::Connection(_) => "a database connection",
            SourceInput::Document(_) => "a document",
            SourceInput::Path(_) => "a path",
            SourceInput::Mapper(_) => "a table mapper",
        }
    }
}

impl From<Vec<Record>> for SourceInput {
    fn from(rows: Vec<Record>) -> Self {
        SourceInput::Records(rows)
    }
}

impl From<serde_json::Value> for SourceInput {
    fn from(value: serde_json::Value) -> Self {
        SourceInput::Json(value)
    }
}

impl From<Connection> for SourceInput {
    fn from(conn: Connection) -> Self {
        SourceInput::Connection(conn)
    }
}

impl From<PathBuf> for SourceInput {
    fn from(path: PathBuf) -> Self {
        SourceInput::Path(path)
    }
}

impl From<&Path> for SourceInput {
    fn from(path: &Path) -> Self {
        SourceInput::Path(path.to_path_buf())
    }
}

/// Constructs the driver for `kind` and binds it.
///
/// Field selection and filters from `options` are applied here, so every
/// count and window afterwards sees the narrowed set.
pub(crate) fn open(kind: DriverKind, input: SourceInput, options: &BindOptions) -> Result<Binding> {
    let driver = kind.as_str();
    let fail = |source: SourceError| GridError::bind(driver, "bind", source);
    let mismatch = |input: &SourceInput| {
        fail(SourceError::unavailable(
            driver,
            format!("cannot bind {} with this driver", input.describe()),
        ))
    };

    let binding = match (kind, input) {
        (DriverKind::Array, SourceInput::Records(rows)) => {
            let source = ArraySource::new(rows);
            Binding::new(narrow_array(source, options).map_err(fail)?)
        }
        (DriverKind::Array, SourceInput::Json(value)) => {
            let source = ArraySource::from_json(&value).map_err(fail)?;
            Binding::new(narrow_array(source, options).map_err(fail)?)
        }
        (DriverKind::Sql, SourceInput::Connection(conn)) => {
            let source = SqlSource::new(conn, options.sql.clone()).map_err(fail)?;
            Binding::new(narrow_sql(source, options).map_err(fail)?)
        }
        (DriverKind::Sql, SourceInput::Path(path)) => {
            let source = SqlSource::open(&path, options.sql.clone()).map_err(fail)?;
            Binding::new(narrow_sql(source, options).map_err(fail)?)
        }
        (DriverKind::Xml, SourceInput::Document(doc)) => {
            let source = XmlSource::parse(&doc, &options.xml).map_err(fail)?;
            Binding::new(narrow_xml(source, options).map_err(fail)?)
        }
        (DriverKind::Xml, SourceInput::Path(path)) => {
            let source = XmlSource::open(&path, &options.xml).map_err(fail)?;
            Binding::new(narrow_xml(source, options).map_err(fail)?)
        }
        (DriverKind::TableMapper, SourceInput::Mapper(mapper)) => {
            let mut mapper_options = options.mapper.clone();
            mapper_options.filters.extend(options.filters.iter().cloned());
            let mut source = TableMapperSource::new(mapper, mapper_options).map_err(fail)?;
            if let Some(fields) = &options.fields {
                source = source.select(fields).map_err(fail)?;
            }
            Binding::new(source)
        }
        (_, input) => return Err(mismatch(&input)),
    };

    debug!(driver, fields = binding.fields().len(), "opened driver");
    Ok(binding.with_sort_push_down(options.sort_push_down))
}

fn narrow_array(mut source: ArraySource, options: &BindOptions) -> datagrid_source::Result<ArraySource> {
    if let Some(fields) = &options.fields {
        source = source.select(fields)?;
    }
    source.filter(&options.filters)
}

fn narrow_sql(mut source: SqlSource, options: &BindOptions) -> datagrid_source::Result<SqlSource> {
    if let Some(fields) = &options.fields {
        source = source.select(fields)?;
    }
    source.filter(&options.filters)
}

fn narrow_xml(mut source: XmlSource, options: &BindOptions) -> datagrid_source::Result<XmlSource> {
    if let Some(fields) = &options.fields {
        source = source.select(fields)?;
    }
    source.filter(&options.filters)
}

// =============================================================================
// Renderers
// =============================================================================

/// Renderer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Html,
    List,
    Csv,
    Xml,
    Spreadsheet,
    Template,
    Form,
    Pager,
}

impl RendererKind {
    pub const ALL: [RendererKind; 8] = [
        RendererKind::Html,
        RendererKind::List,
        RendererKind::Csv,
        RendererKind::Xml,
        RendererKind::Spreadsheet,
        RendererKind::Template,
        RendererKind::Form,
        RendererKind::Pager,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RendererKind::Html => "html",
            RendererKind::List => "list",
            RendererKind::Csv => "csv",
            RendererKind::Xml => "xml",
            RendererKind::Spreadsheet => "spreadsheet",
            RendererKind::Template => "template",
            RendererKind::Form => "form",
            RendererKind::Pager => "pager",
        }
    }

    /// Whether this variant populates a foreign object instead of
    /// producing output.
    pub fn is_fill(self) -> bool {
        matches!(self, RendererKind::Form | RendererKind::Pager)
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        RendererKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| GridError::UnknownRenderer(s.to_string()))
    }
}

/// An output renderer with its options.
///
/// In YAML the variant is selected by `kind`:
///
/// ```rust
/// use datagrid::{RendererConfig, RendererKind};
///
/// let config: RendererConfig = serde_yaml::from_str("kind: csv\ndelimiter: ';'\n").unwrap();
/// assert_eq!(config.kind(), RendererKind::Csv);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RendererConfig {
    Html(HtmlOptions),
    List(ListWidgetOptions),
    Csv(CsvOptions),
    Xml(MarkupOptions),
    Spreadsheet(SpreadsheetOptions),
    Template(TemplateOptions),
}

impl RendererConfig {
    /// Default options for a renderer named `name`.
    ///
    /// Fill variants have no output renderer and fail with
    /// [`RenderError::Unsupported`](datagrid_render::RenderError::Unsupported).
    pub fn named(name: &str) -> Result<Self> {
        match name.parse::<RendererKind>()? {
            RendererKind::Html => Ok(RendererConfig::Html(HtmlOptions::default())),
            RendererKind::List => Ok(RendererConfig::List(ListWidgetOptions::default())),
            RendererKind::Csv => Ok(RendererConfig::Csv(CsvOptions::default())),
            RendererKind::Xml => Ok(RendererConfig::Xml(MarkupOptions::default())),
            RendererKind::Spreadsheet => {
                Ok(RendererConfig::Spreadsheet(SpreadsheetOptions::default()))
            }
            RendererKind::Template => Ok(RendererConfig::Template(TemplateOptions::default())),
            kind @ (RendererKind::Form | RendererKind::Pager) => {
                Err(GridError::unsupported(kind.as_str(), "render"))
            }
        }
    }

    pub fn kind(&self) -> RendererKind {
        match self {
            RendererConfig::Html(_) => RendererKind::Html,
            RendererConfig::List(_) => RendererKind::List,
            RendererConfig::Csv(_) => RendererKind::Csv,
            RendererConfig::Xml(_) => RendererKind::Xml,
            RendererConfig::Spreadsheet(_) => RendererKind::Spreadsheet,
            RendererConfig::Template(_) => RendererKind::Template,
        }
    }

    pub(crate) fn build(&self) -> Box<dyn Renderer> {
        match self {
            RendererConfig::Html(o) => Box::new(HtmlRenderer::new(o.clone())),
            RendererConfig::List(o) => Box::new(ListWidgetRenderer::new(o.clone())),
            RendererConfig::Csv(o) => Box::new(CsvRenderer::new(o.clone())),
            RendererConfig::Xml(o) => Box::new(XmlRenderer::new(o.clone())),
            RendererConfig::Spreadsheet(o) => Box::new(SpreadsheetRenderer::new(o.clone())),
            RendererConfig::Template(o) => Box::new(TemplateRenderer::new(o.clone())),
        }
    }
}

/// A foreign object for a fill pass.
pub enum FillTarget<'a> {
    Form(&'a mut dyn FormTarget, FormOptions),
    Pager(&'a mut dyn PagerTarget, PagerOptions),
}

impl FillTarget<'_> {
    pub fn kind(&self) -> RendererKind {
        match self {
            FillTarget::Form(..) => RendererKind::Form,
            FillTarget::Pager(..) => RendererKind::Pager,
        }
    }
}

impl fmt::Debug for FillTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillTarget::Form(_, options) => f.debug_tuple("Form").field(options).finish(),
            FillTarget::Pager(_, options) => f.debug_tuple("Pager").field(options).finish(),
        }
    }
}
