//! The data source driver contract.

use serde::Serialize;

use crate::error::Result;
use crate::ordering::OrderBy;
use crate::record::Record;

/// What a driver can do natively.
///
/// [`Binding`](crate::Binding) consults these flags to decide whether sorting,
/// limiting and counting happen at the source or are emulated in memory over
/// a fully fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    /// The driver can order rows by a field itself.
    pub push_sort: bool,
    /// The driver can apply an offset/limit itself.
    pub push_limit: bool,
    /// The driver can count matching rows without returning them.
    pub count: bool,
}

impl Capabilities {
    /// No native support: everything is emulated.
    pub const NONE: Capabilities = Capabilities {
        push_sort: false,
        push_limit: false,
        count: false,
    };

    /// Full native support, as a query engine provides.
    pub const ALL: Capabilities = Capabilities {
        push_sort: true,
        push_limit: true,
        count: true,
    };
}

/// A row range: skip `offset` rows, return at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: usize,
    pub limit: usize,
}

/// What a binding asks a driver to return.
///
/// `order` and `range` are only set when the matching capability is
/// advertised; a driver may ignore a field it did not claim to support.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchRequest<'a> {
    pub order: Option<&'a OrderBy>,
    pub range: Option<Range>,
}

impl<'a> FetchRequest<'a> {
    /// Everything, in source order.
    pub fn all() -> Self {
        FetchRequest::default()
    }
}

/// A data source driver.
///
/// Drivers own their underlying resource (connection, parsed document,
/// foreign table object) for as long as they are bound; dropping the driver
/// releases it.
///
/// Every returned [`Record`] carries all of [`fields`](Self::fields), with
/// `Null` for values the source lacks.
pub trait DataSource {
    /// Short driver name for logs and errors (`"array"`, `"sql"`, ...).
    fn name(&self) -> &'static str;

    /// Static capability flags for this driver.
    fn capabilities(&self) -> Capabilities;

    /// Field names exposed by the bound source, in source order.
    fn fields(&self) -> &[String];

    /// Total rows matching the binding. Only called when
    /// [`Capabilities::count`] is set.
    fn count(&mut self) -> Result<usize>;

    /// Returns rows for the request.
    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Record>>;
}

impl<S: DataSource + ?Sized> DataSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn fields(&self) -> &[String] {
        (**self).fields()
    }

    fn count(&mut self) -> Result<usize> {
        (**self).count()
    }

    fn fetch(&mut self, request: &FetchRequest<'_>) -> Result<Vec<Record>> {
        (**self).fetch(request)
    }
}

/// Applies an optional range to an in-memory row list.
pub(crate) fn slice_range(rows: Vec<Record>, range: Option<Range>) -> Vec<Record> {
    match range {
        Some(Range { offset, limit }) => rows.into_iter().skip(offset).take(limit).collect(),
        None => rows,
    }
}
