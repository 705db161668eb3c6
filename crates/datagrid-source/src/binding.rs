//! Binding: one bound driver plus the push-down-or-emulate policy.
//!
//! A [`Binding`] answers "give me the window for this sort and page" for any
//! driver. Work the driver advertises in its [`Capabilities`] is pushed down;
//! everything else is emulated over a snapshot of the full unsorted set,
//! fetched once per binding and reused until [`Binding::invalidate`] or the
//! binding is replaced.
//!
//! ```text
//! sort requested?   push_sort   push_limit   strategy
//! ---------------   ---------   ----------   --------------------------------
//! yes               yes         yes          fetch(order, range)
//! yes               yes         no           fetch(order) then slice
//! yes               no          any          snapshot, stable sort, slice
//! no                -           yes          fetch(range)
//! no                -           no           snapshot, slice
//! ```

use tracing::debug;

use crate::error::{Result, SourceError};
use crate::ordering::{OrderBy, SortState};
use crate::page::{PageState, RecordWindow};
use crate::record::Record;
use crate::source::{slice_range, Capabilities, DataSource, FetchRequest, Range};

/// A data source bound to a grid.
pub struct Binding {
    source: Box<dyn DataSource>,
    sort_push_down: bool,
    snapshot: Option<Vec<Record>>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("driver", &self.source.name())
            .field("fields", &self.source.fields())
            .field("sort_push_down", &self.sort_push_down)
            .field("snapshot_rows", &self.snapshot.as_ref().map(Vec::len))
            .finish()
    }
}

impl Binding {
    /// Binds a driver.
    pub fn new(source: impl DataSource + 'static) -> Self {
        let source: Box<dyn DataSource> = Box::new(source);
        debug!(
            driver = source.name(),
            fields = source.fields().len(),
            "bound data source"
        );
        Binding {
            source,
            sort_push_down: true,
            snapshot: None,
        }
    }

    /// Enables or disables sort push-down even when the driver supports it.
    ///
    /// With push-down disabled, sorting is always done in memory.
    pub fn with_sort_push_down(mut self, enabled: bool) -> Self {
        self.sort_push_down = enabled;
        self
    }

    /// The bound driver's name.
    pub fn driver(&self) -> &'static str {
        self.source.name()
    }

    /// Field names exposed by the bound source.
    pub fn fields(&self) -> &[String] {
        self.source.fields()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().iter().any(|f| f == field)
    }

    /// Effective capabilities: the driver's, minus any disabled push-down.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = self.source.capabilities();
        caps.push_sort &= self.sort_push_down;
        caps
    }

    /// Drops the cached snapshot; the next emulated fetch re-reads the source.
    pub fn invalidate(&mut self) {
        if self.snapshot.take().is_some() {
            debug!(driver = self.driver(), "discarded snapshot");
        }
    }

    /// Total rows in the bound set.
    pub fn count(&mut self) -> Result<usize> {
        if self.capabilities().count {
            self.source.count()
        } else {
            Ok(self.snapshot()?.len())
        }
    }

    /// Fetches the window for `sort` and `page`.
    ///
    /// The page is clamped to the last valid page; an out-of-range request
    /// never fails. Fails with [`SourceError::InvalidField`] if `sort` names
    /// a field the source does not expose.
    pub fn fetch(&mut self, sort: &SortState, page: PageState) -> Result<RecordWindow> {
        if let Some(field) = sort.field() {
            if !self.has_field(field) {
                return Err(SourceError::invalid_field(self.driver(), field));
            }
        }

        let total = self.count()?;
        let page = page.clamp(total);
        let range = page.limit().map(|limit| Range {
            offset: page.offset(),
            limit,
        });
        let caps = self.capabilities();

        let mut records = match sort.order() {
            Some(order) if caps.push_sort => {
                let request = FetchRequest {
                    order: Some(order),
                    range: range.filter(|_| caps.push_limit),
                };
                debug!(
                    driver = self.driver(),
                    pushed_limit = caps.push_limit,
                    "pushing sort to source"
                );
                let rows = self.source.fetch(&request)?;
                if caps.push_limit {
                    rows
                } else {
                    slice_range(rows, range)
                }
            }
            Some(order) => self.sorted_from_snapshot(order, range)?,
            None if caps.push_limit => self.source.fetch(&FetchRequest { order: None, range })?,
            None => {
                let snapshot = self.snapshot()?;
                let (offset, limit) = bounds(range, snapshot.len());
                snapshot.iter().skip(offset).take(limit).cloned().collect()
            }
        };

        if let Some(limit) = page.limit() {
            records.truncate(limit);
        }
        let total = total.max(page.offset() + records.len());

        debug!(
            driver = self.driver(),
            total,
            start = page.offset(),
            len = records.len(),
            "fetched window"
        );
        Ok(RecordWindow::new(records, total, sort.clone(), page))
    }

    fn sorted_from_snapshot(&mut self, order: &OrderBy, range: Option<Range>) -> Result<Vec<Record>> {
        let snapshot = self.snapshot()?;
        let mut indices: Vec<usize> = (0..snapshot.len()).collect();
        // Vec::sort_by is stable; ties keep source order.
        indices.sort_by(|&a, &b| order.compare_records(&snapshot[a], &snapshot[b]));
        let (offset, limit) = bounds(range, snapshot.len());
        Ok(indices
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|i| snapshot[i].clone())
            .collect())
    }

    fn snapshot(&mut self) -> Result<&[Record]> {
        if self.snapshot.is_none() {
            let rows = self.source.fetch(&FetchRequest::all())?;
            debug!(driver = self.source.name(), rows = rows.len(), "materialized snapshot");
            self.snapshot = Some(rows);
        }
        Ok(self.snapshot.as_deref().unwrap_or_default())
    }
}

fn bounds(range: Option<Range>, len: usize) -> (usize, usize) {
    match range {
        Some(Range { offset, limit }) => (offset, limit),
        None => (0, len),
    }
}
