//! The renderer contract and the per-pass render context.
//!
//! A render pass is a fixed sequence of calls on a [`Renderer`]:
//!
//! ```text
//! prepare(ctx)
//! render_header(ctx, out)
//! render_row(ctx, 0, record, out)     once per record, in window order
//! ...
//! render_footer(ctx, out)
//! ```
//!
//! [`render_window`] runs the sequence. Streaming renderers write each piece
//! to `out` as soon as it is produced; buffered renderers accumulate and
//! write (or hand off) everything in `render_footer`.

use std::io::Write;

use datagrid_source::{Dir, PageState, Record, RecordWindow, SortState};
use serde::Serialize;

use crate::column::Column;
use crate::error::Result;
use crate::output::OutputDestination;
use crate::state::Links;

/// Execution model of a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RendererCapabilities {
    /// Accumulates output and releases it at the end of the pass.
    pub buffered: bool,
    /// Writes each row to the output channel as it arrives.
    pub streaming: bool,
    /// Populates a foreign object instead of producing text.
    pub fill: bool,
    /// Hands rows as structured data to a foreign rendering object.
    pub composition: bool,
}

impl RendererCapabilities {
    pub const STREAMING: RendererCapabilities = RendererCapabilities {
        buffered: false,
        streaming: true,
        fill: false,
        composition: false,
    };

    pub const BUFFERED: RendererCapabilities = RendererCapabilities {
        buffered: true,
        streaming: false,
        fill: false,
        composition: false,
    };

    pub const FILL: RendererCapabilities = RendererCapabilities {
        buffered: false,
        streaming: false,
        fill: true,
        composition: false,
    };

    pub const COMPOSITION: RendererCapabilities = RendererCapabilities {
        buffered: true,
        streaming: false,
        fill: false,
        composition: true,
    };
}

/// What a completed render pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    /// Buffered text.
    Text(String),
    /// Output went straight to the caller's writer.
    Streamed,
    /// A document was written to a destination.
    Written(OutputDestination),
    /// A foreign target was populated.
    Filled,
}

impl RenderOutput {
    /// The text, if this pass produced any.
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderOutput::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            RenderOutput::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Read-only state shared with a renderer for one pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub columns: &'a [Column],
    pub sort: &'a SortState,
    pub page: PageState,
    /// Rows in the unbounded set.
    pub total: usize,
    /// Zero-based index of the window's first row.
    pub start: usize,
    pub links: Links<'a>,
}

/// One header cell with its sort link.
#[derive(Debug, Clone)]
pub struct HeaderCell<'a> {
    pub column: &'a Column,
    /// Direction this column is currently sorted in, if it is the sort field.
    pub current: Option<Dir>,
    /// Direction a click applies. `None` for non-sortable columns.
    pub next: Option<Dir>,
    pub href: Option<String>,
}

impl<'a> RenderContext<'a> {
    /// Context for rendering `window`.
    pub fn new(columns: &'a [Column], window: &'a RecordWindow, links: Links<'a>) -> Self {
        RenderContext {
            columns,
            sort: window.sort(),
            page: window.page(),
            total: window.total(),
            start: window.start(),
            links,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page.page_count(self.total)
    }

    /// Header cells in column order.
    ///
    /// A sortable column's next direction flips the current one when it is
    /// the sort field and is its default direction otherwise. Header links
    /// go back to page 1.
    pub fn header_cells(&self) -> Vec<HeaderCell<'a>> {
        let first_page = self.page.with_page(1);
        self.columns
            .iter()
            .map(|column| {
                let current = self.sort.direction_of(&column.field);
                let next = column
                    .sortable
                    .then(|| self.sort.next_direction(&column.field, column.default_dir));
                let href = next.map(|dir| {
                    self.links
                        .href(&SortState::by(column.field.clone(), dir), first_page)
                });
                HeaderCell {
                    column,
                    current,
                    next,
                    href,
                }
            })
            .collect()
    }

    /// Formatted cells for a record, in column order.
    pub fn cells(&self, record: &Record) -> Vec<String> {
        self.columns.iter().map(|c| c.cell(record)).collect()
    }

    /// Link to another page under the current sort.
    pub fn page_href(&self, page: usize) -> String {
        self.links.href(self.sort, self.page.with_page(page))
    }
}

/// A renderer driver.
pub trait Renderer {
    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> RendererCapabilities;

    /// One-time setup before the header; validates options.
    fn prepare(&mut self, _ctx: &RenderContext<'_>) -> Result<()> {
        Ok(())
    }

    fn render_header(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()>;

    /// Renders the record at `index` (zero-based within the window).
    fn render_row(
        &mut self,
        ctx: &RenderContext<'_>,
        index: usize,
        record: &Record,
        out: &mut dyn Write,
    ) -> Result<()>;

    fn render_footer(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()>;

    /// Where the document went, for renderers that write files.
    fn destination(&self) -> Option<&OutputDestination> {
        None
    }
}

/// Runs one full pass over `window`.
pub fn render_window(
    renderer: &mut dyn Renderer,
    ctx: &RenderContext<'_>,
    window: &RecordWindow,
    out: &mut dyn Write,
) -> Result<()> {
    renderer.prepare(ctx)?;
    renderer.render_header(ctx, out)?;
    for (index, record) in window.iter().enumerate() {
        renderer.render_row(ctx, index, record, out)?;
    }
    renderer.render_footer(ctx, out)?;
    out.flush()?;
    Ok(())
}

/// Runs one pass into a buffer.
pub fn render_to_string(
    renderer: &mut dyn Renderer,
    ctx: &RenderContext<'_>,
    window: &RecordWindow,
) -> Result<String> {
    let mut buffer = Vec::new();
    render_window(renderer, ctx, window, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
