//! List-widget renderer (XUL `listbox` markup).

use std::collections::BTreeMap;
use std::io::Write;

use datagrid_source::{Dir, Record};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use serde::{Deserialize, Serialize};

use super::emit;
use crate::error::Result;
use crate::renderer::{RenderContext, Renderer, RendererCapabilities};

const XUL_NS: &str = "http://www.mozilla.org/keymaster/gatekeeper/there.is.only.xul";

/// Options for [`ListWidgetRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListWidgetOptions {
    /// Declare the XUL namespace on the `listbox`.
    pub namespace: bool,
    /// Visible rows of the widget.
    pub rows: Option<usize>,
    pub listbox_attributes: BTreeMap<String, String>,
    /// Script run when a sortable header is clicked. `{href}` is replaced
    /// by the header's link.
    pub command: String,
    /// `flex` of each `listcol`.
    pub flex: Option<String>,
}

impl Default for ListWidgetOptions {
    fn default() -> Self {
        ListWidgetOptions {
            namespace: true,
            rows: None,
            listbox_attributes: BTreeMap::new(),
            command: "window.location.href='{href}'".to_string(),
            flex: Some("1".to_string()),
        }
    }
}

/// Renders a window as a XUL `listbox`.
///
/// Header cells carry `sortDirection` (`ascending`, `descending` or
/// `natural`) and an `oncommand` navigating to the next sort state.
#[derive(Debug, Clone, Default)]
pub struct ListWidgetRenderer {
    options: ListWidgetOptions,
}

impl ListWidgetRenderer {
    pub fn new(options: ListWidgetOptions) -> Self {
        ListWidgetRenderer { options }
    }
}

fn sort_direction(dir: Option<Dir>) -> &'static str {
    match dir {
        Some(Dir::Asc) => "ascending",
        Some(Dir::Desc) => "descending",
        None => "natural",
    }
}

impl Renderer for ListWidgetRenderer {
    fn name(&self) -> &'static str {
        "list"
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::STREAMING
    }

    fn render_header(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        let mut listbox = BytesStart::new("listbox");
        if self.options.namespace {
            listbox.push_attribute(("xmlns", XUL_NS));
        }
        let rows = self.options.rows.map(|r| r.to_string());
        if let Some(rows) = &rows {
            listbox.push_attribute(("rows", rows.as_str()));
        }
        for (key, value) in &self.options.listbox_attributes {
            listbox.push_attribute((key.as_str(), value.as_str()));
        }
        emit(out, Event::Start(listbox))?;
        out.write_all(b"\n")?;

        emit(out, Event::Start(BytesStart::new("listhead")))?;
        out.write_all(b"\n")?;
        for cell in ctx.header_cells() {
            let mut header = BytesStart::new("listheader");
            header.push_attribute(("label", cell.column.label.as_str()));
            header.push_attribute(("sortDirection", sort_direction(cell.current)));
            let command = cell
                .href
                .as_ref()
                .map(|href| self.options.command.replace("{href}", &href.replace('\'', "\\'")));
            if let Some(command) = &command {
                header.push_attribute(("oncommand", command.as_str()));
            }
            for (key, value) in &cell.column.attributes {
                header.push_attribute((key.as_str(), value.as_str()));
            }
            emit(out, Event::Empty(header))?;
            out.write_all(b"\n")?;
        }
        emit(out, Event::End(BytesEnd::new("listhead")))?;
        out.write_all(b"\n")?;

        emit(out, Event::Start(BytesStart::new("listcols")))?;
        for _ in ctx.columns {
            let mut col = BytesStart::new("listcol");
            if let Some(flex) = &self.options.flex {
                col.push_attribute(("flex", flex.as_str()));
            }
            emit(out, Event::Empty(col))?;
        }
        emit(out, Event::End(BytesEnd::new("listcols")))?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn render_row(
        &mut self,
        ctx: &RenderContext<'_>,
        _index: usize,
        record: &Record,
        out: &mut dyn Write,
    ) -> Result<()> {
        emit(out, Event::Start(BytesStart::new("listitem")))?;
        for column in ctx.columns {
            let label = column.cell(record);
            let mut cell = BytesStart::new("listcell");
            cell.push_attribute(("label", label.as_str()));
            emit(out, Event::Empty(cell))?;
        }
        emit(out, Event::End(BytesEnd::new("listitem")))?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn render_footer(&mut self, _ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        emit(out, Event::End(BytesEnd::new("listbox")))?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::renderer::render_to_string;
    use crate::state::{Links, RequestContext, StateCoordinator};
    use datagrid_source::{PageState, RecordWindow, SortState};

    #[test]
    fn renders_listbox() {
        let columns = vec![Column::new("name").label("Name"), Column::new("age")];
        let window = RecordWindow::new(
            vec![Record::new().with("name", "O'Brien & co").with("age", 40)],
            1,
            SortState::by("age", Dir::Desc),
            PageState::unbounded(),
        );
        let coordinator = StateCoordinator::new();
        let request = RequestContext::new("/x");
        let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));
        let options = ListWidgetOptions {
            namespace: false,
            ..ListWidgetOptions::default()
        };
        let xul = render_to_string(&mut ListWidgetRenderer::new(options), &ctx, &window).unwrap();

        assert!(xul.starts_with("<listbox>\n<listhead>\n"));
        assert!(xul.contains(
            "<listheader label=\"Name\" sortDirection=\"natural\" \
             oncommand=\"window.location.href=&apos;/x?direction=ASC&amp;orderBy=name&apos;\"/>"
        ));
        assert!(xul.contains("sortDirection=\"descending\""));
        assert!(xul.contains("<listcols><listcol flex=\"1\"/><listcol flex=\"1\"/></listcols>"));
        assert!(xul.contains(
            "<listitem><listcell label=\"O&apos;Brien &amp; co\"/><listcell label=\"40\"/></listitem>"
        ));
        assert!(xul.ends_with("</listbox>\n"));
    }
}
