//! Structured-markup (XML) renderer.

use std::io::Write;

use datagrid_source::Record;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};

use super::emit;
use crate::error::Result;
use crate::renderer::{RenderContext, Renderer, RendererCapabilities};
use crate::util::sanitize_xml_name;

/// Options for [`XmlRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupOptions {
    pub root: String,
    pub row: String,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>`.
    pub declaration: bool,
    /// Put `total`, `page` and `pages` attributes on the root.
    pub paging_attributes: bool,
    /// Describe the columns in a leading `<columns>` element.
    pub describe_columns: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        MarkupOptions {
            root: "grid".to_string(),
            row: "row".to_string(),
            declaration: true,
            paging_attributes: true,
            describe_columns: false,
        }
    }
}

/// Renders a window as an XML document: one element per record, one child
/// element per column named after its field.
#[derive(Debug, Clone, Default)]
pub struct XmlRenderer {
    options: MarkupOptions,
    root: String,
    row: String,
    names: Vec<String>,
}

impl XmlRenderer {
    pub fn new(options: MarkupOptions) -> Self {
        XmlRenderer {
            options,
            ..XmlRenderer::default()
        }
    }
}

impl Renderer for XmlRenderer {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::STREAMING
    }

    fn prepare(&mut self, ctx: &RenderContext<'_>) -> Result<()> {
        self.root = sanitize_xml_name(&self.options.root);
        self.row = sanitize_xml_name(&self.options.row);
        self.names = ctx.columns.iter().map(|c| sanitize_xml_name(&c.field)).collect();
        Ok(())
    }

    fn render_header(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        if self.options.declaration {
            emit(out, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            out.write_all(b"\n")?;
        }

        let mut root = BytesStart::new(self.root.as_str());
        if self.options.paging_attributes {
            let total = ctx.total.to_string();
            let page = ctx.page.page().to_string();
            let pages = ctx.page_count().to_string();
            root.push_attribute(("total", total.as_str()));
            root.push_attribute(("page", page.as_str()));
            root.push_attribute(("pages", pages.as_str()));
        }
        emit(out, Event::Start(root))?;
        out.write_all(b"\n")?;

        if self.options.describe_columns {
            emit(out, Event::Start(BytesStart::new("columns")))?;
            for cell in ctx.header_cells() {
                let mut column = BytesStart::new("column");
                column.push_attribute(("field", cell.column.field.as_str()));
                column.push_attribute(("label", cell.column.label.as_str()));
                if let Some(dir) = cell.current {
                    column.push_attribute(("sorted", dir.as_str()));
                }
                emit(out, Event::Empty(column))?;
            }
            emit(out, Event::End(BytesEnd::new("columns")))?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn render_row(
        &mut self,
        ctx: &RenderContext<'_>,
        _index: usize,
        record: &Record,
        out: &mut dyn Write,
    ) -> Result<()> {
        emit(out, Event::Start(BytesStart::new(self.row.as_str())))?;
        for (column, name) in ctx.columns.iter().zip(&self.names) {
            let text = column.cell(record);
            if text.is_empty() {
                emit(out, Event::Empty(BytesStart::new(name.as_str())))?;
            } else {
                emit(out, Event::Start(BytesStart::new(name.as_str())))?;
                emit(out, Event::Text(BytesText::new(&text)))?;
                emit(out, Event::End(BytesEnd::new(name.as_str())))?;
            }
        }
        emit(out, Event::End(BytesEnd::new(self.row.as_str())))?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn render_footer(&mut self, _ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        emit(out, Event::End(BytesEnd::new(self.root.as_str())))?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
