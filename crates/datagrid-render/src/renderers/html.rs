//! HTML table renderer.

use std::collections::BTreeMap;
use std::io::Write;

use datagrid_source::{Dir, Record};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::renderer::{RenderContext, Renderer, RendererCapabilities};
use crate::util::{escape_html, html_attributes};

/// Options for [`HtmlRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    /// Attributes on the `<table>` element.
    pub table_attributes: BTreeMap<String, String>,
    /// Attributes on the header `<tr>`.
    pub header_attributes: BTreeMap<String, String>,
    /// Attributes on every body `<tr>`.
    pub row_attributes: BTreeMap<String, String>,
    /// Class of odd rows (1st, 3rd, ...).
    pub odd_class: Option<String>,
    pub even_class: Option<String>,
    pub show_header: bool,
    /// Raw markup appended to the active sort column's header.
    pub sort_icon_asc: String,
    pub sort_icon_desc: String,
    /// Shown in a full-width row when the window is empty.
    pub empty_message: Option<String>,
    /// Prepends a `#` column with the absolute row number.
    pub row_numbers: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        let mut table_attributes = BTreeMap::new();
        table_attributes.insert("class".to_string(), "datagrid".to_string());
        HtmlOptions {
            table_attributes,
            header_attributes: BTreeMap::new(),
            row_attributes: BTreeMap::new(),
            odd_class: Some("odd".to_string()),
            even_class: Some("even".to_string()),
            show_header: true,
            sort_icon_asc: " &#8593;".to_string(),
            sort_icon_desc: " &#8595;".to_string(),
            empty_message: None,
            row_numbers: false,
        }
    }
}

/// Renders a window as an HTML `<table>`, one `<tr>` per record.
///
/// Streams: every row is written as soon as it is rendered.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    options: HtmlOptions,
    rows: usize,
}

impl HtmlRenderer {
    pub fn new(options: HtmlOptions) -> Self {
        HtmlRenderer { options, rows: 0 }
    }

    fn row_class(&self, index: usize) -> Option<&str> {
        if index % 2 == 0 {
            self.options.odd_class.as_deref()
        } else {
            self.options.even_class.as_deref()
        }
    }
}

impl Renderer for HtmlRenderer {
    fn name(&self) -> &'static str {
        "html"
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::STREAMING
    }

    fn prepare(&mut self, _ctx: &RenderContext<'_>) -> Result<()> {
        self.rows = 0;
        Ok(())
    }

    fn render_header(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "<table{}>", html_attributes(&self.options.table_attributes))?;
        if !self.options.show_header {
            writeln!(out, "<tbody>")?;
            return Ok(());
        }

        let mut line = format!("<tr{}>", html_attributes(&self.options.header_attributes));
        if self.options.row_numbers {
            line.push_str("<th>#</th>");
        }
        for cell in ctx.header_cells() {
            let label = escape_html(&cell.column.label);
            let content = match &cell.href {
                Some(href) => format!("<a href=\"{}\">{}</a>", escape_html(href), label),
                None => label,
            };
            let icon = match cell.current {
                Some(Dir::Asc) => self.options.sort_icon_asc.as_str(),
                Some(Dir::Desc) => self.options.sort_icon_desc.as_str(),
                None => "",
            };
            line.push_str(&format!(
                "<th{}>{}{}</th>",
                html_attributes(&cell.column.attributes),
                content,
                icon
            ));
        }
        line.push_str("</tr>");
        writeln!(out, "<thead>\n{}\n</thead>\n<tbody>", line)?;
        Ok(())
    }

    fn render_row(
        &mut self,
        ctx: &RenderContext<'_>,
        index: usize,
        record: &Record,
        out: &mut dyn Write,
    ) -> Result<()> {
        let mut attrs = self.options.row_attributes.clone();
        if let Some(class) = self.row_class(index) {
            let merged = match attrs.get("class") {
                Some(existing) => format!("{} {}", existing, class),
                None => class.to_string(),
            };
            attrs.insert("class".to_string(), merged);
        }

        let mut line = format!("<tr{}>", html_attributes(&attrs));
        if self.options.row_numbers {
            line.push_str(&format!("<td>{}</td>", ctx.start + index + 1));
        }
        for column in ctx.columns {
            line.push_str(&format!(
                "<td{}>{}</td>",
                html_attributes(&column.attributes),
                escape_html(&column.cell(record))
            ));
        }
        line.push_str("</tr>");
        writeln!(out, "{}", line)?;
        self.rows += 1;
        Ok(())
    }

    fn render_footer(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        if self.rows == 0 {
            if let Some(message) = &self.options.empty_message {
                let span = ctx.columns.len() + usize::from(self.options.row_numbers);
                writeln!(
                    out,
                    "<tr><td colspan=\"{}\">{}</td></tr>",
                    span.max(1),
                    escape_html(message)
                )?;
            }
        }
        writeln!(out, "</tbody>\n</table>")?;
        Ok(())
    }
}
