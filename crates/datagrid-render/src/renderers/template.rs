//! Container-composition renderer.
//!
//! Rows are collected as structured data during the pass and handed to a
//! [`TemplateEngine`] in the footer together with the column and paging
//! metadata. The template sees:
//!
//! ```text
//! columns: [{ field, label, sortable, current, next, href, attributes }]
//! rows:    [{ cells: [..], record: { field: value, .. } }]
//! page:    { number, size, count, total, start, first, prev, next, last }
//! ```
//!
//! `current`/`next` are `"ASC"`, `"DESC"` or null. The `page` links are
//! null when they would point outside the page range.
//!
//! Output is HTML-escaped unless [`TemplateOptions::auto_escape`] is off.

use std::io::Write;

use datagrid_source::Record;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::Result;
use crate::renderer::{RenderContext, Renderer, RendererCapabilities};
use crate::template::{MiniJinjaEngine, TemplateEngine};

// The extension selects minijinja's auto-escape mode.
const HTML_TEMPLATE_NAME: &str = "datagrid.html";
const TEXT_TEMPLATE_NAME: &str = "datagrid.txt";

const DEFAULT_TEMPLATE: &str = "\
<table>
<tr>{% for c in columns %}<th>{% if c.href %}<a href=\"{{ c.href }}\">{{ c.label }}</a>{% else %}{{ c.label }}{% endif %}</th>{% endfor %}</tr>
{% for row in rows %}<tr>{% for cell in row.cells %}<td>{{ cell }}</td>{% endfor %}</tr>
{% endfor %}</table>
";

/// Options for [`TemplateRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Template source, compiled in `prepare`.
    pub source: String,
    /// HTML-escape every interpolated value. Turn off for non-markup output.
    pub auto_escape: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        TemplateOptions::new(DEFAULT_TEMPLATE)
    }
}

impl TemplateOptions {
    pub fn new(source: impl Into<String>) -> Self {
        TemplateOptions {
            source: source.into(),
            auto_escape: true,
        }
    }

    pub fn auto_escape(mut self, enabled: bool) -> Self {
        self.auto_escape = enabled;
        self
    }

    fn template_name(&self) -> &'static str {
        if self.auto_escape {
            HTML_TEMPLATE_NAME
        } else {
            TEXT_TEMPLATE_NAME
        }
    }
}

/// Drives a template engine with the window's rows.
pub struct TemplateRenderer {
    options: TemplateOptions,
    engine: Box<dyn TemplateEngine>,
    rows: Vec<JsonValue>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("options", &self.options)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

impl TemplateRenderer {
    /// Uses a fresh [`MiniJinjaEngine`].
    pub fn new(options: TemplateOptions) -> Self {
        Self::with_engine(options, MiniJinjaEngine::new())
    }

    pub fn with_engine(options: TemplateOptions, engine: impl TemplateEngine + 'static) -> Self {
        TemplateRenderer {
            options,
            engine: Box::new(engine),
            rows: Vec::new(),
        }
    }

    fn data(&self, ctx: &RenderContext<'_>) -> JsonValue {
        let columns: Vec<JsonValue> = ctx
            .header_cells()
            .into_iter()
            .map(|cell| {
                json!({
                    "field": cell.column.field,
                    "label": cell.column.label,
                    "sortable": cell.column.sortable,
                    "current": cell.current.map(|d| d.as_str()),
                    "next": cell.next.map(|d| d.as_str()),
                    "href": cell.href,
                    "attributes": cell.column.attributes,
                })
            })
            .collect();

        let number = ctx.page.page();
        let count = ctx.page_count();
        let link = |page: usize| (page >= 1 && page <= count).then(|| ctx.page_href(page));
        json!({
            "columns": columns,
            "rows": self.rows,
            "page": {
                "number": number,
                "size": ctx.page.size(),
                "count": count,
                "total": ctx.total,
                "start": ctx.start,
                "first": link(1),
                "prev": link(number.saturating_sub(1)),
                "next": link(number + 1),
                "last": link(count),
            },
        })
    }
}

impl Renderer for TemplateRenderer {
    fn name(&self) -> &'static str {
        "template"
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::COMPOSITION
    }

    fn prepare(&mut self, _ctx: &RenderContext<'_>) -> Result<()> {
        self.rows.clear();
        self.engine
            .add_template(self.options.template_name(), &self.options.source)
    }

    fn render_header(&mut self, _ctx: &RenderContext<'_>, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn render_row(
        &mut self,
        ctx: &RenderContext<'_>,
        _index: usize,
        record: &Record,
        _out: &mut dyn Write,
    ) -> Result<()> {
        self.rows.push(json!({
            "cells": ctx.cells(record),
            "record": serde_json::to_value(record)?,
        }));
        Ok(())
    }

    fn render_footer(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        let data = self.data(ctx);
        let text = self.engine.render_named(self.options.template_name(), &data)?;
        out.write_all(text.as_bytes())?;
        self.rows.clear();
        Ok(())
    }
}
