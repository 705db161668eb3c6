//! Spreadsheet renderer (SpreadsheetML 2003 workbook).
//!
//! The workbook is buffered for the whole pass and written to an
//! [`OutputDestination`] in the footer; nothing goes to the text channel.

use std::io::Write;

use datagrid_source::Record;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::emit;
use crate::error::Result;
use crate::output::OutputDestination;
use crate::renderer::{RenderContext, Renderer, RendererCapabilities};

const SS_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";

/// Options for [`SpreadsheetRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetOptions {
    pub destination: OutputDestination,
    pub worksheet: String,
    /// First row holds the column labels.
    pub header: bool,
}

impl Default for SpreadsheetOptions {
    fn default() -> Self {
        SpreadsheetOptions {
            destination: OutputDestination::Stdout,
            worksheet: "Sheet1".to_string(),
            header: true,
        }
    }
}

/// Writes a window as a SpreadsheetML workbook.
///
/// Plain numeric values become `Number` cells; everything else, including
/// formatted numbers, is a `String` cell.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetRenderer {
    options: SpreadsheetOptions,
    buffer: Vec<u8>,
}

impl SpreadsheetRenderer {
    pub fn new(options: SpreadsheetOptions) -> Self {
        SpreadsheetRenderer {
            options,
            buffer: Vec::new(),
        }
    }

    fn write_cell(&mut self, kind: &str, text: &str) -> Result<()> {
        let mut data = BytesStart::new("Data");
        data.push_attribute(("ss:Type", kind));
        emit(&mut self.buffer, Event::Start(BytesStart::new("Cell")))?;
        emit(&mut self.buffer, Event::Start(data))?;
        emit(&mut self.buffer, Event::Text(BytesText::new(text)))?;
        emit(&mut self.buffer, Event::End(BytesEnd::new("Data")))?;
        emit(&mut self.buffer, Event::End(BytesEnd::new("Cell")))?;
        Ok(())
    }
}

impl Renderer for SpreadsheetRenderer {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::BUFFERED
    }

    fn prepare(&mut self, _ctx: &RenderContext<'_>) -> Result<()> {
        self.options.destination.validate()?;
        self.buffer.clear();
        Ok(())
    }

    fn render_header(&mut self, ctx: &RenderContext<'_>, _out: &mut dyn Write) -> Result<()> {
        self.buffer.extend_from_slice(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?mso-application progid=\"Excel.Sheet\"?>\n",
        );
        let mut workbook = BytesStart::new("Workbook");
        workbook.push_attribute(("xmlns", SS_NS));
        workbook.push_attribute(("xmlns:ss", SS_NS));
        emit(&mut self.buffer, Event::Start(workbook))?;

        let mut sheet = BytesStart::new("Worksheet");
        sheet.push_attribute(("ss:Name", self.options.worksheet.as_str()));
        emit(&mut self.buffer, Event::Start(sheet))?;
        emit(&mut self.buffer, Event::Start(BytesStart::new("Table")))?;
        self.buffer.push(b'\n');

        if self.options.header {
            emit(&mut self.buffer, Event::Start(BytesStart::new("Row")))?;
            for column in ctx.columns {
                self.write_cell("String", &column.label)?;
            }
            emit(&mut self.buffer, Event::End(BytesEnd::new("Row")))?;
            self.buffer.push(b'\n');
        }
        Ok(())
    }

    fn render_row(
        &mut self,
        ctx: &RenderContext<'_>,
        _index: usize,
        record: &Record,
        _out: &mut dyn Write,
    ) -> Result<()> {
        emit(&mut self.buffer, Event::Start(BytesStart::new("Row")))?;
        for column in ctx.columns {
            let kind = if column.is_raw_number(record) {
                "Number"
            } else {
                "String"
            };
            self.write_cell(kind, &column.cell(record))?;
        }
        emit(&mut self.buffer, Event::End(BytesEnd::new("Row")))?;
        self.buffer.push(b'\n');
        Ok(())
    }

    fn render_footer(&mut self, _ctx: &RenderContext<'_>, _out: &mut dyn Write) -> Result<()> {
        emit(&mut self.buffer, Event::End(BytesEnd::new("Table")))?;
        emit(&mut self.buffer, Event::End(BytesEnd::new("Worksheet")))?;
        emit(&mut self.buffer, Event::End(BytesEnd::new("Workbook")))?;
        self.buffer.push(b'\n');

        self.options.destination.write_binary(&self.buffer)?;
        debug!(
            destination = %self.options.destination,
            bytes = self.buffer.len(),
            "wrote spreadsheet"
        );
        self.buffer.clear();
        Ok(())
    }

    fn destination(&self) -> Option<&OutputDestination> {
        Some(&self.options.destination)
    }
}
