//! Delimited-text renderer.

use std::io::Write;

use datagrid_source::Record;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::renderer::{RenderContext, Renderer, RendererCapabilities};

/// Record terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

/// Options for [`CsvRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter. Must be a single ASCII character.
    pub delimiter: char,
    /// Quote every field, not just those that need it.
    pub quote_all: bool,
    pub line_ending: LineEnding,
    /// Emit the column labels as the first record.
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            quote_all: false,
            line_ending: LineEnding::Lf,
            header: true,
        }
    }
}

/// Renders a window as delimited text, one record per row.
#[derive(Debug, Clone, Default)]
pub struct CsvRenderer {
    options: CsvOptions,
}

impl CsvRenderer {
    pub fn new(options: CsvOptions) -> Self {
        CsvRenderer { options }
    }

    fn builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.options.delimiter as u8)
            .has_headers(false)
            .quote_style(if self.options.quote_all {
                csv::QuoteStyle::Always
            } else {
                csv::QuoteStyle::Necessary
            })
            .terminator(match self.options.line_ending {
                LineEnding::Lf => csv::Terminator::Any(b'\n'),
                LineEnding::Crlf => csv::Terminator::CRLF,
            });
        builder
    }

    /// Writes one record through a fresh writer so each row reaches `out`
    /// immediately.
    fn write_record<I, S>(&self, fields: I, out: &mut dyn Write) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut writer = self.builder().from_writer(Vec::new());
        writer.write_record(fields)?;
        out.write_all(&writer.into_inner()?)?;
        Ok(())
    }
}

impl Renderer for CsvRenderer {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities::STREAMING
    }

    fn prepare(&mut self, _ctx: &RenderContext<'_>) -> Result<()> {
        let delimiter = self.options.delimiter;
        if !delimiter.is_ascii() {
            return Err(RenderError::InvalidFormat(format!(
                "csv delimiter must be a single ASCII character, got '{}'",
                delimiter
            )));
        }
        Ok(())
    }

    fn render_header(&mut self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> Result<()> {
        if self.options.header {
            self.write_record(ctx.columns.iter().map(|c| c.label.as_str()), out)?;
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
        self.write_record(ctx.cells(record), out)
    }

    fn render_footer(&mut self, _ctx: &RenderContext<'_>, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}
