//! Renderer variants.
//!
//! | Renderer | Model | Output |
//! |----------|-------|--------|
//! | [`HtmlRenderer`] | streaming | `<table>` markup |
//! | [`ListWidgetRenderer`] | streaming | XUL `listbox` |
//! | [`CsvRenderer`] | streaming | delimited text |
//! | [`XmlRenderer`] | streaming | XML document |
//! | [`SpreadsheetRenderer`] | buffered | SpreadsheetML written to a destination |
//! | [`TemplateRenderer`] | composition | whatever the template produces |
//!
//! The form and pager populators live in [`crate::fill`]; they do not go
//! through the row-by-row pass.

mod csv;
mod html;
mod list;
mod spreadsheet;
mod template;
mod xml;

use std::io::Write;

use quick_xml::events::Event;
use quick_xml::Writer;

use crate::error::{RenderError, Result};

pub use self::csv::{CsvOptions, CsvRenderer, LineEnding};
pub use html::{HtmlOptions, HtmlRenderer};
pub use list::{ListWidgetOptions, ListWidgetRenderer};
pub use spreadsheet::{SpreadsheetOptions, SpreadsheetRenderer};
pub use template::{TemplateOptions, TemplateRenderer};
pub use xml::{MarkupOptions, XmlRenderer};

/// Writes a single XML event to `out`.
pub(crate) fn emit(out: &mut dyn Write, event: Event<'_>) -> Result<()> {
    Writer::new(out)
        .write_event(event)
        .map_err(RenderError::serialization)
}
