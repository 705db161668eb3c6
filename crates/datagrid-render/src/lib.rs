//! # Datagrid Render - Columns, Links and Output Renderers
//!
//! `datagrid-render` turns a [`RecordWindow`](datagrid_source::RecordWindow)
//! into output. It owns everything between the fetched rows and the bytes
//! on the wire:
//!
//! ## Core Concepts
//!
//! - [`Column`] / [`ColumnRegistry`]: ordered display columns with labels,
//!   formatting rules, sortability and display attributes
//! - [`Format`]: numeric and date formatting rules, built from a
//!   [`FormatRule`] name plus positional arguments
//! - [`StateCoordinator`]: decodes sort and page state from a
//!   [`RequestContext`] and encodes it back into links, either as query
//!   parameters or through a [`UrlFormat`] template
//! - [`Renderer`]: the driver contract; see [`renderers`] for the variants
//! - [`fill`]: populators for forms and pagers that produce no text
//!
//! ## Quick Start
//!
//! ```rust
//! use datagrid_render::{
//!     render_to_string, Column, HtmlOptions, HtmlRenderer, Links, RenderContext,
//!     RequestContext, StateCoordinator,
//! };
//! use datagrid_source::{Dir, PageState, Record, RecordWindow, SortState};
//!
//! let columns = vec![Column::new("name").label("Name"), Column::new("age")];
//! let window = RecordWindow::new(
//!     vec![Record::new().with("name", "Ada").with("age", 36)],
//!     1,
//!     SortState::by("age", Dir::Asc),
//!     PageState::new(1, 10),
//! );
//!
//! let coordinator = StateCoordinator::new();
//! let request = RequestContext::new("/people");
//! let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));
//!
//! let html = render_to_string(&mut HtmlRenderer::new(HtmlOptions::default()), &ctx, &window).unwrap();
//! assert!(html.contains("<td>Ada</td><td>36</td>"));
//! // the active column links to the opposite direction
//! assert!(html.contains("href=\"/people?direction=DESC&amp;orderBy=age&amp;page=1\""));
//! ```
//!
//! ## Round-tripping Sort State
//!
//! Every link the renderers emit decodes back to the state it encodes:
//!
//! ```rust
//! use datagrid_render::{RequestContext, StateCoordinator};
//! use datagrid_source::{Dir, PageState, SortState};
//!
//! let coordinator = StateCoordinator::new();
//! let request = RequestContext::new("/people").param("tab", "all");
//! let href = coordinator.link(&request, &SortState::by("age", Dir::Desc), PageState::new(3, 10));
//! assert_eq!(href, "/people?direction=DESC&orderBy=age&page=3&tab=all");
//!
//! let state = coordinator.parse(&RequestContext::from_url(&href), |_| Some(Dir::Asc));
//! assert_eq!(state.sort, Some(SortState::by("age", Dir::Desc)));
//! assert_eq!(state.page, Some(3));
//! ```
//!
//! Malformed incoming parameters never fail a parse; they are logged at
//! `warn` and dropped, leaving the caller's defaults in effect.

mod column;
mod error;
pub mod fill;
mod format;
mod output;
mod renderer;
pub mod renderers;
mod state;
pub mod template;
mod util;

// Re-export public API
pub use column::{Column, ColumnRegistry, Transform};
pub use error::{RenderError, Result};
pub use fill::{
    fill_form, fill_pager, Form, FormElement, FormOptions, FormTarget, LinkKind, Pager, PagerLink,
    PagerOptions, PagerTarget,
};
pub use format::{Format, FormatRule};
pub use output::OutputDestination;
pub use renderer::{
    render_to_string, render_window, HeaderCell, RenderContext, RenderOutput, Renderer,
    RendererCapabilities,
};
pub use renderers::{
    CsvOptions, CsvRenderer, HtmlOptions, HtmlRenderer, LineEnding, ListWidgetOptions,
    ListWidgetRenderer, MarkupOptions, SpreadsheetOptions, SpreadsheetRenderer, TemplateOptions,
    TemplateRenderer, XmlRenderer,
};
pub use state::{
    LinkBuilder, Links, ParamNames, RequestContext, RequestState, StateCoordinator, UrlFormat,
};
pub use template::{MiniJinjaEngine, TemplateEngine};
pub use util::{escape_html, sanitize_xml_name};
