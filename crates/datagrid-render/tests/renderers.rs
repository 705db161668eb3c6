//! Renderer integration tests over a shared window.

use std::io::{self, Write};
use std::sync::Arc;

use datagrid_render::{
    render_to_string, render_window, Column, CsvOptions, CsvRenderer, Format, FormatRule,
    HtmlOptions, HtmlRenderer, LinkBuilder, Links, ListWidgetOptions, ListWidgetRenderer,
    MarkupOptions, RenderContext, Renderer, RendererCapabilities, RequestContext,
    SpreadsheetOptions, SpreadsheetRenderer, StateCoordinator, TemplateOptions, TemplateRenderer,
    XmlRenderer,
};
use datagrid_source::{Dir, PageState, Record, RecordWindow, SortState};

// ============================================================================
// Fixtures
// ============================================================================

fn columns() -> Vec<Column> {
    vec![
        Column::new("name").label("Name"),
        Column::new("balance")
            .label("Balance")
            .format(Format::from_rule(&FormatRule::new("number", ["2"])).unwrap()),
        Column::new("email")
            .label("Email")
            .sortable(false)
            .transform(|value, record| {
                if value.is_null() {
                    format!("({} has none)", record.value("name"))
                } else {
                    value.to_string()
                }
            }),
    ]
}

fn window() -> RecordWindow {
    RecordWindow::new(
        vec![
            Record::new()
                .with("name", "Ada")
                .with("balance", 1234.5)
                .with("email", "ada@example.com"),
            Record::new().with("name", "Grace").with("balance", -3),
        ],
        6,
        SortState::by("name", Dir::Asc),
        PageState::new(2, 2),
    )
}

fn streaming_renderers() -> Vec<Box<dyn Renderer>> {
    vec![
        Box::new(HtmlRenderer::new(HtmlOptions::default())),
        Box::new(ListWidgetRenderer::new(ListWidgetOptions::default())),
        Box::new(CsvRenderer::new(CsvOptions::default())),
        Box::new(XmlRenderer::new(MarkupOptions::default())),
    ]
}

/// Keeps a copy of everything written so far at each write call.
#[derive(Default)]
struct Snapshots {
    buffer: Vec<u8>,
    snapshots: Vec<String>,
}

impl Write for Snapshots {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.snapshots
            .push(String::from_utf8_lossy(&self.buffer).into_owned());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn streaming_renderers_write_rows_before_the_footer() {
    let columns = columns();
    let window = window();
    let coordinator = StateCoordinator::new();
    let request = RequestContext::new("/people");
    let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

    for mut renderer in streaming_renderers() {
        assert_eq!(renderer.capabilities(), RendererCapabilities::STREAMING);
        let mut out = Snapshots::default();
        render_window(renderer.as_mut(), &ctx, &window, &mut out).unwrap();

        let full = String::from_utf8(out.buffer.clone()).unwrap();
        let partial = out
            .snapshots
            .iter()
            .find(|s| s.contains("Ada"))
            .unwrap_or_else(|| panic!("{} never wrote the first row", renderer.name()));
        assert!(
            partial.len() < full.len(),
            "{} held the first row until the end",
            renderer.name()
        );
    }
}

#[test]
fn formats_and_transforms_apply_everywhere() {
    let columns = columns();
    let window = window();
    let coordinator = StateCoordinator::new();
    let request = RequestContext::new("/people");
    let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

    for mut renderer in streaming_renderers() {
        let text = render_to_string(renderer.as_mut(), &ctx, &window).unwrap();
        assert!(text.contains("1,234.50"), "{}: {}", renderer.name(), text);
        assert!(text.contains("-3.00"), "{}: {}", renderer.name(), text);
        assert!(text.contains("(Grace has none)"), "{}: {}", renderer.name(), text);
    }
}

#[test]
fn csv_document() {
    let columns = columns();
    let window = window();
    let coordinator = StateCoordinator::new();
    let request = RequestContext::default();
    let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

    let csv = render_to_string(&mut CsvRenderer::new(CsvOptions::default()), &ctx, &window).unwrap();
    assert_eq!(
        csv,
        "Name,Balance,Email\nAda,\"1,234.50\",ada@example.com\nGrace,-3.00,(Grace has none)\n"
    );
}

#[test]
fn custom_link_builder_reaches_html_headers() {
    let columns = columns();
    let window = window();
    let coordinator = StateCoordinator::new();
    let request = RequestContext::new("/people");
    let builder: LinkBuilder = Arc::new(|sort: &SortState, page: PageState| {
        format!(
            "javascript:grid.sort('{}', '{}', {})",
            sort.field().unwrap_or(""),
            sort.dir().map(Dir::as_str).unwrap_or(""),
            page.page()
        )
    });
    let links = Links::new(&coordinator, &request).with_builder(Some(&builder));
    let ctx = RenderContext::new(&columns, &window, links);

    let html = render_to_string(&mut HtmlRenderer::new(HtmlOptions::default()), &ctx, &window).unwrap();
    assert!(html.contains("href=\"javascript:grid.sort(&#39;name&#39;, &#39;DESC&#39;, 1)\""));
    assert!(html.contains("href=\"javascript:grid.sort(&#39;balance&#39;, &#39;ASC&#39;, 1)\""));
    assert!(!html.contains("&#39;email&#39;"));
}

#[test]
fn spreadsheet_writes_nothing_to_the_text_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.xml");
    let columns = columns();
    let window = window();
    let coordinator = StateCoordinator::new();
    let request = RequestContext::default();
    let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

    let mut renderer = SpreadsheetRenderer::new(SpreadsheetOptions {
        destination: datagrid_render::OutputDestination::file(&path),
        ..SpreadsheetOptions::default()
    });
    assert!(renderer.capabilities().buffered);
    let text = render_to_string(&mut renderer, &ctx, &window).unwrap();
    assert!(text.is_empty());

    let doc = std::fs::read_to_string(&path).unwrap();
    assert!(doc.contains("<Data ss:Type=\"String\">1,234.50</Data>"));
    assert!(doc.contains("<Data ss:Type=\"String\">Grace</Data>"));
}

#[test]
fn template_composition_sees_paging() {
    let columns = columns();
    let window = window();
    let coordinator = StateCoordinator::new();
    let request = RequestContext::new("/people");
    let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

    let mut renderer = TemplateRenderer::new(TemplateOptions::new(
        "rows {{ page.start + 1 }}-{{ page.start + rows|length }} of {{ page.total }}",
    ));
    assert!(renderer.capabilities().composition);
    let text = render_to_string(&mut renderer, &ctx, &window).unwrap();
    assert_eq!(text, "rows 3-4 of 6");
}

#[test]
fn markup_renderers_escape_cell_values_and_links() {
    let columns = columns();
    let window = RecordWindow::new(
        vec![Record::new()
            .with("name", "<script>alert(1)</script>")
            .with("balance", 1)],
        1,
        SortState::by("name", Dir::Asc),
        PageState::new(1, 2),
    );
    let coordinator = StateCoordinator::new();
    let request = RequestContext::new("/people").param("tab", "2");
    let ctx = RenderContext::new(&columns, &window, Links::new(&coordinator, &request));

    let renderers: Vec<Box<dyn Renderer>> = vec![
        Box::new(HtmlRenderer::new(HtmlOptions::default())),
        Box::new(TemplateRenderer::new(TemplateOptions::default())),
    ];
    for mut renderer in renderers {
        let text = render_to_string(renderer.as_mut(), &ctx, &window).unwrap();
        assert!(!text.contains("<script>"), "{}: {}", renderer.name(), text);
        assert!(text.contains("&lt;script&gt;"), "{}: {}", renderer.name(), text);
        assert!(!text.contains("&orderBy"), "{}: {}", renderer.name(), text);
    }
}
