//! End-to-end grid behaviour: bind, resolve state, fetch, render.

use std::sync::{Arc, Mutex};

use datagrid::{
    BindOptions, Column, DataGrid, Dir, DriverKind, FillTarget, Filter, Form, FormElement,
    FormOptions, GridConfig, GridError, MapperOptions, MemoryTable, Op, OutputDestination,
    PageState, Pager, PagerOptions, Record, RenderError, RenderOutput, RendererConfig,
    RequestContext, SortState, SourceInput, SpreadsheetOptions, SqlOptions, XmlOptions,
};
use rusqlite::Connection;

// ============================================================================
// Fixtures: five people, four drivers
// ============================================================================

const PEOPLE: [(i64, &str, i64); 5] = [
    (1, "Ada", 36),
    (2, "Grace", 85),
    (3, "Linus", 28),
    (4, "Barbara", 36),
    (5, "Ken", 70),
];

fn records() -> Vec<Record> {
    PEOPLE
        .iter()
        .map(|(id, name, age)| {
            Record::new()
                .with("id", *id)
                .with("first_name", *name)
                .with("age", *age)
        })
        .collect()
}

fn connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE people (id INTEGER, first_name TEXT, age INTEGER)")
        .unwrap();
    for (id, name, age) in PEOPLE {
        conn.execute("INSERT INTO people VALUES (?1, ?2, ?3)", (id, name, age))
            .unwrap();
    }
    conn
}

fn document() -> String {
    let mut doc = String::from("<people>");
    for (id, name, age) in PEOPLE {
        doc.push_str(&format!(
            r#"<person id="{id}"><first_name>{name}</first_name><age>{age}</age></person>"#
        ));
    }
    doc.push_str("</people>");
    doc
}

fn grids(page_size: usize) -> Vec<(DriverKind, DataGrid)> {
    let config = GridConfig::default().page_size(page_size);
    let options = BindOptions::default()
        .sql(SqlOptions::new("SELECT * FROM people"))
        .xml(XmlOptions::new("/people/person"));
    let inputs: Vec<SourceInput> = vec![
        records().into(),
        connection().into(),
        SourceInput::Document(document()),
        SourceInput::mapper(MemoryTable::new(records())),
    ];
    inputs
        .into_iter()
        .map(|input| {
            let mut grid = DataGrid::with_config(config.clone()).unwrap();
            let kind = DriverKind::detect(&input).unwrap();
            grid.bind(input, &options).unwrap();
            (kind, grid)
        })
        .collect()
}

fn names(grid: &mut DataGrid, request: &RequestContext) -> Vec<String> {
    grid.window(request)
        .unwrap()
        .iter()
        .map(|r| r.value("first_name").to_string())
        .collect()
}

// ============================================================================
// Paging and sorting scenarios
// ============================================================================

#[test]
fn five_rows_in_pages_of_four() {
    for (kind, mut grid) in grids(4) {
        let page1 = grid.window(&RequestContext::default()).unwrap();
        assert_eq!((page1.len(), page1.total(), page1.start()), (4, 5, 0), "{}", kind);

        let page2 = grid
            .window(&RequestContext::new("/").param("page", "2"))
            .unwrap();
        assert_eq!((page2.len(), page2.total(), page2.start()), (1, 5, 4), "{}", kind);
    }
}

#[test]
fn page_past_the_end_clamps() {
    for (kind, mut grid) in grids(4) {
        grid.set_page(99);
        let window = grid.window(&RequestContext::default()).unwrap();
        assert_eq!(window.page(), PageState::new(2, 4), "{}", kind);
        assert_eq!(window.len(), 1, "{}", kind);
    }
}

#[test]
fn every_driver_sorts_the_same_way() {
    let request = RequestContext::from_url("/people?orderBy=first_name&direction=DESC");
    for (kind, mut grid) in grids(0) {
        assert_eq!(
            names(&mut grid, &request),
            ["Linus", "Ken", "Grace", "Barbara", "Ada"],
            "{}",
            kind
        );
    }
}

#[test]
fn unknown_explicit_sort_field_fails_the_render() {
    for (kind, mut grid) in grids(4) {
        grid.set_sort("salary", Dir::Asc);
        let err = grid
            .render(&RendererConfig::named("html").unwrap(), &RequestContext::default())
            .unwrap_err();
        assert!(err.is_invalid_field(), "{}: {:?}", kind, err);
    }
}

#[test]
fn garbage_request_parameters_fall_back_to_defaults() {
    for (kind, mut grid) in grids(4) {
        let request = RequestContext::new("/")
            .param("page", "-3")
            .param("orderBy", "salary")
            .param("direction", "sideways");
        let window = grid.window(&request).unwrap();
        assert_eq!(window.page().page(), 1, "{}", kind);
        assert_eq!(window.sort(), &SortState::unsorted(), "{}", kind);
    }
}

// ============================================================================
// Columns
// ============================================================================

#[test]
fn dropping_a_column_leaves_the_others() {
    let (_, mut grid) = grids(0).remove(0);
    grid.generate_columns().unwrap();
    let csv = RendererConfig::named("csv").unwrap();

    let before = grid.render(&csv, &RequestContext::default()).unwrap();
    assert!(before.text().unwrap().starts_with("id,first_name,age\n1,Ada,36\n"));

    let dropped = grid.drop_column("first_name").unwrap();
    assert_eq!(dropped.field, "first_name");
    let after = grid.render(&csv, &RequestContext::default()).unwrap();
    assert!(after.text().unwrap().starts_with("id,age\n1,36\n2,85\n"));
    assert_eq!(grid.fields(), ["id", "first_name", "age"]);
}

#[test]
fn explicit_column_replaces_generated_one_in_place() {
    let (_, mut grid) = grids(0).remove(0);
    grid.generate_columns().unwrap();
    grid.add_column(Column::new("first_name").label("Name"));
    let labels: Vec<&str> = grid.columns().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["id", "Name", "age"]);
}

#[test]
fn header_encodes_next_direction() {
    let (_, mut grid) = grids(0).remove(0);
    grid.add_column(Column::new("first_name").label("Name"));
    grid.add_column(Column::new("age").label("Age").default_dir(Dir::Desc));
    let html = RendererConfig::named("html").unwrap();

    let request = RequestContext::from_url("/p?orderBy=first_name&direction=ASC");
    let text = grid.render(&html, &request).unwrap().into_text().unwrap();
    assert!(text.contains("href=\"/p?direction=DESC&amp;orderBy=first_name\""), "{}", text);
    // unsorted column offers its default
    assert!(text.contains("href=\"/p?direction=DESC&amp;orderBy=age\""), "{}", text);

    let request = RequestContext::from_url("/p?orderBy=first_name&direction=DESC");
    let text = grid.render(&html, &request).unwrap().into_text().unwrap();
    assert!(text.contains("href=\"/p?direction=ASC&amp;orderBy=first_name\""), "{}", text);
}

// ============================================================================
// Binding options
// ============================================================================

#[test]
fn filters_and_field_selection_apply_to_every_driver() {
    let options = BindOptions::default()
        .sql(SqlOptions::new("SELECT * FROM people"))
        .xml(XmlOptions::new("//person"))
        .fields(["first_name", "age"])
        .filter(Filter::new("age", Op::Gte, 36));
    let inputs: Vec<SourceInput> = vec![
        records().into(),
        connection().into(),
        SourceInput::Document(document()),
        SourceInput::mapper(MemoryTable::new(records())),
    ];
    for input in inputs {
        let mut grid = DataGrid::new();
        grid.bind(input, &options).unwrap();
        assert_eq!(grid.fields(), ["first_name", "age"]);
        assert_eq!(grid.record_count().unwrap(), 4);
    }
}

#[test]
fn unknown_filter_field_fails_bind() {
    let mut grid = DataGrid::new();
    let options = BindOptions::default().filter(Filter::eq("salary", 1));
    let err = grid.bind(records(), &options).unwrap_err();
    assert!(err.is_invalid_field());
    assert!(!grid.is_bound());
}

#[test]
fn driver_names_and_mismatches() {
    let mut grid = DataGrid::new();
    assert!(matches!(
        grid.bind_named("ldap", records(), &BindOptions::default()),
        Err(GridError::UnknownDriver(_))
    ));
    let err = grid
        .bind_named("xml", records(), &BindOptions::default())
        .unwrap_err();
    assert!(matches!(err, GridError::Bind { driver: "xml", operation: "bind", .. }));

    let mut grid = DataGrid::new();
    let options = BindOptions::default().mapper(MapperOptions {
        query: Some("missing".into()),
        ..MapperOptions::default()
    });
    let err = grid
        .bind(SourceInput::mapper(MemoryTable::new(records())), &options)
        .unwrap_err();
    assert!(matches!(err, GridError::Bind { driver: "table_mapper", .. }));
}

#[test]
fn malformed_query_fails_bind() {
    let mut grid = DataGrid::new();
    let options = BindOptions::default().sql(SqlOptions::new("SELECT * FROM nowhere"));
    let err = grid.bind(connection(), &options).unwrap_err();
    assert!(matches!(err, GridError::Bind { driver: "sql", operation: "bind", .. }));
}

// ============================================================================
// Renderers
// ============================================================================

#[test]
fn unknown_renderer() {
    let (_, mut grid) = grids(0).remove(0);
    let err = grid
        .render_named("pdf", &RequestContext::default())
        .unwrap_err();
    assert!(matches!(err, GridError::UnknownRenderer(name) if name == "pdf"));
}

#[test]
fn streaming_render_writes_to_the_caller() {
    let (_, mut grid) = grids(2).remove(0);
    grid.add_column(Column::new("first_name"));
    let mut out = Vec::new();
    let result = grid
        .render_to(
            &RendererConfig::named("csv").unwrap(),
            &RequestContext::default(),
            &mut out,
        )
        .unwrap();
    assert_eq!(result, RenderOutput::Streamed);
    assert_eq!(String::from_utf8(out).unwrap(), "first_name\nAda\nGrace\n");
}

#[test]
fn buffered_renderer_cannot_stream() {
    let (_, mut grid) = grids(2).remove(0);
    let err = grid
        .render_to(
            &RendererConfig::named("spreadsheet").unwrap(),
            &RequestContext::default(),
            &mut Vec::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        GridError::Render {
            source: RenderError::Unsupported { .. },
            ..
        }
    ));
}

#[test]
fn spreadsheet_is_written_to_its_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xml");
    let (_, mut grid) = grids(0).remove(0);
    let config = RendererConfig::Spreadsheet(SpreadsheetOptions {
        destination: OutputDestination::file(&path),
        ..SpreadsheetOptions::default()
    });

    let output = grid.render(&config, &RequestContext::default()).unwrap();
    assert_eq!(output, RenderOutput::Written(OutputDestination::file(&path)));
    let doc = std::fs::read_to_string(&path).unwrap();
    assert!(doc.contains("<Data ss:Type=\"Number\">85</Data>"));
}

#[test]
fn renderer_failures_name_the_renderer() {
    let (_, mut grid) = grids(0).remove(0);
    let config = RendererConfig::Template(datagrid::TemplateOptions::new("{% for %}"));
    let err = grid.render(&config, &RequestContext::default()).unwrap_err();
    assert!(matches!(err, GridError::Render { renderer: "template", .. }));
}

#[test]
fn url_template_links() {
    let config = GridConfig::default()
        .page_size(2)
        .url_format("/people/:page/:orderBy/:direction")
        .script_name("/index.php");
    let mut grid = DataGrid::with_config(config).unwrap();
    grid.bind(records(), &BindOptions::default()).unwrap();
    grid.add_column(Column::new("first_name"));

    let request = RequestContext::new("/").path("/index.php/people/3/first_name/DESC");
    let window = grid.window(&request).unwrap();
    assert_eq!(window.page().page(), 3);
    assert_eq!(window.records()[0].value("first_name").to_string(), "Ada");

    let html = grid
        .render(&RendererConfig::named("html").unwrap(), &request)
        .unwrap()
        .into_text()
        .unwrap();
    assert!(html.contains("href=\"/index.php/people/1/first_name/ASC\""), "{}", html);
}

#[test]
fn custom_link_builder() {
    let (_, mut grid) = grids(0).remove(0);
    grid.add_column(Column::new("age"));
    grid.set_link_builder(|sort: &SortState, _page: PageState| {
        format!("#sort-{}", sort.field().unwrap_or(""))
    });
    let html = grid
        .render_named("html", &RequestContext::new("/ignored"))
        .unwrap()
        .into_text()
        .unwrap();
    assert!(html.contains("<a href=\"#sort-age\">age</a>"));
}

// ============================================================================
// Fill targets
// ============================================================================

#[test]
fn form_fill_reflects_request_state() {
    let (_, mut grid) = grids(2).remove(0);
    let mut form = Form::new();
    let request = RequestContext::from_url("/p?orderBy=age&direction=DESC&page=2");
    let output = grid
        .fill("form", FillTarget::Form(&mut form, FormOptions::default()), &request)
        .unwrap();
    assert_eq!(output, RenderOutput::Filled);
    assert_eq!(
        form.element("page"),
        Some(&FormElement::Hidden {
            name: "page".into(),
            value: "2".into()
        })
    );
}

#[test]
fn pager_fill() {
    let (_, mut grid) = grids(2).remove(0);
    let mut pager = Pager::new();
    grid.fill(
        "pager",
        FillTarget::Pager(&mut pager, PagerOptions::default()),
        &RequestContext::new("/p").param("page", "2"),
    )
    .unwrap();
    assert_eq!((pager.page, pager.pages, pager.total), (2, 3, 5));
    assert_eq!(pager.numbers(), [1, 2, 3]);
}

#[test]
fn fill_requires_a_matching_fill_renderer() {
    let (_, mut grid) = grids(2).remove(0);
    let mut form = Form::new();
    let err = grid
        .fill(
            "html",
            FillTarget::Form(&mut form, FormOptions::default()),
            &RequestContext::default(),
        )
        .unwrap_err();
    assert!(matches!(err, GridError::Render { renderer: "html", .. }));

    let err = grid
        .fill(
            "pager",
            FillTarget::Form(&mut form, FormOptions::default()),
            &RequestContext::default(),
        )
        .unwrap_err();
    assert!(matches!(err, GridError::Render { renderer: "pager", .. }));
    assert!(form.elements().is_empty());

    assert!(matches!(
        grid.render_named("form", &RequestContext::default()),
        Err(GridError::Render { renderer: "form", .. })
    ));
}

// ============================================================================
// Logging
// ============================================================================

/// Collects the level and message of every event.
struct LogCapture {
    logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        struct MessageVisitor(String);

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{:?}", value);
                }
            }
        }

        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.logs
            .lock()
            .unwrap()
            .push(format!("[{}] {}", event.metadata().level(), visitor.0));
    }
}

#[test]
fn dropped_request_parameters_are_logged() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let logs = Arc::new(Mutex::new(Vec::new()));
    let _guard = tracing_subscriber::registry()
        .with(LogCapture { logs: logs.clone() })
        .set_default();

    let (_, mut grid) = grids(4).remove(0);
    grid.window(&RequestContext::new("/").param("page", "zero"))
        .unwrap();

    let captured = logs.lock().unwrap();
    assert!(
        captured
            .iter()
            .any(|log| log.starts_with("[WARN]") && log.contains("malformed page")),
        "{:?}",
        *captured
    );
}
