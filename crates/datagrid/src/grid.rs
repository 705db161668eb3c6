//! The grid orchestrator.

use std::io::Write;
use std::sync::Arc;

use datagrid_render::{
    fill_form, fill_pager, render_window, Column, ColumnRegistry, LinkBuilder, Links,
    RenderContext, RenderError, RenderOutput, RequestContext, StateCoordinator,
};
use datagrid_source::{Binding, Dir, PageState, RecordWindow, SortState, SourceError};
use tracing::debug;

use crate::config::{BindOptions, GridConfig};
use crate::error::{GridError, Result};
use crate::registry::{self, DriverKind, FillTarget, RendererConfig, RendererKind, SourceInput};

/// A data grid: one bound source, its columns and its sort/page state.
///
/// A render pass resolves the state, fetches one window from the source
/// and drives a renderer over it:
///
/// ```text
/// explicit override  >  request parameters  >  configured default
///          \                    |                    /
///           SortState + PageState  ->  Binding::fetch  ->  Renderer
/// ```
///
/// # Example
///
/// ```rust
/// use datagrid::{BindOptions, Column, DataGrid, GridConfig, Record, RendererConfig, RequestContext};
///
/// let rows = vec![
///     Record::new().with("id", 1).with("name", "Ada"),
///     Record::new().with("id", 2).with("name", "Grace"),
/// ];
///
/// let mut grid = DataGrid::with_config(GridConfig::default().page_size(10)).unwrap();
/// grid.bind(rows, &BindOptions::default()).unwrap();
/// grid.add_column(Column::new("name").label("Name"));
///
/// let request = RequestContext::from_url("/people?orderBy=name&direction=DESC");
/// let output = grid.render(&RendererConfig::named("csv").unwrap(), &request).unwrap();
/// assert_eq!(output.text(), Some("Name\nGrace\nAda\n"));
/// ```
pub struct DataGrid {
    config: GridConfig,
    coordinator: StateCoordinator,
    columns: ColumnRegistry,
    binding: Option<Binding>,
    sort: Option<SortState>,
    page: Option<usize>,
    link_builder: Option<LinkBuilder>,
}

impl std::fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataGrid")
            .field("config", &self.config)
            .field("columns", &self.columns)
            .field("binding", &self.binding)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

impl Default for DataGrid {
    fn default() -> Self {
        DataGrid {
            config: GridConfig::default(),
            coordinator: StateCoordinator::new(),
            columns: ColumnRegistry::new(),
            binding: None,
            sort: None,
            page: None,
            link_builder: None,
        }
    }
}

impl DataGrid {
    /// An unpaged grid with default parameter names.
    pub fn new() -> Self {
        DataGrid::default()
    }

    /// Fails with [`GridError::Config`] if the URL template is invalid.
    pub fn with_config(config: GridConfig) -> Result<Self> {
        let coordinator = config.coordinator()?;
        Ok(DataGrid {
            config,
            coordinator,
            ..DataGrid::default()
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    // =========================================================================
    // Binding and columns
    // =========================================================================

    /// Binds a source, choosing the driver from the input.
    pub fn bind(&mut self, input: impl Into<SourceInput>, options: &BindOptions) -> Result<()> {
        let input = input.into();
        let kind = DriverKind::detect(&input)?;
        self.bind_with(kind, input, options)
    }

    /// Binds a source with an explicit driver.
    ///
    /// The previous binding, its cached rows and any generated columns are
    /// discarded. On failure the grid is left unbound.
    pub fn bind_with(
        &mut self,
        kind: DriverKind,
        input: impl Into<SourceInput>,
        options: &BindOptions,
    ) -> Result<()> {
        self.binding = None;
        self.columns.clear_generated();
        let binding = registry::open(kind, input.into(), options)?;
        debug!(driver = %kind, fields = ?binding.fields(), "grid bound");
        self.binding = Some(binding);
        Ok(())
    }

    /// Binds by driver name; unknown names fail with [`GridError::UnknownDriver`].
    pub fn bind_named(
        &mut self,
        driver: &str,
        input: impl Into<SourceInput>,
        options: &BindOptions,
    ) -> Result<()> {
        let kind = driver.parse::<DriverKind>()?;
        self.bind_with(kind, input, options)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Fields of the bound source, in source order.
    pub fn fields(&self) -> &[String] {
        self.binding.as_ref().map(Binding::fields).unwrap_or_default()
    }

    /// Adds a column, replacing any column (generated or not) for the same field.
    pub fn add_column(&mut self, column: Column) {
        self.columns.add(column);
    }

    pub fn drop_column(&mut self, field: &str) -> Option<Column> {
        self.columns.drop_column(field)
    }

    /// Generates one column per bound field unless columns were added
    /// explicitly. Returns the number of columns generated.
    pub fn generate_columns(&mut self) -> Result<usize> {
        let binding = self.binding.as_ref().ok_or(GridError::NotBound)?;
        Ok(self
            .columns
            .generate(binding.fields().iter().map(String::as_str)))
    }

    pub fn columns(&self) -> &[Column] {
        self.columns.columns()
    }

    pub fn column(&self, field: &str) -> Option<&Column> {
        self.columns.get(field)
    }

    // =========================================================================
    // Sort and page state
    // =========================================================================

    /// Overrides the sort for every following render, ignoring request
    /// parameters. The field is checked when the window is fetched.
    pub fn set_sort(&mut self, field: impl Into<String>, dir: Dir) {
        self.sort = Some(SortState::by(field, dir));
    }

    /// Drops the sort override.
    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// Overrides the page for every following render. Pages are 1-indexed;
    /// 0 is treated as 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = Some(page.max(1));
    }

    pub fn clear_page(&mut self) {
        self.page = None;
    }

    /// Rows per page; 0 disables paging.
    pub fn set_page_size(&mut self, size: usize) {
        self.config.page_size = size;
    }

    /// Replaces the coordinator's links in every renderer.
    pub fn set_link_builder<F>(&mut self, builder: F)
    where
        F: Fn(&SortState, PageState) -> String + Send + Sync + 'static,
    {
        let builder: LinkBuilder = Arc::new(builder);
        self.link_builder = Some(builder);
    }

    /// Resolves the sort and page a render for `request` would use.
    ///
    /// Request parameters that are malformed, or name unknown or
    /// non-sortable fields, are dropped. An explicit or configured sort on
    /// such a field fails with [`GridError::Bind`].
    pub fn resolve_state(&mut self, request: &RequestContext) -> Result<(SortState, PageState)> {
        self.ensure_columns();
        let columns = &self.columns;
        let incoming = self.coordinator.parse(request, |field| columns.sortable(field));

        let sort = match (&self.sort, incoming.sort) {
            (Some(explicit), _) => self.checked(explicit.clone())?,
            (None, Some(requested)) => requested,
            (None, None) => match &self.config.default_sort {
                Some(default) => self.checked(default.into())?,
                None => SortState::unsorted(),
            },
        };
        let page = self.page.or(incoming.page).unwrap_or(1);
        Ok((sort, PageState::new(page, self.config.page_size)))
    }

    fn checked(&self, sort: SortState) -> Result<SortState> {
        if let Some(field) = sort.field() {
            if self.columns.sortable(field).is_none() {
                let driver = self.binding.as_ref().map_or("grid", Binding::driver);
                return Err(GridError::bind(
                    driver,
                    "fetch",
                    SourceError::invalid_field(driver, field),
                ));
            }
        }
        Ok(sort)
    }

    // =========================================================================
    // Windows
    // =========================================================================

    /// Fetches the window a render for `request` would show.
    pub fn window(&mut self, request: &RequestContext) -> Result<RecordWindow> {
        let (sort, page) = self.resolve_state(request)?;
        let binding = self.binding.as_mut().ok_or(GridError::NotBound)?;
        let driver = binding.driver();
        binding
            .fetch(&sort, page)
            .map_err(|source| GridError::bind(driver, "fetch", source))
    }

    /// Total rows in the bound set.
    pub fn record_count(&mut self) -> Result<usize> {
        let binding = self.binding.as_mut().ok_or(GridError::NotBound)?;
        let driver = binding.driver();
        binding
            .count()
            .map_err(|source| GridError::bind(driver, "count", source))
    }

    /// Pages at the current page size. Always at least 1.
    pub fn page_count(&mut self) -> Result<usize> {
        let total = self.record_count()?;
        Ok(PageState::new(1, self.config.page_size).page_count(total))
    }

    /// Discards cached rows so the next window re-reads the source.
    pub fn refresh(&mut self) -> Result<()> {
        self.binding
            .as_mut()
            .ok_or(GridError::NotBound)?
            .invalidate();
        Ok(())
    }

    fn ensure_columns(&mut self) {
        if self.columns.is_empty() {
            if let Some(binding) = &self.binding {
                let generated = self
                    .columns
                    .generate(binding.fields().iter().map(String::as_str));
                debug!(generated, "generated columns");
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Runs one render pass and returns what it produced.
    ///
    /// Text-producing renderers return [`RenderOutput::Text`]; the
    /// spreadsheet renderer writes its destination and returns
    /// [`RenderOutput::Written`].
    pub fn render(&mut self, config: &RendererConfig, request: &RequestContext) -> Result<RenderOutput> {
        let window = self.window(request)?;
        let mut renderer = config.build();
        let name = renderer.name();

        let mut buffer = Vec::new();
        let links = Links::new(&self.coordinator, request).with_builder(self.link_builder.as_ref());
        let ctx = RenderContext::new(self.columns.columns(), &window, links);
        render_window(renderer.as_mut(), &ctx, &window, &mut buffer)
            .map_err(|source| GridError::render(name, source))?;

        if let Some(destination) = renderer.destination() {
            return Ok(RenderOutput::Written(destination.clone()));
        }
        let text = String::from_utf8(buffer)
            .map_err(|err| GridError::render(name, RenderError::from(err)))?;
        Ok(RenderOutput::Text(text))
    }

    /// Renders with a renderer's default options, selected by name.
    pub fn render_named(&mut self, renderer: &str, request: &RequestContext) -> Result<RenderOutput> {
        let config = RendererConfig::named(renderer)?;
        self.render(&config, request)
    }

    /// Runs one render pass writing straight to `out`.
    ///
    /// Only streaming renderers can do this; others fail with
    /// [`RenderError::Unsupported`] before anything is fetched.
    pub fn render_to(
        &mut self,
        config: &RendererConfig,
        request: &RequestContext,
        out: &mut dyn Write,
    ) -> Result<RenderOutput> {
        let mut renderer = config.build();
        let name = renderer.name();
        if !renderer.capabilities().streaming {
            return Err(GridError::unsupported(name, "streaming"));
        }

        let window = self.window(request)?;
        let links = Links::new(&self.coordinator, request).with_builder(self.link_builder.as_ref());
        let ctx = RenderContext::new(self.columns.columns(), &window, links);
        render_window(renderer.as_mut(), &ctx, &window, out)
            .map_err(|source| GridError::render(name, source))?;
        Ok(RenderOutput::Streamed)
    }

    /// Populates a form or pager with the state a render for `request`
    /// would use.
    ///
    /// `renderer` must name the fill variant matching `target`; other names
    /// fail with [`RenderError::Unsupported`].
    pub fn fill(
        &mut self,
        renderer: &str,
        target: FillTarget<'_>,
        request: &RequestContext,
    ) -> Result<RenderOutput> {
        let kind = renderer.parse::<RendererKind>()?;
        if !kind.is_fill() || kind != target.kind() {
            return Err(GridError::unsupported(kind.as_str(), "fill"));
        }

        let window = self.window(request)?;
        let links = Links::new(&self.coordinator, request).with_builder(self.link_builder.as_ref());
        let ctx = RenderContext::new(self.columns.columns(), &window, links);
        let filled = match target {
            FillTarget::Form(form, options) => fill_form(&ctx, form, &options),
            FillTarget::Pager(pager, options) => fill_pager(&ctx, pager, &options),
        };
        filled.map_err(|source| GridError::render(kind.as_str(), source))?;
        Ok(RenderOutput::Filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_source::Record;

    fn people() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("name", "Ada").with("age", 36),
            Record::new().with("id", 2).with("name", "Grace").with("age", 85),
            Record::new().with("id", 3).with("name", "Linus").with("age", 28),
        ]
    }

    fn bound(page_size: usize) -> DataGrid {
        let mut grid = DataGrid::with_config(GridConfig::default().page_size(page_size)).unwrap();
        grid.bind(people(), &BindOptions::default()).unwrap();
        grid
    }

    #[test]
    fn unbound_grid() {
        let mut grid = DataGrid::new();
        assert!(matches!(grid.record_count(), Err(GridError::NotBound)));
        assert!(matches!(grid.generate_columns(), Err(GridError::NotBound)));
        assert!(matches!(
            grid.window(&RequestContext::default()),
            Err(GridError::NotBound)
        ));
        assert!(grid.fields().is_empty());
    }

    #[test]
    fn explicit_state_wins_over_request() {
        let mut grid = bound(2);
        grid.set_sort("age", Dir::Desc);
        grid.set_page(2);
        let request = RequestContext::new("/").param("orderBy", "name").param("page", "1");
        let (sort, page) = grid.resolve_state(&request).unwrap();
        assert_eq!(sort, SortState::by("age", Dir::Desc));
        assert_eq!(page, PageState::new(2, 2));

        grid.clear_sort();
        grid.clear_page();
        let (sort, page) = grid.resolve_state(&request).unwrap();
        assert_eq!(sort, SortState::by("name", Dir::Asc));
        assert_eq!(page.page(), 1);
    }

    #[test]
    fn configured_default_sort_applies_last() {
        let config = GridConfig::default().default_sort("age", Dir::Desc);
        let mut grid = DataGrid::with_config(config).unwrap();
        grid.bind(people(), &BindOptions::default()).unwrap();

        let (sort, _) = grid.resolve_state(&RequestContext::default()).unwrap();
        assert_eq!(sort, SortState::by("age", Dir::Desc));

        let request = RequestContext::new("/").param("orderBy", "id");
        let (sort, _) = grid.resolve_state(&request).unwrap();
        assert_eq!(sort, SortState::by("id", Dir::Asc));
    }

    #[test]
    fn explicit_sort_on_non_sortable_column_fails() {
        let mut grid = bound(0);
        grid.add_column(Column::new("name"));
        grid.add_column(Column::new("age").sortable(false));
        grid.set_sort("age", Dir::Asc);
        let err = grid.window(&RequestContext::default()).unwrap_err();
        assert!(err.is_invalid_field(), "{:?}", err);
    }

    #[test]
    fn rebinding_drops_generated_columns() {
        let mut grid = bound(0);
        assert_eq!(grid.generate_columns().unwrap(), 3);
        grid.bind(vec![Record::new().with("sku", "A1")], &BindOptions::default())
            .unwrap();
        assert!(grid.columns().is_empty());
        assert_eq!(grid.generate_columns().unwrap(), 1);
        assert_eq!(grid.columns()[0].field, "sku");
    }

    #[test]
    fn page_count_tracks_page_size() {
        let mut grid = bound(2);
        assert_eq!(grid.record_count().unwrap(), 3);
        assert_eq!(grid.page_count().unwrap(), 2);
        grid.set_page_size(0);
        assert_eq!(grid.page_count().unwrap(), 1);
    }
}
