//! Typed configuration.
//!
//! Everything the grid can be told up front lives in plain structs with
//! serde defaults, so a configuration can be written in code or loaded
//! from YAML:
//!
//! ```rust
//! use datagrid::GridConfig;
//!
//! let config = GridConfig::from_yaml(r#"
//! page_size: 25
//! params:
//!   prefix: "people_"
//! url_format: "/people/:page/:orderBy/:direction"
//! script_name: "/index.php"
//! default_sort:
//!   field: last_name
//!   direction: desc
//! "#).unwrap();
//!
//! assert_eq!(config.page_size, 25);
//! assert_eq!(config.params.order_by_key(), "people_orderBy");
//! ```

use datagrid_render::{ParamNames, StateCoordinator, UrlFormat};
use datagrid_source::{Dir, Filter, MapperOptions, SortState, SqlOptions, XmlOptions};
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Grid-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Rows per page; 0 disables paging.
    pub page_size: usize,
    /// Names of the incoming/outgoing request parameters.
    pub params: ParamNames,
    /// Positional URL template using `:page`, `:orderBy` and `:direction`.
    pub url_format: Option<String>,
    /// Literal path prepended to `url_format`.
    pub script_name: Option<String>,
    /// Sort applied when neither the caller nor the request asks for one.
    pub default_sort: Option<SortConfig>,
}

impl GridConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn params(mut self, params: ParamNames) -> Self {
        self.params = params;
        self
    }

    pub fn url_format(mut self, template: impl Into<String>) -> Self {
        self.url_format = Some(template.into());
        self
    }

    pub fn script_name(mut self, script: impl Into<String>) -> Self {
        self.script_name = Some(script.into());
        self
    }

    pub fn default_sort(mut self, field: impl Into<String>, direction: Dir) -> Self {
        self.default_sort = Some(SortConfig {
            field: field.into(),
            direction,
        });
        self
    }

    /// Builds the state coordinator, compiling the URL template.
    pub(crate) fn coordinator(&self) -> Result<StateCoordinator> {
        let coordinator = StateCoordinator::new().with_names(self.params.clone());
        match &self.url_format {
            Some(template) => {
                let format = UrlFormat::new(template, self.script_name.as_deref())
                    .map_err(|e| GridError::Config(e.to_string()))?;
                Ok(coordinator.with_url_format(format))
            }
            None => Ok(coordinator),
        }
    }
}

/// A configured sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,
    #[serde(default)]
    pub direction: Dir,
}

impl From<&SortConfig> for SortState {
    fn from(config: &SortConfig) -> Self {
        SortState::by(config.field.clone(), config.direction)
    }
}

/// Options for one bind.
///
/// The driver-specific sections are only read by their driver; the rest
/// applies to every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    /// Restrict the bound field set. `None` keeps every source field.
    pub fields: Option<Vec<String>>,
    /// Narrow the bound rows before counting.
    pub filters: Vec<Filter>,
    /// Let drivers that can sort natively do so.
    pub sort_push_down: bool,
    pub sql: SqlOptions,
    pub xml: XmlOptions,
    pub mapper: MapperOptions,
}

impl Default for BindOptions {
    fn default() -> Self {
        BindOptions {
            fields: None,
            filters: Vec::new(),
            sort_push_down: true,
            sql: SqlOptions::default(),
            xml: XmlOptions::default(),
            mapper: MapperOptions::default(),
        }
    }
}

impl BindOptions {
    pub fn new() -> Self {
        BindOptions::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort_push_down(mut self, enabled: bool) -> Self {
        self.sort_push_down = enabled;
        self
    }

    pub fn sql(mut self, options: SqlOptions) -> Self {
        self.sql = options;
        self
    }

    pub fn xml(mut self, options: XmlOptions) -> Self {
        self.xml = options;
        self
    }

    pub fn mapper(mut self, options: MapperOptions) -> Self {
        self.mapper = options;
        self
    }
}
