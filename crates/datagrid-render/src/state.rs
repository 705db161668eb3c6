//! Sort/page state coordination.
//!
//! [`StateCoordinator`] turns an incoming [`RequestContext`] into a sort and
//! page number, and builds the link for any target sort/page. Both directions
//! share one set of parameter names and one optional [`UrlFormat`], so a link
//! built for a state parses back to exactly that state.
//!
//! Two link styles are supported:
//!
//! ```text
//! query string:  /people?direction=DESC&orderBy=age&page=2
//! url template:  /index.php/people/2/age/DESC     (script "/index.php",
//!                                                  template "/people/:page/:orderBy/:direction")
//! ```
//!
//! Incoming parameters are untrusted: anything malformed or unknown is
//! dropped with a warning and the grid falls back to its defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use datagrid_source::{Dir, PageState, SortState};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RenderError, Result};

/// Characters escaped inside a templated path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const PAGE: &str = ":page";

// =============================================================================
// Parameter names
// =============================================================================

/// Request parameter names for one grid.
///
/// `prefix` is prepended to each name so several grids can share a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamNames {
    pub prefix: String,
    pub order_by: String,
    pub direction: String,
    pub page: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        ParamNames {
            prefix: String::new(),
            order_by: "orderBy".to_string(),
            direction: "direction".to_string(),
            page: "page".to_string(),
        }
    }
}

impl ParamNames {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        ParamNames {
            prefix: prefix.into(),
            ..ParamNames::default()
        }
    }

    pub fn order_by_key(&self) -> String {
        format!("{}{}", self.prefix, self.order_by)
    }

    pub fn direction_key(&self) -> String {
        format!("{}{}", self.prefix, self.direction)
    }

    pub fn page_key(&self) -> String {
        format!("{}{}", self.prefix, self.page)
    }

    fn owns(&self, key: &str) -> bool {
        key == self.order_by_key() || key == self.direction_key() || key == self.page_key()
    }
}

// =============================================================================
// Request context
// =============================================================================

/// The incoming request, as far as the grid cares.
///
/// ```
/// use datagrid_render::RequestContext;
///
/// let request = RequestContext::from_url("/people?orderBy=age&direction=DESC&tab=2");
/// assert_eq!(request.self_path, "/people");
/// assert_eq!(request.get("orderBy"), Some("age"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Base for generated links.
    pub self_path: String,
    /// Query parameters.
    pub params: BTreeMap<String, String>,
    /// Request path, matched against a [`UrlFormat`] when one is configured.
    pub path: Option<String>,
}

impl RequestContext {
    pub fn new(self_path: impl Into<String>) -> Self {
        RequestContext {
            self_path: self_path.into(),
            ..RequestContext::default()
        }
    }

    /// Splits `path?query` into a context. An unparsable query is ignored.
    pub fn from_url(url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };
        let params = match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(err) => {
                warn!(error = %err, "ignoring malformed query string");
                BTreeMap::new()
            }
        };
        RequestContext {
            self_path: path.to_string(),
            params,
            path: Some(path.to_string()),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

// =============================================================================
// URL templates
// =============================================================================

/// A positional URL template with `:page`, `:orderBy` and `:direction`.
///
/// The `:page` segment is left out of links when paging is off.
#[derive(Clone)]
pub struct UrlFormat {
    template: String,
    without_page: String,
    placeholder: Regex,
    paged: Regex,
    unpaged: Regex,
}

impl fmt::Debug for UrlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlFormat")
            .field("template", &self.template)
            .finish()
    }
}

impl UrlFormat {
    /// Compiles a template, optionally behind a literal script path.
    pub fn new(template: &str, script_name: Option<&str>) -> Result<Self> {
        if !template.contains(":orderBy") || !template.contains(":direction") {
            return Err(RenderError::InvalidFormat(format!(
                "url format '{}' needs :orderBy and :direction",
                template
            )));
        }
        let script = script_name.unwrap_or("").trim_end_matches('/');
        let body = if template.starts_with('/') {
            template.to_string()
        } else {
            format!("/{}", template)
        };
        let template = format!("{}{}", script, body);
        let without_page = strip_page_segment(&template);
        let placeholder = placeholder()?;

        Ok(UrlFormat {
            paged: compile(&placeholder, &template)?,
            unpaged: compile(&placeholder, &without_page)?,
            placeholder,
            template,
            without_page,
        })
    }

    /// The full template, script path included.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Builds the path for a state.
    ///
    /// Placeholders are substituted in one pass, so a field name that
    /// itself contains `:page` or `:direction` is left alone.
    pub fn build(&self, sort: &SortState, page: PageState) -> String {
        let template = if page.is_paged() {
            &self.template
        } else {
            &self.without_page
        };
        let field = sort.field().map(encode).unwrap_or_default();
        let dir = sort.dir().map(Dir::as_str).unwrap_or("");
        self.placeholder
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "page" => page.page().to_string(),
                "orderBy" => field.clone(),
                _ => dir.to_string(),
            })
            .into_owned()
    }

    /// Matches a path, returning raw (decoded) parameter values.
    fn parse(&self, path: &str) -> Option<RawParams> {
        let caps = self
            .paged
            .captures(path)
            .or_else(|| self.unpaged.captures(path))?;
        let get = |name: &str| caps.name(name).map(|m| decode(m.as_str()));
        Some(RawParams {
            order_by: get("orderBy"),
            direction: get("direction"),
            page: get("page"),
        })
    }
}

fn strip_page_segment(template: &str) -> String {
    if template.contains("/:page") {
        template.replacen("/:page", "", 1)
    } else if template.contains(":page/") {
        template.replacen(":page/", "", 1)
    } else {
        template.replacen(PAGE, "", 1)
    }
}

fn placeholder() -> Result<Regex> {
    Regex::new(":(page|orderBy|direction)").map_err(|e| RenderError::InvalidFormat(e.to_string()))
}

fn compile(placeholder: &Regex, template: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    let mut last = 0;
    for m in placeholder.find_iter(template) {
        pattern.push_str(&regex::escape(&template[last..m.start()]));
        pattern.push_str(&format!("(?P<{}>[^/?#]*)", &m.as_str()[1..]));
        last = m.end();
    }
    pattern.push_str(&regex::escape(&template[last..]));
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| RenderError::InvalidFormat(e.to_string()))
}

fn encode(text: &str) -> String {
    utf8_percent_encode(text, SEGMENT).to_string()
}

fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

// =============================================================================
// Coordinator
// =============================================================================

#[derive(Debug, Default)]
struct RawParams {
    order_by: Option<String>,
    direction: Option<String>,
    page: Option<String>,
}

/// What a request asked for, after normalization. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub sort: Option<SortState>,
    pub page: Option<usize>,
}

/// Parses request state and builds links.
///
/// ```
/// use datagrid_render::{RequestContext, StateCoordinator};
/// use datagrid_source::{Dir, PageState, SortState};
///
/// let coordinator = StateCoordinator::new();
/// let request = RequestContext::new("/people").param("tab", "2");
///
/// let link = coordinator.link(&request, &SortState::by("age", Dir::Desc), PageState::new(3, 10));
/// assert_eq!(link, "/people?direction=DESC&orderBy=age&page=3&tab=2");
///
/// let state = coordinator.parse(&RequestContext::from_url(&link), |_| Some(Dir::Asc));
/// assert_eq!(state.sort, Some(SortState::by("age", Dir::Desc)));
/// assert_eq!(state.page, Some(3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateCoordinator {
    names: ParamNames,
    url_format: Option<UrlFormat>,
}

impl StateCoordinator {
    pub fn new() -> Self {
        StateCoordinator::default()
    }

    pub fn with_names(mut self, names: ParamNames) -> Self {
        self.names = names;
        self
    }

    pub fn with_url_format(mut self, format: UrlFormat) -> Self {
        self.url_format = Some(format);
        self
    }

    pub fn names(&self) -> &ParamNames {
        &self.names
    }

    pub fn url_format(&self) -> Option<&UrlFormat> {
        self.url_format.as_ref()
    }

    /// Reads sort and page from a request.
    ///
    /// `sortable` returns the default direction of a sortable field and
    /// `None` for unknown or non-sortable ones. Never fails: bad values are
    /// dropped.
    pub fn parse(&self, request: &RequestContext, sortable: impl Fn(&str) -> Option<Dir>) -> RequestState {
        let raw = match (&self.url_format, &request.path) {
            (Some(format), Some(path)) => format.parse(path).unwrap_or_else(|| {
                warn!(path = %path, template = %format.template(), "request path does not match url format");
                RawParams::default()
            }),
            _ => RawParams {
                order_by: request.get(&self.names.order_by_key()).map(str::to_string),
                direction: request.get(&self.names.direction_key()).map(str::to_string),
                page: request.get(&self.names.page_key()).map(str::to_string),
            },
        };

        let page = raw.page.as_deref().filter(|p| !p.is_empty()).and_then(|p| {
            match p.trim().parse::<usize>() {
                Ok(n) if n >= 1 => Some(n),
                _ => {
                    warn!(page = %p, "ignoring malformed page parameter");
                    None
                }
            }
        });

        let sort = raw.order_by.as_deref().filter(|f| !f.is_empty()).and_then(|field| {
            let Some(default) = sortable(field) else {
                warn!(field = %field, "ignoring sort on unknown or non-sortable field");
                return None;
            };
            let dir = match raw.direction.as_deref().filter(|d| !d.is_empty()) {
                None => default,
                Some(text) => text.parse::<Dir>().unwrap_or_else(|_| {
                    warn!(direction = %text, "ignoring malformed sort direction");
                    default
                }),
            };
            Some(SortState::by(field, dir))
        });

        RequestState { sort, page }
    }

    /// Builds the link that reproduces `sort` and `page`.
    ///
    /// Unrelated request parameters are kept, sorted by name.
    pub fn link(&self, request: &RequestContext, sort: &SortState, page: PageState) -> String {
        let mut params: BTreeMap<String, String> = request
            .params
            .iter()
            .filter(|(k, _)| !self.names.owns(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let base = match &self.url_format {
            Some(format) => format.build(sort, page),
            None => {
                if let Some(order) = sort.order() {
                    params.insert(self.names.order_by_key(), order.field.clone());
                    params.insert(self.names.direction_key(), order.dir.as_str().to_string());
                }
                if page.is_paged() {
                    params.insert(self.names.page_key(), page.page().to_string());
                }
                request.self_path.clone()
            }
        };

        let query = serde_urlencoded::to_string(&params).unwrap_or_default();
        if query.is_empty() {
            base
        } else {
            format!("{}?{}", base, query)
        }
    }
}

// =============================================================================
// Links
// =============================================================================

/// Caller-supplied link builder, replacing the coordinator's links.
pub type LinkBuilder = Arc<dyn Fn(&SortState, PageState) -> String + Send + Sync>;

/// Link building for one render pass.
#[derive(Clone, Copy)]
pub struct Links<'a> {
    coordinator: &'a StateCoordinator,
    request: &'a RequestContext,
    custom: Option<&'a LinkBuilder>,
}

impl fmt::Debug for Links<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("coordinator", self.coordinator)
            .field("request", self.request)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl<'a> Links<'a> {
    pub fn new(coordinator: &'a StateCoordinator, request: &'a RequestContext) -> Self {
        Links {
            coordinator,
            request,
            custom: None,
        }
    }

    pub fn with_builder(mut self, builder: Option<&'a LinkBuilder>) -> Self {
        self.custom = builder;
        self
    }

    /// The link for a target state.
    pub fn href(&self, sort: &SortState, page: PageState) -> String {
        match self.custom {
            Some(build) => build(sort, page),
            None => self.coordinator.link(self.request, sort, page),
        }
    }

    pub fn names(&self) -> &'a ParamNames {
        self.coordinator.names()
    }
}
