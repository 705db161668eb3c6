//! The unified error type.
//!
//! Driver and renderer failures are wrapped, never swallowed: a
//! [`GridError`] always says which driver or renderer failed and, for data
//! sources, during which operation.

use datagrid_render::RenderError;
use datagrid_source::SourceError;
use thiserror::Error;

/// Error type for grid operations.
#[derive(Debug, Error)]
pub enum GridError {
    /// The data source failed to bind, count or fetch.
    #[error("{driver} source failed during {operation}: {source}")]
    Bind {
        driver: &'static str,
        operation: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("unknown driver '{0}'")]
    UnknownDriver(String),

    #[error("unknown renderer '{0}'")]
    UnknownRenderer(String),

    /// A render pass failed.
    #[error("{renderer} renderer failed: {source}")]
    Render {
        renderer: &'static str,
        #[source]
        source: RenderError,
    },

    /// An operation needs a bound data source.
    #[error("no data source is bound")]
    NotBound,

    #[error("configuration error: {0}")]
    Config(String),
}

impl GridError {
    pub(crate) fn bind(driver: &'static str, operation: &'static str, source: SourceError) -> Self {
        GridError::Bind {
            driver,
            operation,
            source,
        }
    }

    pub(crate) fn render(renderer: &'static str, source: RenderError) -> Self {
        GridError::Render { renderer, source }
    }

    pub(crate) fn unsupported(renderer: &'static str, operation: &'static str) -> Self {
        GridError::render(renderer, RenderError::Unsupported { renderer, operation })
    }

    /// Whether this wraps an unknown or non-sortable field reference.
    pub fn is_invalid_field(&self) -> bool {
        matches!(self, GridError::Bind { source, .. } if source.is_invalid_field())
    }
}

impl From<serde_yaml::Error> for GridError {
    fn from(err: serde_yaml::Error) -> Self {
        GridError::Config(err.to_string())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
